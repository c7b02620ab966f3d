//! Deployment plans: named steps with declared dependencies.
//!
//! A plan is a DAG. Dependencies are implied by argument references
//! ([`Arg::Contract`], [`Arg::ContractList`], invoke targets) and may be added
//! explicitly with `after`. The execution order is derived in [`graph`].
//!
//! Plans can be written by hand in TOML:
//!
//! ```toml
//! [[step]]
//! name = "factory"
//! kind = "deploy"
//! artifact = "FlatFactory.sol:UniswapV2Factory"
//! args = ["signer"]
//!
//! [[step]]
//! name = "router"
//! kind = "deploy"
//! artifact = "FlatRouter.sol:UniswapV2Router02"
//! args = [{ contract = "factory" }, { address = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2" }]
//! ```

mod graph;
pub mod standard;

use std::{fmt, path::Path, str::FromStr};

use alloy_core::primitives::{Address, B256, U256};
use anyhow::Context;
use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::{abi::ArgValue, error::DeployError, registry::DeployedContractSet};

/// Logical name of a plan step (and of the contract it deploys).
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[serde(transparent)]
pub struct StepName(String);

impl StepName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StepName {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for StepName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Reference to a compiled artifact, written `<Source>.sol:<Contract>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactRef {
    /// Source file name, e.g. `FlatFactory.sol`.
    pub source: String,
    /// Contract name inside the source, e.g. `UniswapV2Factory`.
    pub contract: String,
}

impl ArtifactRef {
    pub fn new(source: impl Into<String>, contract: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            contract: contract.into(),
        }
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.contract)
    }
}

impl FromStr for ArtifactRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((source, contract)) if !source.is_empty() && !contract.is_empty() => {
                Ok(Self::new(source, contract))
            }
            _ => Err(format!(
                "invalid artifact reference {s:?}, expected <Source>.sol:<Contract>"
            )),
        }
    }
}

impl TryFrom<String> for ArtifactRef {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ArtifactRef> for String {
    fn from(value: ArtifactRef) -> Self {
        value.to_string()
    }
}

/// A constructor or function argument, possibly referring to an earlier step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arg {
    /// Address of a contract deployed by another step.
    Contract(StepName),
    /// Addresses of several deployed contracts.
    ContractList(Vec<StepName>),
    /// Address of the signing identity.
    Signer,
    Address(Address),
    AddressList(Vec<Address>),
    Uint(U256),
    UintList(Vec<U256>),
    Bytes32(B256),
    String(String),
    Bool(bool),
}

impl Arg {
    pub fn contract(name: impl Into<StepName>) -> Self {
        Self::Contract(name.into())
    }

    pub fn uint(value: u64) -> Self {
        Self::Uint(U256::from(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Steps this argument refers to.
    pub fn references(&self) -> Vec<&StepName> {
        match self {
            Self::Contract(name) => vec![name],
            Self::ContractList(names) => names.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Resolve references against the contracts deployed so far.
    pub fn resolve(
        &self,
        deployed: &DeployedContractSet,
        signer: Address,
    ) -> Result<ArgValue, DeployError> {
        let lookup = |name: &StepName| {
            deployed.address_of(name).ok_or_else(|| {
                DeployError::plan(format!("contract {name} has not been deployed yet"))
            })
        };

        Ok(match self {
            Self::Contract(name) => ArgValue::Address(lookup(name)?),
            Self::ContractList(names) => ArgValue::List(
                names
                    .iter()
                    .map(|name| lookup(name).map(ArgValue::Address))
                    .collect::<Result<_, _>>()?,
            ),
            Self::Signer => ArgValue::Address(signer),
            Self::Address(address) => ArgValue::Address(*address),
            Self::AddressList(addresses) => {
                ArgValue::List(addresses.iter().copied().map(ArgValue::Address).collect())
            }
            Self::Uint(value) => ArgValue::Uint(*value),
            Self::UintList(values) => {
                ArgValue::List(values.iter().copied().map(ArgValue::Uint).collect())
            }
            Self::Bytes32(word) => ArgValue::Bytes32(*word),
            Self::String(s) => ArgValue::String(s.clone()),
            Self::Bool(b) => ArgValue::Bool(*b),
        })
    }
}

/// What a step does on-chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepAction {
    /// Deploy a contract from an artifact.
    Deploy {
        artifact: ArtifactRef,
        #[serde(default)]
        args: Vec<Arg>,
    },
    /// Call a function on a contract deployed by another step.
    Invoke {
        target: StepName,
        /// Solidity signature, e.g. `addMinter(address)`.
        function: String,
        #[serde(default)]
        args: Vec<Arg>,
    },
}

impl StepAction {
    pub fn args(&self) -> &[Arg] {
        match self {
            Self::Deploy { args, .. } | Self::Invoke { args, .. } => args,
        }
    }
}

/// A single named step of a deployment plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    pub name: StepName,
    #[serde(flatten)]
    pub action: StepAction,
    /// Extra ordering constraints not implied by arguments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub after: Vec<StepName>,
}

impl PlanStep {
    pub fn is_deploy(&self) -> bool {
        matches!(self.action, StepAction::Deploy { .. })
    }

    /// Steps whose addresses this step consumes.
    pub fn address_dependencies(&self) -> Vec<&StepName> {
        let mut deps: Vec<&StepName> = self
            .action
            .args()
            .iter()
            .flat_map(Arg::references)
            .collect();
        if let StepAction::Invoke { target, .. } = &self.action {
            deps.push(target);
        }
        deps
    }

    /// All steps that must complete before this one.
    pub fn dependencies(&self) -> Vec<&StepName> {
        let mut deps = self.address_dependencies();
        deps.extend(self.after.iter());
        deps
    }
}

/// An ordered collection of deployment steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentPlan {
    #[serde(rename = "step", default)]
    pub steps: Vec<PlanStep>,
}

impl DeploymentPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a deploy step.
    pub fn deploy(
        mut self,
        name: impl Into<StepName>,
        artifact: ArtifactRef,
        args: Vec<Arg>,
    ) -> Self {
        self.steps.push(PlanStep {
            name: name.into(),
            action: StepAction::Deploy { artifact, args },
            after: Vec::new(),
        });
        self
    }

    /// Append an invoke step calling `function` on the contract deployed by `target`.
    pub fn invoke(
        mut self,
        name: impl Into<StepName>,
        target: impl Into<StepName>,
        function: impl Into<String>,
        args: Vec<Arg>,
    ) -> Self {
        self.steps.push(PlanStep {
            name: name.into(),
            action: StepAction::Invoke {
                target: target.into(),
                function: function.into(),
                args,
            },
            after: Vec::new(),
        });
        self
    }

    /// Add an ordering constraint to the most recently added step.
    pub fn after(mut self, dependency: impl Into<StepName>) -> Self {
        if let Some(step) = self.steps.last_mut() {
            step.after.push(dependency.into());
        }
        self
    }

    pub fn step(&self, name: &StepName) -> Option<&PlanStep> {
        self.steps.iter().find(|step| &step.name == name)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Artifacts referenced by deploy steps, in declaration order.
    pub fn artifacts(&self) -> impl Iterator<Item = &ArtifactRef> {
        self.steps.iter().filter_map(|step| match &step.action {
            StepAction::Deploy { artifact, .. } => Some(artifact),
            StepAction::Invoke { .. } => None,
        })
    }

    /// Load a plan from a TOML file.
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read plan from {}", path.display()))?;
        let plan: Self = toml::from_str(&content).context("Failed to parse plan file as TOML")?;
        tracing::info!(path = %path.display(), steps = plan.len(), "Deployment plan loaded");
        Ok(plan)
    }

    /// Save the plan to a TOML file.
    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize plan to TOML")?;
        std::fs::write(path, content)
            .context(format!("Failed to write plan to {}", path.display()))?;
        Ok(())
    }
}
