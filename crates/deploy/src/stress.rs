//! Stake-cycle gas scenario.
//!
//! Repeatedly approves, stakes and unstakes NFTs on a staking contract to
//! measure how its reward accounting behaves under load. Scenarios are written
//! in TOML:
//!
//! ```toml
//! staking = "0x..."
//! minter = "0x..."
//! held_ids = [1, 2]          # staked in the first round and never unstaked
//! token_ids = [3, 4, 5]      # staked and unstaked every round
//! unstake_order = [3, 5, 4]
//! rounds = 13
//! claim_token = 1
//! ```

use std::{
    collections::{BTreeMap, BTreeSet},
    path::Path,
};

use alloy_core::primitives::Address;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::{
    abi::{self, ArgValue},
    error::{DeployError, DeployResult},
    executor::TxExecutor,
    plan::StepName,
};

/// Kind of call made by the scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StakeOpKind {
    Approve,
    Stake,
    Unstake,
    Claim,
}

/// Function signatures called by the scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StakeSignatures {
    /// Called on the minter with `(staking, token_id)`.
    pub approve: String,
    /// Called on the staking contract with `(token_id, pool_id)`.
    pub stake: String,
    pub unstake: String,
    /// Called on the staking contract with `(pool_id, token_id)`.
    pub claim: String,
}

impl Default for StakeSignatures {
    fn default() -> Self {
        Self {
            approve: "approve(address,uint256)".to_string(),
            stake: "stake(uint256,uint256)".to_string(),
            unstake: "unstake(uint256,uint256)".to_string(),
            claim: "claim(uint256,uint256)".to_string(),
        }
    }
}

fn default_rounds() -> u32 {
    1
}

/// Parameters of a stake-cycle run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeCycleConfig {
    pub staking: Address,
    pub minter: Address,
    /// Tokens staked and unstaked every round.
    pub token_ids: Vec<u64>,
    /// Tokens staked in the first round only, left staked afterwards.
    #[serde(default)]
    pub held_ids: Vec<u64>,
    /// Unstake order of `token_ids`; defaults to the staking order.
    #[serde(default)]
    pub unstake_order: Vec<u64>,
    #[serde(default)]
    pub pool_id: u64,
    #[serde(default = "default_rounds")]
    pub rounds: u32,
    /// Token to claim rewards for once every round is done.
    #[serde(default)]
    pub claim_token: Option<u64>,
    #[serde(default)]
    pub signatures: StakeSignatures,
}

/// A single call of the scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StakeOp {
    pub round: u32,
    pub kind: StakeOpKind,
    pub token_id: u64,
}

impl StakeOp {
    /// Label used in logs and errors, e.g. `round2_unstake_5`.
    pub fn label(&self) -> StepName {
        match self.kind {
            StakeOpKind::Claim => format!("claim_{}", self.token_id).into(),
            kind => format!("round{}_{kind}_{}", self.round, self.token_id).into(),
        }
    }
}

impl StakeCycleConfig {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read scenario from {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).context("Failed to parse scenario file as TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DeployResult<()> {
        if self.token_ids.is_empty() {
            return Err(DeployError::config("token_ids must not be empty"));
        }
        if self.rounds == 0 {
            return Err(DeployError::config("rounds must be at least 1"));
        }

        let tokens: BTreeSet<u64> = self.token_ids.iter().copied().collect();
        if tokens.len() != self.token_ids.len() {
            return Err(DeployError::config("token_ids must not contain duplicates"));
        }
        if let Some(id) = self.held_ids.iter().find(|id| tokens.contains(*id)) {
            return Err(DeployError::config(format!(
                "token {id} cannot be both held and cycled"
            )));
        }
        if !self.unstake_order.is_empty() {
            if let Some(id) = self.unstake_order.iter().find(|id| !tokens.contains(*id)) {
                return Err(DeployError::config(format!(
                    "unstake_order contains token {id} which is not in token_ids"
                )));
            }
            let order: BTreeSet<u64> = self.unstake_order.iter().copied().collect();
            if order != tokens || self.unstake_order.len() != self.token_ids.len() {
                return Err(DeployError::config(
                    "unstake_order must list every token of token_ids exactly once",
                ));
            }
        }

        Ok(())
    }

    /// The full call sequence, in execution order.
    pub fn operations(&self) -> Vec<StakeOp> {
        let unstake_order = if self.unstake_order.is_empty() {
            &self.token_ids
        } else {
            &self.unstake_order
        };

        let mut ops = Vec::new();
        for round in 1..=self.rounds {
            let staked: Vec<u64> = if round == 1 {
                self.held_ids.iter().chain(&self.token_ids).copied().collect()
            } else {
                self.token_ids.clone()
            };

            for kind in [StakeOpKind::Approve, StakeOpKind::Stake] {
                ops.extend(staked.iter().map(|&token_id| StakeOp {
                    round,
                    kind,
                    token_id,
                }));
            }
            ops.extend(unstake_order.iter().map(|&token_id| StakeOp {
                round,
                kind: StakeOpKind::Unstake,
                token_id,
            }));
        }

        if let Some(token_id) = self.claim_token {
            ops.push(StakeOp {
                round: self.rounds,
                kind: StakeOpKind::Claim,
                token_id,
            });
        }
        ops
    }

    /// Target, signature and arguments of a call.
    fn call_for(&self, op: &StakeOp) -> (Address, &str, Vec<ArgValue>) {
        let token = ArgValue::from(op.token_id);
        let pool = ArgValue::from(self.pool_id);
        match op.kind {
            StakeOpKind::Approve => (self.minter, self.signatures.approve.as_str(), vec![
                self.staking.into(),
                token,
            ]),
            StakeOpKind::Stake => (self.staking, self.signatures.stake.as_str(), vec![token, pool]),
            StakeOpKind::Unstake => (self.staking, self.signatures.unstake.as_str(), vec![token, pool]),
            StakeOpKind::Claim => (self.staking, self.signatures.claim.as_str(), vec![pool, token]),
        }
    }
}

/// Gas statistics of one kind of call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GasStats {
    pub kind: StakeOpKind,
    pub count: usize,
    pub total: u64,
    pub min: u64,
    pub max: u64,
    pub mean: u64,
}

impl GasStats {
    /// Ether spent on every call of this kind at `gas_price_gwei`.
    pub fn cost_eth(&self, gas_price_gwei: f64) -> f64 {
        self.total as f64 * gas_price_gwei / 1e9
    }
}

/// Gas used by every call of a scenario, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GasReport {
    samples: BTreeMap<StakeOpKind, Vec<u64>>,
}

impl GasReport {
    pub fn record(&mut self, kind: StakeOpKind, gas_used: u64) {
        self.samples.entry(kind).or_default().push(gas_used);
    }

    pub fn calls(&self) -> usize {
        self.samples.values().map(Vec::len).sum()
    }

    pub fn samples(&self, kind: StakeOpKind) -> &[u64] {
        self.samples.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn stats(&self) -> Vec<GasStats> {
        self.samples
            .iter()
            .filter(|(_, samples)| !samples.is_empty())
            .map(|(&kind, samples)| {
                let total: u64 = samples.iter().sum();
                GasStats {
                    kind,
                    count: samples.len(),
                    total,
                    min: samples.iter().copied().min().unwrap_or_default(),
                    max: samples.iter().copied().max().unwrap_or_default(),
                    mean: total / samples.len() as u64,
                }
            })
            .collect()
    }
}

/// Run the scenario, stopping at the first failed call.
pub async fn run_stake_cycles<E: TxExecutor>(
    executor: &E,
    config: &StakeCycleConfig,
) -> DeployResult<GasReport> {
    config.validate()?;
    let ops = config.operations();
    tracing::info!(
        calls = ops.len(),
        rounds = config.rounds,
        staking = %config.staking,
        "Starting stake cycles"
    );

    let mut report = GasReport::default();
    for op in &ops {
        let label = op.label();
        let (to, signature, args) = config.call_for(op);
        let calldata =
            abi::encode_call(signature, &args).map_err(|e| DeployError::encoding(&label, e))?;

        let outcome = executor.call(&label, to, calldata).await?;
        tracing::debug!(%label, gas_used = outcome.gas_used, "Call confirmed");
        report.record(op.kind, outcome.gas_used);
    }

    tracing::info!(calls = report.calls(), "Stake cycles complete");
    Ok(report)
}
