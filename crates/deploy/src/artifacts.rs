//! Compiled contract artifacts.
//!
//! Artifacts are read from Hardhat compilation output:
//! `<artifacts_dir>/contracts/<Source>.sol/<Contract>.json`, with `abi` and
//! `bytecode` fields. Forge-style `{ "object": "0x..." }` bytecode is accepted
//! too.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use alloy_core::{json_abi::JsonAbi, primitives::Bytes};
use serde::Deserialize;

use crate::{
    abi::{self, ArgValue},
    error::{DeployError, DeployResult},
    plan::{ArtifactRef, DeploymentPlan},
};

/// Interface and creation bytecode of one contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub reference: ArtifactRef,
    pub abi: JsonAbi,
    pub bytecode: Bytes,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    Hex(String),
    Object { object: String },
}

#[derive(Deserialize)]
struct RawArtifact {
    abi: JsonAbi,
    bytecode: RawBytecode,
}

impl Artifact {
    /// Parse an artifact from its JSON content.
    pub fn from_json(reference: ArtifactRef, content: &str) -> DeployResult<Self> {
        let raw: RawArtifact = serde_json::from_str(content)
            .map_err(|e| DeployError::artifact(reference.to_string(), e))?;

        let hex_code = match &raw.bytecode {
            RawBytecode::Hex(code) | RawBytecode::Object { object: code } => code,
        };
        let bytecode = hex::decode(hex_code.trim_start_matches("0x")).map_err(|e| {
            DeployError::artifact(reference.to_string(), format!("invalid bytecode: {e}"))
        })?;
        if bytecode.is_empty() {
            return Err(DeployError::artifact(
                reference.to_string(),
                "bytecode is empty (abstract contract or interface?)",
            ));
        }

        Ok(Self {
            reference,
            abi: raw.abi,
            bytecode: bytecode.into(),
        })
    }

    /// Read an artifact from a Hardhat artifacts directory.
    pub fn load(artifacts_dir: &Path, reference: &ArtifactRef) -> DeployResult<Self> {
        let path = artifact_path(artifacts_dir, reference);
        let content = std::fs::read_to_string(&path).map_err(|e| {
            DeployError::artifact(
                reference.to_string(),
                format!("cannot read {}: {e}", path.display()),
            )
        })?;
        Self::from_json(reference.clone(), &content)
    }

    /// Creation code followed by the ABI-encoded constructor arguments.
    pub fn deploy_code(&self, args: &[ArgValue]) -> Result<Bytes, String> {
        let encoded = abi::encode_constructor(&self.abi, args)?;
        let mut code = self.bytecode.to_vec();
        code.extend(encoded);
        Ok(code.into())
    }
}

/// Location of an artifact file inside a Hardhat artifacts directory.
pub fn artifact_path(artifacts_dir: &Path, reference: &ArtifactRef) -> PathBuf {
    artifacts_dir
        .join("contracts")
        .join(&reference.source)
        .join(format!("{}.json", reference.contract))
}

/// Artifacts needed by a plan, loaded up front.
#[derive(Debug, Clone, Default)]
pub struct ArtifactStore {
    artifacts: HashMap<ArtifactRef, Artifact>,
}

impl ArtifactStore {
    /// Load every artifact referenced by the plan.
    ///
    /// Fails before any transaction can be sent if one of them is missing or
    /// invalid.
    pub fn load_for_plan(artifacts_dir: &Path, plan: &DeploymentPlan) -> DeployResult<Self> {
        let mut artifacts = HashMap::new();
        for reference in plan.artifacts() {
            if artifacts.contains_key(reference) {
                continue;
            }
            let artifact = Artifact::load(artifacts_dir, reference)?;
            tracing::debug!(
                artifact = %reference,
                bytecode_len = artifact.bytecode.len(),
                "Artifact loaded"
            );
            artifacts.insert(reference.clone(), artifact);
        }

        tracing::info!(
            dir = %artifacts_dir.display(),
            count = artifacts.len(),
            "Artifacts loaded"
        );
        Ok(Self { artifacts })
    }

    pub fn from_artifacts(artifacts: impl IntoIterator<Item = Artifact>) -> Self {
        Self {
            artifacts: artifacts
                .into_iter()
                .map(|a| (a.reference.clone(), a))
                .collect(),
        }
    }

    pub fn get(&self, reference: &ArtifactRef) -> DeployResult<&Artifact> {
        self.artifacts.get(reference).ok_or_else(|| {
            DeployError::artifact(reference.to_string(), "artifact was not loaded")
        })
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}
