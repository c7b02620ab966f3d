//! Deployment record: checkpoint of a run, written after every step.
//!
//! The record carries a hash of everything that determines the deployed
//! addresses (chain, signer, plan). A run may only resume from a record whose
//! hash matches.

use std::path::{Path, PathBuf};

use alloy_core::primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{
    error::{DeployError, DeployResult},
    plan::DeploymentPlan,
    registry::DeploymentReport,
};

/// File name of the record inside the output directory.
pub const RECORD_FILENAME: &str = "deployment.json";

/// Inputs that determine the outcome of a deployment.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentFingerprint<'a> {
    pub chain_id: u64,
    pub signer: Address,
    pub plan: &'a DeploymentPlan,
}

impl DeploymentFingerprint<'_> {
    /// Hex-encoded SHA-256 of the JSON serialization. Deterministic.
    pub fn compute_hash(&self) -> DeployResult<String> {
        let json = serde_json::to_string(self)
            .map_err(|e| DeployError::record(format!("cannot serialize fingerprint: {e}")))?;

        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }
}

/// Persisted state of a deployment run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub config_hash: String,
    pub chain_id: u64,
    /// Time of the last checkpoint.
    pub deployed_at: DateTime<Utc>,
    pub tool_version: String,
    #[serde(flatten)]
    pub report: DeploymentReport,
}

impl DeploymentRecord {
    pub fn new(config_hash: String, chain_id: u64, report: DeploymentReport) -> Self {
        Self {
            config_hash,
            chain_id,
            deployed_at: Utc::now(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            report,
        }
    }

    /// Write the record as pretty JSON.
    ///
    /// The content goes to a temporary file first and is then renamed, so an
    /// interrupted write never leaves a truncated record behind.
    pub fn save_to_file(&self, path: &Path) -> DeployResult<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| DeployError::record(format!("cannot serialize record: {e}")))?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .map_err(|e| DeployError::record(format!("cannot write {}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, path)
            .map_err(|e| DeployError::record(format!("cannot write {}: {e}", path.display())))?;

        Ok(())
    }

    pub fn load_from_file(path: &Path) -> DeployResult<Self> {
        if !path.exists() {
            return Err(DeployError::record(format!(
                "deployment record does not exist: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| DeployError::record(format!("cannot read {}: {e}", path.display())))?;
        serde_json::from_str(&content)
            .map_err(|e| DeployError::record(format!("cannot parse {}: {e}", path.display())))
    }

    /// Fail unless the record was produced by the same chain, signer and plan.
    pub fn ensure_matches(&self, config_hash: &str) -> DeployResult<()> {
        if self.config_hash != config_hash {
            return Err(DeployError::record(format!(
                "configuration changed since the recorded deployment (recorded {}, current {config_hash}); \
                 run without --resume to deploy afresh",
                self.config_hash
            )));
        }
        Ok(())
    }

    /// Move an existing record aside so a fresh run does not overwrite it.
    ///
    /// The archive is named after the time of the last checkpoint. A record
    /// that cannot be parsed is still moved aside, named after its
    /// modification time. Returns the archive path, or `None` when there was
    /// nothing to archive.
    pub fn archive_existing(path: &Path) -> DeployResult<Option<PathBuf>> {
        if !path.exists() {
            return Ok(None);
        }

        let stamp = match Self::load_from_file(path) {
            Ok(previous) => previous.deployed_at,
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "Unreadable deployment record, archiving it as is"
                );
                std::fs::metadata(path)
                    .and_then(|meta| meta.modified())
                    .map(DateTime::<Utc>::from)
                    .unwrap_or_else(|_| Utc::now())
            }
        };

        let archive = archive_path(path, stamp);
        std::fs::rename(path, &archive).map_err(|e| {
            DeployError::record(format!("cannot archive {}: {e}", path.display()))
        })?;

        tracing::info!(archive = %archive.display(), "Previous deployment record archived");
        Ok(Some(archive))
    }
}

/// First free `deployment-<timestamp>[-n].json` next to `path`.
fn archive_path(path: &Path, stamp: DateTime<Utc>) -> PathBuf {
    let base = format!("deployment-{}", stamp.format("%Y%m%dT%H%M%SZ"));
    let mut archive = path.with_file_name(format!("{base}.json"));
    let mut suffix = 1;
    while archive.exists() {
        archive = path.with_file_name(format!("{base}-{suffix}.json"));
        suffix += 1;
    }
    archive
}
