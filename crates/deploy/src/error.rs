//! Error taxonomy for deployment runs.
//!
//! Every variant is fatal for a run: the orchestrator stops at the first
//! error and never attempts the remaining steps.

use std::fmt::Display;

use crate::plan::StepName;

/// Result alias used across the deployment library.
pub type DeployResult<T> = Result<T, DeployError>;

/// Errors raised while loading inputs or executing a deployment plan.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("artifact error for {contract}: {reason}")]
    Artifact { contract: String, reason: String },

    #[error("invalid deployment plan: {0}")]
    Plan(String),

    #[error("cannot encode arguments for {step}: {reason}")]
    Encoding { step: StepName, reason: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("transaction for {step} reverted: {reason}")]
    Reverted { step: StepName, reason: String },

    #[error("deployment record error: {0}")]
    Record(String),
}

impl DeployError {
    pub fn config(msg: impl Display) -> Self {
        Self::Config(msg.to_string())
    }

    pub fn plan(msg: impl Display) -> Self {
        Self::Plan(msg.to_string())
    }

    pub fn transport(err: impl Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn record(msg: impl Display) -> Self {
        Self::Record(msg.to_string())
    }

    pub fn artifact(contract: impl Into<String>, reason: impl Display) -> Self {
        Self::Artifact {
            contract: contract.into(),
            reason: reason.to_string(),
        }
    }

    pub fn encoding(step: &StepName, reason: impl Display) -> Self {
        Self::Encoding {
            step: step.clone(),
            reason: reason.to_string(),
        }
    }

    pub fn reverted(step: &StepName, reason: impl Display) -> Self {
        Self::Reverted {
            step: step.clone(),
            reason: reason.to_string(),
        }
    }
}

impl From<figment::Error> for DeployError {
    fn from(value: figment::Error) -> Self {
        Self::Config(value.to_string())
    }
}
