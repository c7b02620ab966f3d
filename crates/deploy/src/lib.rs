//! raptor-deploy - Deployment library for the Raptor contract suite.
//!
//! This crate deploys a suite of compiled contracts in dependency order,
//! threading each resulting address into the constructors of later contracts,
//! and provides a stake-cycle gas scenario for the staking contracts.

pub mod abi;
pub mod artifacts;
pub mod config;
mod context;
mod error;
pub mod executor;
mod orchestrator;
pub mod plan;
pub mod record;
mod registry;
pub mod stress;

pub use artifacts::{Artifact, ArtifactStore};
pub use config::{DeploymentConfig, FeeSchedule, PrivateKey};
pub use context::DeployContext;
pub use error::{DeployError, DeployResult};
pub use executor::{RpcExecutor, SimulatedExecutor, SimulatedTx, TxExecutor, TxOutcome};
pub use orchestrator::{Orchestrator, RecordOptions, run_recorded};
pub use plan::{
    Arg, ArtifactRef, DeploymentPlan, PlanStep, StepAction, StepName,
    standard::{SuiteContract, standard_plan},
};
pub use record::{DeploymentFingerprint, DeploymentRecord, RECORD_FILENAME};
pub use registry::{CompletedCall, DeployedContract, DeployedContractSet, DeploymentReport};
pub use stress::{GasReport, GasStats, StakeCycleConfig, StakeOp, StakeOpKind, run_stake_cycles};
