//! Runs a deployment plan step by step.

use std::path::PathBuf;

use crate::{
    artifacts::ArtifactStore,
    context::DeployContext,
    error::{DeployError, DeployResult},
    executor::TxExecutor,
    plan::DeploymentPlan,
    record::{DeploymentFingerprint, DeploymentRecord, RECORD_FILENAME},
    registry::DeploymentReport,
};

struct Checkpoint {
    path: PathBuf,
    config_hash: String,
}

/// Executes the steps of a plan in dependency order.
///
/// Steps run strictly one after another; each waits for its transaction to be
/// included before the next starts. The first failure stops the run and no
/// later step is attempted.
pub struct Orchestrator<'a, E> {
    executor: &'a E,
    artifacts: &'a ArtifactStore,
    checkpoint: Option<Checkpoint>,
    resume: Option<DeploymentReport>,
}

impl<'a, E: TxExecutor> Orchestrator<'a, E> {
    pub fn new(executor: &'a E, artifacts: &'a ArtifactStore) -> Self {
        Self {
            executor,
            artifacts,
            checkpoint: None,
            resume: None,
        }
    }

    /// Write a [`DeploymentRecord`] to `path` after every completed step.
    pub fn checkpoint_to(mut self, path: impl Into<PathBuf>, config_hash: impl Into<String>) -> Self {
        self.checkpoint = Some(Checkpoint {
            path: path.into(),
            config_hash: config_hash.into(),
        });
        self
    }

    /// Continue a previous run: steps present in `record` are skipped and
    /// their addresses reused.
    ///
    /// The caller is responsible for checking the record hash first.
    pub fn resume_from(mut self, record: DeploymentRecord) -> Self {
        self.resume = Some(record.report);
        self
    }

    /// Execute the plan and return everything it deployed.
    pub async fn run(self, plan: &DeploymentPlan) -> DeployResult<DeploymentReport> {
        let order = plan.execution_order()?;
        let mut ctx = DeployContext::new(
            self.executor,
            self.artifacts,
            self.resume.unwrap_or_default(),
        );

        tracing::info!(
            steps = order.len(),
            signer = %ctx.signer,
            chain_id = self.executor.chain_id(),
            "Starting deployment"
        );

        for step in order {
            if ctx.report.is_complete(&step.name) {
                tracing::info!(step = %step.name, "Already completed, skipping");
                continue;
            }

            step.execute(&mut ctx).await?;

            if let Some(checkpoint) = &self.checkpoint {
                DeploymentRecord::new(
                    checkpoint.config_hash.clone(),
                    self.executor.chain_id(),
                    ctx.report.clone(),
                )
                .save_to_file(&checkpoint.path)?;
            }
        }

        tracing::info!(
            contracts = ctx.report.contracts.len(),
            calls = ctx.report.calls.len(),
            gas_used = ctx.report.total_gas(),
            "Deployment complete"
        );

        Ok(ctx.report)
    }
}

/// Where and how a recorded run keeps its checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOptions {
    /// Directory holding the deployment record.
    pub outdata: PathBuf,
    /// Skip the steps of a matching existing record instead of deploying afresh.
    pub resume: bool,
}

impl RecordOptions {
    pub fn record_path(&self) -> PathBuf {
        self.outdata.join(RECORD_FILENAME)
    }
}

/// Run a plan with a deployment record checkpointed after every step.
///
/// Without `resume`, an existing record is archived and every contract is
/// deployed afresh. With `resume`, the existing record must have been produced
/// by the same chain, signer and plan.
pub async fn run_recorded<E: TxExecutor>(
    executor: &E,
    artifacts: &ArtifactStore,
    plan: &DeploymentPlan,
    options: &RecordOptions,
) -> DeployResult<DeploymentReport> {
    let config_hash = DeploymentFingerprint {
        chain_id: executor.chain_id(),
        signer: executor.signer(),
        plan,
    }
    .compute_hash()?;

    std::fs::create_dir_all(&options.outdata).map_err(|e| {
        DeployError::record(format!("cannot create {}: {e}", options.outdata.display()))
    })?;
    let record_path = options.record_path();

    let mut orchestrator =
        Orchestrator::new(executor, artifacts).checkpoint_to(&record_path, config_hash.clone());

    if options.resume {
        let record = DeploymentRecord::load_from_file(&record_path)?;
        record.ensure_matches(&config_hash)?;
        tracing::info!(
            record = %record_path.display(),
            contracts = record.report.contracts.len(),
            calls = record.report.calls.len(),
            "Resuming deployment"
        );
        orchestrator = orchestrator.resume_from(record);
    } else {
        DeploymentRecord::archive_existing(&record_path)?;
    }

    orchestrator.run(plan).await
}
