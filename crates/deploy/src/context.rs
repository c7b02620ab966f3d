//! Execution context of a deployment run and per-step execution.

use alloy_core::primitives::Address;

use crate::{
    abi::{self, ArgValue},
    artifacts::ArtifactStore,
    error::{DeployError, DeployResult},
    executor::TxExecutor,
    plan::{Arg, PlanStep, StepAction},
    registry::{CompletedCall, DeployedContract, DeploymentReport},
};

/// State carried from one step to the next.
pub struct DeployContext<'a, E> {
    pub executor: &'a E,
    pub artifacts: &'a ArtifactStore,
    pub signer: Address,
    pub report: DeploymentReport,
}

impl<'a, E: TxExecutor> DeployContext<'a, E> {
    pub fn new(executor: &'a E, artifacts: &'a ArtifactStore, report: DeploymentReport) -> Self {
        Self {
            executor,
            artifacts,
            signer: executor.signer(),
            report,
        }
    }

    fn resolve(&self, args: &[Arg]) -> DeployResult<Vec<ArgValue>> {
        args.iter()
            .map(|arg| arg.resolve(&self.report.contracts, self.signer))
            .collect()
    }
}

/// Function name of a Solidity signature: `addMinter(address)` -> `addMinter`.
fn function_name(signature: &str) -> &str {
    signature.split('(').next().unwrap_or(signature).trim()
}

impl PlanStep {
    /// Execute this step, recording its result in the context.
    ///
    /// Arguments are resolved and encoded before anything is sent, so an
    /// encoding error never produces a transaction.
    pub async fn execute<E: TxExecutor>(&self, ctx: &mut DeployContext<'_, E>) -> DeployResult<()> {
        match &self.action {
            StepAction::Deploy { artifact, args } => {
                tracing::info!("Starting to deploy {}", self.name);

                let artifact = ctx.artifacts.get(artifact)?;
                let values = ctx.resolve(args)?;
                let code = artifact
                    .deploy_code(&values)
                    .map_err(|e| DeployError::encoding(&self.name, e))?;

                let outcome = ctx.executor.create(&self.name, code).await?;
                let address = outcome.contract_address.ok_or_else(|| {
                    DeployError::reverted(&self.name, "receipt carries no contract address")
                })?;

                ctx.report.contracts.insert(DeployedContract {
                    name: self.name.clone(),
                    address,
                    tx_hash: outcome.tx_hash,
                    gas_used: outcome.gas_used,
                    block_number: outcome.block_number,
                })?;

                tracing::info!(
                    tx_hash = %outcome.tx_hash,
                    gas_used = outcome.gas_used,
                    "{} deployed: {address}",
                    self.name
                );
            }
            StepAction::Invoke {
                target,
                function,
                args,
            } => {
                let label = format!("{target}.{}", function_name(function));
                tracing::info!("Calling {label}");

                let to = ctx.report.contracts.address_of(target).ok_or_else(|| {
                    DeployError::plan(format!("contract {target} has not been deployed yet"))
                })?;
                let values = ctx.resolve(args)?;
                let calldata = abi::encode_call(function, &values)
                    .map_err(|e| DeployError::encoding(&self.name, e))?;

                let outcome = ctx.executor.call(&self.name, to, calldata).await?;
                ctx.report.calls.push(CompletedCall {
                    name: self.name.clone(),
                    target: to,
                    function: function.clone(),
                    tx_hash: outcome.tx_hash,
                    gas_used: outcome.gas_used,
                    block_number: outcome.block_number,
                });

                tracing::info!(
                    tx_hash = %outcome.tx_hash,
                    gas_used = outcome.gas_used,
                    "{label} confirmed"
                );
            }
        }
        Ok(())
    }

    pub fn describe(&self) -> String {
        match &self.action {
            StepAction::Deploy { artifact, .. } => format!("deploy {artifact}"),
            StepAction::Invoke {
                target, function, ..
            } => format!("call {target}.{function}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_name() {
        assert_eq!(function_name("addMinter(address)"), "addMinter");
        assert_eq!(function_name("claim"), "claim");
    }
}
