//! Transaction execution.
//!
//! The orchestrator never talks to the network directly. It goes through a
//! [`TxExecutor`], which is either a live JSON-RPC connection ([`RpcExecutor`])
//! or a simulation predicting CREATE addresses from the signer nonce
//! ([`SimulatedExecutor`]).

mod rpc;
mod simulated;

use std::future::Future;

use alloy_core::primitives::{Address, B256, Bytes};

pub use rpc::RpcExecutor;
pub use simulated::{SimulatedExecutor, SimulatedTx};

use crate::{error::DeployResult, plan::StepName};

/// Result of a transaction included in a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxOutcome {
    pub tx_hash: B256,
    /// Address of the created contract, for creation transactions.
    pub contract_address: Option<Address>,
    pub gas_used: u64,
    pub block_number: Option<u64>,
}

/// Submits transactions on behalf of a single signing identity.
///
/// Each method resolves once the transaction is included. A transaction
/// included with a failed status is reported as [`DeployError::Reverted`].
///
/// [`DeployError::Reverted`]: crate::DeployError::Reverted
pub trait TxExecutor: Send + Sync {
    /// Address of the signing identity.
    fn signer(&self) -> Address;

    fn chain_id(&self) -> u64;

    /// Send a contract-creation transaction with the given init code.
    fn create(
        &self,
        step: &StepName,
        code: Bytes,
    ) -> impl Future<Output = DeployResult<TxOutcome>> + Send;

    /// Send a call to `to` with the given calldata.
    fn call(
        &self,
        step: &StepName,
        to: Address,
        calldata: Bytes,
    ) -> impl Future<Output = DeployResult<TxOutcome>> + Send;
}
