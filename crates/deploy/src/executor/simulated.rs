//! In-memory executor used for dry runs and tests.

use std::sync::{Mutex, MutexGuard, PoisonError};

use alloy_core::primitives::{Address, Bytes, keccak256};

use super::{TxExecutor, TxOutcome};
use crate::{
    error::{DeployError, DeployResult},
    plan::StepName,
};

/// Chain id reported by a simulation (Anvil's default).
pub const SIMULATED_CHAIN_ID: u64 = 31337;

const TX_BASE_GAS: u64 = 21_000;
const CREATE_GAS: u64 = 32_000;

/// A transaction recorded by the simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedTx {
    pub step: StepName,
    pub nonce: u64,
    /// `None` for contract creations.
    pub to: Option<Address>,
    pub input: Bytes,
    pub reverted: bool,
}

#[derive(Debug, Default)]
struct State {
    nonce: u64,
    block: u64,
    sent: Vec<SimulatedTx>,
}

/// Executor predicting the outcome of transactions without sending them.
///
/// Contract addresses are derived from the signer address and its nonce,
/// exactly as the network would for CREATE. Every transaction, including a
/// reverted one, consumes a nonce.
#[derive(Debug)]
pub struct SimulatedExecutor {
    signer: Address,
    chain_id: u64,
    fail_at: Option<StepName>,
    state: Mutex<State>,
}

impl SimulatedExecutor {
    pub fn new(signer: Address) -> Self {
        Self {
            signer,
            chain_id: SIMULATED_CHAIN_ID,
            fail_at: None,
            state: Mutex::new(State::default()),
        }
    }

    /// Start from the given signer nonce instead of zero.
    pub fn with_nonce(self, nonce: u64) -> Self {
        self.lock().nonce = nonce;
        self
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// Make the transaction of `step` revert.
    pub fn with_failure(mut self, step: impl Into<StepName>) -> Self {
        self.fail_at = Some(step.into());
        self
    }

    /// Next nonce of the signer.
    pub fn nonce(&self) -> u64 {
        self.lock().nonce
    }

    /// Transactions recorded so far, in submission order.
    pub fn sent(&self) -> Vec<SimulatedTx> {
        self.lock().sent.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn submit(&self, step: &StepName, to: Option<Address>, input: Bytes) -> DeployResult<TxOutcome> {
        let mut state = self.lock();
        let nonce = state.nonce;
        state.nonce += 1;
        state.block += 1;

        let reverted = self.fail_at.as_ref() == Some(step);
        let gas_used = intrinsic_gas(&input, to.is_none());
        let tx_hash = keccak256([self.signer.as_slice(), &nonce.to_be_bytes()].concat());

        tracing::debug!(%step, nonce, gas_used, reverted, "Simulated transaction");
        state.sent.push(SimulatedTx {
            step: step.clone(),
            nonce,
            to,
            input,
            reverted,
        });

        if reverted {
            return Err(DeployError::reverted(
                step,
                format!("simulated revert of transaction {tx_hash}"),
            ));
        }

        Ok(TxOutcome {
            tx_hash,
            contract_address: to.is_none().then(|| self.signer.create(nonce)),
            gas_used,
            block_number: Some(state.block),
        })
    }
}

/// Intrinsic gas of a transaction: the cost charged before any execution.
fn intrinsic_gas(input: &[u8], is_create: bool) -> u64 {
    let data_gas: u64 = input.iter().map(|b| if *b == 0 { 4 } else { 16 }).sum();
    let create_gas = if is_create { CREATE_GAS } else { 0 };
    TX_BASE_GAS + create_gas + data_gas
}

impl TxExecutor for SimulatedExecutor {
    fn signer(&self) -> Address {
        self.signer
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn create(&self, step: &StepName, code: Bytes) -> DeployResult<TxOutcome> {
        self.submit(step, None, code)
    }

    async fn call(&self, step: &StepName, to: Address, calldata: Bytes) -> DeployResult<TxOutcome> {
        self.submit(step, Some(to), calldata)
    }
}

#[cfg(test)]
mod tests {
    use alloy_core::primitives::address;

    use super::*;

    const SIGNER: Address = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

    #[tokio::test]
    async fn test_create_addresses_follow_nonce() {
        let executor = SimulatedExecutor::new(SIGNER);

        let first = executor
            .create(&"factory".into(), Bytes::from_static(&[0x60, 0x00]))
            .await
            .unwrap();
        let second = executor
            .create(&"router".into(), Bytes::from_static(&[0x60, 0x00]))
            .await
            .unwrap();

        // First contract deployed by Anvil's default account.
        assert_eq!(
            first.contract_address,
            Some(address!("0x5FbDB2315678afecb367f032d93F642f64180aa3"))
        );
        assert_eq!(second.contract_address, Some(SIGNER.create(1)));
        assert_ne!(first.tx_hash, second.tx_hash);
        assert_eq!(executor.nonce(), 2);
    }

    #[tokio::test]
    async fn test_call_has_no_contract_address() {
        let executor = SimulatedExecutor::new(SIGNER).with_nonce(7);
        let outcome = executor
            .call(&"wire".into(), Address::repeat_byte(1), Bytes::from_static(&[1, 0, 0, 0]))
            .await
            .unwrap();

        assert_eq!(outcome.contract_address, None);
        assert_eq!(outcome.gas_used, 21_000 + 16 + 3 * 4);
        assert_eq!(executor.sent()[0].nonce, 7);
    }

    #[tokio::test]
    async fn test_injected_failure_consumes_nonce() {
        let executor = SimulatedExecutor::new(SIGNER).with_failure("game");

        let err = executor.create(&"game".into(), Bytes::new()).await.unwrap_err();
        assert!(matches!(err, DeployError::Reverted { .. }));
        assert_eq!(executor.nonce(), 1);
        assert!(executor.sent()[0].reverted);
    }
}
