//! Contracts deployed during a run.

use alloy_core::primitives::{Address, B256};
use derive_more::Deref;
use serde::{Deserialize, Serialize};

use crate::{
    error::{DeployError, DeployResult},
    plan::StepName,
};

/// A contract deployed by a plan step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedContract {
    pub name: StepName,
    pub address: Address,
    /// Hash of the creation transaction.
    pub tx_hash: B256,
    pub gas_used: u64,
    pub block_number: Option<u64>,
}

/// Append-only set of deployed contracts, in deployment order.
///
/// Names are unique: a step name is bound to exactly one address for the
/// lifetime of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Deref)]
#[serde(transparent)]
pub struct DeployedContractSet(Vec<DeployedContract>);

impl DeployedContractSet {
    /// Record a deployed contract. Fails if the name is already bound.
    pub fn insert(&mut self, contract: DeployedContract) -> DeployResult<()> {
        if let Some(existing) = self.get(&contract.name) {
            return Err(DeployError::plan(format!(
                "contract {} already deployed at {}",
                contract.name, existing.address
            )));
        }
        self.0.push(contract);
        Ok(())
    }

    pub fn get(&self, name: &StepName) -> Option<&DeployedContract> {
        self.0.iter().find(|c| &c.name == name)
    }

    pub fn address_of(&self, name: &StepName) -> Option<Address> {
        self.get(name).map(|c| c.address)
    }
}

/// A confirmed call made by an invoke step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedCall {
    pub name: StepName,
    pub target: Address,
    pub function: String,
    pub tx_hash: B256,
    pub gas_used: u64,
    pub block_number: Option<u64>,
}

/// Everything a run has done so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentReport {
    pub contracts: DeployedContractSet,
    #[serde(default)]
    pub calls: Vec<CompletedCall>,
}

impl DeploymentReport {
    /// Whether the step has already completed in this run.
    pub fn is_complete(&self, name: &StepName) -> bool {
        self.contracts.get(name).is_some() || self.calls.iter().any(|c| &c.name == name)
    }

    /// Total gas used by every transaction of the run.
    pub fn total_gas(&self) -> u64 {
        self.contracts.iter().map(|c| c.gas_used).sum::<u64>()
            + self.calls.iter().map(|c| c.gas_used).sum::<u64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contract(name: &str, byte: u8) -> DeployedContract {
        DeployedContract {
            name: name.into(),
            address: Address::repeat_byte(byte),
            tx_hash: B256::repeat_byte(byte),
            gas_used: 21_000,
            block_number: Some(1),
        }
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut set = DeployedContractSet::default();
        set.insert(contract("factory", 1)).unwrap();
        set.insert(contract("router", 2)).unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.address_of(&"router".into()), Some(Address::repeat_byte(2)));
        assert_eq!(set.address_of(&"stats".into()), None);
        assert_eq!(set[0].name.as_str(), "factory");
    }

    #[test]
    fn test_name_is_bound_once() {
        let mut set = DeployedContractSet::default();
        set.insert(contract("factory", 1)).unwrap();

        let err = set.insert(contract("factory", 2)).unwrap_err();
        assert!(err.to_string().contains("already deployed"), "{err}");
        assert_eq!(set.address_of(&"factory".into()), Some(Address::repeat_byte(1)));
    }

    #[test]
    fn test_report_completion_and_gas() {
        let mut report = DeploymentReport::default();
        report.contracts.insert(contract("stats", 1)).unwrap();
        report.calls.push(CompletedCall {
            name: "stats_add_main_minter".into(),
            target: Address::repeat_byte(1),
            function: "addMinter(address)".to_string(),
            tx_hash: B256::ZERO,
            gas_used: 50_000,
            block_number: None,
        });

        assert!(report.is_complete(&"stats".into()));
        assert!(report.is_complete(&"stats_add_main_minter".into()));
        assert!(!report.is_complete(&"game".into()));
        assert_eq!(report.total_gas(), 71_000);
    }
}
