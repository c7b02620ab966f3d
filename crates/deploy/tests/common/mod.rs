//! Shared fixtures: a configuration and Hardhat artifacts for the whole suite.

use std::path::Path;

use raptor_deploy::{DeploymentConfig, SuiteContract, artifacts::artifact_path};
use serde_json::{Value, json};

/// First default Anvil account.
pub const TEST_PRIVATE_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Init code returning a one-byte runtime (`STOP`), constructor arguments ignored.
pub const STOP_INIT_CODE: &str = "0x6001600c60003960016000f300";

/// Init code that always reverts.
pub const REVERT_INIT_CODE: &str = "0x60006000fd";

pub fn config_toml(provider_url: &str, artifacts_dir: &Path) -> String {
    format!(
        r#"
        [testnet]
        private_key = "{TEST_PRIVATE_KEY}"
        provider_url = "{provider_url}"
        weth = "0xB4FBF271143F4FBf7B91A5ded31805e42b2208d6"
        subscription_id = 4242
        key_hash = "0x79d3d8832d904592c0bf9818b621522c988bb8b0c05cdc3b15aea1b6e8db0c15"
        vrf_coordinator = "0x2Ca8E0C643bDe4C2E08ab1fA0da3401AdAD7734D"
        usd_tokens = ["0x07865c6E87B9F70255377e024ace6630C1Eaa37F"]
        signers = ["0x70997970C51812dc3A010C7d01b50e0d17dc79C8", "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC"]
        payees = ["0x70997970C51812dc3A010C7d01b50e0d17dc79C8"]
        shares = [100]
        artifacts_dir = "{}"
        "#,
        artifacts_dir.display()
    )
}

pub fn config(artifacts_dir: &Path) -> DeploymentConfig {
    DeploymentConfig::from_toml_str(&config_toml("http://localhost:8545", artifacts_dir), "testnet")
        .unwrap()
}

fn input(name: &str, ty: &str) -> Value {
    json!({"name": name, "type": ty, "internalType": ty})
}

/// Constructor inputs of each suite contract.
fn constructor_inputs(contract: SuiteContract) -> Option<Vec<Value>> {
    use SuiteContract::*;

    let inputs = match contract {
        UniswapFactory => vec![input("_feeToSetter", "address")],
        UniswapRouter => vec![input("_factory", "address"), input("_WETH", "address")],
        BudMinter => return None,
        Stats => vec![input("_budMinter", "address")],
        RaptorCoin => vec![input("_weth", "address"), input("_router", "address")],
        Multisig => vec![input("_signers", "address[]"), input("_raptorCoin", "address")],
        SignatureVerifier => vec![input("_signer", "address")],
        Game => vec![
            input("_stats", "address"),
            input("_raptorCoin", "address"),
            input("_multisig", "address"),
            input("_vrfCoordinator", "address"),
            input("_signatureVerifier", "address"),
            input("_subscriptionId", "uint64"),
            input("_keyHash", "bytes32"),
            input("_distance", "uint256"),
            input("_fee", "uint256"),
        ],
        MainMinter => vec![
            input("_subscriptionId", "uint64"),
            input("_vrfCoordinator", "address"),
            input("_keyHash", "bytes32"),
            input("_name", "string"),
            input("_symbol", "string"),
            input("_stats", "address"),
            input("_usdTokens", "address[]"),
        ],
        SecondaryMinter => vec![input("_stats", "address")],
        ThirdMinter => vec![
            input("_name", "string"),
            input("_symbol", "string"),
            input("_mainMinter", "address"),
            input("_stats", "address"),
            input("_usdTokens", "address[]"),
            input("_breedingFee", "uint256"),
            input("_payees", "address[]"),
            input("_shares", "uint256[]"),
        ],
        Claws => vec![input("_raptorCoin", "address")],
        LpDepositor => vec![
            input("_router", "address"),
            input("_usd", "address"),
            input("_raptorCoin", "address"),
            input("_amount", "uint256"),
        ],
    };
    Some(inputs)
}

/// Write a Hardhat artifact for every suite contract under `dir`.
pub fn write_suite_artifacts(dir: &Path, bytecode: &str) {
    for contract in SuiteContract::all() {
        let reference = contract.artifact();
        let abi = match constructor_inputs(contract) {
            Some(inputs) => json!([{
                "type": "constructor",
                "inputs": inputs,
                "stateMutability": "nonpayable"
            }]),
            None => json!([]),
        };
        let artifact = json!({
            "_format": "hh-sol-artifact-1",
            "contractName": reference.contract,
            "sourceName": format!("contracts/{}", reference.source),
            "abi": abi,
            "bytecode": bytecode,
            "deployedBytecode": "0x00",
            "linkReferences": {},
            "deployedLinkReferences": {}
        });

        let path = artifact_path(dir, &reference);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, serde_json::to_string_pretty(&artifact).unwrap()).unwrap();
    }
}
