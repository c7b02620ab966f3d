//! Network configuration for a deployment run.
//!
//! Configuration files hold one table per network:
//!
//! ```toml
//! [goerli]
//! private_key = "0x..."
//! provider_url = "https://eth-goerli.g.alchemy.com/v2/<key>"
//! weth = "0xB4FBF271143F4FBf7B91A5ded31805e42b2208d6"
//! subscription_id = 4242
//! key_hash = "0x79d3d8832d904592c0bf9818b621522c988bb8b0c05cdc3b15aea1b6e8db0c15"
//! vrf_coordinator = "0x2Ca8E0C643bDe4C2E08ab1fA0da3401AdAD7734D"
//! usd_tokens = ["0x07865c6E87B9F70255377e024ace6630C1Eaa37F"]
//! signers = ["0x70997970C51812dc3A010C7d01b50e0d17dc79C8"]
//! payees = ["0x70997970C51812dc3A010C7d01b50e0d17dc79C8"]
//! shares = [100]
//! ```
//!
//! Environment variables prefixed with `RAPTOR_` override file values for the
//! selected network (e.g. `RAPTOR_PRIVATE_KEY`).

use std::{fmt, path::Path, path::PathBuf, str::FromStr};

use alloy_core::primitives::{Address, B256};
use alloy_signer_local::PrivateKeySigner;
use figment::{
    Figment, Profile,
    providers::{Env, Format, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DeployError, DeployResult};

/// Prefix of environment variables overriding configuration values.
pub const ENV_PREFIX: &str = "RAPTOR_";

/// Default location of Hardhat compilation output.
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// Hex-encoded private key of the signing identity.
///
/// Never printed: the `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrivateKey(String);

impl PrivateKey {
    /// Build a local signer from the key.
    pub fn signer(&self) -> DeployResult<PrivateKeySigner> {
        PrivateKeySigner::from_str(self.0.trim())
            .map_err(|e| DeployError::config(format!("invalid private_key: {e}")))
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// Constants passed to constructors of the suite contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeSchedule {
    /// Race distance of the game contract.
    pub game_distance: u32,
    /// Entry fee of the game contract.
    pub game_fee: u64,
    /// Breeding fee of the third minter (USD, 6 decimals).
    pub breeding_fee: u64,
    /// USD amount used by the LP depositor (6 decimals).
    pub lp_deposit_amount: u64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            game_distance: 10_000,
            game_fee: 1_000_000,
            breeding_fee: 25_000_000,
            lp_deposit_amount: 1_000_000_000,
        }
    }
}

/// Read-only configuration of a deployment run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// Key of the signing identity.
    pub private_key: PrivateKey,
    /// JSON-RPC endpoint (http or https).
    pub provider_url: String,
    /// Wrapped native token.
    pub weth: Address,
    /// VRF subscription used by the game and the main minter.
    pub subscription_id: u64,
    /// VRF gas lane key hash.
    pub key_hash: B256,
    /// VRF coordinator contract.
    pub vrf_coordinator: Address,
    /// Accepted stablecoins; the first one funds the LP depositor.
    pub usd_tokens: Vec<Address>,
    /// Multisig owners.
    pub signers: Vec<Address>,
    /// Payment splitter payees of the third minter.
    pub payees: Vec<Address>,
    /// Shares of each payee, same length as `payees`.
    pub shares: Vec<u16>,
    /// Hardhat artifacts directory.
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,
    #[serde(default)]
    pub fees: FeeSchedule,
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from(DEFAULT_ARTIFACTS_DIR)
}

impl DeploymentConfig {
    /// Load the configuration of `network` from a TOML file, with environment overrides.
    pub fn load(path: &Path, network: &str) -> DeployResult<Self> {
        if !path.exists() {
            return Err(DeployError::config(format!(
                "configuration file not found: {}",
                path.display()
            )));
        }

        let figment = Figment::new()
            .merge(Toml::file(path).nested())
            .merge(Env::prefixed(ENV_PREFIX).global());

        let config = Self::extract(figment, network)?;
        tracing::info!(path = %path.display(), network, "Configuration loaded");
        Ok(config)
    }

    /// Parse the configuration of `network` from a TOML string.
    pub fn from_toml_str(content: &str, network: &str) -> DeployResult<Self> {
        Self::extract(Figment::from(Toml::string(content).nested()), network)
    }

    fn extract(figment: Figment, network: &str) -> DeployResult<Self> {
        let profile = Profile::new(network);
        if !figment.profiles().any(|p| *p == profile) {
            return Err(DeployError::config(format!(
                "network {network} is not defined in the configuration"
            )));
        }

        let config: Self = figment.select(profile).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the standard plan relies on.
    pub fn validate(&self) -> DeployResult<()> {
        self.private_key.signer()?;
        self.provider_url()?;

        if self.usd_tokens.is_empty() {
            return Err(DeployError::config("usd_tokens must contain at least one token"));
        }
        if self.signers.is_empty() {
            return Err(DeployError::config("signers must contain at least one address"));
        }
        if self.payees.is_empty() {
            return Err(DeployError::config("payees must contain at least one address"));
        }
        if self.payees.len() != self.shares.len() {
            return Err(DeployError::config(format!(
                "payees and shares must have the same length ({} payees, {} shares)",
                self.payees.len(),
                self.shares.len()
            )));
        }
        if self.subscription_id == 0 {
            return Err(DeployError::config("subscription_id must be non-zero"));
        }

        Ok(())
    }

    /// Parsed RPC endpoint.
    pub fn provider_url(&self) -> DeployResult<Url> {
        let url = Url::parse(&self.provider_url)
            .map_err(|e| DeployError::config(format!("invalid provider_url: {e}")))?;
        match url.scheme() {
            "http" | "https" | "ws" | "wss" => Ok(url),
            scheme => Err(DeployError::config(format!(
                "unsupported provider_url scheme {scheme}, expected http, https, ws or wss"
            ))),
        }
    }

    /// Address of the signing identity.
    pub fn signer_address(&self) -> DeployResult<Address> {
        Ok(self.private_key.signer()?.address())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// First default Anvil account.
    pub(crate) const TEST_PRIVATE_KEY: &str =
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    pub(crate) fn sample_toml() -> String {
        format!(
            r#"
            [goerli]
            private_key = "{TEST_PRIVATE_KEY}"
            provider_url = "http://localhost:8545"
            weth = "0xB4FBF271143F4FBf7B91A5ded31805e42b2208d6"
            subscription_id = 4242
            key_hash = "0x79d3d8832d904592c0bf9818b621522c988bb8b0c05cdc3b15aea1b6e8db0c15"
            vrf_coordinator = "0x2Ca8E0C643bDe4C2E08ab1fA0da3401AdAD7734D"
            usd_tokens = ["0x07865c6E87B9F70255377e024ace6630C1Eaa37F"]
            signers = ["0x70997970C51812dc3A010C7d01b50e0d17dc79C8", "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC"]
            payees = ["0x70997970C51812dc3A010C7d01b50e0d17dc79C8", "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC"]
            shares = [60, 40]

            [goerli.fees]
            game_fee = 2000000
            "#
        )
    }

    pub(crate) fn sample_config() -> DeploymentConfig {
        DeploymentConfig::from_toml_str(&sample_toml(), "goerli").unwrap()
    }

    #[test]
    fn test_load_network_table() {
        let config = sample_config();

        assert_eq!(config.subscription_id, 4242);
        assert_eq!(config.signers.len(), 2);
        assert_eq!(config.shares, vec![60, 40]);
        assert_eq!(config.artifacts_dir, PathBuf::from(DEFAULT_ARTIFACTS_DIR));
        assert_eq!(config.fees.game_fee, 2_000_000);
        assert_eq!(config.fees.game_distance, 10_000);
        assert_eq!(
            config.signer_address().unwrap(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse::<Address>().unwrap()
        );
    }

    #[test]
    fn test_unknown_network() {
        let err = DeploymentConfig::from_toml_str(&sample_toml(), "mainnet").unwrap_err();
        assert!(matches!(err, DeployError::Config(_)));
        assert!(err.to_string().contains("mainnet"));
    }

    #[test]
    fn test_missing_field() {
        let toml = sample_toml().replace("subscription_id = 4242", "");
        let err = DeploymentConfig::from_toml_str(&toml, "goerli").unwrap_err();
        assert!(matches!(err, DeployError::Config(_)));
        assert!(err.to_string().contains("subscription_id"), "{err}");
    }

    #[test]
    fn test_payees_shares_mismatch() {
        let toml = sample_toml().replace("shares = [60, 40]", "shares = [100]");
        let err = DeploymentConfig::from_toml_str(&toml, "goerli").unwrap_err();
        assert!(err.to_string().contains("same length"), "{err}");
    }

    #[test]
    fn test_invalid_private_key() {
        let toml = sample_toml().replace(TEST_PRIVATE_KEY, "0x1234");
        let err = DeploymentConfig::from_toml_str(&toml, "goerli").unwrap_err();
        assert!(err.to_string().contains("private_key"), "{err}");
    }

    #[test]
    fn test_websocket_url_is_accepted() {
        let toml = sample_toml().replace(
            "http://localhost:8545",
            "wss://eth-goerli.g.alchemy.com/v2/key",
        );
        let config = DeploymentConfig::from_toml_str(&toml, "goerli").unwrap();
        assert_eq!(config.provider_url().unwrap().scheme(), "wss");
    }

    #[test]
    fn test_unsupported_url_scheme_is_rejected() {
        let toml = sample_toml().replace("http://localhost:8545", "ftp://localhost:8545");
        let err = DeploymentConfig::from_toml_str(&toml, "goerli").unwrap_err();
        assert!(err.to_string().contains("scheme"), "{err}");
    }

    #[test]
    fn test_private_key_is_redacted() {
        let config = sample_config();
        let debug = format!("{config:?}");
        assert!(!debug.contains(&TEST_PRIVATE_KEY[2..]));
    }
}
