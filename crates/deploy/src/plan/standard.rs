//! The standard suite deployment plan.
//!
//! Order of the wired testnet deployment:
//! 1. AMM factory and router
//! 2. Bud minter and stats
//! 3. RaptorCoin, multisig, signature verifier and game
//! 4. The three minters, registered on the stats contract
//! 5. Claws and the LP depositor

use alloy_core::primitives::U256;
use strum::{Display, EnumIter, IntoEnumIterator};

use super::{Arg, ArtifactRef, DeploymentPlan, StepName};
use crate::{
    config::DeploymentConfig,
    error::{DeployError, DeployResult},
};

/// Contracts deployed by the standard plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum SuiteContract {
    UniswapFactory,
    UniswapRouter,
    BudMinter,
    Stats,
    RaptorCoin,
    Multisig,
    SignatureVerifier,
    Game,
    MainMinter,
    SecondaryMinter,
    ThirdMinter,
    Claws,
    LpDepositor,
}

impl SuiteContract {
    /// Hardhat artifact compiled for this contract.
    pub fn artifact(&self) -> ArtifactRef {
        let (source, contract) = match self {
            Self::UniswapFactory => ("FlatFactory.sol", "UniswapV2Factory"),
            Self::UniswapRouter => ("FlatRouter.sol", "UniswapV2Router02"),
            Self::BudMinter => ("budMinter.sol", "BudMinter"),
            Self::Stats => ("stats.sol", "Stats"),
            Self::RaptorCoin => ("raptorCoin.sol", "RaptorCoin"),
            Self::Multisig => ("multiSigNFTWallet.sol", "Multisig"),
            Self::SignatureVerifier => ("SignatureVerifier.sol", "SignatureVerifier"),
            Self::Game => ("game.sol", "GameV3"),
            Self::MainMinter => ("mainMinter.sol", "MainMinter"),
            Self::SecondaryMinter => ("secondaryMinter.sol", "SecondaryMinter"),
            Self::ThirdMinter => ("thirdMinter.sol", "ThirdMinter"),
            Self::Claws => ("ClawsToken.sol", "Claws"),
            Self::LpDepositor => ("LpDepositor.sol", "LpDepositor"),
        };
        ArtifactRef::new(source, contract)
    }

    pub fn step_name(&self) -> StepName {
        StepName::from(self.to_string())
    }

    /// All suite contracts in deployment order.
    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }
}

fn contract(c: SuiteContract) -> Arg {
    Arg::Contract(c.step_name())
}

fn deploy(plan: DeploymentPlan, c: SuiteContract, args: Vec<Arg>) -> DeploymentPlan {
    plan.deploy(c.step_name(), c.artifact(), args)
}

/// Build the standard plan for a network configuration.
///
/// The LP depositor is funded in the first USD token, so `usd_tokens` must not
/// be empty.
pub fn standard_plan(config: &DeploymentConfig) -> DeployResult<DeploymentPlan> {
    use SuiteContract::*;

    let lp_token = config
        .usd_tokens
        .first()
        .copied()
        .ok_or_else(|| DeployError::config("usd_tokens must not be empty"))?;

    let usd_tokens = Arg::AddressList(config.usd_tokens.clone());
    let subscription_id = Arg::uint(config.subscription_id);
    let key_hash = Arg::Bytes32(config.key_hash);
    let vrf_coordinator = Arg::Address(config.vrf_coordinator);

    let plan = DeploymentPlan::new();
    let plan = deploy(plan, UniswapFactory, vec![Arg::Signer]);
    let plan = deploy(plan, UniswapRouter, vec![
        contract(UniswapFactory),
        Arg::Address(config.weth),
    ]);
    let plan = deploy(plan, BudMinter, vec![]);
    let plan = deploy(plan, Stats, vec![contract(BudMinter)]);
    let plan = deploy(plan, RaptorCoin, vec![
        Arg::Address(config.weth),
        contract(UniswapRouter),
    ]);
    let plan = deploy(plan, Multisig, vec![
        Arg::AddressList(config.signers.clone()),
        contract(RaptorCoin),
    ]);
    let plan = deploy(plan, SignatureVerifier, vec![Arg::Signer]);
    let plan = deploy(plan, Game, vec![
        contract(Stats),
        contract(RaptorCoin),
        contract(Multisig),
        vrf_coordinator.clone(),
        contract(SignatureVerifier),
        subscription_id.clone(),
        key_hash.clone(),
        Arg::uint(config.fees.game_distance.into()),
        Arg::uint(config.fees.game_fee),
    ]);
    let plan = deploy(plan, MainMinter, vec![
        subscription_id,
        vrf_coordinator,
        key_hash,
        Arg::string("Main Minter"),
        Arg::string("MM"),
        contract(Stats),
        usd_tokens.clone(),
    ]);
    let plan = deploy(plan, SecondaryMinter, vec![contract(Stats)]);
    let plan = deploy(plan, ThirdMinter, vec![
        Arg::string("Minter 3"),
        Arg::string("M3"),
        contract(MainMinter),
        contract(Stats),
        usd_tokens,
        Arg::uint(config.fees.breeding_fee),
        Arg::AddressList(config.payees.clone()),
        Arg::UintList(config.shares.iter().map(|s| U256::from(*s)).collect()),
    ]);

    let mut plan = plan;
    for minter in [MainMinter, SecondaryMinter, ThirdMinter] {
        plan = plan.invoke(
            format!("stats_add_{minter}"),
            Stats.step_name(),
            "addMinter(address)",
            vec![contract(minter)],
        );
    }

    let plan = deploy(plan, Claws, vec![contract(RaptorCoin)]);
    Ok(deploy(plan, LpDepositor, vec![
        contract(UniswapRouter),
        Arg::Address(lp_token),
        contract(RaptorCoin),
        Arg::uint(config.fees.lp_deposit_amount),
    ]))
}
