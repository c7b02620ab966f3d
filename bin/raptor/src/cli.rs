use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::level_filters::LevelFilter;

/// The default configuration file.
const DEFAULT_CONFIG: &str = "raptor.toml";
/// The default network table of the configuration file.
const DEFAULT_NETWORK: &str = "goerli";

/// Output format of reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Parser)]
#[command(name = "raptor")]
#[command(
    author,
    version,
    about = "Deploy the Raptor contract suite and measure staking gas usage"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, global = true, env = "RAPTOR_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Deploy the contract suite.
    Deploy(DeployArgs),
    /// Print the execution order of a plan without sending anything.
    Plan(PlanArgs),
    /// Run the stake-cycle gas scenario against a staking contract.
    Stress(StressArgs),
}

/// Configuration file and network selection.
#[derive(Debug, Clone, Args)]
pub struct NetworkArgs {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "RAPTOR_CONFIG", default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// The network table to use from the configuration file.
    #[arg(short, long, env = "RAPTOR_NETWORK", default_value = DEFAULT_NETWORK)]
    pub network: String,

    /// Report output format.
    #[arg(long, env = "RAPTOR_FORMAT", default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Args)]
pub struct DeployArgs {
    #[command(flatten)]
    pub network: NetworkArgs,

    /// Deploy a custom plan (TOML) instead of the standard suite.
    #[arg(long, env = "RAPTOR_PLAN")]
    pub plan: Option<PathBuf>,

    /// Directory holding the deployment record.
    ///
    /// Defaults to ./deployments/<network>.
    #[arg(long, env = "RAPTOR_OUTDATA")]
    pub outdata: Option<PathBuf>,

    /// Resume from the deployment record instead of deploying every contract afresh.
    ///
    /// The record must have been produced with the same chain, signer and plan.
    #[arg(long, env = "RAPTOR_RESUME", default_value_t = false, conflicts_with = "dry_run")]
    pub resume: bool,

    /// Simulate the deployment: predict addresses from the signer nonce, send nothing.
    #[arg(long, env = "RAPTOR_DRY_RUN", default_value_t = false)]
    pub dry_run: bool,

    /// Signer nonce to start from in a dry run.
    #[arg(long, default_value_t = 0, requires = "dry_run")]
    pub nonce: u64,
}

impl DeployArgs {
    pub fn outdata(&self) -> PathBuf {
        self.outdata
            .clone()
            .unwrap_or_else(|| PathBuf::from("deployments").join(&self.network.network))
    }
}

#[derive(Debug, Clone, Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub network: NetworkArgs,

    /// Show the order of a custom plan (TOML) instead of the standard suite.
    #[arg(long, env = "RAPTOR_PLAN")]
    pub plan: Option<PathBuf>,

    /// Write the plan to a TOML file, to be edited and passed back with --plan.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct StressArgs {
    #[command(flatten)]
    pub network: NetworkArgs,

    /// Path to the stake-cycle scenario (TOML).
    #[arg(short, long, env = "RAPTOR_SCENARIO")]
    pub scenario: PathBuf,

    /// Override the number of rounds of the scenario.
    #[arg(long)]
    pub rounds: Option<u32>,

    /// Simulate the calls instead of sending them.
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Gas price in gwei used to report the cost of each kind of call.
    #[arg(long, env = "RAPTOR_GAS_PRICE")]
    pub gas_price: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deploy_defaults() {
        let cli = Cli::try_parse_from(["raptor", "deploy"]).unwrap();
        let Command::Deploy(args) = cli.command else {
            panic!("expected deploy");
        };

        assert_eq!(cli.verbosity, LevelFilter::INFO);
        assert_eq!(args.network.config, PathBuf::from("raptor.toml"));
        assert_eq!(args.network.network, "goerli");
        assert_eq!(args.outdata(), PathBuf::from("deployments/goerli"));
        assert!(!args.resume);
        assert!(!args.dry_run);
    }

    #[test]
    fn test_resume_conflicts_with_dry_run() {
        assert!(Cli::try_parse_from(["raptor", "deploy", "--resume", "--dry-run"]).is_err());
    }

    #[test]
    fn test_nonce_requires_dry_run() {
        assert!(Cli::try_parse_from(["raptor", "deploy", "--nonce", "3"]).is_err());
        assert!(Cli::try_parse_from(["raptor", "deploy", "--dry-run", "--nonce", "3"]).is_ok());
    }

    #[test]
    fn test_stress_args() {
        let cli = Cli::try_parse_from([
            "raptor",
            "-v",
            "debug",
            "stress",
            "--network",
            "sepolia",
            "--scenario",
            "stake.toml",
            "--rounds",
            "13",
            "--format",
            "json",
            "--gas-price",
            "31",
        ])
        .unwrap();
        let Command::Stress(args) = cli.command else {
            panic!("expected stress");
        };

        assert_eq!(cli.verbosity, LevelFilter::DEBUG);
        assert_eq!(args.network.network, "sepolia");
        assert_eq!(args.rounds, Some(13));
        assert_eq!(args.network.format, OutputFormat::Json);
        assert_eq!(args.gas_price, Some(31.0));
    }
}
