//! raptor deploys the Raptor contract suite in dependency order and measures
//! staking gas usage.

mod cli;
mod report;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Command, DeployArgs, NetworkArgs, OutputFormat, PlanArgs, StressArgs};
use raptor_deploy::{
    ArtifactStore, DeploymentConfig, DeploymentPlan, Orchestrator, RecordOptions, RpcExecutor,
    SimulatedExecutor, StakeCycleConfig, run_recorded, run_stake_cycles, standard_plan,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    match cli.command {
        Command::Deploy(args) => deploy(args).await,
        Command::Plan(args) => plan(args),
        Command::Stress(args) => stress(args).await,
    }
}

fn load_config(args: &NetworkArgs) -> Result<DeploymentConfig> {
    DeploymentConfig::load(&args.config, &args.network).context(format!(
        "Failed to load network {} from {}",
        args.network,
        args.config.display()
    ))
}

fn load_plan(path: Option<&Path>, config: &DeploymentConfig) -> Result<DeploymentPlan> {
    match path {
        Some(path) => DeploymentPlan::load_from_file(path),
        None => Ok(standard_plan(config)?),
    }
}

async fn connect(config: &DeploymentConfig) -> Result<RpcExecutor> {
    let executor = RpcExecutor::connect(config.provider_url()?, config.private_key.signer()?)
        .await
        .context("Failed to connect to the RPC endpoint")?;
    Ok(executor)
}

async fn deploy(args: DeployArgs) -> Result<()> {
    let config = load_config(&args.network)?;
    let plan = load_plan(args.plan.as_deref(), &config)?;
    let artifacts = ArtifactStore::load_for_plan(&config.artifacts_dir, &plan)
        .context("Failed to load contract artifacts")?;

    let report = if args.dry_run {
        tracing::info!(nonce = args.nonce, "Dry run: nothing will be sent");
        let executor = SimulatedExecutor::new(config.signer_address()?).with_nonce(args.nonce);
        Orchestrator::new(&executor, &artifacts).run(&plan).await?
    } else {
        let executor = connect(&config).await?;
        let options = RecordOptions {
            outdata: args.outdata(),
            resume: args.resume,
        };
        let report = run_recorded(&executor, &artifacts, &plan, &options)
            .await
            .context(format!(
                "Deployment failed, completed steps are recorded in {}",
                options.record_path().display()
            ))?;
        tracing::info!(record = %options.record_path().display(), "Deployment recorded");
        report
    };

    match args.network.format {
        OutputFormat::Table => println!("{}", report::deployment_table(&report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

fn plan(args: PlanArgs) -> Result<()> {
    let config = load_config(&args.network)?;
    let plan = load_plan(args.plan.as_deref(), &config)?;
    let order = plan.execution_order()?;

    match args.network.format {
        OutputFormat::Table => println!("{}", report::plan_table(&order)),
        OutputFormat::Json => {
            let steps: Vec<_> = order.iter().map(|step| step.name.as_str()).collect();
            println!("{}", serde_json::to_string_pretty(&steps)?);
        }
    }

    if let Some(path) = &args.export {
        plan.save_to_file(path)?;
        tracing::info!(path = %path.display(), "Plan exported");
    }
    Ok(())
}

async fn stress(args: StressArgs) -> Result<()> {
    let mut scenario = StakeCycleConfig::load_from_file(&args.scenario)?;
    if let Some(rounds) = args.rounds {
        scenario.rounds = rounds;
    }

    let config = load_config(&args.network)?;
    let report = if args.dry_run {
        let executor = SimulatedExecutor::new(config.signer_address()?);
        run_stake_cycles(&executor, &scenario).await?
    } else {
        let executor = connect(&config).await?;
        run_stake_cycles(&executor, &scenario)
            .await
            .context("Stake cycles failed")?
    };

    match args.network.format {
        OutputFormat::Table => println!("{}", report::gas_table(&report, args.gas_price)),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&report::gas_json(&report, args.gas_price)?)?
        ),
    }
    Ok(())
}
