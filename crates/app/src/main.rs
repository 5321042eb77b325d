//! Harvest Application CLI

use std::process;

use clap::{Args, Parser, Subcommand};
use jiff::civil::Date;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use harvest::commission::Rate;
use harvest_app::{
    config::AppConfig,
    context::AppContext,
    domain::settlements::models::{SettlementPeriod, SettlementUuid},
};

#[derive(Debug, Parser)]
#[command(name = "harvest-app", about = "Harvest marketplace CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Policy(PolicyCommand),
    Settlement(SettlementCommand),
}

#[derive(Debug, Args)]
struct PolicyCommand {
    #[command(subcommand)]
    command: PolicySubcommand,
}

#[derive(Debug, Subcommand)]
enum PolicySubcommand {
    Set(SetPolicyArgs),
    List(ListPoliciesArgs),
}

#[derive(Debug, Args)]
struct SetPolicyArgs {
    /// Commission rate in basis points (500 = 5%)
    #[arg(long)]
    basis_points: u32,

    /// First date the policy applies, inclusive (YYYY-MM-DD)
    #[arg(long)]
    valid_from: Date,

    /// Last date the policy applies, inclusive; open-ended when omitted
    #[arg(long)]
    valid_to: Option<Date>,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
}

#[derive(Debug, Args)]
struct ListPoliciesArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
}

#[derive(Debug, Args)]
struct SettlementCommand {
    #[command(subcommand)]
    command: SettlementSubcommand,
}

#[derive(Debug, Subcommand)]
enum SettlementSubcommand {
    Run(RunSettlementArgs),
    Pay(PaySettlementArgs),
}

#[derive(Debug, Args)]
struct RunSettlementArgs {
    /// First delivery date of the period, inclusive (YYYY-MM-DD)
    #[arg(long)]
    period_start: Date,

    /// Last delivery date, inclusive; one week when omitted
    #[arg(long)]
    period_end: Option<Date>,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
}

#[derive(Debug, Args)]
struct PaySettlementArgs {
    /// Settlement UUID
    #[arg(long)]
    settlement: Uuid,

    /// Bank or provider reference for the payout
    #[arg(long)]
    payment_reference: String,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
}

#[tokio::main]
pub async fn main() {
    let _env = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(error) = run(cli).await {
        eprintln!("{error}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Commands::Policy(PolicyCommand {
            command: PolicySubcommand::Set(args),
        }) => set_policy(args).await,
        Commands::Policy(PolicyCommand {
            command: PolicySubcommand::List(args),
        }) => list_policies(args).await,
        Commands::Settlement(SettlementCommand {
            command: SettlementSubcommand::Run(args),
        }) => run_settlement(args).await,
        Commands::Settlement(SettlementCommand {
            command: SettlementSubcommand::Pay(args),
        }) => pay_settlement(args).await,
    }
}

async fn connect(database_url: &str) -> Result<AppContext, String> {
    AppContext::from_config(&AppConfig::new(database_url))
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))
}

async fn set_policy(args: SetPolicyArgs) -> Result<(), String> {
    let ctx = connect(&args.database_url).await?;

    let rate = Rate::from_basis_points(args.basis_points)
        .map_err(|error| format!("invalid rate: {error}"))?;

    let policy = ctx
        .payments
        .set_policy(rate, args.valid_from, args.valid_to)
        .await
        .map_err(|error| format!("failed to set policy: {error}"))?;

    println!("policy_uuid: {}", policy.uuid);
    println!("basis_points: {}", policy.rate.basis_points());
    println!("valid_from: {}", policy.valid_from);

    match policy.valid_to {
        Some(valid_to) => println!("valid_to: {valid_to}"),
        None => println!("valid_to: open-ended"),
    }

    Ok(())
}

async fn list_policies(args: ListPoliciesArgs) -> Result<(), String> {
    let ctx = connect(&args.database_url).await?;

    let policies = ctx
        .payments
        .list_policies()
        .await
        .map_err(|error| format!("failed to list policies: {error}"))?;

    for policy in policies {
        let valid_to = policy
            .valid_to
            .map_or_else(|| "open-ended".to_string(), |d| d.to_string());

        println!(
            "{} {}bp {} -> {}",
            policy.uuid,
            policy.rate.basis_points(),
            policy.valid_from,
            valid_to
        );
    }

    Ok(())
}

async fn run_settlement(args: RunSettlementArgs) -> Result<(), String> {
    let ctx = connect(&args.database_url).await?;

    let period = match args.period_end {
        Some(end) => SettlementPeriod::new(args.period_start, end),
        None => SettlementPeriod::week_starting(args.period_start),
    };

    let settlements = ctx
        .settlements
        .settle_all(period)
        .await
        .map_err(|error| format!("failed to settle period: {error}"))?;

    for settlement in &settlements {
        println!(
            "{} producer={} orders={} payout_pence={}",
            settlement.uuid, settlement.producer, settlement.order_count, settlement.payout_pence
        );
    }

    println!("settled {} producer(s)", settlements.len());

    Ok(())
}

async fn pay_settlement(args: PaySettlementArgs) -> Result<(), String> {
    let ctx = connect(&args.database_url).await?;

    let settlement = ctx
        .settlements
        .mark_paid(
            SettlementUuid::from_uuid(args.settlement),
            &args.payment_reference,
        )
        .await
        .map_err(|error| format!("failed to mark settlement paid: {error}"))?;

    println!("settlement_uuid: {}", settlement.uuid);
    println!("status: {}", settlement.status.as_str());
    println!("payment_reference: {}", settlement.payment_reference);

    Ok(())
}
