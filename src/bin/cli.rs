use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Result;
use balance_checker::{
    connect, token_metadata, AssetKind, BalanceChecker, BalanceReport, BalanceRequest, Config,
    CustomToken, WellKnownToken,
};
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "balance-checker")]
#[command(about = "Query native and ERC-20 balances on EVM networks", long_about = None)]
struct Cli {
    /// JSON file with network and token tables (defaults to the built-in one)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check the balances of a wallet address
    Check(CheckArgs),
    /// List configured networks and their well-known tokens
    Networks,
    /// Show symbol and decimals of an ERC-20 contract
    Token {
        /// Token contract address
        #[arg(long)]
        contract: String,

        /// Network to query
        #[arg(short, long, default_value = "ethereum")]
        network: String,
    },
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// The wallet address to query
    #[arg(short, long)]
    address: String,

    /// Network to query (ethereum, polygon, base, ...)
    #[arg(short, long, default_value = "ethereum")]
    network: String,

    /// Well-known tokens to check
    #[arg(short, long, value_delimiter = ',', default_value = "usdt,usdc,dai")]
    tokens: Vec<WellKnownToken>,

    /// Do not check any well-known token
    #[arg(long, conflicts_with = "tokens")]
    skip_tokens: bool,

    /// Do not check the native coin
    #[arg(long)]
    skip_native: bool,

    /// Contract address of an extra ERC-20 token
    #[arg(long, default_value = "")]
    custom_token: String,

    /// Symbol to show for the extra token
    #[arg(long, default_value = "")]
    custom_symbol: String,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_path(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Command::Check(args) => run_check(&config, args).await,
        Command::Networks => {
            list_networks(&config);
            Ok(())
        }
        Command::Token { contract, network } => {
            let ctx = connect(&config, &network)?;
            let (symbol, decimals) = token_metadata(&ctx, &contract).await?;
            println!("{} on {}: {} ({} decimals)", contract, ctx.network.name, symbol, decimals);
            Ok(())
        }
    }
}

async fn run_check(config: &Config, args: CheckArgs) -> Result<()> {
    let ctx = connect(config, &args.network)?;
    let network_name = ctx.network.name.clone();
    let mut checker = BalanceChecker::new(ctx);

    let request = build_request(&args);

    match checker.check(&request).await {
        Ok(report) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(report)?);
            } else {
                print_report(report, &network_name);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

fn build_request(args: &CheckArgs) -> BalanceRequest {
    let tokens = if args.skip_tokens {
        BTreeSet::new()
    } else {
        args.tokens.iter().copied().collect()
    };
    BalanceRequest {
        address: args.address.clone(),
        native: !args.skip_native,
        tokens,
        custom: CustomToken::new(&args.custom_token, &args.custom_symbol),
    }
}

fn print_report(report: &BalanceReport, network_name: &str) {
    println!("Address: {}", report.address);
    println!("Network: {}", network_name);
    println!("{}", "=".repeat(60));

    for row in &report.results {
        let marker = if row.kind == AssetKind::Error { "!" } else { " " };
        println!(
            "{}{:8} | {:>24} ({})",
            marker,
            row.symbol,
            row.balance.to_string(),
            row.kind
        );
    }

    println!("{}", "=".repeat(60));
}

fn list_networks(config: &Config) {
    for id in config.network_ids() {
        let Some(network) = config.get_network(id) else {
            continue;
        };
        let mut tokens: Vec<&str> = network.tokens.keys().map(String::as_str).collect();
        tokens.sort_unstable();
        println!(
            "{:10} {:20} {:6} {}",
            id,
            network.name,
            network.native_token.symbol,
            tokens.join(", ")
        );
    }
}
