//! Bridge Functions CLI
//!
//! Runs one routine invocation locally against the configured networks.
//! Secrets are read from `BRIDGE_SECRET_*` environment variables; the result is
//! printed as `0x`-hex on stdout.

use anyhow::Result;
use bridge_functions::config::ChainSelector;
use bridge_functions::dispatch;
use bridge_functions::secrets::SECRET_ENV_PREFIX;
use bridge_functions::{Config, Routine, Secrets};
use chain_clients_common::strip_hex_prefix;
use clap::{Parser, Subcommand};
use ethereum_types::U256;
use std::str::FromStr;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "bridge-functions",
    author,
    version,
    about = "Verify cross-chain transfers and rebalance pool liquidity"
)]
struct Cli {
    /// Config file path (overrides BRIDGE_FUNCTIONS_CONFIG_PATH)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Verify a ConceroBridgeSent event on its source chain
    Verify {
        #[arg(long, value_name = "0x...")]
        source_contract: HexArg,
        /// Source chain selector, decimal or 0x-hex
        #[arg(long)]
        source_chain: ChainSelector,
        #[arg(long, value_name = "0x...")]
        message_id: HexArg,
        #[arg(long, value_name = "0x...")]
        commitment: HexArg,
    },
    /// Total child pool liquidity and received hub deposits
    TotalBalance,
    /// Fund a joining pool from the existing pools
    Redistribute {
        #[arg(long)]
        joining_chain: ChainSelector,
        #[arg(long, value_name = "0x...")]
        request_id: HexArg,
        /// 0 = join, 1 = liquidate and exit
        #[arg(long, default_value_t = 0)]
        distribution_type: u8,
        #[arg(long)]
        host_chain_id: u64,
    },
    /// Request withdrawal liquidity from every child pool
    CollectWithdrawal {
        /// Amount per pool in token base units (decimal)
        #[arg(long)]
        amount: DecimalArg,
        #[arg(long, value_name = "0x...")]
        withdrawal_id: HexArg,
    },
}

/// Byte string given as hex, with or without `0x`.
#[derive(Debug, Clone)]
struct HexArg(Vec<u8>);

impl FromStr for HexArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        hex::decode(strip_hex_prefix(s.trim()))
            .map(HexArg)
            .map_err(|e| format!("Invalid hex '{}': {}", s, e))
    }
}

/// Decimal uint256, passed on as a 32-byte big-endian word.
#[derive(Debug, Clone)]
struct DecimalArg(U256);

impl FromStr for DecimalArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        U256::from_dec_str(s.trim())
            .map(DecimalArg)
            .map_err(|e| format!("Invalid amount '{}': {:?}", s, e))
    }
}

impl DecimalArg {
    fn to_word(&self) -> Vec<u8> {
        let mut word = [0u8; 32];
        self.0.to_big_endian(&mut word);
        word.to_vec()
    }
}

impl Command {
    /// Positional host arguments for this command.
    fn into_invocation(self) -> Vec<Vec<u8>> {
        match self {
            Command::Verify {
                source_contract,
                source_chain,
                message_id,
                commitment,
            } => Routine::VerifyTransfer.invocation_args(vec![
                source_contract.0,
                source_chain.as_u64().to_be_bytes().to_vec(),
                message_id.0,
                commitment.0,
            ]),
            Command::TotalBalance => Routine::TotalBalance.invocation_args(Vec::new()),
            Command::Redistribute {
                joining_chain,
                request_id,
                distribution_type,
                host_chain_id,
            } => Routine::RedistributeLiquidity.invocation_args(vec![
                joining_chain.as_u64().to_be_bytes().to_vec(),
                request_id.0,
                vec![distribution_type],
                host_chain_id.to_be_bytes().to_vec(),
            ]),
            Command::CollectWithdrawal {
                amount,
                withdrawal_id,
            } => Routine::CollectWithdrawalLiquidity
                .invocation_args(vec![amount.to_word(), withdrawal_id.0]),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load_from_path(cli.config.as_deref())?;
    info!("Configuration loaded: {} networks", config.networks.len());

    let secrets = Secrets::from_env(SECRET_ENV_PREFIX);
    let args = cli.command.into_invocation();

    match dispatch::run(&config, &secrets, &args).await {
        Ok(result) => {
            println!("0x{}", hex::encode(result));
            Ok(())
        }
        Err(message) => {
            eprintln!("Error: {}", message);
            std::process::exit(1);
        }
    }
}
