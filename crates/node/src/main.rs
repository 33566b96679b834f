use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use strata_codec::hash_transaction;
use strata_crypto::{sign_inputs, PrivateKey};
use strata_node::peers::make_client;
use strata_node::{Node, NodeApiClient, NodeConfig};
use strata_types::{Transaction, TxInput, TxOutput};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "strata-node", version, about = "UTXO ledger node")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a node until ctrl-c.
    Run(RunArgs),
    /// Sign a throwaway transaction and submit it to a running node.
    SendTx(SendTxArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    /// TOML config file; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    listen: Option<String>,
    /// May be repeated.
    #[arg(long = "bootstrap")]
    bootstrap: Vec<String>,
    /// Hex seed; makes this node a validator.
    #[arg(long)]
    validator_seed: Option<String>,
}

#[derive(Debug, Args)]
struct SendTxArgs {
    #[arg(long, default_value = "127.0.0.1:3000")]
    node: String,
    #[arg(long, default_value_t = 99)]
    amount: u64,
    #[arg(long, default_value_t = 5_000)]
    timeout_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match Cli::parse().command {
        Command::Run(args) => run(args).await,
        Command::SendTx(args) => send_tx(args).await,
    }
}

async fn run(args: RunArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => NodeConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => NodeConfig::default(),
    };
    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }
    if !args.bootstrap.is_empty() {
        config.bootstrap = args.bootstrap;
    }
    if args.validator_seed.is_some() {
        config.validator_seed = args.validator_seed;
    }

    let node = Node::new(config).context("building node")?;
    let handle = node.start().await.context("starting node")?;

    tokio::signal::ctrl_c()
        .await
        .context("waiting for ctrl-c")?;
    info!(listen_addr = %handle.local_addr(), "shutting down");
    handle.stop().await;
    Ok(())
}

async fn send_tx(args: SendTxArgs) -> Result<()> {
    let key = PrivateKey::generate();
    let public = key.public();

    let mut tx = Transaction::new(
        1,
        vec![TxInput::new(rand::random(), 0, public.to_bytes().to_vec())],
        vec![TxOutput::new(args.amount, public.address().to_bytes().to_vec())],
    );
    sign_inputs(&key, &mut tx);

    let client = make_client(&args.node, Duration::from_millis(args.timeout_ms))?;
    client
        .handle_transaction(tx.clone())
        .await
        .with_context(|| format!("submitting transaction to {}", args.node))?;

    info!(
        hash = %hex::encode(hash_transaction(&tx)),
        node = %args.node,
        "transaction submitted"
    );
    Ok(())
}
