use anyhow::Result;
use clap::Parser;
use erc20_ledger_indexer::config::Config;
use erc20_ledger_indexer::logging::init_tracing;
use erc20_ledger_indexer::repository::Database;
use erc20_ledger_indexer::rpc::RpcClient;
use erc20_ledger_indexer::scanner::Scanner;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Derive balances, supply history and minters from ERC20 events", long_about = None)]
struct Cli {
    /// Overrides DATABASE_URL
    #[arg(long)]
    database_url: Option<String>,

    /// Overrides START_BLOCK; only used when no progress is stored yet
    #[arg(long)]
    start_block: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    info!("Starting ERC20 ledger indexer");

    let mut config = Config::from_env()?;
    if let Some(database_url) = cli.database_url {
        config.database_url = database_url;
    }
    if cli.start_block.is_some() {
        config.start_block = cli.start_block;
    }

    info!("Configuration loaded");
    info!("Contract address: {:?}", config.token_contract_address);
    info!(
        "RPC URLs: {} endpoint(s) configured",
        config.json_rpc_urls.len()
    );

    let db = Database::new(&config.database_url)?;
    info!("Database initialized");

    let client = RpcClient::new(&config.json_rpc_urls)?;
    info!("RPC client connected");

    let mut scanner = Scanner::new(client, db, &config)?;

    if let Err(e) = scanner.run().await {
        error!("Scanner error: {:#}", e);
        return Err(e);
    }

    Ok(())
}
