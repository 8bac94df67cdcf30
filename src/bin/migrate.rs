use anyhow::Result;
use erc20_ledger_indexer::config::database_url_from_env;
use erc20_ledger_indexer::logging::init_tracing;
use erc20_ledger_indexer::repository::Database;
use tracing::info;

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let database_url = database_url_from_env();

    info!("Running migrations on database: {}", database_url);

    let _db = Database::new(&database_url)?;

    info!("Migrations completed successfully");

    Ok(())
}
