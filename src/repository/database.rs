use alloy_primitives::U256;
use anyhow::{Context, Result};
use bigdecimal::BigDecimal;
use rusqlite::Connection;
use std::str::FromStr;

pub struct Database {
    pub conn: Connection,
}

impl Database {
    pub fn new(db_path: &str) -> Result<Self> {
        let db_path = db_path.strip_prefix("sqlite:").unwrap_or(db_path);
        let conn = Connection::open(db_path).context("Failed to open database")?;

        let db = Database { conn };
        db.create_tables()?;
        Ok(db)
    }

    pub fn in_memory() -> Result<Self> {
        Self::new(":memory:")
    }

    fn create_tables(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS tokens (
                id TEXT PRIMARY KEY
            );

            -- last observed total supply per token, used only for change detection
            CREATE TABLE IF NOT EXISTS token_supply_cursors (
                token_id TEXT PRIMARY KEY,
                total_supply TEXT NOT NULL,
                FOREIGN KEY (token_id) REFERENCES tokens(id)
            );

            CREATE TABLE IF NOT EXISTS supply_snapshots (
                id TEXT PRIMARY KEY,
                token_id TEXT NOT NULL,
                total_supply TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                FOREIGN KEY (token_id) REFERENCES tokens(id)
            );

            CREATE TABLE IF NOT EXISTS balances (
                id TEXT PRIMARY KEY,
                amount TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS transfers (
                id TEXT PRIMARY KEY,
                from_address TEXT NOT NULL,
                to_address TEXT NOT NULL,
                amount TEXT NOT NULL,
                timestamp INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS approvals (
                id TEXT PRIMARY KEY,
                owner TEXT NOT NULL,
                spender TEXT NOT NULL,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS minters (
                id TEXT PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS sync_state (
                address TEXT PRIMARY KEY,
                deployment_block INTEGER NOT NULL,
                last_processed_block INTEGER,
                last_event_block INTEGER,
                last_event_log_index INTEGER
            );

            CREATE INDEX IF NOT EXISTS idx_supply_snapshots_token
             ON supply_snapshots(token_id, timestamp);",
        )?;

        Ok(())
    }
}

/// Parses a decimal column, reporting the column index on failure.
pub(crate) fn decimal_column(idx: usize, value: String) -> rusqlite::Result<BigDecimal> {
    BigDecimal::from_str(&value).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

pub(crate) fn u256_column(idx: usize, value: String) -> rusqlite::Result<U256> {
    U256::from_str(&value).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
