use alloy_primitives::Address;
use anyhow::{Context, Result};
use std::str::FromStr;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:./indexer.db";
const DEFAULT_BATCH_SIZE: u64 = 1000; // Most public RPCs allow up to 1k logs per request
const DEFAULT_CONFIRMATIONS: u64 = 12;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 12;

#[derive(Debug, Clone)]
pub struct Config {
    pub json_rpc_urls: Vec<String>,
    pub token_contract_address: Address,
    pub database_url: String,
    pub start_block: Option<u64>,
    pub batch_size: u64,
    pub confirmations: u64,
    pub poll_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let urls = std::env::var("JSON_RPC_URLS")
            .or_else(|_| std::env::var("JSON_RPC_URL"))
            .context("JSON_RPC_URLS or JSON_RPC_URL must be set in .env")?;
        let json_rpc_urls = parse_url_list(&urls);
        if json_rpc_urls.is_empty() {
            anyhow::bail!("JSON_RPC_URLS does not contain any endpoint");
        }

        let contract_address_str = std::env::var("TOKEN_CONTRACT_ADDRESS")
            .context("TOKEN_CONTRACT_ADDRESS must be set in .env")?;

        let token_contract_address = Address::from_str(contract_address_str.trim())
            .context("Invalid TOKEN_CONTRACT_ADDRESS format")?;

        let database_url = database_url_from_env();

        Ok(Config {
            json_rpc_urls,
            token_contract_address,
            database_url,
            start_block: optional_u64("START_BLOCK")?,
            batch_size: optional_u64("BATCH_SIZE")?.unwrap_or(DEFAULT_BATCH_SIZE).max(1),
            confirmations: optional_u64("CONFIRMATIONS")?.unwrap_or(DEFAULT_CONFIRMATIONS),
            poll_interval_secs: optional_u64("POLL_INTERVAL_SECS")?
                .unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
        })
    }
}

/// `DATABASE_URL`, falling back to a local SQLite file.
pub fn database_url_from_env() -> String {
    database_url_or_default(std::env::var("DATABASE_URL").ok())
}

fn database_url_or_default(value: Option<String>) -> String {
    value
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
}

fn parse_url_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect()
}

fn optional_u64(name: &str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{name} must be a non-negative integer, got {value:?}")),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_list_skips_blank_entries() {
        let urls = parse_url_list(" https://a.example , ,https://b.example,");
        assert_eq!(urls, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn url_list_of_single_endpoint() {
        assert_eq!(parse_url_list("http://localhost:8545"), vec!["http://localhost:8545"]);
    }

    #[test]
    fn database_url_defaults_to_local_file() {
        assert_eq!(database_url_or_default(None), "sqlite:./indexer.db");
        assert_eq!(database_url_or_default(Some("  ".to_string())), DEFAULT_DATABASE_URL);
        assert_eq!(
            database_url_or_default(Some("sqlite:/tmp/ledger.db".to_string())),
            "sqlite:/tmp/ledger.db"
        );
    }
}
