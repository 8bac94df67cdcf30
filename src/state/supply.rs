use crate::repository::models::LastTotalSupply;
use crate::repository::{SupplyRepository, SupplySnapshot, Token, TokenRepository};
use anyhow::Result;
use bigdecimal::BigDecimal;
use rusqlite::Connection;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupplyChange {
    /// First observation of the token; token and initial snapshot created.
    Initialized,
    Changed,
    Unchanged,
}

/// Keeps the total-supply history of a token, appending a snapshot only when
/// the observed value differs from the last one seen.
pub struct SupplyTracker<'a> {
    tokens: TokenRepository<'a>,
    supply: SupplyRepository<'a>,
}

impl<'a> SupplyTracker<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self {
            tokens: TokenRepository::new(conn),
            supply: SupplyRepository::new(conn),
        }
    }

    pub fn observe(
        &self,
        token_id: &str,
        snapshot_id: &str,
        total_supply: &BigDecimal,
        timestamp: u64,
    ) -> Result<SupplyChange> {
        if self.tokens.load(token_id)?.is_none() {
            info!("First sight of token {}, total supply {}", token_id, total_supply);
            self.tokens.save(&Token::new(token_id))?;
            self.append(token_id, snapshot_id, total_supply, timestamp)?;
            return Ok(SupplyChange::Initialized);
        }

        let Some(last) = self.supply.load_last_total_supply(token_id)? else {
            anyhow::bail!(
                "token {} is tracked but has no last total supply record",
                token_id
            );
        };

        if last.total_supply == *total_supply {
            return Ok(SupplyChange::Unchanged);
        }

        debug!(
            "Total supply of {} changed from {} to {}",
            token_id, last.total_supply, total_supply
        );
        self.append(token_id, snapshot_id, total_supply, timestamp)?;
        Ok(SupplyChange::Changed)
    }

    fn append(
        &self,
        token_id: &str,
        snapshot_id: &str,
        total_supply: &BigDecimal,
        timestamp: u64,
    ) -> Result<()> {
        self.supply.insert_snapshot(&SupplySnapshot::new(
            snapshot_id,
            token_id,
            total_supply.clone(),
            timestamp,
        ))?;
        self.supply.save_last_total_supply(&LastTotalSupply {
            token_id: token_id.to_string(),
            total_supply: total_supply.clone(),
        })
    }
}
