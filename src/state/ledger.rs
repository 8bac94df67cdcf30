use crate::repository::{Balance, BalanceRepository, is_zero_address};
use anyhow::Result;
use bigdecimal::BigDecimal;
use rusqlite::Connection;
use tracing::debug;

/// Per-address running balances.
///
/// The zero-address sentinel is never tracked, so minted amounts only credit
/// the receiver and burned amounts only debit the sender. Balances may go
/// negative; amounts from the event source are trusted as-is.
pub struct BalanceLedger<'a> {
    balances: BalanceRepository<'a>,
}

impl<'a> BalanceLedger<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self {
            balances: BalanceRepository::new(conn),
        }
    }

    pub fn ensure_initialized(&self, address: &str) -> Result<()> {
        if is_zero_address(address) {
            return Ok(());
        }

        if self.balances.load(address)?.is_none() {
            debug!("Initializing balance for {}", address);
            self.balances.save(&Balance::zero(address))?;
        }

        Ok(())
    }

    pub fn apply_transfer(&self, from: &str, to: &str, amount: &BigDecimal) -> Result<()> {
        self.ensure_initialized(from)?;
        self.ensure_initialized(to)?;

        // Reload between debit and credit so a self-transfer nets to zero.
        if let Some(mut balance) = self.balances.load(from)? {
            balance.amount = &balance.amount - amount;
            self.balances.save(&balance)?;
        }

        if let Some(mut balance) = self.balances.load(to)? {
            balance.amount = &balance.amount + amount;
            self.balances.save(&balance)?;
        }

        Ok(())
    }

    pub fn balance_of(&self, address: &str) -> Result<Option<BigDecimal>> {
        Ok(self.balances.load(address)?.map(|balance| balance.amount))
    }
}
