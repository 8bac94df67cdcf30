use super::database::decimal_column;
use super::models::Balance;
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};

pub struct BalanceRepository<'a> {
    conn: &'a Connection,
}

impl<'a> BalanceRepository<'a> {
    const UPSERT_BALANCE: &'static str =
        "INSERT OR REPLACE INTO balances (id, amount) VALUES (?1, ?2)";

    const SELECT_BALANCE: &'static str = "SELECT id, amount FROM balances WHERE id = ?1";

    const COUNT_BALANCES: &'static str = "SELECT COUNT(*) FROM balances";

    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn load(&self, address: &str) -> Result<Option<Balance>> {
        let balance = self
            .conn
            .query_row(Self::SELECT_BALANCE, params![address], |row| {
                Ok(Balance {
                    id: row.get(0)?,
                    amount: decimal_column(1, row.get(1)?)?,
                })
            })
            .optional()?;
        Ok(balance)
    }

    pub fn save(&self, balance: &Balance) -> Result<()> {
        self.conn.execute(
            Self::UPSERT_BALANCE,
            params![balance.id, balance.amount.to_plain_string()],
        )?;
        Ok(())
    }

    pub fn count(&self) -> Result<usize> {
        let count = self
            .conn
            .query_row(Self::COUNT_BALANCES, [], |row| row.get(0))?;
        Ok(count)
    }
}
