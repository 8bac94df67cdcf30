use super::database::decimal_column;
use super::models::Transfer;
use anyhow::Result;
use rusqlite::{OptionalExtension, Row, params};

pub struct TransferRepository<'a> {
    conn: &'a rusqlite::Connection,
}

impl<'a> TransferRepository<'a> {
    // A second transfer with the same transaction hash replaces the first.
    const INSERT_TRANSFER: &'static str = "INSERT OR REPLACE INTO transfers (
            id, from_address, to_address, amount, timestamp
        ) VALUES (?1, ?2, ?3, ?4, ?5)";

    const SELECT_TRANSFER: &'static str =
        "SELECT id, from_address, to_address, amount, timestamp FROM transfers";

    const COUNT_TRANSFERS: &'static str = "SELECT COUNT(*) FROM transfers";

    pub fn new(conn: &'a rusqlite::Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, transfer: &Transfer) -> Result<()> {
        self.conn.execute(
            Self::INSERT_TRANSFER,
            params![
                transfer.id,
                transfer.from_address,
                transfer.to_address,
                transfer.amount.to_plain_string(),
                transfer.timestamp,
            ],
        )?;
        Ok(())
    }

    pub fn load(&self, id: &str) -> Result<Option<Transfer>> {
        let query = format!("{} WHERE id = ?1", Self::SELECT_TRANSFER);
        let transfer = self
            .conn
            .query_row(&query, params![id], Self::row_to_transfer)
            .optional()?;
        Ok(transfer)
    }

    pub fn count(&self) -> Result<usize> {
        let count = self
            .conn
            .query_row(Self::COUNT_TRANSFERS, [], |row| row.get(0))?;
        Ok(count)
    }

    fn row_to_transfer(row: &Row) -> rusqlite::Result<Transfer> {
        Ok(Transfer {
            id: row.get(0)?,
            from_address: row.get(1)?,
            to_address: row.get(2)?,
            amount: decimal_column(3, row.get(3)?)?,
            timestamp: row.get(4)?,
        })
    }
}
