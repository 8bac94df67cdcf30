use super::database::decimal_column;
use super::models::{LastTotalSupply, SupplySnapshot};
use anyhow::Result;
use rusqlite::{OptionalExtension, Row, params};

pub struct SupplyRepository<'a> {
    conn: &'a rusqlite::Connection,
}

impl<'a> SupplyRepository<'a> {
    const INSERT_SNAPSHOT: &'static str = "INSERT OR REPLACE INTO supply_snapshots
            (id, token_id, total_supply, timestamp) VALUES (?1, ?2, ?3, ?4)";

    const SELECT_SNAPSHOT: &'static str =
        "SELECT id, token_id, total_supply, timestamp FROM supply_snapshots";

    const UPSERT_CURSOR: &'static str =
        "INSERT OR REPLACE INTO token_supply_cursors (token_id, total_supply) VALUES (?1, ?2)";

    const SELECT_CURSOR: &'static str =
        "SELECT token_id, total_supply FROM token_supply_cursors WHERE token_id = ?1";

    pub fn new(conn: &'a rusqlite::Connection) -> Self {
        Self { conn }
    }

    pub fn insert_snapshot(&self, snapshot: &SupplySnapshot) -> Result<()> {
        self.conn.execute(
            Self::INSERT_SNAPSHOT,
            params![
                snapshot.id,
                snapshot.token_id,
                snapshot.total_supply.to_plain_string(),
                snapshot.timestamp,
            ],
        )?;
        Ok(())
    }

    pub fn load_snapshot(&self, id: &str) -> Result<Option<SupplySnapshot>> {
        let query = format!("{} WHERE id = ?1", Self::SELECT_SNAPSHOT);
        let snapshot = self
            .conn
            .query_row(&query, params![id], Self::row_to_snapshot)
            .optional()?;
        Ok(snapshot)
    }

    /// Supply history of a token, oldest first.
    pub fn snapshots_for_token(&self, token_id: &str) -> Result<Vec<SupplySnapshot>> {
        let query = format!(
            "{} WHERE token_id = ?1 ORDER BY timestamp ASC, rowid ASC",
            Self::SELECT_SNAPSHOT
        );
        let mut stmt = self.conn.prepare(&query)?;
        let snapshots = stmt
            .query_map(params![token_id], Self::row_to_snapshot)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(snapshots)
    }

    pub(crate) fn load_last_total_supply(&self, token_id: &str) -> Result<Option<LastTotalSupply>> {
        let cursor = self
            .conn
            .query_row(Self::SELECT_CURSOR, params![token_id], |row| {
                Ok(LastTotalSupply {
                    token_id: row.get(0)?,
                    total_supply: decimal_column(1, row.get(1)?)?,
                })
            })
            .optional()?;
        Ok(cursor)
    }

    pub(crate) fn save_last_total_supply(&self, cursor: &LastTotalSupply) -> Result<()> {
        self.conn.execute(
            Self::UPSERT_CURSOR,
            params![cursor.token_id, cursor.total_supply.to_plain_string()],
        )?;
        Ok(())
    }

    fn row_to_snapshot(row: &Row) -> rusqlite::Result<SupplySnapshot> {
        Ok(SupplySnapshot {
            id: row.get(0)?,
            token_id: row.get(1)?,
            total_supply: decimal_column(2, row.get(2)?)?,
            timestamp: row.get(3)?,
        })
    }
}
