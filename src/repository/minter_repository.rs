use super::models::Minter;
use anyhow::Result;
use rusqlite::{OptionalExtension, params};

pub struct MinterRepository<'a> {
    conn: &'a rusqlite::Connection,
}

impl<'a> MinterRepository<'a> {
    const UPSERT_MINTER: &'static str = "INSERT OR REPLACE INTO minters (id) VALUES (?1)";

    const SELECT_MINTER: &'static str = "SELECT id FROM minters WHERE id = ?1";

    const DELETE_MINTER: &'static str = "DELETE FROM minters WHERE id = ?1";

    const SELECT_ALL_MINTERS: &'static str = "SELECT id FROM minters ORDER BY id";

    pub fn new(conn: &'a rusqlite::Connection) -> Self {
        Self { conn }
    }

    pub fn load(&self, id: &str) -> Result<Option<Minter>> {
        let minter = self
            .conn
            .query_row(Self::SELECT_MINTER, params![id], |row| {
                Ok(Minter { id: row.get(0)? })
            })
            .optional()?;
        Ok(minter)
    }

    pub fn save(&self, minter: &Minter) -> Result<()> {
        self.conn.execute(Self::UPSERT_MINTER, params![minter.id])?;
        Ok(())
    }

    /// Returns whether a record was removed.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let removed = self.conn.execute(Self::DELETE_MINTER, params![id])?;
        Ok(removed > 0)
    }

    pub fn list(&self) -> Result<Vec<Minter>> {
        let mut stmt = self.conn.prepare(Self::SELECT_ALL_MINTERS)?;
        let minters = stmt
            .query_map([], |row| Ok(Minter { id: row.get(0)? }))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(minters)
    }
}
