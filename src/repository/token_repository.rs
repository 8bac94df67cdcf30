use super::models::Token;
use anyhow::Result;
use rusqlite::{OptionalExtension, params};

pub struct TokenRepository<'a> {
    conn: &'a rusqlite::Connection,
}

impl<'a> TokenRepository<'a> {
    const INSERT_TOKEN: &'static str = "INSERT OR REPLACE INTO tokens (id) VALUES (?1)";

    const SELECT_TOKEN: &'static str = "SELECT id FROM tokens WHERE id = ?1";

    pub fn new(conn: &'a rusqlite::Connection) -> Self {
        Self { conn }
    }

    pub fn save(&self, token: &Token) -> Result<()> {
        self.conn.execute(Self::INSERT_TOKEN, params![token.id])?;
        Ok(())
    }

    pub fn load(&self, id: &str) -> Result<Option<Token>> {
        let token = self
            .conn
            .query_row(Self::SELECT_TOKEN, params![id], |row| {
                Ok(Token { id: row.get(0)? })
            })
            .optional()?;
        Ok(token)
    }
}
