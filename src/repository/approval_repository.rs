use super::database::u256_column;
use super::models::Approval;
use anyhow::Result;
use rusqlite::{OptionalExtension, params};

pub struct ApprovalRepository<'a> {
    conn: &'a rusqlite::Connection,
}

impl<'a> ApprovalRepository<'a> {
    const UPSERT_APPROVAL: &'static str =
        "INSERT OR REPLACE INTO approvals (id, owner, spender, value) VALUES (?1, ?2, ?3, ?4)";

    const SELECT_APPROVAL: &'static str =
        "SELECT id, owner, spender, value FROM approvals WHERE id = ?1";

    const COUNT_APPROVALS: &'static str = "SELECT COUNT(*) FROM approvals";

    pub fn new(conn: &'a rusqlite::Connection) -> Self {
        Self { conn }
    }

    pub fn load(&self, owner: &str) -> Result<Option<Approval>> {
        let approval = self
            .conn
            .query_row(Self::SELECT_APPROVAL, params![owner], |row| {
                Ok(Approval {
                    id: row.get(0)?,
                    owner: row.get(1)?,
                    spender: row.get(2)?,
                    value: u256_column(3, row.get(3)?)?,
                })
            })
            .optional()?;
        Ok(approval)
    }

    pub fn save(&self, approval: &Approval) -> Result<()> {
        self.conn.execute(
            Self::UPSERT_APPROVAL,
            params![
                approval.id,
                approval.owner,
                approval.spender,
                approval.value.to_string(),
            ],
        )?;
        Ok(())
    }

    pub fn count(&self) -> Result<usize> {
        let count = self
            .conn
            .query_row(Self::COUNT_APPROVALS, [], |row| row.get(0))?;
        Ok(count)
    }
}
