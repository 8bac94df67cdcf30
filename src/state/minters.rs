use crate::repository::{Minter, MinterRepository};
use anyhow::Result;
use rusqlite::Connection;
use tracing::debug;

pub struct MinterRegistry<'a> {
    minters: MinterRepository<'a>,
}

impl<'a> MinterRegistry<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self {
            minters: MinterRepository::new(conn),
        }
    }

    pub fn add(&self, account: &str) -> Result<()> {
        let minter = self
            .minters
            .load(account)?
            .unwrap_or_else(|| Minter::new(account));
        self.minters.save(&minter)
    }

    pub fn remove(&self, account: &str) -> Result<()> {
        if !self.minters.delete(account)? {
            debug!("MinterRemoved for {} which was not a known minter", account);
        }
        Ok(())
    }

    pub fn is_minter(&self, account: &str) -> Result<bool> {
        Ok(self.minters.load(account)?.is_some())
    }
}
