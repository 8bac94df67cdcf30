use super::models::{EventPosition, SyncState};
use alloy_primitives::Address;
use anyhow::Result;
use rusqlite::{OptionalExtension, params};
use std::str::FromStr;

pub struct SyncStateRepository<'a> {
    conn: &'a rusqlite::Connection,
}

impl<'a> SyncStateRepository<'a> {
    const INSERT_STATE: &'static str =
        "INSERT OR IGNORE INTO sync_state (address, deployment_block) VALUES (?1, ?2)";

    const UPDATE_LAST_PROCESSED_BLOCK: &'static str =
        "UPDATE sync_state SET last_processed_block = ?1 WHERE address = ?2";

    const RECORD_EVENT: &'static str = "INSERT INTO sync_state
            (address, deployment_block, last_event_block, last_event_log_index)
         VALUES (?1, ?2, ?2, ?3)
         ON CONFLICT(address) DO UPDATE SET
            last_event_block = excluded.last_event_block,
            last_event_log_index = excluded.last_event_log_index";

    const SELECT_STATE: &'static str = "SELECT address, deployment_block, last_processed_block,
            last_event_block, last_event_log_index
         FROM sync_state WHERE address = ?1";

    pub fn new(conn: &'a rusqlite::Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, address: &Address, deployment_block: u64) -> Result<()> {
        self.conn.execute(
            Self::INSERT_STATE,
            params![format!("{:?}", address), deployment_block],
        )?;
        Ok(())
    }

    pub fn load(&self, address: &Address) -> Result<Option<SyncState>> {
        let state = self
            .conn
            .query_row(
                Self::SELECT_STATE,
                params![format!("{:?}", address)],
                |row| {
                    let address = Address::from_str(&row.get::<_, String>(0)?).map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            0,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?;
                    let last_event_block: Option<u64> = row.get(3)?;
                    let last_event_log_index: Option<u64> = row.get(4)?;

                    Ok(SyncState {
                        address,
                        deployment_block: row.get(1)?,
                        last_processed_block: row.get(2)?,
                        last_event: last_event_block.zip(last_event_log_index).map(
                            |(block_number, log_index)| EventPosition {
                                block_number,
                                log_index,
                            },
                        ),
                    })
                },
            )
            .optional()?;
        Ok(state)
    }

    pub fn update_last_processed_block(&self, address: &Address, block_number: u64) -> Result<()> {
        self.conn.execute(
            Self::UPDATE_LAST_PROCESSED_BLOCK,
            params![block_number, format!("{:?}", address)],
        )?;
        Ok(())
    }

    /// Stores the position of the last applied event. Meant to run inside the
    /// same transaction as the event's state changes.
    pub fn record_event(&self, address: &Address, position: EventPosition) -> Result<()> {
        self.conn.execute(
            Self::RECORD_EVENT,
            params![
                format!("{:?}", address),
                position.block_number,
                position.log_index
            ],
        )?;
        Ok(())
    }
}
