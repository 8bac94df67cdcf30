use crate::events::{EventContext, IndexedEvent, TokenEvent};
use crate::repository::{Database, EventPosition, SyncStateRepository, address_key, hash_key};
use crate::state::{BalanceLedger, MinterRegistry, Recorder, SupplyTracker, scale_amount};
use alloy_primitives::{Address, U256};
use anyhow::{Context, Result};
use rusqlite::Connection;
use std::collections::HashMap;
use std::future::Future;
use tracing::debug;

/// On-chain supply figures of a token at a given block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupplyReading {
    pub total_supply: U256,
    pub decimals: u8,
}

/// Read access to `totalSupply()` and `decimals()` of the token contract.
pub trait TokenReader {
    fn read_supply(
        &self,
        token: Address,
        block_number: u64,
    ) -> impl Future<Output = Result<SupplyReading>> + Send;
}

/// Applies events one at a time. Each event's writes, together with its
/// position in the stream, are committed in one transaction or not at all.
pub struct EventProcessor<R> {
    db: Database,
    reader: R,
}

impl<R: TokenReader> EventProcessor<R> {
    pub fn new(db: Database, reader: R) -> Self {
        Self { db, reader }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Applies a batch in chain order. Events at or before the stored stream
    /// position of their token were applied before a restart and are skipped.
    /// Returns the number of events applied.
    pub async fn apply_batch(&self, mut events: Vec<IndexedEvent>) -> Result<usize> {
        events.sort_by_key(|indexed| indexed.context.position());

        let mut last_events = HashMap::new();
        let mut applied = 0;

        for indexed in &events {
            let ctx = &indexed.context;
            let last_event = match last_events.get(&ctx.token).copied() {
                Some(last_event) => last_event,
                None => {
                    let last_event = SyncStateRepository::new(&self.db.conn)
                        .load(&ctx.token)?
                        .and_then(|state| state.last_event);
                    last_events.insert(ctx.token, last_event);
                    last_event
                }
            };

            if is_already_applied(last_event, ctx.position()) {
                debug!(
                    "Skipping already applied event at block {} log {}",
                    ctx.block_number, ctx.log_index
                );
                continue;
            }

            self.process(indexed).await.with_context(|| {
                format!(
                    "failed to process {} in transaction {:?}",
                    indexed.event.name(),
                    ctx.transaction_hash
                )
            })?;
            applied += 1;
        }

        Ok(applied)
    }

    pub async fn process(&self, indexed: &IndexedEvent) -> Result<()> {
        let ctx = &indexed.context;
        debug!(
            "Processing {} at block {} log {}",
            indexed.event.name(),
            ctx.block_number,
            ctx.log_index
        );

        match indexed.event {
            TokenEvent::Transfer { from, to, value } => {
                // Read before opening the transaction so a failed call leaves no trace.
                let reading = self
                    .reader
                    .read_supply(ctx.token, ctx.block_number)
                    .await
                    .with_context(|| {
                        format!(
                            "failed to read supply of {:?} at block {}",
                            ctx.token, ctx.block_number
                        )
                    })?;
                self.commit(ctx, |conn| {
                    handle_transfer(conn, ctx, &from, &to, value, reading)
                })
            }
            TokenEvent::Approval {
                owner,
                spender,
                value,
            } => self.commit(ctx, |conn| {
                Recorder::new(conn).record_approval(
                    &address_key(&owner),
                    &address_key(&spender),
                    value,
                )
            }),
            TokenEvent::MinterAdded { account } => self.commit(ctx, |conn| {
                MinterRegistry::new(conn).add(&address_key(&account))
            }),
            TokenEvent::MinterRemoved { account } => self.commit(ctx, |conn| {
                MinterRegistry::new(conn).remove(&address_key(&account))
            }),
        }
    }

    fn commit<F>(&self, ctx: &EventContext, apply: F) -> Result<()>
    where
        F: FnOnce(&Connection) -> Result<()>,
    {
        let tx = self.db.conn.unchecked_transaction()?;
        apply(&tx)?;
        SyncStateRepository::new(&tx).record_event(&ctx.token, ctx.position())?;
        tx.commit()?;
        Ok(())
    }
}

fn handle_transfer(
    conn: &Connection,
    ctx: &EventContext,
    from: &Address,
    to: &Address,
    value: U256,
    reading: SupplyReading,
) -> Result<()> {
    let token_id = address_key(&ctx.token);
    let transfer_id = hash_key(&ctx.transaction_hash);
    let from = address_key(from);
    let to = address_key(to);

    let total_supply = scale_amount(reading.total_supply, reading.decimals);
    let amount = scale_amount(value, reading.decimals);

    let change = SupplyTracker::new(conn).observe(
        &token_id,
        &transfer_id,
        &total_supply,
        ctx.block_timestamp,
    )?;

    Recorder::new(conn).record_transfer(
        &transfer_id,
        &from,
        &to,
        amount.clone(),
        ctx.block_timestamp,
    )?;

    BalanceLedger::new(conn).apply_transfer(&from, &to, &amount)?;

    debug!(
        "Transfer {} -> {} of {} ({:?} supply {})",
        from, to, amount, change, total_supply
    );
    Ok(())
}

fn is_already_applied(last_event: Option<EventPosition>, position: EventPosition) -> bool {
    last_event.is_some_and(|last| position <= last)
}
