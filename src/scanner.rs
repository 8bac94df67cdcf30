use crate::config::Config;
use crate::deployment::{fetch_token_metadata, find_deployment_block};
use crate::events::{EventContext, IndexedEvent, decode_token_event, tracked_topics};
use crate::processor::EventProcessor;
use crate::repository::{Database, SyncStateRepository};
use crate::rpc::RpcClient;
use alloy::rpc::types::Log;
use alloy_primitives::{Address, B256};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, warn};

const RATE_LIMIT_DELAY_MS: u64 = 200; // 200ms between requests = 5 requests per second

pub struct Scanner {
    client: RpcClient,
    processor: EventProcessor<RpcClient>,
    contract_address: Address,
    topics: Vec<B256>,
    start_block: Option<u64>,
    batch_size: u64,
    confirmations: u64,
    poll_interval: Duration,
}

impl Scanner {
    pub fn new(client: RpcClient, db: Database, config: &Config) -> Result<Self> {
        let processor = EventProcessor::new(db, client.clone());
        Ok(Scanner {
            client,
            processor,
            contract_address: config.token_contract_address,
            topics: tracked_topics(),
            start_block: config.start_block,
            batch_size: config.batch_size.max(1),
            confirmations: config.confirmations,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        let deployment_block = self.ensure_deployment_block().await?;
        fetch_token_metadata(&self.client, self.contract_address).await;

        let mut next_block = self
            .sync_state()
            .load(&self.contract_address)?
            .and_then(|state| state.last_processed_block)
            .map_or(deployment_block, |block| block + 1);

        info!("Starting scan from block {}", next_block);

        loop {
            let loop_start = Instant::now();

            let latest_block = self.client.get_latest_block().await?;
            let safe_head = latest_block.saturating_sub(self.confirmations);

            if next_block > safe_head {
                info!(
                    "Caught up to block {} ({} confirmations). Entering polling mode...",
                    safe_head, self.confirmations
                );
                sleep(self.poll_interval).await;
                continue;
            }

            let from = next_block;
            let to_block = (from + self.batch_size - 1).min(safe_head);
            info!("Fetching logs for blocks {} to {}", from, to_block);

            let logs = match self
                .client
                .get_logs(from, to_block, self.contract_address, &self.topics)
                .await
            {
                Ok(logs) => logs,
                Err(e) if e.to_string().contains("429") => {
                    warn!("Rate limited, waiting 1 second before retry...");
                    sleep(Duration::from_secs(1)).await;
                    self.client
                        .get_logs(from, to_block, self.contract_address, &self.topics)
                        .await?
                }
                Err(e) => return Err(e),
            };

            info!(
                "Received {} logs for blocks {} to {}",
                logs.len(),
                from,
                to_block
            );

            if !logs.is_empty() {
                let applied = self.process_logs(logs).await?;
                info!("Applied {} events", applied);
            }

            self.sync_state()
                .update_last_processed_block(&self.contract_address, to_block)?;
            next_block = to_block + 1;

            debug!("Updated last processed block to {}", to_block);

            let loop_duration = loop_start.elapsed();
            let target_duration = Duration::from_millis(RATE_LIMIT_DELAY_MS);
            if loop_duration < target_duration {
                sleep(target_duration - loop_duration).await;
            }
        }
    }

    /// Decodes a batch of logs and hands it to the processor, which applies it
    /// in chain order and skips events already applied before a restart.
    async fn process_logs(&self, logs: Vec<Log>) -> Result<usize> {
        let mut timestamps = HashMap::new();
        let mut events = Vec::with_capacity(logs.len());

        for log in &logs {
            if let Some(indexed) = self.index_log(log, &mut timestamps).await? {
                events.push(indexed);
            }
        }

        self.processor.apply_batch(events).await
    }

    async fn index_log(
        &self,
        log: &Log,
        timestamps: &mut HashMap<u64, u64>,
    ) -> Result<Option<IndexedEvent>> {
        if log.removed {
            warn!("Ignoring removed log {:?}", log.transaction_hash);
            return Ok(None);
        }

        let event = match decode_token_event(log) {
            Ok(event) => event,
            Err(e) => {
                warn!("Failed to decode token event: {}", e);
                return Ok(None);
            }
        };

        let block_number = log.block_number.context("log is missing its block number")?;
        let log_index = log.log_index.context("log is missing its log index")?;
        let transaction_hash = log
            .transaction_hash
            .context("log is missing its transaction hash")?;

        let block_timestamp = match log.block_timestamp.or(timestamps.get(&block_number).copied())
        {
            Some(timestamp) => timestamp,
            None => {
                let timestamp = self.client.get_block_timestamp(block_number).await?;
                timestamps.insert(block_number, timestamp);
                timestamp
            }
        };

        Ok(Some(IndexedEvent {
            context: EventContext {
                token: log.address(),
                transaction_hash,
                block_number,
                log_index,
                block_timestamp,
            },
            event,
        }))
    }

    fn sync_state(&self) -> SyncStateRepository<'_> {
        SyncStateRepository::new(&self.processor.database().conn)
    }

    async fn ensure_deployment_block(&self) -> Result<u64> {
        if let Some(state) = self.sync_state().load(&self.contract_address)? {
            info!("Using cached deployment block: {}", state.deployment_block);
            return Ok(state.deployment_block);
        }

        let deployment_block = match self.start_block {
            Some(block) => {
                info!("Using configured start block {}", block);
                block
            }
            None => {
                info!(
                    "Finding deployment block for contract {:?}",
                    self.contract_address
                );
                let latest_block = self.client.get_latest_block().await?;
                find_deployment_block(&self.client, self.contract_address, latest_block).await?
            }
        };

        self.sync_state()
            .insert(&self.contract_address, deployment_block)?;
        Ok(deployment_block)
    }
}
