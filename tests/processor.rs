use alloy_primitives::{Address, B256, U256, address};
use anyhow::{Result, anyhow};
use bigdecimal::BigDecimal;
use erc20_ledger_indexer::events::{EventContext, IndexedEvent, TokenEvent};
use erc20_ledger_indexer::processor::{EventProcessor, SupplyReading, TokenReader};
use erc20_ledger_indexer::repository::{
    ApprovalRepository, BalanceRepository, Database, EventPosition, MinterRepository,
    SupplyRepository, SyncStateRepository, Token, TokenRepository, TransferRepository,
    address_key,
};
use std::collections::VecDeque;
use std::future::Future;
use std::str::FromStr;
use std::sync::Mutex;

const TOKEN: Address = address!("0x7777777777777777777777777777777777777777");
const ALICE: Address = address!("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
const BOB: Address = address!("0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");
const CAROL: Address = address!("0xcccccccccccccccccccccccccccccccccccccccc");

/// Hands out pre-arranged contract readings in order.
#[derive(Default)]
struct ScriptedReader {
    readings: Mutex<VecDeque<Result<SupplyReading, String>>>,
}

impl ScriptedReader {
    fn with_supplies(decimals: u8, supplies: &[u64]) -> Self {
        let readings = supplies
            .iter()
            .map(|supply| {
                Ok(SupplyReading {
                    total_supply: U256::from(*supply),
                    decimals,
                })
            })
            .collect();
        Self {
            readings: Mutex::new(readings),
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            readings: Mutex::new(VecDeque::from([Err(message.to_string())])),
        }
    }
}

impl TokenReader for ScriptedReader {
    fn read_supply(
        &self,
        _token: Address,
        _block_number: u64,
    ) -> impl Future<Output = Result<SupplyReading>> + Send {
        let next = self.readings.lock().unwrap().pop_front();
        async move {
            match next {
                Some(Ok(reading)) => Ok(reading),
                Some(Err(message)) => Err(anyhow!(message)),
                None => Err(anyhow!("no reading scripted")),
            }
        }
    }
}

fn processor(reader: ScriptedReader) -> EventProcessor<ScriptedReader> {
    EventProcessor::new(Database::in_memory().unwrap(), reader)
}

fn context(seq: u8) -> EventContext {
    EventContext {
        token: TOKEN,
        transaction_hash: B256::with_last_byte(seq),
        block_number: 100 + u64::from(seq),
        log_index: 0,
        block_timestamp: 1_600_000_000 + u64::from(seq),
    }
}

fn transfer(seq: u8, from: Address, to: Address, value: u64) -> IndexedEvent {
    IndexedEvent {
        context: context(seq),
        event: TokenEvent::Transfer {
            from,
            to,
            value: U256::from(value),
        },
    }
}

fn decimal(value: &str) -> BigDecimal {
    BigDecimal::from_str(value).unwrap()
}

fn balance(processor: &EventProcessor<ScriptedReader>, address: &Address) -> Option<BigDecimal> {
    BalanceRepository::new(&processor.database().conn)
        .load(&address_key(address))
        .unwrap()
        .map(|b| b.amount)
}

#[tokio::test]
async fn first_transfer_creates_token_snapshot_log_and_balances() {
    let processor = processor(ScriptedReader::with_supplies(2, &[1000]));

    processor.process(&transfer(1, ALICE, BOB, 500)).await.unwrap();

    let conn = &processor.database().conn;
    let token_id = address_key(&TOKEN);

    assert_eq!(
        TokenRepository::new(conn).load(&token_id).unwrap(),
        Some(Token::new(&token_id))
    );

    let snapshots = SupplyRepository::new(conn)
        .snapshots_for_token(&token_id)
        .unwrap();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].total_supply, decimal("10.00"));
    assert_eq!(snapshots[0].id, format!("{:?}", B256::with_last_byte(1)));
    assert_eq!(snapshots[0].timestamp, 1_600_000_001);

    let logged = TransferRepository::new(conn)
        .load(&format!("{:?}", B256::with_last_byte(1)))
        .unwrap()
        .unwrap();
    assert_eq!(logged.from_address, address_key(&ALICE));
    assert_eq!(logged.to_address, address_key(&BOB));
    assert_eq!(logged.amount, decimal("5.00"));

    assert_eq!(balance(&processor, &ALICE), Some(decimal("-5.00")));
    assert_eq!(balance(&processor, &BOB), Some(decimal("5.00")));
}

#[tokio::test]
async fn supply_history_grows_only_on_change() {
    let supplies = [100, 100, 150, 150, 150, 200];
    let processor = processor(ScriptedReader::with_supplies(0, &supplies));

    for seq in 0..supplies.len() as u8 {
        processor
            .process(&transfer(seq, ALICE, BOB, 1))
            .await
            .unwrap();
    }

    let history: Vec<_> = SupplyRepository::new(&processor.database().conn)
        .snapshots_for_token(&address_key(&TOKEN))
        .unwrap()
        .into_iter()
        .map(|s| s.total_supply)
        .collect();
    assert_eq!(history, vec![decimal("100"), decimal("150"), decimal("200")]);

    assert_eq!(
        TransferRepository::new(&processor.database().conn)
            .count()
            .unwrap(),
        supplies.len()
    );
}

#[tokio::test]
async fn mint_and_burn_never_track_zero_address() {
    let processor = processor(ScriptedReader::with_supplies(18, &[0, 0]));
    let one_token = 1_000_000_000_000_000_000u64;

    processor
        .process(&transfer(1, Address::ZERO, ALICE, 3 * one_token))
        .await
        .unwrap();
    processor
        .process(&transfer(2, ALICE, Address::ZERO, one_token))
        .await
        .unwrap();

    assert_eq!(balance(&processor, &ALICE), Some(decimal("2")));
    assert_eq!(balance(&processor, &Address::ZERO), None);
    assert_eq!(
        BalanceRepository::new(&processor.database().conn)
            .count()
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn failed_contract_read_leaves_no_state() {
    let processor = processor(ScriptedReader::failing("execution reverted"));

    let err = processor
        .process(&transfer(1, ALICE, BOB, 500))
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("execution reverted"));

    let conn = &processor.database().conn;
    assert!(
        TokenRepository::new(conn)
            .load(&address_key(&TOKEN))
            .unwrap()
            .is_none()
    );
    assert_eq!(TransferRepository::new(conn).count().unwrap(), 0);
    assert_eq!(BalanceRepository::new(conn).count().unwrap(), 0);
}

#[tokio::test]
async fn missing_shadow_supply_rolls_back_whole_event() {
    let processor = processor(ScriptedReader::with_supplies(0, &[100]));
    let conn = &processor.database().conn;
    TokenRepository::new(conn)
        .save(&Token::new(&address_key(&TOKEN)))
        .unwrap();

    let err = processor
        .process(&transfer(1, ALICE, BOB, 5))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no last total supply"));

    assert_eq!(TransferRepository::new(conn).count().unwrap(), 0);
    assert_eq!(BalanceRepository::new(conn).count().unwrap(), 0);
    assert!(
        SyncStateRepository::new(conn)
            .load(&TOKEN)
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn approval_keeps_only_latest_per_owner() {
    let processor = processor(ScriptedReader::default());

    processor
        .process(&IndexedEvent {
            context: context(1),
            event: TokenEvent::Approval {
                owner: ALICE,
                spender: BOB,
                value: U256::from(10u64),
            },
        })
        .await
        .unwrap();
    processor
        .process(&IndexedEvent {
            context: context(2),
            event: TokenEvent::Approval {
                owner: ALICE,
                spender: CAROL,
                value: U256::from(20u64),
            },
        })
        .await
        .unwrap();

    let approvals = ApprovalRepository::new(&processor.database().conn);
    assert_eq!(approvals.count().unwrap(), 1);

    let approval = approvals.load(&address_key(&ALICE)).unwrap().unwrap();
    assert_eq!(approval.owner, address_key(&ALICE));
    assert_eq!(approval.spender, address_key(&CAROL));
    assert_eq!(approval.value, U256::from(20u64));
}

#[tokio::test]
async fn minters_are_added_once_and_removed() {
    let processor = processor(ScriptedReader::default());
    let minter_event = |seq, event| IndexedEvent {
        context: context(seq),
        event,
    };

    processor
        .process(&minter_event(1, TokenEvent::MinterAdded { account: CAROL }))
        .await
        .unwrap();
    processor
        .process(&minter_event(2, TokenEvent::MinterAdded { account: CAROL }))
        .await
        .unwrap();

    let minters = MinterRepository::new(&processor.database().conn);
    let ids: Vec<_> = minters.list().unwrap().into_iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![address_key(&CAROL)]);

    processor
        .process(&minter_event(3, TokenEvent::MinterRemoved { account: CAROL }))
        .await
        .unwrap();
    assert!(minters.list().unwrap().is_empty());
}

#[tokio::test]
async fn applied_events_advance_stream_position() {
    let processor = processor(ScriptedReader::with_supplies(0, &[10]));

    processor.process(&transfer(4, ALICE, BOB, 1)).await.unwrap();

    let state = SyncStateRepository::new(&processor.database().conn)
        .load(&TOKEN)
        .unwrap()
        .unwrap();
    assert_eq!(
        state.last_event,
        Some(EventPosition {
            block_number: 104,
            log_index: 0,
        })
    );
}

#[tokio::test]
async fn batch_is_applied_in_chain_order() {
    let processor = processor(ScriptedReader::default());
    let removed = IndexedEvent {
        context: context(2),
        event: TokenEvent::MinterRemoved { account: CAROL },
    };
    let added = IndexedEvent {
        context: context(1),
        event: TokenEvent::MinterAdded { account: CAROL },
    };

    let applied = processor.apply_batch(vec![removed, added]).await.unwrap();

    assert_eq!(applied, 2);
    assert!(
        MinterRepository::new(&processor.database().conn)
            .list()
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn replayed_batch_is_skipped_after_restart() {
    // One reading per transfer; a second application of any event would run dry.
    let processor = processor(ScriptedReader::with_supplies(0, &[10, 10]));
    let batch = || vec![transfer(2, BOB, ALICE, 1), transfer(1, ALICE, BOB, 3)];

    assert_eq!(processor.apply_batch(batch()).await.unwrap(), 2);
    assert_eq!(processor.apply_batch(batch()).await.unwrap(), 0);

    assert_eq!(balance(&processor, &ALICE), Some(decimal("-2")));
    assert_eq!(balance(&processor, &BOB), Some(decimal("2")));
}

#[tokio::test]
async fn overlapping_batch_applies_only_new_events() {
    let processor = processor(ScriptedReader::with_supplies(0, &[10, 10, 10]));

    processor
        .apply_batch(vec![transfer(1, ALICE, BOB, 1), transfer(2, ALICE, BOB, 1)])
        .await
        .unwrap();

    let applied = processor
        .apply_batch(vec![
            transfer(3, ALICE, CAROL, 5),
            transfer(2, ALICE, BOB, 1),
            transfer(1, ALICE, BOB, 1),
        ])
        .await
        .unwrap();

    assert_eq!(applied, 1);
    assert_eq!(balance(&processor, &ALICE), Some(decimal("-7")));
    assert_eq!(balance(&processor, &BOB), Some(decimal("2")));
    assert_eq!(balance(&processor, &CAROL), Some(decimal("5")));

    let state = SyncStateRepository::new(&processor.database().conn)
        .load(&TOKEN)
        .unwrap()
        .unwrap();
    assert_eq!(
        state.last_event,
        Some(EventPosition {
            block_number: 103,
            log_index: 0,
        })
    );
}
