use alloy_primitives::{Address, B256, U256};
use bigdecimal::BigDecimal;

/// Addresses starting with this prefix stand for mint (no source) or burn (no destination).
pub const ZERO_ADDRESS_PREFIX: &str = "0x000000";

/// Lowercase, 0x-prefixed hex key for an address.
pub fn address_key(address: &Address) -> String {
    format!("{address:?}")
}

pub fn hash_key(hash: &B256) -> String {
    format!("{hash:?}")
}

pub fn is_zero_address(key: &str) -> bool {
    key.starts_with(ZERO_ADDRESS_PREFIX)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub id: String,
}

impl Token {
    pub fn new(id: &str) -> Self {
        Self { id: id.to_string() }
    }
}

/// Shadow of the latest observed total supply; never exposed outside the crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LastTotalSupply {
    pub token_id: String,
    pub total_supply: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplySnapshot {
    pub id: String,
    pub token_id: String,
    pub total_supply: BigDecimal,
    pub timestamp: u64,
}

impl SupplySnapshot {
    pub fn new(id: &str, token_id: &str, total_supply: BigDecimal, timestamp: u64) -> Self {
        Self {
            id: id.to_string(),
            token_id: token_id.to_string(),
            total_supply,
            timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Balance {
    pub id: String,
    pub amount: BigDecimal,
}

impl Balance {
    pub fn zero(id: &str) -> Self {
        Self {
            id: id.to_string(),
            amount: BigDecimal::from(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub id: String,
    pub from_address: String,
    pub to_address: String,
    pub amount: BigDecimal,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Approval {
    pub id: String,
    pub owner: String,
    pub spender: String,
    pub value: U256,
}

impl Approval {
    pub fn new(owner: &str) -> Self {
        Self {
            id: owner.to_string(),
            owner: owner.to_string(),
            spender: String::new(),
            value: U256::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Minter {
    pub id: String,
}

impl Minter {
    pub fn new(id: &str) -> Self {
        Self { id: id.to_string() }
    }
}

/// Scanner progress for one token contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncState {
    pub address: Address,
    pub deployment_block: u64,
    pub last_processed_block: Option<u64>,
    pub last_event: Option<EventPosition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct EventPosition {
    pub block_number: u64,
    pub log_index: u64,
}
