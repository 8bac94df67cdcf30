use crate::repository::EventPosition;
use alloy::rpc::types::Log;
use alloy::sol;
use alloy::sol_types::SolEvent;
use alloy_primitives::{Address, B256, U256};
use anyhow::{Context, Result};

sol! {
    event Transfer(address indexed from, address indexed to, uint256 value);
    event Approval(address indexed owner, address indexed spender, uint256 value);
    event MinterAdded(address indexed account);
    event MinterRemoved(address indexed account);

    function totalSupply() external view returns (uint256);
    function decimals() external view returns (uint8);
    function name() external view returns (string);
    function symbol() external view returns (string);
}

/// Topic0 values of every event the indexer consumes.
pub fn tracked_topics() -> Vec<B256> {
    vec![
        Transfer::SIGNATURE_HASH,
        Approval::SIGNATURE_HASH,
        MinterAdded::SIGNATURE_HASH,
        MinterRemoved::SIGNATURE_HASH,
    ]
}

/// Fields shared by every inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventContext {
    pub token: Address,
    pub transaction_hash: B256,
    pub block_number: u64,
    pub log_index: u64,
    pub block_timestamp: u64,
}

impl EventContext {
    pub fn position(&self) -> EventPosition {
        EventPosition {
            block_number: self.block_number,
            log_index: self.log_index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenEvent {
    Transfer {
        from: Address,
        to: Address,
        value: U256,
    },
    Approval {
        owner: Address,
        spender: Address,
        value: U256,
    },
    MinterAdded {
        account: Address,
    },
    MinterRemoved {
        account: Address,
    },
}

impl TokenEvent {
    pub fn name(&self) -> &'static str {
        match self {
            TokenEvent::Transfer { .. } => "Transfer",
            TokenEvent::Approval { .. } => "Approval",
            TokenEvent::MinterAdded { .. } => "MinterAdded",
            TokenEvent::MinterRemoved { .. } => "MinterRemoved",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedEvent {
    pub context: EventContext,
    pub event: TokenEvent,
}

pub fn decode_token_event(log: &Log) -> Result<TokenEvent> {
    let topics = log.topics();
    let data = &log.data().data;
    let topic0 = topics.first().context("log has no topics")?;

    let event = if *topic0 == Transfer::SIGNATURE_HASH {
        let decoded = Transfer::decode_raw_log(topics.iter().copied(), data)?;
        TokenEvent::Transfer {
            from: decoded.from,
            to: decoded.to,
            value: decoded.value,
        }
    } else if *topic0 == Approval::SIGNATURE_HASH {
        let decoded = Approval::decode_raw_log(topics.iter().copied(), data)?;
        TokenEvent::Approval {
            owner: decoded.owner,
            spender: decoded.spender,
            value: decoded.value,
        }
    } else if *topic0 == MinterAdded::SIGNATURE_HASH {
        let decoded = MinterAdded::decode_raw_log(topics.iter().copied(), data)?;
        TokenEvent::MinterAdded {
            account: decoded.account,
        }
    } else if *topic0 == MinterRemoved::SIGNATURE_HASH {
        let decoded = MinterRemoved::decode_raw_log(topics.iter().copied(), data)?;
        TokenEvent::MinterRemoved {
            account: decoded.account,
        }
    } else {
        anyhow::bail!("unknown event signature {topic0:?}");
    };

    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{LogData, address, b256};

    fn rpc_log(topics: Vec<B256>, data: Vec<u8>) -> Log {
        Log {
            inner: alloy_primitives::Log {
                address: address!("0x1111111111111111111111111111111111111111"),
                data: LogData::new_unchecked(topics, data.into()),
            },
            ..Default::default()
        }
    }

    fn address_topic(address: Address) -> B256 {
        address.into_word()
    }

    #[test]
    fn decodes_transfer() {
        let from = address!("0x00000000000000000000000000000000000000aa");
        let to = address!("0x00000000000000000000000000000000000000bb");
        let value = U256::from(500u64);
        let log = rpc_log(
            vec![
                Transfer::SIGNATURE_HASH,
                address_topic(from),
                address_topic(to),
            ],
            value.to_be_bytes_vec(),
        );

        let event = decode_token_event(&log).unwrap();
        assert_eq!(event, TokenEvent::Transfer { from, to, value });
        assert_eq!(event.name(), "Transfer");
    }

    #[test]
    fn decodes_minter_added() {
        let account = address!("0xcccccccccccccccccccccccccccccccccccccccc");
        let log = rpc_log(
            vec![MinterAdded::SIGNATURE_HASH, address_topic(account)],
            Vec::new(),
        );

        assert_eq!(
            decode_token_event(&log).unwrap(),
            TokenEvent::MinterAdded { account }
        );
    }

    #[test]
    fn rejects_unknown_signature() {
        let log = rpc_log(
            vec![b256!(
                "0x0000000000000000000000000000000000000000000000000000000000000001"
            )],
            Vec::new(),
        );
        assert!(decode_token_event(&log).is_err());
    }

    #[test]
    fn tracks_four_topics() {
        assert_eq!(tracked_topics().len(), 4);
    }
}
