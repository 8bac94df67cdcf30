use crate::events::{decimalsCall, nameCall, symbolCall};
use crate::rpc::RpcClient;
use alloy::rpc::types::BlockNumberOrTag;
use alloy_primitives::Address;
use anyhow::Result;
use tracing::{info, warn};

/// Binary search for the first block at which `address` has code.
pub async fn find_deployment_block(
    client: &RpcClient,
    address: Address,
    latest_block: u64,
) -> Result<u64> {
    info!("Searching for deployment block of contract {:?}", address);

    let code = client.get_code_at_block(address, latest_block).await?;
    if code.is_empty() {
        anyhow::bail!("Address {:?} is not a deployed contract", address);
    }

    let mut left = 0u64;
    let mut right = latest_block;

    while left < right {
        let mid = left + (right - left) / 2;

        let code = client.get_code_at_block(address, mid).await?;

        if code.is_empty() {
            left = mid + 1;
        } else {
            right = mid;
        }
    }

    info!("Contract deployed at block {}", left);
    Ok(left)
}

/// Logs the token's descriptive metadata. Absent functions are logged and skipped;
/// indexing never depends on them.
pub async fn fetch_token_metadata(client: &RpcClient, address: Address) {
    info!("Fetching token metadata for {:?}", address);
    let latest = BlockNumberOrTag::Latest;

    let name = match client.call_contract(address, nameCall {}, latest).await {
        Ok(result) => result,
        Err(e) => {
            warn!("Failed to fetch token name: {}", e);
            "<unnamed>".to_string()
        }
    };

    let symbol = match client.call_contract(address, symbolCall {}, latest).await {
        Ok(result) => result,
        Err(e) => {
            warn!("Failed to fetch token symbol: {}", e);
            "?".to_string()
        }
    };

    let decimals = match client.call_contract(address, decimalsCall {}, latest).await {
        Ok(result) => result.to_string(),
        Err(e) => {
            warn!("Failed to fetch token decimals: {}", e);
            "unknown".to_string()
        }
    };

    info!("Token {} ({}), {} decimals", name, symbol, decimals);
}
