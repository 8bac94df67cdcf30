use crate::repository::{Approval, ApprovalRepository, Transfer, TransferRepository};
use alloy_primitives::U256;
use anyhow::Result;
use bigdecimal::BigDecimal;
use rusqlite::Connection;

/// Append-only transfer log plus the latest approval per owner.
pub struct Recorder<'a> {
    transfers: TransferRepository<'a>,
    approvals: ApprovalRepository<'a>,
}

impl<'a> Recorder<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self {
            transfers: TransferRepository::new(conn),
            approvals: ApprovalRepository::new(conn),
        }
    }

    pub fn record_transfer(
        &self,
        transaction_hash: &str,
        from: &str,
        to: &str,
        amount: BigDecimal,
        timestamp: u64,
    ) -> Result<()> {
        self.transfers.insert(&Transfer {
            id: transaction_hash.to_string(),
            from_address: from.to_string(),
            to_address: to.to_string(),
            amount,
            timestamp,
        })
    }

    pub fn record_approval(&self, owner: &str, spender: &str, value: U256) -> Result<()> {
        let mut approval = self
            .approvals
            .load(owner)?
            .unwrap_or_else(|| Approval::new(owner));

        approval.owner = owner.to_string();
        approval.spender = spender.to_string();
        approval.value = value;
        self.approvals.save(&approval)
    }
}
