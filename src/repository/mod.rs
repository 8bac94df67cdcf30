pub mod approval_repository;
pub mod balance_repository;
pub mod database;
pub mod minter_repository;
pub mod models;
pub mod supply_repository;
pub mod sync_state_repository;
pub mod token_repository;
pub mod transfer_repository;

pub use approval_repository::ApprovalRepository;
pub use balance_repository::BalanceRepository;
pub use database::Database;
pub use minter_repository::MinterRepository;
pub use models::{
    Approval, Balance, EventPosition, Minter, SupplySnapshot, SyncState, Token, Transfer,
    address_key, hash_key, is_zero_address,
};
pub use supply_repository::SupplyRepository;
pub use sync_state_repository::SyncStateRepository;
pub use token_repository::TokenRepository;
pub use transfer_repository::TransferRepository;
