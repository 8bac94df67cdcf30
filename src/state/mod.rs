//! Derivation of token state from the event stream.
//!
//! Every component works on a borrowed connection, which is normally the
//! transaction opened for the event being processed.

pub mod ledger;
pub mod minters;
pub mod recorder;
pub mod scaling;
pub mod supply;

pub use ledger::BalanceLedger;
pub use minters::MinterRegistry;
pub use recorder::Recorder;
pub use scaling::scale_amount;
pub use supply::{SupplyChange, SupplyTracker};
