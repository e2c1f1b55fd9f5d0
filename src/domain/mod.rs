//! Domain module
//!
//! Pure business types and rules: validated amounts, the account record and
//! its ledger, and the business-rule errors they can raise. Nothing in here
//! performs I/O.

pub mod account;
pub mod amount;
pub mod error;

pub use account::{Account, ActionKind, EntryKind, LedgerEntry};
pub use amount::{Amount, AmountError};
pub use error::DomainError;
