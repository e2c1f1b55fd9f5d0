//! cubank library
//!
//! Account ledger service: numeric account IDs with PIN authentication,
//! a single balance per account and an append-only transaction log.
//! Re-exports modules for integration testing and the server binary.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod store;

pub use api::build_router;
pub use config::Config;
pub use error::AppError;
pub use domain::{Account, ActionKind, Amount, AmountError, DomainError, EntryKind, LedgerEntry};
