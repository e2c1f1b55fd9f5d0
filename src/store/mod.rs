//! Account Store module
//!
//! The single shared mutable resource in the system. Balances live here and
//! nowhere else; there is deliberately no in-process cache of them.

mod error;
mod repository;

pub use error::StoreError;
pub use repository::{AccountStore, CommitSide, NewAccount};
