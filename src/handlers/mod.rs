//! Command handlers
//!
//! Each handler owns one write path: validate the command, load current
//! state, produce ledger entries and commit them through the store.

pub mod commands;
pub mod mutation_handler;
pub mod register_handler;

pub use commands::{MutateCommand, MutateResult, RegisterCommand, RegisterResult};
pub use mutation_handler::MutationHandler;
pub use register_handler::RegisterHandler;
