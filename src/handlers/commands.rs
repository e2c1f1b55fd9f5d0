//! Command definitions
//!
//! Commands represent intentions to change the system state, together with
//! the results handlers hand back to the API layer.

use serde_json::Value;

use crate::domain::{Account, LedgerEntry};

// =========================================================================
// RegisterCommand
// =========================================================================

/// Command to register a new account
#[derive(Debug, Clone)]
pub struct RegisterCommand {
    pub name: String,
    pub account_id: String,
    pub pin: String,
}

impl RegisterCommand {
    pub fn new(name: String, account_id: String, pin: String) -> Self {
        Self {
            name,
            account_id,
            pin,
        }
    }
}

/// Result of a successful registration
#[derive(Debug)]
pub struct RegisterResult {
    pub account: Account,
    pub token: String,
}

// =========================================================================
// MutateCommand
// =========================================================================

/// Command to apply one balance-affecting action to the acting account.
///
/// `amount` stays a raw JSON value until the precondition checker has seen
/// it; `target` is the counterparty account ID for transfers or a free-text
/// biller for bill payments.
#[derive(Debug, Clone)]
pub struct MutateCommand {
    pub action: String,
    pub amount: Value,
    pub target: Option<String>,
}

impl MutateCommand {
    pub fn new(action: impl Into<String>, amount: Value) -> Self {
        Self {
            action: action.into(),
            amount,
            target: None,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

/// Result of a successful mutation: the acting account as re-read after
/// commit, plus its full ledger.
#[derive(Debug)]
pub struct MutateResult {
    pub account: Account,
    pub ledger: Vec<LedgerEntry>,
}
