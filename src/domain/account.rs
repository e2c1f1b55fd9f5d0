//! Account and ledger types
//!
//! The account is the unit of mutation: one mutable balance plus an
//! append-only ledger of balance-affecting events. Ledger entries are
//! produced here, never constructed ad hoc, so the
//! `resulting_balance == balance after the entry` invariant holds by
//! construction.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Amount, DomainError};

/// The four balance-affecting actions a client can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Deposit,
    Withdraw,
    Transfer,
    BillPayment,
}

impl FromStr for ActionKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(Self::Deposit),
            "withdraw" => Ok(Self::Withdraw),
            "transfer" => Ok(Self::Transfer),
            "billpayment" => Ok(Self::BillPayment),
            other => Err(DomainError::UnknownAction(other.to_string())),
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Deposit => "deposit",
            Self::Withdraw => "withdraw",
            Self::Transfer => "transfer",
            Self::BillPayment => "billpayment",
        };
        write!(f, "{}", s)
    }
}

/// Kind of a committed ledger entry.
///
/// Distinct from [`ActionKind`]: a single transfer action produces a
/// `TransferOut` entry on one account and a `TransferIn` entry on the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    #[serde(rename = "deposit")]
    Deposit,
    #[serde(rename = "withdraw")]
    Withdraw,
    #[serde(rename = "transfer-out")]
    TransferOut,
    #[serde(rename = "transfer-in")]
    TransferIn,
    #[serde(rename = "bill-payment")]
    BillPayment,
}

impl EntryKind {
    /// String form used in storage and API responses
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdraw => "withdraw",
            Self::TransferOut => "transfer-out",
            Self::TransferIn => "transfer-in",
            Self::BillPayment => "bill-payment",
        }
    }
}

impl FromStr for EntryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(Self::Deposit),
            "withdraw" => Ok(Self::Withdraw),
            "transfer-out" => Ok(Self::TransferOut),
            "transfer-in" => Ok(Self::TransferIn),
            "bill-payment" => Ok(Self::BillPayment),
            other => Err(format!("unknown ledger entry kind '{}'", other)),
        }
    }
}

/// One immutable record of a balance-affecting event.
///
/// `resulting_balance` is the owning account's balance after this entry was
/// applied. It is redundant with the balance column but load-bearing for
/// history display and for the ledger-tail consistency invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub kind: EntryKind,
    /// Empty, the other account's ID for transfers, or a free-text biller
    pub counterparty: String,
    pub amount: i64,
    pub resulting_balance: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Account record: identity, one mutable balance, and metadata used by the
/// store's optimistic locking.
///
/// Deliberately not `Serialize`: the PIN hash must never reach a client, so
/// response shapes are built explicitly at the API layer.
#[derive(Debug, Clone)]
pub struct Account {
    /// Storage primary key
    pub id: Uuid,
    /// 10-digit public account identifier
    pub account_id: String,
    pub name: String,
    /// Opaque credential digest, never serialized
    pub pin_hash: String,
    /// Non-negative, in smallest currency units
    pub balance: i64,
    /// Optimistic-lock version, bumped on every committed mutation
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Check that the balance covers `amount`, without mutating anything.
    ///
    /// Split out from [`Account::debit_entry`] because the transfer flow
    /// must report insufficient funds before the target account is even
    /// looked up.
    pub fn ensure_funds(&self, amount: &Amount, action: ActionKind) -> Result<(), DomainError> {
        if amount.value() > self.balance {
            return Err(DomainError::InsufficientFunds(action));
        }
        Ok(())
    }

    /// Build the ledger entry for a credit (balance increase).
    pub fn credit_entry(
        &self,
        kind: EntryKind,
        counterparty: impl Into<String>,
        amount: &Amount,
    ) -> Result<LedgerEntry, DomainError> {
        let resulting_balance = self
            .balance
            .checked_add(amount.value())
            .ok_or(DomainError::BalanceOverflow)?;

        Ok(LedgerEntry {
            kind,
            counterparty: counterparty.into(),
            amount: amount.value(),
            resulting_balance,
            occurred_at: Utc::now(),
        })
    }

    /// Build the ledger entry for a debit (balance decrease), enforcing the
    /// non-negative balance invariant.
    pub fn debit_entry(
        &self,
        kind: EntryKind,
        counterparty: impl Into<String>,
        amount: &Amount,
        action: ActionKind,
    ) -> Result<LedgerEntry, DomainError> {
        self.ensure_funds(amount, action)?;

        Ok(LedgerEntry {
            kind,
            counterparty: counterparty.into(),
            amount: amount.value(),
            resulting_balance: self.balance - amount.value(),
            occurred_at: Utc::now(),
        })
    }
}
