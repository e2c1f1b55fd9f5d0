//! Account mutation handler
//!
//! The single entry point through which every balance-affecting action runs:
//! deposits, withdrawals, transfers and bill payments. Validation happens
//! here in one place, then the handler builds ledger entries against a fresh
//! snapshot of the account and commits them with an optimistic version
//! check. A concurrent writer shows up as a version conflict and the whole
//! attempt is retried against re-read state.

use std::time::Duration;

use sqlx::SqlitePool;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::{Account, ActionKind, Amount, DomainError, EntryKind};
use crate::error::AppError;
use crate::handlers::commands::{MutateCommand, MutateResult};
use crate::store::{AccountStore, CommitSide, StoreError};

/// How many times a conflicted commit is retried before giving up.
const MAX_COMMIT_RETRIES: u32 = 10;

/// Base backoff between retries; grows linearly with the attempt number.
const RETRY_BACKOFF: Duration = Duration::from_millis(20);

pub struct MutationHandler {
    store: AccountStore,
}

impl MutationHandler {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            store: AccountStore::new(pool),
        }
    }

    /// Applies `command` on behalf of the authenticated account `acting_id`.
    ///
    /// The amount is checked before the action is parsed, so a request that
    /// is wrong in both ways reports the amount problem.
    #[instrument(skip(self, command), fields(action = %command.action))]
    pub async fn handle(
        &self,
        acting_id: Uuid,
        command: MutateCommand,
    ) -> Result<MutateResult, AppError> {
        let amount = Amount::check(&command.amount)?;
        let action: ActionKind = command.action.parse().map_err(AppError::Domain)?;

        for attempt in 0..MAX_COMMIT_RETRIES {
            let account = self
                .store
                .find_by_id(acting_id)
                .await?
                .ok_or_else(|| AppError::AccountNotFound(acting_id.to_string()))?;

            let outcome = match action {
                ActionKind::Deposit => self.commit_single(&account, EntryKind::Deposit, "", &amount).await,
                ActionKind::Withdraw => {
                    self.commit_single(&account, EntryKind::Withdraw, "", &amount).await
                }
                ActionKind::BillPayment => {
                    let biller = command.target.as_deref().unwrap_or("");
                    self.commit_single(&account, EntryKind::BillPayment, biller, &amount)
                        .await
                }
                ActionKind::Transfer => self.commit_transfer(&account, &command, &amount).await,
            };

            match outcome {
                Ok(()) => {
                    let account = self
                        .store
                        .find_by_id(acting_id)
                        .await?
                        .ok_or_else(|| AppError::AccountNotFound(acting_id.to_string()))?;
                    let ledger = self.store.ledger(account.id).await?;
                    info!(
                        account_id = %account.account_id,
                        action = %action,
                        amount = amount.value(),
                        balance = account.balance,
                        "mutation committed"
                    );
                    return Ok(MutateResult { account, ledger });
                }
                Err(AppError::StorageConflict) => {
                    debug!(attempt, "commit conflicted, retrying against fresh state");
                    tokio::time::sleep(RETRY_BACKOFF * (attempt + 1)).await;
                }
                Err(other) => return Err(other),
            }
        }

        warn!(action = %action, "giving up after {MAX_COMMIT_RETRIES} conflicted commits");
        Err(AppError::StorageConflict)
    }

    /// Commits a one-sided mutation (deposit, withdrawal, bill payment).
    async fn commit_single(
        &self,
        account: &Account,
        kind: EntryKind,
        counterparty: &str,
        amount: &Amount,
    ) -> Result<(), AppError> {
        let entry = match kind {
            EntryKind::Deposit => account.credit_entry(kind, counterparty, amount)?,
            _ => account.debit_entry(kind, counterparty, amount, kind_action(kind))?,
        };
        self.commit_side(account, &entry).await
    }

    /// Commits both sides of a transfer in a single storage transaction.
    ///
    /// Check order is fixed: funds first, then target existence, then the
    /// self-transfer guard.
    async fn commit_transfer(
        &self,
        source: &Account,
        command: &MutateCommand,
        amount: &Amount,
    ) -> Result<(), AppError> {
        source.ensure_funds(amount, ActionKind::Transfer)?;

        let target_id = command.target.as_deref().unwrap_or("");
        let target = self
            .store
            .find_by_account_id(target_id)
            .await?
            .ok_or_else(|| AppError::Domain(DomainError::TargetNotFound(target_id.to_string())))?;

        if target.id == source.id {
            return Err(AppError::Domain(DomainError::SelfTransfer));
        }

        let debit = source.debit_entry(
            EntryKind::TransferOut,
            target.account_id.as_str(),
            amount,
            ActionKind::Transfer,
        )?;
        let credit = target.credit_entry(EntryKind::TransferIn, source.account_id.as_str(), amount)?;

        match self
            .store
            .commit_transfer(
                CommitSide {
                    account: source,
                    entry: &debit,
                },
                CommitSide {
                    account: &target,
                    entry: &credit,
                },
            )
            .await
        {
            Ok(()) => Ok(()),
            Err(StoreError::VersionConflict { .. }) => Err(AppError::StorageConflict),
            Err(other) => Err(other.into()),
        }
    }

    async fn commit_side(&self, account: &Account, entry: &crate::domain::LedgerEntry) -> Result<(), AppError> {
        match self.store.commit(account, entry).await {
            Ok(()) => Ok(()),
            Err(StoreError::VersionConflict { .. }) => Err(AppError::StorageConflict),
            Err(other) => Err(other.into()),
        }
    }
}

fn kind_action(kind: EntryKind) -> ActionKind {
    match kind {
        EntryKind::Deposit | EntryKind::TransferIn => ActionKind::Deposit,
        EntryKind::Withdraw => ActionKind::Withdraw,
        EntryKind::TransferOut => ActionKind::Transfer,
        EntryKind::BillPayment => ActionKind::BillPayment,
    }
}
