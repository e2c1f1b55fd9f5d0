//! Account Store Repository
//!
//! Persistence boundary for accounts and their embedded transaction logs.
//! All concurrency control lives here: every balance update is guarded by an
//! optimistic version check, and a transfer commits both sides inside a
//! single database transaction so a failure on either side rolls back the
//! whole operation.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use crate::domain::{Account, LedgerEntry};

use super::StoreError;

/// Input for account creation. The store assigns the primary key and the
/// creation timestamp.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub account_id: String,
    pub name: String,
    pub pin_hash: String,
}

/// One side of a transfer commit: the account as loaded (for the version
/// check) plus the entry to append. The entry's `resulting_balance` becomes
/// the account's new balance, which keeps the ledger-tail invariant true by
/// construction.
#[derive(Debug)]
pub struct CommitSide<'a> {
    pub account: &'a Account,
    pub entry: &'a LedgerEntry,
}

/// Account store backed by SQLite
#[derive(Debug, Clone)]
pub struct AccountStore {
    pool: SqlitePool,
}

type AccountRow = (String, String, String, String, i64, i64, DateTime<Utc>);

impl AccountStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new account with zero balance and an empty ledger.
    pub async fn create(&self, new: NewAccount) -> Result<Account, StoreError> {
        let account = Account {
            id: Uuid::new_v4(),
            account_id: new.account_id,
            name: new.name,
            pin_hash: new.pin_hash,
            balance: 0,
            version: 1,
            created_at: Utc::now(),
        };

        let result = sqlx::query(
            r#"
            INSERT INTO accounts (id, account_id, name, pin_hash, balance, version, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(account.id.to_string())
        .bind(&account.account_id)
        .bind(&account.name)
        .bind(&account.pin_hash)
        .bind(account.balance)
        .bind(account.version)
        .bind(account.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(account),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::DuplicateKey(account.account_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Look up an account by its public 10-digit identifier.
    pub async fn find_by_account_id(
        &self,
        account_id: &str,
    ) -> Result<Option<Account>, StoreError> {
        let row: Option<AccountRow> = sqlx::query_as(
            r#"
            SELECT id, account_id, name, pin_hash, balance, version, created_at
            FROM accounts
            WHERE account_id = ?
            "#,
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(decode_account).transpose()
    }

    /// Look up an account by its storage primary key.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let row: Option<AccountRow> = sqlx::query_as(
            r#"
            SELECT id, account_id, name, pin_hash, balance, version, created_at
            FROM accounts
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(decode_account).transpose()
    }

    /// Load an account's full transaction log in insertion (chronological)
    /// order.
    pub async fn ledger(&self, account_pk: Uuid) -> Result<Vec<LedgerEntry>, StoreError> {
        let rows: Vec<(String, String, i64, i64, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT kind, counterparty, amount, resulting_balance, occurred_at
            FROM ledger_entries
            WHERE account_pk = ?
            ORDER BY id ASC
            "#,
        )
        .bind(account_pk.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(kind, counterparty, amount, resulting_balance, occurred_at)| {
                let kind = kind.parse().map_err(StoreError::InvalidRow)?;
                Ok(LedgerEntry {
                    kind,
                    counterparty,
                    amount,
                    resulting_balance,
                    occurred_at,
                })
            })
            .collect()
    }

    /// Commit a single-account mutation: set the balance to the entry's
    /// `resulting_balance` and append the entry, atomically.
    ///
    /// The balance update is guarded by the version the caller loaded; a
    /// concurrent commit in between makes the guard miss and the whole
    /// transaction rolls back with [`StoreError::VersionConflict`].
    pub async fn commit(&self, account: &Account, entry: &LedgerEntry) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        Self::apply_side(&mut tx, &CommitSide { account, entry }).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Commit both sides of a transfer as a single unit of work.
    ///
    /// Either both the debit and the credit are durably recorded or neither
    /// is: a version conflict on either side aborts the transaction before
    /// commit, so no money is ever left in flight.
    pub async fn commit_transfer(
        &self,
        debit: CommitSide<'_>,
        credit: CommitSide<'_>,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        Self::apply_side(&mut tx, &debit).await?;
        Self::apply_side(&mut tx, &credit).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Apply one account mutation inside an open transaction.
    async fn apply_side(
        tx: &mut Transaction<'_, Sqlite>,
        side: &CommitSide<'_>,
    ) -> Result<(), StoreError> {
        let updated = sqlx::query(
            r#"
            UPDATE accounts
            SET balance = ?, version = version + 1
            WHERE id = ? AND version = ?
            "#,
        )
        .bind(side.entry.resulting_balance)
        .bind(side.account.id.to_string())
        .bind(side.account.version)
        .execute(&mut **tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::VersionConflict {
                account_id: side.account.account_id.clone(),
                expected: side.account.version,
            });
        }

        sqlx::query(
            r#"
            INSERT INTO ledger_entries (account_pk, kind, counterparty, amount, resulting_balance, occurred_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(side.account.id.to_string())
        .bind(side.entry.kind.as_str())
        .bind(&side.entry.counterparty)
        .bind(side.entry.amount)
        .bind(side.entry.resulting_balance)
        .bind(side.entry.occurred_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

fn decode_account(row: AccountRow) -> Result<Account, StoreError> {
    let (id, account_id, name, pin_hash, balance, version, created_at) = row;
    let id = Uuid::parse_str(&id)
        .map_err(|e| StoreError::InvalidRow(format!("account primary key '{}': {}", id, e)))?;

    Ok(Account {
        id,
        account_id,
        name,
        pin_hash,
        balance,
        version,
        created_at,
    })
}
