//! Database module
//!
//! SQLite pool creation and schema initialization. The schema is created at
//! startup; every statement is idempotent, so restarting against an existing
//! database is safe.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::config::Config;

/// Create the connection pool.
///
/// WAL keeps readers unblocked while a writer commits; the busy timeout
/// makes concurrent writers queue instead of failing immediately.
pub async fn connect(config: &Config) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect_with(options)
        .await
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS accounts (
        id TEXT PRIMARY KEY,
        account_id TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        pin_hash TEXT NOT NULL,
        balance INTEGER NOT NULL DEFAULT 0 CHECK (balance >= 0),
        version INTEGER NOT NULL DEFAULT 1,
        created_at DATETIME NOT NULL
    )
    "#,
    // Insertion order (the autoincrement id) is chronological order; entries
    // are never updated or deleted.
    r#"
    CREATE TABLE IF NOT EXISTS ledger_entries (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        account_pk TEXT NOT NULL,
        kind TEXT NOT NULL,
        counterparty TEXT NOT NULL DEFAULT '',
        amount INTEGER NOT NULL CHECK (amount > 0),
        resulting_balance INTEGER NOT NULL CHECK (resulting_balance >= 0),
        occurred_at DATETIME NOT NULL,
        FOREIGN KEY (account_pk) REFERENCES accounts(id)
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_ledger_entries_account
    ON ledger_entries(account_pk)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sessions (
        token_hash TEXT PRIMARY KEY,
        account_pk TEXT NOT NULL,
        expires_at DATETIME NOT NULL,
        FOREIGN KEY (account_pk) REFERENCES accounts(id)
    )
    "#,
];

/// Create all tables and indexes if they do not exist yet.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }

    tracing::debug!("Database schema verified");
    Ok(())
}
