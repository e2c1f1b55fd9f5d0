//! Credential service
//!
//! PIN hashing and opaque session tokens. The rest of the system treats
//! this as a capability: it asks for a token to be issued or authenticated
//! and never inspects the stored material.
//!
//! Tokens are 32 random bytes, hex-encoded; only their SHA-256 digest is
//! stored, so a leaked sessions table does not leak usable tokens. PINs are
//! stored as `salt$digest` with a per-account random salt.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Hash a PIN with a fresh random salt.
pub fn hash_pin(pin: &str) -> String {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);

    format!("{}${}", hex::encode(salt), digest_pin(&salt, pin))
}

/// Check an entered PIN against a stored `salt$digest` value.
pub fn verify_pin(pin: &str, stored: &str) -> bool {
    let Some((salt_hex, digest)) = stored.split_once('$') else {
        return false;
    };
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };

    digest_pin(&salt, pin) == digest
}

fn digest_pin(salt: &[u8], pin: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(pin.as_bytes());
    hex::encode(hasher.finalize())
}

fn digest_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

// =========================================================================
// Identity validation (register/login boundary)
// =========================================================================

/// Display name: at most 30 characters including spaces.
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("Please enter your name.");
    }
    if name.chars().count() > 30 {
        return Err("Your fullname must be 30 characters or less, including spaces.");
    }
    Ok(())
}

/// Account ID: digits only, exactly 10 of them.
pub fn validate_account_id(account_id: &str) -> Result<(), &'static str> {
    if !account_id.chars().all(|c| c.is_ascii_digit()) {
        return Err("Your account ID should contain numbers only.");
    }
    if account_id.len() != 10 {
        return Err("Your account ID must be exactly 10 digits long.");
    }
    Ok(())
}

/// PIN: digits only, exactly 4 of them.
pub fn validate_pin(pin: &str) -> Result<(), &'static str> {
    if !pin.chars().all(|c| c.is_ascii_digit()) {
        return Err("Your password should contain numbers only.");
    }
    if pin.len() != 4 {
        return Err("Your password must be exactly 4 digits long.");
    }
    Ok(())
}

// =========================================================================
// Sessions
// =========================================================================

/// Session repository: issues and validates opaque bearer tokens.
#[derive(Debug, Clone)]
pub struct SessionStore {
    pool: SqlitePool,
}

impl SessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Issue a fresh token for an account. Returns the raw token; only its
    /// digest is persisted.
    pub async fn issue_token(
        &self,
        account_pk: Uuid,
        ttl: Duration,
    ) -> Result<String, sqlx::Error> {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let token = hex::encode(bytes);
        let expires_at: DateTime<Utc> = Utc::now() + ttl;

        sqlx::query(
            r#"
            INSERT INTO sessions (token_hash, account_pk, expires_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(digest_token(&token))
        .bind(account_pk.to_string())
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(token)
    }

    /// Resolve a presented token to the account it authenticates, if the
    /// session exists and has not expired.
    pub async fn authenticate(&self, token: &str) -> Result<Option<Uuid>, sqlx::Error> {
        let row: Option<(String, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT account_pk, expires_at
            FROM sessions
            WHERE token_hash = ?
            "#,
        )
        .bind(digest_token(token))
        .fetch_optional(&self.pool)
        .await?;

        let Some((account_pk, expires_at)) = row else {
            return Ok(None);
        };

        if expires_at <= Utc::now() {
            // Expired sessions are dead weight, drop them as we find them
            self.revoke(token).await?;
            return Ok(None);
        }

        Ok(Uuid::parse_str(&account_pk).ok())
    }

    /// Delete the session for a token. Revoking an unknown token is a no-op.
    pub async fn revoke(&self, token: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(digest_token(token))
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
