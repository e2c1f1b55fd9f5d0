//! Account Store Errors
//!
//! Error types for persistence operations.

/// Errors that can occur in the account store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Optimistic concurrency conflict: another mutation committed first
    #[error("Version conflict for account {account_id}: expected version {expected}")]
    VersionConflict { account_id: String, expected: i64 },

    /// Unique constraint violation on account creation
    #[error("Account ID already exists: {0}")]
    DuplicateKey(String),

    /// A stored row failed to decode into a domain value
    #[error("Corrupt row in store: {0}")]
    InvalidRow(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Check if this error is a concurrency conflict
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, StoreError::VersionConflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_conflict_detection() {
        let conflict = StoreError::VersionConflict {
            account_id: "1234567890".to_string(),
            expected: 3,
        };
        assert!(conflict.is_version_conflict());

        let duplicate = StoreError::DuplicateKey("1234567890".to_string());
        assert!(!duplicate.is_version_conflict());
    }
}
