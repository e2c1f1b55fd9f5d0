//! Registration handler

use sqlx::SqlitePool;
use tracing::{info, instrument, warn};

use crate::auth::{self, SessionStore};
use crate::config::Config;
use crate::error::AppError;
use crate::handlers::commands::{RegisterCommand, RegisterResult};
use crate::store::{AccountStore, NewAccount, StoreError};

/// Handler for account registration.
///
/// Validates the submitted profile fields, hashes the PIN and creates the
/// account row. The unique index on `account_id` is the authority on
/// duplicates; a pre-check only exists to give the common case a clean
/// error without burning an insert.
pub struct RegisterHandler {
    store: AccountStore,
    sessions: SessionStore,
    session_ttl: chrono::Duration,
}

impl RegisterHandler {
    pub fn new(pool: SqlitePool, config: &Config) -> Self {
        Self {
            store: AccountStore::new(pool.clone()),
            sessions: SessionStore::new(pool),
            session_ttl: chrono::Duration::hours(config.session_ttl_hours),
        }
    }

    #[instrument(skip(self, command), fields(account_id = %command.account_id))]
    pub async fn handle(&self, command: RegisterCommand) -> Result<RegisterResult, AppError> {
        auth::validate_name(&command.name).map_err(|msg| AppError::Validation(msg.to_string()))?;
        auth::validate_account_id(&command.account_id)
            .map_err(|msg| AppError::Validation(msg.to_string()))?;
        auth::validate_pin(&command.pin).map_err(|msg| AppError::Validation(msg.to_string()))?;

        if self
            .store
            .find_by_account_id(&command.account_id)
            .await?
            .is_some()
        {
            warn!(account_id = %command.account_id, "registration rejected, account ID taken");
            return Err(AppError::Domain(
                crate::domain::DomainError::DuplicateAccount(command.account_id),
            ));
        }

        let pin_hash = auth::hash_pin(&command.pin);
        let account = match self
            .store
            .create(NewAccount {
                account_id: command.account_id.clone(),
                name: command.name.trim().to_string(),
                pin_hash,
            })
            .await
        {
            Ok(account) => account,
            // Lost a race with a concurrent registration for the same ID.
            Err(StoreError::DuplicateKey(account_id)) => {
                warn!(account_id = %account_id, "registration rejected, account ID taken");
                return Err(AppError::Domain(
                    crate::domain::DomainError::DuplicateAccount(account_id),
                ));
            }
            Err(other) => return Err(other.into()),
        };

        let token = self.sessions.issue_token(account.id, self.session_ttl).await?;

        info!(account_id = %account.account_id, "account registered");

        Ok(RegisterResult { account, token })
    }
}
