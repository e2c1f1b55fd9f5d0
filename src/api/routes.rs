//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{Extension, Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::{self, SessionStore};
use crate::domain::{Account, LedgerEntry};
use crate::error::AppError;
use crate::handlers::{MutateCommand, MutationHandler, RegisterCommand, RegisterHandler};
use crate::store::AccountStore;

use super::middleware::ActingAccount;
use super::AppState;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub account_id: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub account_id: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub success: bool,
    pub token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub account_id: String,
    pub name: String,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            account_id: account.account_id.clone(),
            name: account.name.clone(),
            balance: account.balance,
            created_at: account.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub data: AccountResponse,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
    pub data: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutateRequest {
    pub action: String,
    // Left raw so malformed amounts are reported by the checker,
    // not by serde.
    pub amount: Value,
    #[serde(default)]
    pub target: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntryResponse {
    pub kind: String,
    pub counterparty: String,
    pub amount: i64,
    pub resulting_balance: i64,
    pub occurred_at: DateTime<Utc>,
}

impl From<&LedgerEntry> for LedgerEntryResponse {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            kind: entry.kind.as_str().to_string(),
            counterparty: entry.counterparty.clone(),
            amount: entry.amount,
            resulting_balance: entry.resulting_balance,
            occurred_at: entry.occurred_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MutateResponse {
    pub success: bool,
    pub msg: String,
    pub data: AccountResponse,
    pub transactions: Vec<LedgerEntryResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicAccount {
    pub account_id: String,
    pub name: String,
    pub balance: i64,
}

#[derive(Debug, Serialize)]
pub struct PublicAccountResponse {
    pub success: bool,
    pub data: PublicAccount,
}

#[derive(Debug, Serialize)]
pub struct LedgerResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<LedgerEntryResponse>,
}

// =========================================================================
// Routers
// =========================================================================

/// Routes that do not require a session token
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

/// Routes that require a valid session token
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(me))
        .route("/auth/logout", get(logout))
        .route("/transactions", put(mutate))
        .route("/transactions/me", get(my_transactions))
        .route("/transactions/:account_id", get(account_public_view))
}

// =========================================================================
// POST /auth/register
// =========================================================================

/// Register a new account and issue a session token
async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), AppError> {
    let handler = RegisterHandler::new(state.pool, &state.config);

    let command = RegisterCommand::new(request.name, request.account_id, request.password);
    let result = handler.handle(command).await?;

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            success: true,
            token: result.token,
        }),
    ))
}

// =========================================================================
// POST /auth/login
// =========================================================================

/// Authenticate with account ID and PIN
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    if request.account_id.is_empty() || request.password.is_empty() {
        return Err(AppError::Validation(
            "Please provide an account ID and password".to_string(),
        ));
    }
    auth::validate_account_id(&request.account_id)
        .map_err(|msg| AppError::Validation(msg.to_string()))?;
    auth::validate_pin(&request.password)
        .map_err(|msg| AppError::Validation(msg.to_string()))?;

    let store = AccountStore::new(state.pool.clone());
    let account = store
        .find_by_account_id(&request.account_id)
        .await?
        .ok_or_else(|| AppError::Authentication("Invalid credentials".to_string()))?;

    if !auth::verify_pin(&request.password, &account.pin_hash) {
        return Err(AppError::Authentication("Invalid credentials".to_string()));
    }

    let sessions = SessionStore::new(state.pool);
    let token = sessions
        .issue_token(
            account.id,
            chrono::Duration::hours(state.config.session_ttl_hours),
        )
        .await?;

    tracing::info!(account_id = %account.account_id, "login succeeded");

    Ok(Json(TokenResponse {
        success: true,
        token,
    }))
}

// =========================================================================
// GET /auth/me
// =========================================================================

/// Return the profile of the authenticated account
async fn me(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingAccount>,
) -> Result<Json<ProfileResponse>, AppError> {
    let store = AccountStore::new(state.pool);
    let account = store
        .find_by_id(acting.id)
        .await?
        .ok_or_else(|| AppError::AccountNotFound(acting.id.to_string()))?;

    Ok(Json(ProfileResponse {
        success: true,
        data: AccountResponse::from(&account),
    }))
}

// =========================================================================
// GET /auth/logout
// =========================================================================

/// Revoke the session token used for this request
async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<LogoutResponse>, AppError> {
    if let Some(token) = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        let sessions = SessionStore::new(state.pool);
        sessions.revoke(token).await?;
    }

    Ok(Json(LogoutResponse {
        success: true,
        data: serde_json::json!({}),
    }))
}

// =========================================================================
// PUT /transactions
// =========================================================================

/// Apply one balance-affecting action to the authenticated account
async fn mutate(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingAccount>,
    Json(request): Json<MutateRequest>,
) -> Result<Json<MutateResponse>, AppError> {
    let handler = MutationHandler::new(state.pool);

    let mut command = MutateCommand::new(request.action, request.amount);
    if let Some(target) = request.target {
        command = command.with_target(target);
    }

    // Parsed once more by the handler; used here only for the message.
    let action_label = command.action.clone();

    let result = handler.handle(acting.id, command).await?;

    Ok(Json(MutateResponse {
        success: true,
        msg: format!("Your {} was successful!", action_label),
        data: AccountResponse::from(&result.account),
        transactions: result.ledger.iter().map(LedgerEntryResponse::from).collect(),
    }))
}

// =========================================================================
// GET /transactions/me
// =========================================================================

/// Full transaction log of the authenticated account, oldest first
async fn my_transactions(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingAccount>,
) -> Result<Json<LedgerResponse>, AppError> {
    let store = AccountStore::new(state.pool);
    let entries = store.ledger(acting.id).await?;

    Ok(Json(LedgerResponse {
        success: true,
        count: entries.len(),
        data: entries.iter().map(LedgerEntryResponse::from).collect(),
    }))
}

// =========================================================================
// GET /transactions/:account_id
// =========================================================================

/// Public view of an account, addressed by account ID.
///
/// This is how clients confirm a transfer target before sending money.
/// Only public fields are exposed; the ledger stays private to its owner.
async fn account_public_view(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<Json<PublicAccountResponse>, AppError> {
    let store = AccountStore::new(state.pool);
    let account = store
        .find_by_account_id(&account_id)
        .await?
        .ok_or(AppError::AccountNotFound(account_id))?;

    Ok(Json(PublicAccountResponse {
        success: true,
        data: PublicAccount {
            account_id: account.account_id,
            name: account.name,
            balance: account.balance,
        },
    }))
}
