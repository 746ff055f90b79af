//! Application error type and stable machine codes
//!
//! Every layer returns `AppError`; the axum boundary renders it to the wire
//! format `{error: {code, message, details?}}`. Codes are stable strings that
//! clients may match on.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::Value;

/// Stable machine-readable error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Validation
    ValidationError,
    IdempotencyKeyMissing,
    // Lookup
    UserNotFound,
    AssetTypeNotFound,
    UserWalletNotFound,
    AssetWalletNotFound,
    // Idempotency
    IdempotencyKeyReusedWithDifferentRequest,
    RequestAlreadyInProgress,
    IdempotencyStateNotFound,
    IdempotencyContextMissing,
    // Business
    InsufficientFunds,
    // Concurrency
    OptimisticLockConflict,
    LockedWalletMismatch,
    DistributedLockNotAcquired,
    LockKeysMissing,
    // Configuration
    TreasuryWalletNotConfigured,
    // Fallback
    InternalServerError,
    RouteNotFound,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::IdempotencyKeyMissing => "IDEMPOTENCY_KEY_MISSING",
            ErrorCode::UserNotFound => "USER_NOT_FOUND",
            ErrorCode::AssetTypeNotFound => "ASSET_TYPE_NOT_FOUND",
            ErrorCode::UserWalletNotFound => "USER_WALLET_NOT_FOUND",
            ErrorCode::AssetWalletNotFound => "ASSET_WALLET_NOT_FOUND",
            ErrorCode::IdempotencyKeyReusedWithDifferentRequest => {
                "IDEMPOTENCY_KEY_REUSED_WITH_DIFFERENT_REQUEST"
            }
            ErrorCode::RequestAlreadyInProgress => "REQUEST_ALREADY_IN_PROGRESS",
            ErrorCode::IdempotencyStateNotFound => "IDEMPOTENCY_STATE_NOT_FOUND",
            ErrorCode::IdempotencyContextMissing => "IDEMPOTENCY_CONTEXT_MISSING",
            ErrorCode::InsufficientFunds => "INSUFFICIENT_FUNDS",
            ErrorCode::OptimisticLockConflict => "OPTIMISTIC_LOCK_CONFLICT",
            ErrorCode::LockedWalletMismatch => "LOCKED_WALLET_MISMATCH",
            ErrorCode::DistributedLockNotAcquired => "DISTRIBUTED_LOCK_NOT_ACQUIRED",
            ErrorCode::LockKeysMissing => "LOCK_KEYS_MISSING",
            ErrorCode::TreasuryWalletNotConfigured => "TREASURY_WALLET_NOT_CONFIGURED",
            ErrorCode::InternalServerError => "INTERNAL_SERVER_ERROR",
            ErrorCode::RouteNotFound => "ROUTE_NOT_FOUND",
        }
    }
}

/// Unified application error
///
/// Carries an HTTP status, a stable machine code and a human message.
/// `details` is optional structured context (offending wallet id, etc.).
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<Value>,
}

impl AppError {
    pub fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorCode::ValidationError, msg)
    }

    pub fn idempotency_key_missing() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            ErrorCode::IdempotencyKeyMissing,
            "Idempotency-Key header is required",
        )
    }

    pub fn user_not_found(user_id: impl std::fmt::Display) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            ErrorCode::UserNotFound,
            format!("User not found: {}", user_id),
        )
    }

    pub fn asset_type_not_found(code: &str) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            ErrorCode::AssetTypeNotFound,
            format!("Asset type not found: {}", code),
        )
    }

    pub fn user_wallet_not_found(code: &str) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            ErrorCode::UserWalletNotFound,
            format!("User has no wallet for asset: {}", code),
        )
    }

    pub fn asset_wallet_not_found(code: &str) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            ErrorCode::AssetWalletNotFound,
            format!("No wallet found for asset: {}", code),
        )
    }

    pub fn idempotency_key_reused() -> Self {
        Self::new(
            StatusCode::CONFLICT,
            ErrorCode::IdempotencyKeyReusedWithDifferentRequest,
            "Idempotency key was already used with a different request",
        )
    }

    pub fn request_in_progress() -> Self {
        Self::new(
            StatusCode::CONFLICT,
            ErrorCode::RequestAlreadyInProgress,
            "A request with this idempotency key is already being processed",
        )
    }

    pub fn insufficient_funds() -> Self {
        Self::new(
            StatusCode::CONFLICT,
            ErrorCode::InsufficientFunds,
            "Insufficient funds in source wallet",
        )
    }

    pub fn optimistic_conflict(wallet_id: impl std::fmt::Display) -> Self {
        Self::new(
            StatusCode::CONFLICT,
            ErrorCode::OptimisticLockConflict,
            format!("Concurrent modification detected on wallet {}", wallet_id),
        )
    }

    pub fn locked_wallet_mismatch(expected: usize, got: usize) -> Self {
        Self::new(
            StatusCode::CONFLICT,
            ErrorCode::LockedWalletMismatch,
            format!("Expected to lock {} wallets, locked {}", expected, got),
        )
    }

    pub fn lock_unavailable() -> Self {
        Self::new(
            StatusCode::LOCKED,
            ErrorCode::DistributedLockNotAcquired,
            "Could not acquire wallet lock, please retry",
        )
    }

    pub fn lock_keys_missing() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            ErrorCode::LockKeysMissing,
            "No wallet ids provided for locking",
        )
    }

    pub fn treasury_not_configured(code: &str) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::TreasuryWalletNotConfigured,
            format!("TREASURY wallet is not configured for asset: {}", code),
        )
    }

    pub fn idempotency_context_missing() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::IdempotencyContextMissing,
            "Mutation dispatched without idempotency context",
        )
    }

    pub fn idempotency_state_not_found(key: &str) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::IdempotencyStateNotFound,
            format!("Transaction row vanished for idempotency key: {}", key),
        )
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalServerError,
            msg,
        )
    }

    pub fn route_not_found() -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            ErrorCode::RouteNotFound,
            "No such route",
        )
    }

    /// Wire form of this error, also persisted into failed transaction rows.
    pub fn to_body(&self) -> Value {
        let mut inner = serde_json::json!({
            "code": self.code.as_str(),
            "message": self.message,
        });
        if let Some(details) = &self.details {
            inner["details"] = details.clone();
        }
        serde_json::json!({ "error": inner })
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        if self.status.is_server_error() {
            tracing::error!(code = self.code.as_str(), "{}", self.message);
        }
        (self.status, Json(self.to_body())).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::internal(format!("Database error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable_strings() {
        assert_eq!(
            ErrorCode::IdempotencyKeyReusedWithDifferentRequest.as_str(),
            "IDEMPOTENCY_KEY_REUSED_WITH_DIFFERENT_REQUEST"
        );
        assert_eq!(ErrorCode::InsufficientFunds.as_str(), "INSUFFICIENT_FUNDS");
        assert_eq!(
            ErrorCode::DistributedLockNotAcquired.as_str(),
            "DISTRIBUTED_LOCK_NOT_ACQUIRED"
        );
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::lock_unavailable().status, StatusCode::LOCKED);
        assert_eq!(AppError::insufficient_funds().status, StatusCode::CONFLICT);
        assert_eq!(
            AppError::lock_keys_missing().status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::treasury_not_configured("GOLD_COINS").status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_body_shape() {
        let body = AppError::insufficient_funds().to_body();
        assert_eq!(body["error"]["code"], "INSUFFICIENT_FUNDS");
        assert!(body["error"]["message"].is_string());
        assert!(body["error"].get("details").is_none());

        let with_details = AppError::optimistic_conflict("w1")
            .with_details(serde_json::json!({"walletId": "w1"}))
            .to_body();
        assert_eq!(with_details["error"]["details"]["walletId"], "w1");
    }
}
