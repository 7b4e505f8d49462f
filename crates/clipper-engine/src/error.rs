//! # Engine Error Types
//!
//! [`EngineError`] is what every engine operation returns; [`ApiError`] is
//! what the web layer serializes.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ValidationError ──► CoreError ──┐                                      │
//! │                                  ├──► EngineError ──► ApiError          │
//! │  sqlx::Error ─────► DbError ─────┘                   {code, message,   │
//! │                                                        status}          │
//! │                                                                         │
//! │  DbError::NotFound          → CoreError::NotFound                       │
//! │  live-slot UniqueViolation  → CoreError::SlotTaken (booking ledger)     │
//! │  anything else from the db  → 500, details logged, never echoed         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Serialization
//! ```json
//! {
//!   "code": "CONFLICT",
//!   "message": "Slot 7f3e... on 2024-06-03 is not available for barber 91ab...",
//!   "status": 400
//! }
//! ```

use std::fmt;

use clipper_core::{CoreError, ErrorKind, ValidationError};
use clipper_db::DbError;
use serde::Serialize;
use thiserror::Error;

// =============================================================================
// Engine Error
// =============================================================================

/// Failure of an engine operation.
///
/// A failed operation leaves every ledger in its pre-call state.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A domain rule rejected the operation.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The store failed.
    #[error(transparent)]
    Db(DbError),
}

impl EngineError {
    /// The stable failure class, `None` for store failures.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            EngineError::Core(err) => Some(err.kind()),
            EngineError::Db(_) => None,
        }
    }
}

impl From<DbError> for EngineError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => EngineError::Core(CoreError::NotFound { entity, id }),
            other => EngineError::Db(other),
        }
    }
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Core(CoreError::Validation(err))
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// API Error
// =============================================================================

/// Error returned to the web layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// HTTP status the web layer should answer with
    pub status: u16,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Slot already held (400)
    Conflict,

    /// Not enough stock (400)
    InsufficientStock,

    /// Terminal order, rest day or past slot (400)
    InvalidState,

    /// Not the owner, or missing capability (403)
    Forbidden,

    /// Input validation failed (400)
    ValidationError,

    /// Database operation failed (500)
    DatabaseError,
}

impl ErrorCode {
    /// HTTP status for this code.
    pub const fn http_status(&self) -> u16 {
        match self {
            ErrorCode::NotFound => 404,
            ErrorCode::Forbidden => 403,
            ErrorCode::Conflict
            | ErrorCode::InsufficientStock
            | ErrorCode::InvalidState
            | ErrorCode::ValidationError => 400,
            ErrorCode::DatabaseError => 500,
        }
    }
}

impl From<ErrorKind> for ErrorCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::NotFound => ErrorCode::NotFound,
            ErrorKind::Conflict => ErrorCode::Conflict,
            ErrorKind::InsufficientResource => ErrorCode::InsufficientStock,
            ErrorKind::InvalidState => ErrorCode::InvalidState,
            ErrorKind::Forbidden => ErrorCode::Forbidden,
            ErrorKind::InvalidInput => ErrorCode::ValidationError,
        }
    }
}

impl ApiError {
    /// Creates a new API error; the status follows the code.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            status: code.http_status(),
        }
    }

    /// Creates a database error with a generic message.
    fn database(message: &str) -> Self {
        ApiError::new(ErrorCode::DatabaseError, message)
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::new(err.kind().into(), err.to_string())
    }
}

/// Converts database errors to API errors.
///
/// Store internals are logged, not returned.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => {
                ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", entity, id))
            }
            DbError::UniqueViolation { field, .. } => {
                tracing::warn!("Unique violation on {}", field);
                ApiError::new(ErrorCode::Conflict, "Resource already exists")
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::CheckViolation { message } => {
                tracing::error!("Check constraint failed: {}", message);
                ApiError::database("Database operation failed")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::database("Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::database("Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                ApiError::database("Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::database("Database transaction failed")
            }
            DbError::PoolExhausted => ApiError::database("Database pool exhausted"),
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::database("Database operation failed")
            }
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Core(e) => e.into(),
            EngineError::Db(e) => e.into(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Unit Tests
// =============================================================================
