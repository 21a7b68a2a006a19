//! Core error types for pomofocus-core.
//!
//! Timer and recorder side effects never surface these: storage and gateway
//! failures there are logged and swallowed. Explicit user operations (task
//! edits, settings writes, purchases) return them so a front end can report.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for pomofocus-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Key-value storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Audio / notification / entitlement gateway errors
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Purchase flow errors
    #[error("Purchase error: {0}")]
    Purchase(#[from] PurchaseError),

    /// Configuration file errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Lookup by id failed
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Feature is locked behind the premium entitlement
    #[error("'{feature}' requires premium")]
    PremiumRequired { feature: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),

    /// In-memory store poisoned by a panicking writer
    #[error("Store lock poisoned")]
    Poisoned,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Errors reported by the audio, notification and entitlement gateways.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The platform refused or could not perform the request
    #[error("{gateway} unavailable: {message}")]
    Unavailable {
        gateway: &'static str,
        message: String,
    },
}

/// Purchase flow failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PurchaseError {
    /// The user dismissed the purchase sheet
    #[error("Purchase cancelled by user")]
    Cancelled,

    /// Product id unknown to the store
    #[error("Unknown product: {0}")]
    ProductNotFound(String),

    /// Nothing to restore for this account
    #[error("No previous purchases to restore")]
    NothingToRestore,

    /// Store transport failure
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl PurchaseError {
    /// Message to show the user, if any. Cancellation is silent.
    pub fn user_message(&self) -> Option<String> {
        match self {
            PurchaseError::Cancelled => None,
            other => Some(other.to_string()),
        }
    }
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Empty required text field
    #[error("'{0}' must not be empty")]
    Empty(&'static str),

    /// Out of range
    #[error("Value {value} for '{field}' is outside {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked
                    || e.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

impl CoreError {
    pub(crate) fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            kind,
            id: id.into(),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
