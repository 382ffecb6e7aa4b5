//! Error types for the Artify backend.
//!
//! One enum per layer:
//!
//! - [`StorageError`] - Persistence backend errors
//! - [`PinningError`] - Pinning proxy / provider errors
//! - [`DraftError`] - Creator input validation errors
//! - [`IssuanceError`] - Coin deployment and trade errors
//! - [`MarketError`] - Marketplace aggregation and trade validation errors
//! - [`WorkflowError`] - Submission workflow errors
//! - [`ServerError`] - HTTP server errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors from a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO error.
    #[error("Storage IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error.
    #[error("Storage JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The backend lock was poisoned by a panicking writer.
    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),
}

// =============================================================================
// Pinning Errors
// =============================================================================

/// Errors while uploading content to the pinning provider.
#[derive(Debug, Error)]
pub enum PinningError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Provider (or proxy) answered with a non-success status.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// Success response without any content identifier.
    #[error("Pinning response did not contain a content identifier")]
    MissingCid,

    /// Provider credential is not configured.
    #[error("Missing PINATA_JWT environment variable")]
    MissingCredential,

    /// JSON error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl From<reqwest::Error> for PinningError {
    fn from(err: reqwest::Error) -> Self {
        PinningError::HttpError(err.to_string())
    }
}

// =============================================================================
// Draft Validation Errors
// =============================================================================

/// A creator draft is missing a required field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("Name is required")]
    MissingName,

    #[error("Description is required")]
    MissingDescription,

    #[error("Image is required")]
    MissingImage,

    #[error("File is required")]
    MissingFile,

    #[error("Link is required")]
    MissingLink,

    #[error("Link must be an http(s) URL")]
    InvalidLink,

    #[error("Unknown content type: {0}")]
    UnknownContentType(String),
}

// =============================================================================
// Issuance Errors
// =============================================================================

/// Error returned by the token-issuance service.
///
/// The service only gives us a message and, sometimes, the hash of a
/// transaction that was broadcast before the failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct IssuanceError {
    pub message: String,
    pub tx_hash: Option<String>,
}

impl IssuanceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), tx_hash: None }
    }

    pub fn with_tx_hash(mut self, tx_hash: impl Into<String>) -> Self {
        self.tx_hash = Some(tx_hash.into());
        self
    }
}

impl From<reqwest::Error> for IssuanceError {
    fn from(err: reqwest::Error) -> Self {
        IssuanceError::new(err.to_string())
    }
}

// =============================================================================
// Market Errors
// =============================================================================

/// Errors from marketplace reads and trade validation.
#[derive(Debug, Error)]
pub enum MarketError {
    /// Remote statistics or chain read failed.
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// JSON-RPC node returned an error object.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Amount could not be parsed or is not positive.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Sell amount exceeds the wallet balance.
    #[error("Insufficient balance: have {available}, need {requested}")]
    InsufficientBalance { available: String, requested: String },

    /// Another trade on the same item is still pending.
    #[error("A trade is already pending for {0}")]
    TradePending(String),

    /// Trade call failed.
    #[error("Trade failed: {0}")]
    Issuance(#[from] IssuanceError),

    /// Local storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<reqwest::Error> for MarketError {
    fn from(err: reqwest::Error) -> Self {
        MarketError::HttpError(err.to_string())
    }
}

// =============================================================================
// Workflow Errors (top-level)
// =============================================================================

/// Submission workflow errors.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Draft validation failed, no upload was attempted.
    #[error("{0}")]
    Draft(#[from] DraftError),

    /// Upload failed.
    #[error("{0}")]
    Pinning(#[from] PinningError),

    /// A submission is already uploading.
    #[error("A submission is already in progress")]
    Busy,
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Could not bind or serve.
    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type for pinning operations.
pub type PinningResult<T> = Result<T, PinningError>;

/// Result type for issuance operations.
pub type IssuanceResult<T> = Result<T, IssuanceError>;

/// Result type for marketplace operations.
pub type MarketResult<T> = Result<T, MarketError>;

/// Result type for workflow operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
