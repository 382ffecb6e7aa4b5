//! # Artify - tokenized creator content
//!
//! Artify lets a creator pin a piece of content (image, blog post, video,
//! music, code) to IPFS, mint a tradable coin for it, and browse or trade
//! the coins other creators have minted.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │    Draft    │────▶│  Workflow   │────▶│    Proxy    │────▶│   Pinata    │
//! │ (per type)  │     │ (validate)  │     │ (/api/...)  │     │   (IPFS)    │
//! └─────────────┘     └──────┬──────┘     └─────────────┘     └─────────────┘
//!                            │ metadata URI
//!                            ▼
//!                     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//!                     │   Minter    │────▶│   Storage   │◀────│ Marketplace │
//!                     │  (relay)    │     │ (per user)  │     │ (+ remote)  │
//!                     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use artify::{ContentDraft, PinningClient, SubmissionWorkflow};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = Arc::new(PinningClient::new("http://localhost:3000/api/upload-to-pinata"));
//!     let mut workflow = SubmissionWorkflow::new(client);
//!     let draft = ContentDraft::Blog {
//!         name: "Web3 Guide".into(),
//!         description: "Getting started".into(),
//!         url: None,
//!     };
//!     let uploaded = workflow.submit(&draft).await.unwrap();
//!     println!("Metadata at {}", uploaded.metadata_uri);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`config`] - Environment configuration
//! - [`models`] - Drafts, metadata, token and user records
//! - [`storage`] - Per-user token registry and session
//! - [`pinning`] - Upload client and Pinata forwarding
//! - [`workflow`] - Submission state machine
//! - [`issuance`] - Coin deployment and trades
//! - [`market`] - Marketplace aggregation and trade desk
//! - [`api`] - HTTP proxy server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Persistence
pub mod storage;

// Content pinning
pub mod pinning;
pub mod workflow;

// Coins
pub mod issuance;
pub mod market;

// HTTP API
pub mod api;

#[cfg(test)]
mod test_support;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    DraftError,
    IssuanceError,
    MarketError,
    PinningError,
    ServerError,
    StorageError,
    WorkflowError,
};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::AppConfig;

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    Asset,
    ContentDraft,
    ContentId,
    ContentType,
    MetadataDocument,
    RawDraft,
    TokenData,
    UserData,
};

// =============================================================================
// Re-exports - Storage
// =============================================================================

pub use storage::{FileBackend, MemoryBackend, SessionStore, StorageBackend, TokenRepository};

// =============================================================================
// Re-exports - Pinning
// =============================================================================

pub use pinning::{ContentStore, PinataProvider, PinningClient};

// =============================================================================
// Re-exports - Workflow
// =============================================================================

pub use workflow::{SubmissionState, SubmissionWorkflow, UploadedContent};

// =============================================================================
// Re-exports - Issuance
// =============================================================================

pub use issuance::{
    classify_mint,
    CoinIssuer,
    Currency,
    MintInput,
    MintOutcome,
    Minter,
    RelayIssuer,
};

// =============================================================================
// Re-exports - Market
// =============================================================================

pub use market::{
    filter_items,
    market_summary,
    ChainReader,
    CoinStatsSource,
    JsonRpcReader,
    MarketItem,
    MarketSummary,
    Marketplace,
    TradeDesk,
    TradeState,
    ZoraCoinsClient,
};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
