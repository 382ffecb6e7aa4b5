//! Coin issuance.
//!
//! [`CoinIssuer`] is the seam to the token-issuance service: deploy a coin
//! for a metadata URI, or trade an existing one. The only failure
//! distinction made is [`classify_mint`]: a transaction that timed out is
//! pending, anything else failed.
//!
//! [`Minter`] records confirmed coins in the local [`TokenRepository`].

pub mod relay;

pub use relay::RelayIssuer;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::api::logs::{log_error, log_info, log_success, log_warning};
use crate::config::BASE_CHAIN_ID;
use crate::error::{IssuanceResult, StorageResult};
use crate::models::{ContentType, TokenData};
use crate::storage::{StorageBackend, TokenRepository};
use crate::workflow::UploadedContent;

/// Substring the issuance SDK uses when confirmation took too long.
pub const TIMEOUT_MARKER: &str = "Timed out while waiting for transaction";

/// Symbol used when a name has no usable characters.
pub const FALLBACK_SYMBOL: &str = "COIN";

const MAX_SYMBOL_LEN: usize = 6;

// =============================================================================
// Requests
// =============================================================================

/// Currency the coin is paired against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Zora,
    #[default]
    Eth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCoinRequest {
    pub name: String,
    pub symbol: String,
    /// Metadata URI (`ipfs://...`)
    pub uri: String,
    pub payout_recipient: String,
    pub chain_id: u64,
    pub currency: Currency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinDeployment {
    pub tx_hash: String,
    /// Known once the deployment is confirmed
    pub address: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeDirection {
    Buy,
    Sell,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRequest {
    pub direction: TradeDirection,
    pub coin_address: String,
    /// Amount in base units (wei for buys, token units for sells)
    pub amount_in: String,
    /// Fraction, e.g. `0.05` for 5%
    pub slippage: f64,
    pub trader: String,
    pub chain_id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeReceipt {
    pub tx_hash: String,
}

/// Token-issuance service.
#[async_trait]
pub trait CoinIssuer: Send + Sync {
    async fn create_coin(&self, request: CreateCoinRequest) -> IssuanceResult<CoinDeployment>;

    async fn trade_coin(&self, request: TradeRequest) -> IssuanceResult<TradeReceipt>;
}

// =============================================================================
// Outcome
// =============================================================================

/// What a mint attempt means for the creator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MintOutcome {
    Confirmed { tx_hash: String, address: Option<String> },
    /// Broadcast but not confirmed in time; may still land
    Pending { tx_hash: Option<String> },
    Failed { message: String },
}

pub fn classify_mint(result: IssuanceResult<CoinDeployment>) -> MintOutcome {
    match result {
        Ok(CoinDeployment { tx_hash, address }) => MintOutcome::Confirmed { tx_hash, address },
        Err(err) if err.message.contains(TIMEOUT_MARKER) => MintOutcome::Pending { tx_hash: err.tx_hash },
        Err(err) => MintOutcome::Failed { message: err.message },
    }
}

/// Ticker derived from a coin name: uppercase alphanumerics, six at most.
pub fn derive_symbol(name: &str) -> String {
    let symbol: String = name
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .take(MAX_SYMBOL_LEN)
        .collect();

    if symbol.is_empty() {
        FALLBACK_SYMBOL.to_string()
    } else {
        symbol
    }
}

// =============================================================================
// Minter
// =============================================================================

/// Everything needed to deploy and record one coin.
#[derive(Debug, Clone, PartialEq)]
pub struct MintInput {
    pub name: String,
    pub symbol: Option<String>,
    pub description: String,
    pub content_type: ContentType,
    pub image_uri: String,
    pub metadata_uri: String,
}

impl From<&UploadedContent> for MintInput {
    fn from(content: &UploadedContent) -> Self {
        Self {
            name: content.name.clone(),
            symbol: None,
            description: content.description.clone(),
            content_type: content.content_type,
            image_uri: content.image_uri.clone(),
            metadata_uri: content.metadata_uri.clone(),
        }
    }
}

impl MintInput {
    fn ticker(&self) -> String {
        match self.symbol.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => derive_symbol(s),
            _ => derive_symbol(&self.name),
        }
    }
}

/// Deploys coins and records the confirmed ones.
pub struct Minter<I: CoinIssuer + ?Sized, B: StorageBackend + ?Sized> {
    issuer: Arc<I>,
    repository: TokenRepository<B>,
    chain_id: u64,
    currency: Currency,
}

impl<I: CoinIssuer + ?Sized, B: StorageBackend + ?Sized> Minter<I, B> {
    pub fn new(issuer: Arc<I>, repository: TokenRepository<B>) -> Self {
        Self {
            issuer,
            repository,
            chain_id: BASE_CHAIN_ID,
            currency: Currency::default(),
        }
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    /// Deploy a coin paying out to `wallet`.
    ///
    /// Only storage failures are errors; issuance failures are part of the
    /// returned outcome.
    pub async fn mint(&self, input: &MintInput, wallet: &str) -> StorageResult<MintOutcome> {
        let request = CreateCoinRequest {
            name: input.name.clone(),
            symbol: input.ticker(),
            uri: input.metadata_uri.clone(),
            payout_recipient: wallet.to_string(),
            chain_id: self.chain_id,
            currency: self.currency,
        };

        log_info(format!("Deploying coin {} (${})", request.name, request.symbol));
        let symbol = request.symbol.clone();
        let outcome = classify_mint(self.issuer.create_coin(request).await);

        match &outcome {
            MintOutcome::Confirmed { tx_hash, address: Some(address) } => {
                let token = TokenData {
                    contract_address: address.clone(),
                    name: input.name.clone(),
                    symbol,
                    description: input.description.clone(),
                    content_type: input.content_type.as_str().to_string(),
                    image_uri: input.image_uri.clone(),
                    metadata_uri: input.metadata_uri.clone(),
                    creator_address: wallet.to_string(),
                    created_at: chrono::Utc::now().to_rfc3339(),
                    transaction_hash: tx_hash.clone(),
                };
                self.repository.add_user_token(wallet, token)?;
                log_success(format!("Coin deployed at {}", address));
            }
            MintOutcome::Confirmed { tx_hash, address: None } => {
                log_warning(format!("Coin confirmed in {} without an address, not recorded", tx_hash));
            }
            MintOutcome::Pending { tx_hash } => {
                log_warning(format!(
                    "Transaction pending: {}",
                    tx_hash.as_deref().unwrap_or("hash unknown")
                ));
            }
            MintOutcome::Failed { message } => log_error(format!("Mint failed: {}", message)),
        }

        Ok(outcome)
    }
}
