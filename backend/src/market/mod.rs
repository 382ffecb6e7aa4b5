//! Marketplace aggregation.
//!
//! Locally recorded coins are merged with remote statistics by contract
//! address and mapped into [`MarketItem`] display records. Remote fields
//! win over local placeholders; coins only known remotely (held by the
//! connected wallet) are listed too.

pub mod chain;
pub mod trade;
pub mod zora;

pub use chain::{ChainReader, JsonRpcReader};
pub use trade::{TradeDesk, TradeState};
pub use zora::{CoinStatsSource, ZoraCoinsClient};

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::MarketResult;
use crate::models::{ipfs_to_gateway, same_address, short_address, type_icon, TokenData};
use crate::storage::{StorageBackend, TokenRepository};

/// Price shown when a coin has no market cap yet.
pub const FALLBACK_PRICE: &str = "0.0001 ETH";
pub const DEFAULT_SUPPLY: &str = "1000";
pub const FALLBACK_THUMBNAIL: &str =
    "https://images.unsplash.com/photo-1465146344425-f00d5f5c8f07?w=400&h=300&fit=crop";
pub const TOP_COINS: usize = 5;

const UNKNOWN_TYPE: &str = "unknown";

// =============================================================================
// Remote data
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewImage {
    #[serde(default)]
    pub small: String,
    #[serde(default)]
    pub medium: String,
    #[serde(default)]
    pub blurhash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaContent {
    #[serde(default)]
    pub preview_image: Option<PreviewImage>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub original_uri: Option<String>,
}

/// Remote statistics for one coin. Decimals are kept as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCoin {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub total_supply: String,
    pub market_cap: String,
    #[serde(rename = "volume24h")]
    pub volume_24h: String,
    pub creator_address: String,
    pub created_at: String,
    pub unique_holders: u64,
    pub media_content: Option<MediaContent>,
}

impl RemoteCoin {
    pub fn preview_image(&self) -> Option<&str> {
        self.media_content
            .as_ref()
            .and_then(|m| m.preview_image.as_ref())
            .map(|p| p.small.as_str())
            .filter(|s| !s.is_empty())
    }
}

// =============================================================================
// Display records
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketItem {
    pub id: String,
    pub title: String,
    /// Shortened creator address
    pub creator: String,
    pub content_type: String,
    pub type_icon: String,
    pub symbol: String,
    pub supply: String,
    pub price: String,
    pub thumbnail: String,
    /// Unique holders
    pub sales: u64,
    pub market_cap: String,
    #[serde(rename = "volume24h")]
    pub volume_24h: String,
    pub description: String,
    pub contract_address: String,
    pub creator_address: String,
    pub created_at: String,
}

/// Take the remote value unless it is empty or the API's placeholder.
fn prefer(remote: Option<&str>, placeholder: &str, local: &str) -> String {
    match remote {
        Some(value) if !value.is_empty() && value != placeholder => value.to_string(),
        _ => local.to_string(),
    }
}

fn price(market_cap: &str, supply: &str) -> String {
    let cap = market_cap.trim().parse::<f64>().unwrap_or(0.0);
    let supply = supply.trim().parse::<f64>().unwrap_or(0.0);
    if cap > 0.0 && supply > 0.0 {
        format!("{:.4} ETH", cap / supply)
    } else {
        FALLBACK_PRICE.to_string()
    }
}

/// Map a local record and its remote statistics into a display record.
pub fn to_market_item(token: &TokenData, remote: Option<&RemoteCoin>, gateway: &str) -> MarketItem {
    let supply = remote
        .map(|r| r.total_supply.as_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SUPPLY)
        .to_string();
    let market_cap = remote.map(|r| r.market_cap.clone()).unwrap_or_else(|| "0".to_string());
    let volume_24h = remote.map(|r| r.volume_24h.clone()).unwrap_or_else(|| "0".to_string());

    let thumbnail = if !token.image_uri.is_empty() {
        ipfs_to_gateway(&token.image_uri, gateway)
    } else {
        remote
            .and_then(RemoteCoin::preview_image)
            .unwrap_or(FALLBACK_THUMBNAIL)
            .to_string()
    };

    let content_type = if token.content_type.is_empty() {
        UNKNOWN_TYPE.to_string()
    } else {
        token.content_type.clone()
    };

    MarketItem {
        id: token.contract_address.clone(),
        title: prefer(remote.map(|r| r.name.as_str()), "Unknown", &token.name),
        creator: short_address(&token.creator_address),
        type_icon: type_icon(&content_type).to_string(),
        content_type,
        symbol: prefer(remote.map(|r| r.symbol.as_str()), "UNKNOWN", &token.symbol),
        price: price(&market_cap, &supply),
        supply,
        thumbnail,
        sales: remote.map(|r| r.unique_holders).unwrap_or(0),
        market_cap,
        volume_24h,
        description: prefer(remote.map(|r| r.description.as_str()), "", &token.description),
        contract_address: token.contract_address.clone(),
        creator_address: token.creator_address.clone(),
        created_at: token.created_at.clone(),
    }
}

/// Local placeholder for a coin only known remotely.
fn placeholder_token(coin: &RemoteCoin) -> TokenData {
    TokenData {
        contract_address: coin.address.clone(),
        name: coin.name.clone(),
        symbol: coin.symbol.clone(),
        description: coin.description.clone(),
        content_type: UNKNOWN_TYPE.to_string(),
        image_uri: String::new(),
        metadata_uri: String::new(),
        creator_address: coin.creator_address.clone(),
        created_at: coin.created_at.clone(),
        transaction_hash: String::new(),
    }
}

/// Deduplicate by address and map into display records.
///
/// Local coins come first in recorded order, followed by remote-only coins.
pub fn merge(local: &[TokenData], remote: &[RemoteCoin], gateway: &str) -> Vec<MarketItem> {
    let mut stats: HashMap<String, &RemoteCoin> = HashMap::new();
    for coin in remote.iter().filter(|c| !c.address.is_empty()) {
        stats.entry(coin.address.to_ascii_lowercase()).or_insert(coin);
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut items = Vec::new();

    for token in local {
        let key = token.contract_address.to_ascii_lowercase();
        if !seen.insert(key.clone()) {
            continue;
        }
        items.push(to_market_item(token, stats.get(&key).copied(), gateway));
    }

    for coin in remote {
        let key = coin.address.to_ascii_lowercase();
        if coin.address.is_empty() || !seen.insert(key) {
            continue;
        }
        items.push(to_market_item(&placeholder_token(coin), Some(coin), gateway));
    }

    items
}

// =============================================================================
// Browsing
// =============================================================================

/// Content-type filter (`all` or a type) plus case-insensitive search over
/// title and creator.
pub fn filter_items<'a>(items: &'a [MarketItem], filter: &str, query: &str) -> Vec<&'a MarketItem> {
    let filter = filter.trim();
    let query = query.trim().to_lowercase();

    items
        .iter()
        .filter(|item| filter.is_empty() || filter.eq_ignore_ascii_case("all") || item.content_type.eq_ignore_ascii_case(filter))
        .filter(|item| {
            query.is_empty()
                || item.title.to_lowercase().contains(&query)
                || item.creator.to_lowercase().contains(&query)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopCoin {
    pub title: String,
    pub symbol: String,
    pub volume_24h: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSummary {
    pub total_volume: f64,
    pub creators: usize,
    pub coins_listed: usize,
    pub total_holders: u64,
    pub top_coins: Vec<TopCoin>,
}

fn volume(item: &MarketItem) -> f64 {
    item.volume_24h.trim().parse::<f64>().unwrap_or(0.0)
}

pub fn market_summary(items: &[MarketItem]) -> MarketSummary {
    let creators: HashSet<String> = items
        .iter()
        .filter(|i| !i.creator_address.is_empty())
        .map(|i| i.creator_address.to_ascii_lowercase())
        .collect();

    let mut ranked: Vec<&MarketItem> = items.iter().collect();
    ranked.sort_by(|a, b| volume(b).total_cmp(&volume(a)));

    MarketSummary {
        total_volume: items.iter().map(volume).sum(),
        creators: creators.len(),
        coins_listed: items.len(),
        total_holders: items.iter().map(|i| i.sales).sum(),
        top_coins: ranked
            .into_iter()
            .take(TOP_COINS)
            .map(|i| TopCoin {
                title: i.title.clone(),
                symbol: i.symbol.clone(),
                volume_24h: volume(i),
            })
            .collect(),
    }
}

// =============================================================================
// Marketplace
// =============================================================================

pub struct Marketplace<S: CoinStatsSource + ?Sized, B: StorageBackend + ?Sized> {
    stats: Arc<S>,
    repository: TokenRepository<B>,
    gateway: String,
}

impl<S: CoinStatsSource + ?Sized, B: StorageBackend + ?Sized> Marketplace<S, B> {
    pub fn new(stats: Arc<S>, repository: TokenRepository<B>, gateway: impl Into<String>) -> Self {
        Self {
            stats,
            repository,
            gateway: gateway.into(),
        }
    }

    /// Local coins plus coins held by `wallet`, with remote statistics.
    pub async fn load(&self, wallet: Option<&str>) -> MarketResult<Vec<MarketItem>> {
        let local = self.repository.all_tokens()?;

        let mut addresses: Vec<String> = Vec::new();
        for token in &local {
            if !addresses.iter().any(|a| same_address(a, &token.contract_address)) {
                addresses.push(token.contract_address.clone());
            }
        }

        let mut remote = self.stats.coins(&addresses).await;
        if let Some(wallet) = wallet {
            remote.extend(self.stats.coins_by_owner(wallet).await);
        }

        tracing::debug!(local = local.len(), remote = remote.len(), "merging marketplace");
        Ok(merge(&local, &remote, &self.gateway))
    }
}
