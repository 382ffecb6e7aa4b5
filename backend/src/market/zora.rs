//! Remote coin statistics from the Zora coins API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::RemoteCoin;
use crate::api::logs::log_warning;
use crate::error::MarketResult;

const OWNER_PAGE_SIZE: u32 = 50;

/// Source of remote coin statistics.
#[async_trait]
pub trait CoinStatsSource: Send + Sync {
    /// Statistics for a batch of coin addresses.
    async fn coins(&self, addresses: &[String]) -> Vec<RemoteCoin>;

    /// Coins held by a wallet.
    async fn coins_by_owner(&self, owner: &str) -> Vec<RemoteCoin>;
}

/// Fields as the API sends them; anything may be missing or null.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawCoin {
    address: Option<String>,
    name: Option<String>,
    symbol: Option<String>,
    description: Option<String>,
    total_supply: Option<String>,
    market_cap: Option<String>,
    volume_24h: Option<String>,
    creator_address: Option<String>,
    created_at: Option<String>,
    unique_holders: Option<u64>,
    media_content: Option<super::MediaContent>,
}

fn or_default(value: Option<String>, default: &str) -> String {
    value.filter(|v| !v.is_empty()).unwrap_or_else(|| default.to_string())
}

impl From<RawCoin> for RemoteCoin {
    fn from(raw: RawCoin) -> Self {
        Self {
            address: raw.address.unwrap_or_default(),
            name: or_default(raw.name, "Unknown"),
            symbol: or_default(raw.symbol, "UNKNOWN"),
            description: raw.description.unwrap_or_default(),
            total_supply: or_default(raw.total_supply, "0"),
            market_cap: or_default(raw.market_cap, "0"),
            volume_24h: or_default(raw.volume_24h, "0"),
            creator_address: raw.creator_address.unwrap_or_default(),
            created_at: raw.created_at.unwrap_or_default(),
            unique_holders: raw.unique_holders.unwrap_or(0),
            media_content: raw.media_content,
        }
    }
}

fn parse_coins(items: Option<&Value>) -> Vec<RemoteCoin> {
    items
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value::<RawCoin>(item.clone()).ok())
                .map(RemoteCoin::from)
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct ZoraCoinsClient {
    http: Client,
    base_url: String,
    chain_id: u64,
}

impl ZoraCoinsClient {
    pub fn new(base_url: impl Into<String>, chain_id: u64) -> Self {
        Self::with_client(Client::new(), base_url, chain_id)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>, chain_id: u64) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url, chain_id }
    }

    async fn fetch_coins(&self, addresses: &[String]) -> MarketResult<Vec<RemoteCoin>> {
        let coins: Vec<Value> = addresses
            .iter()
            .map(|address| json!({"chainId": self.chain_id, "collectionAddress": address}))
            .collect();

        let body: Value = self
            .http
            .post(format!("{}/coins", self.base_url))
            .json(&json!({ "coins": coins }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let tokens = body
            .get("zora20Tokens")
            .or_else(|| body.pointer("/data/zora20Tokens"));
        Ok(parse_coins(tokens))
    }

    async fn fetch_owned(&self, owner: &str) -> MarketResult<Vec<RemoteCoin>> {
        let body: Value = self
            .http
            .get(format!("{}/profileBalances", self.base_url))
            .query(&[("identifier", owner.to_string()), ("count", OWNER_PAGE_SIZE.to_string())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let edges = body
            .pointer("/profile/coinBalances/edges")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let coins: Vec<Value> = edges
            .into_iter()
            .filter_map(|edge| edge.pointer("/node/coin").cloned())
            .collect();
        Ok(parse_coins(Some(&Value::Array(coins))))
    }
}

#[async_trait]
impl CoinStatsSource for ZoraCoinsClient {
    async fn coins(&self, addresses: &[String]) -> Vec<RemoteCoin> {
        if addresses.is_empty() {
            return Vec::new();
        }
        match self.fetch_coins(addresses).await {
            Ok(coins) => coins,
            Err(e) => {
                log_warning(format!("Could not fetch coin statistics: {}", e));
                Vec::new()
            }
        }
    }

    async fn coins_by_owner(&self, owner: &str) -> Vec<RemoteCoin> {
        if owner.trim().is_empty() {
            return Vec::new();
        }
        match self.fetch_owned(owner).await {
            Ok(coins) => coins,
            Err(e) => {
                log_warning(format!("Could not fetch coins held by {}: {}", owner, e));
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_router;
    use axum::{
        extract::Query,
        http::StatusCode,
        routing::{get, post},
        Json, Router,
    };
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    async fn spawn_zora(hits: Arc<AtomicUsize>) -> String {
        let router = Router::new()
            .route(
                "/coins",
                post(move |Json(body): Json<Value>| {
                    let hits = Arc::clone(&hits);
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        let first = body["coins"][0]["collectionAddress"].as_str().unwrap_or("").to_string();
                        assert_eq!(body["coins"][0]["chainId"], 8453);
                        Json(json!({"zora20Tokens": [
                            {"address": first, "name": "Sunset", "symbol": "DSUN", "marketCap": "50",
                             "totalSupply": "500", "uniqueHolders": 23, "volume24h": "1.5",
                             "mediaContent": {"previewImage": {"small": "https://cdn/s.png", "medium": "https://cdn/m.png"}}},
                            {"address": "0xbare", "name": null}
                        ]}))
                    }
                }),
            )
            .route(
                "/profileBalances",
                get(|Query(params): Query<HashMap<String, String>>| async move {
                    if params.get("identifier").map(String::as_str) == Some("0xbroken") {
                        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({})));
                    }
                    (
                        StatusCode::OK,
                        Json(json!({"profile": {"coinBalances": {"edges": [
                            {"node": {"balance": "10", "coin": {"address": "0xheld", "name": "Held"}}}
                        ]}}})),
                    )
                }),
            );
        format!("http://{}", spawn_router(router).await)
    }

    #[tokio::test]
    async fn test_coins_batch_with_defaults() {
        let hits = Arc::new(AtomicUsize::new(0));
        let client = ZoraCoinsClient::new(spawn_zora(Arc::clone(&hits)).await, 8453);

        let coins = client.coins(&["0xAAA".to_string()]).await;
        assert_eq!(coins.len(), 2);
        assert_eq!(coins[0].address, "0xAAA");
        assert_eq!(coins[0].unique_holders, 23);
        assert_eq!(coins[0].preview_image(), Some("https://cdn/s.png"));

        assert_eq!(coins[1].name, "Unknown");
        assert_eq!(coins[1].symbol, "UNKNOWN");
        assert_eq!(coins[1].market_cap, "0");
        assert_eq!(coins[1].preview_image(), None);
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_request() {
        let hits = Arc::new(AtomicUsize::new(0));
        let client = ZoraCoinsClient::new(spawn_zora(Arc::clone(&hits)).await, 8453);
        assert!(client.coins(&[]).await.is_empty());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_coins_by_owner() {
        let hits = Arc::new(AtomicUsize::new(0));
        let client = ZoraCoinsClient::new(spawn_zora(hits).await, 8453);

        let held = client.coins_by_owner("0xwallet").await;
        assert_eq!(held.len(), 1);
        assert_eq!(held[0].address, "0xheld");

        assert!(client.coins_by_owner("0xbroken").await.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_api_degrades_to_empty() {
        let client = ZoraCoinsClient::new("http://127.0.0.1:9", 8453);
        assert!(client.coins(&["0xAAA".to_string()]).await.is_empty());
    }
}
