//! [`CoinIssuer`] backed by an HTTP issuance relay.
//!
//! The relay holds the signer. `POST /coins` deploys a coin and answers
//! `{hash, address}`; `POST /trades` executes a swap and answers `{hash}`.
//! Failures come back as `{error, txHash?}` with a non-2xx status.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::{CoinDeployment, CoinIssuer, CreateCoinRequest, TradeReceipt, TradeRequest};
use crate::error::{IssuanceError, IssuanceResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelayReply {
    hash: Option<String>,
    tx_hash: Option<String>,
    address: Option<String>,
}

impl RelayReply {
    /// `hash`, falling back to `txHash`.
    fn into_tx_hash(self) -> IssuanceResult<String> {
        self.hash
            .or(self.tx_hash)
            .ok_or_else(|| IssuanceError::new("Relay response has no transaction hash"))
    }
}

#[derive(Debug, Clone)]
pub struct RelayIssuer {
    http: Client,
    base_url: String,
}

impl RelayIssuer {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    async fn post<T: serde::Serialize>(&self, path: &str, body: &T) -> IssuanceResult<RelayReply> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.post(&url).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        let value: Value = serde_json::from_str(&text).unwrap_or(Value::Null);

        if !status.is_success() {
            let message = value
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Issuance relay returned {}", status));
            let mut err = IssuanceError::new(message);
            if let Some(hash) = value.get("txHash").and_then(Value::as_str) {
                err = err.with_tx_hash(hash);
            }
            return Err(err);
        }

        serde_json::from_value(value)
            .map_err(|e| IssuanceError::new(format!("Invalid relay response: {}", e)))
    }
}

#[async_trait]
impl CoinIssuer for RelayIssuer {
    async fn create_coin(&self, request: CreateCoinRequest) -> IssuanceResult<CoinDeployment> {
        let mut reply = self.post("/coins", &request).await?;
        let address = reply.address.take();
        Ok(CoinDeployment { tx_hash: reply.into_tx_hash()?, address })
    }

    async fn trade_coin(&self, request: TradeRequest) -> IssuanceResult<TradeReceipt> {
        let reply = self.post("/trades", &request).await?;
        Ok(TradeReceipt { tx_hash: reply.into_tx_hash()? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issuance::{classify_mint, Currency, MintOutcome, TradeDirection, TIMEOUT_MARKER};
    use crate::test_support::spawn_router;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::json;

    fn coin_request(name: &str) -> CreateCoinRequest {
        CreateCoinRequest {
            name: name.into(),
            symbol: "ART".into(),
            uri: "ipfs://meta".into(),
            payout_recipient: "0xCreator".into(),
            chain_id: 8453,
            currency: Currency::Eth,
        }
    }

    async fn spawn_relay() -> String {
        let router = Router::new()
            .route(
                "/coins",
                post(|Json(body): Json<Value>| async move {
                    match body["name"].as_str() {
                        Some("slow") => (
                            StatusCode::GATEWAY_TIMEOUT,
                            Json(json!({"error": format!("{} with hash 0xslow", TIMEOUT_MARKER), "txHash": "0xslow"})),
                        ),
                        Some("broken") => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({}))),
                        Some("both") => (
                            StatusCode::OK,
                            Json(json!({"hash": "0xtx", "txHash": "0xtx", "address": "0xCoin"})),
                        ),
                        Some("legacy") => (StatusCode::OK, Json(json!({"txHash": "0xold", "address": "0xCoin"}))),
                        _ => (StatusCode::OK, Json(json!({"hash": "0xtx", "address": "0xCoin"}))),
                    }
                }),
            )
            .route(
                "/trades",
                post(|Json(body): Json<Value>| async move {
                    assert_eq!(body["direction"], "sell");
                    assert_eq!(body["amountIn"], "1500");
                    Json(json!({"hash": "0xtrade"}))
                }),
            );
        format!("http://{}/", spawn_router(router).await)
    }

    #[tokio::test]
    async fn test_create_coin() {
        let relay = RelayIssuer::new(spawn_relay().await);
        let deployment = relay.create_coin(coin_request("Sunset")).await.unwrap();
        assert_eq!(deployment.tx_hash, "0xtx");
        assert_eq!(deployment.address.as_deref(), Some("0xCoin"));
    }

    #[tokio::test]
    async fn test_hash_key_variants() {
        let relay = RelayIssuer::new(spawn_relay().await);

        let deployment = relay.create_coin(coin_request("both")).await.unwrap();
        assert_eq!(deployment.tx_hash, "0xtx");
        assert_eq!(deployment.address.as_deref(), Some("0xCoin"));

        let deployment = relay.create_coin(coin_request("legacy")).await.unwrap();
        assert_eq!(deployment.tx_hash, "0xold");
    }

    #[tokio::test]
    async fn test_timeout_keeps_hash() {
        let relay = RelayIssuer::new(spawn_relay().await);
        let outcome = classify_mint(relay.create_coin(coin_request("slow")).await);
        assert_eq!(outcome, MintOutcome::Pending { tx_hash: Some("0xslow".into()) });
    }

    #[tokio::test]
    async fn test_error_without_message() {
        let relay = RelayIssuer::new(spawn_relay().await);
        let err = relay.create_coin(coin_request("broken")).await.unwrap_err();
        assert!(err.message.contains("500"));
        assert_eq!(err.tx_hash, None);
    }

    #[tokio::test]
    async fn test_trade() {
        let relay = RelayIssuer::new(spawn_relay().await);
        let receipt = relay
            .trade_coin(TradeRequest {
                direction: TradeDirection::Sell,
                coin_address: "0xCoin".into(),
                amount_in: "1500".into(),
                slippage: 0.15,
                trader: "0xTrader".into(),
                chain_id: 8453,
            })
            .await
            .unwrap();
        assert_eq!(receipt.tx_hash, "0xtrade");
    }
}
