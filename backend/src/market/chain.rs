//! Read-only ERC-20 calls over Ethereum JSON-RPC.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{MarketError, MarketResult};

/// `balanceOf(address)`
pub const BALANCE_OF_SELECTOR: &str = "70a08231";
/// `decimals()`
pub const DECIMALS_SELECTOR: &str = "313ce567";

/// On-chain token reads needed before a sell.
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn balance_of(&self, token: &str, owner: &str) -> MarketResult<u128>;

    async fn decimals(&self, token: &str) -> MarketResult<u8>;
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: Value,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    result: Option<String>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    message: String,
}

#[derive(Debug, Clone)]
pub struct JsonRpcReader {
    http: Client,
    rpc_url: String,
}

impl JsonRpcReader {
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), rpc_url)
    }

    pub fn with_client(http: Client, rpc_url: impl Into<String>) -> Self {
        Self { http, rpc_url: rpc_url.into() }
    }

    async fn eth_call(&self, to: &str, data: String) -> MarketResult<Vec<u8>> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: "eth_call",
            params: json!([{"to": to, "data": data}, "latest"]),
        };

        let reply: JsonRpcResponse = self
            .http
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = reply.error {
            return Err(MarketError::Rpc(error.message));
        }

        let result = reply
            .result
            .ok_or_else(|| MarketError::Rpc("missing result".to_string()))?;
        hex::decode(result.trim_start_matches("0x"))
            .map_err(|e| MarketError::Rpc(format!("invalid result: {}", e)))
    }
}

/// ABI-encode an address argument as one 32-byte word.
fn encode_address(address: &str) -> MarketResult<String> {
    let raw = address.trim_start_matches("0x");
    let bytes = hex::decode(raw).map_err(|_| MarketError::Rpc(format!("invalid address: {}", address)))?;
    if bytes.len() != 20 {
        return Err(MarketError::Rpc(format!("invalid address: {}", address)));
    }
    Ok(format!("{:0>64}", hex::encode(bytes)))
}

/// Decode a uint256 word, rejecting values that do not fit in `u128`.
fn decode_uint(word: &[u8]) -> MarketResult<u128> {
    if word.is_empty() {
        return Ok(0);
    }
    if word.len() > 32 {
        return Err(MarketError::Rpc("unexpected return size".to_string()));
    }
    let split = word.len().saturating_sub(16);
    if word[..split].iter().any(|b| *b != 0) {
        return Err(MarketError::Rpc("value exceeds 128 bits".to_string()));
    }
    Ok(word[split..].iter().fold(0u128, |acc, b| (acc << 8) | u128::from(*b)))
}

#[async_trait]
impl ChainReader for JsonRpcReader {
    async fn balance_of(&self, token: &str, owner: &str) -> MarketResult<u128> {
        let data = format!("0x{}{}", BALANCE_OF_SELECTOR, encode_address(owner)?);
        decode_uint(&self.eth_call(token, data).await?)
    }

    async fn decimals(&self, token: &str) -> MarketResult<u8> {
        let value = decode_uint(&self.eth_call(token, format!("0x{}", DECIMALS_SELECTOR)).await?)?;
        u8::try_from(value).map_err(|_| MarketError::Rpc(format!("invalid decimals: {}", value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_router;
    use axum::{routing::post, Json, Router};

    const OWNER: &str = "0x00000000000000000000000000000000000000aa";

    async fn spawn_node() -> String {
        let router = Router::new().route(
            "/",
            post(|Json(body): Json<Value>| async move {
                let data = body["params"][0]["data"].as_str().unwrap_or("").to_string();
                let to = body["params"][0]["to"].as_str().unwrap_or("");
                if to == "0xdead" {
                    return Json(json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32000, "message": "execution reverted"}}));
                }
                let result = if data.starts_with(&format!("0x{}", BALANCE_OF_SELECTOR)) {
                    assert!(data.ends_with("aa"));
                    assert_eq!(data.len(), 2 + 8 + 64);
                    format!("0x{:064x}", 2_500_000_000_000_000_000u128)
                } else {
                    format!("0x{:064x}", 18)
                };
                Json(json!({"jsonrpc": "2.0", "id": 1, "result": result}))
            }),
        );
        format!("http://{}/", spawn_router(router).await)
    }

    #[tokio::test]
    async fn test_balance_and_decimals() {
        let reader = JsonRpcReader::new(spawn_node().await);
        assert_eq!(reader.balance_of("0xcoin", OWNER).await.unwrap(), 2_500_000_000_000_000_000);
        assert_eq!(reader.decimals("0xcoin").await.unwrap(), 18);
    }

    #[tokio::test]
    async fn test_rpc_error() {
        let reader = JsonRpcReader::new(spawn_node().await);
        let err = reader.decimals("0xdead").await.unwrap_err();
        assert_eq!(err.to_string(), "RPC error: execution reverted");
    }

    #[test]
    fn test_encode_address() {
        assert!(encode_address("0x1234").is_err());
        assert_eq!(encode_address(OWNER).unwrap().len(), 64);
    }

    #[test]
    fn test_decode_uint() {
        let mut word = vec![0u8; 32];
        word[31] = 7;
        assert_eq!(decode_uint(&word).unwrap(), 7);
        word[0] = 1;
        assert!(decode_uint(&word).is_err());
        assert_eq!(decode_uint(&[]).unwrap(), 0);
    }
}
