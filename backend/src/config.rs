//! Application configuration.
//!
//! Values come from the environment (a `.env` file is loaded first when
//! present). Every endpoint has a development default except the Pinata
//! credential, which only the proxy server needs.

use std::env;
use std::path::PathBuf;

/// Pinata v3 file upload endpoint.
pub const DEFAULT_PINATA_UPLOAD_URL: &str = "https://uploads.pinata.cloud/v3/files";

/// Public Pinata gateway host.
pub const DEFAULT_PINATA_GATEWAY: &str = "gateway.pinata.cloud";

/// Local proxy endpoint used by the CLI.
pub const DEFAULT_PROXY_URL: &str = "http://localhost:3000/api/upload-to-pinata";

/// Zora coins REST API.
pub const DEFAULT_ZORA_API_URL: &str = "https://api-sdk.zora.engineering";

/// Issuance relay that signs coin deployments and trades.
pub const DEFAULT_ISSUER_URL: &str = "http://localhost:8787";

/// Base mainnet JSON-RPC.
pub const DEFAULT_RPC_URL: &str = "https://mainnet.base.org";

/// Base mainnet chain id.
pub const BASE_CHAIN_ID: u64 = 8453;

/// Directory for file-backed storage.
pub const DEFAULT_DATA_DIR: &str = ".artify/data";

/// Proxy server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Bearer credential for Pinata (server side only)
    pub pinata_jwt: Option<String>,
    pub pinata_upload_url: String,
    pub pinata_gateway: String,
    pub proxy_url: String,
    pub zora_api_url: String,
    pub issuer_url: String,
    pub rpc_url: String,
    pub chain_id: u64,
    pub data_dir: PathBuf,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pinata_jwt: None,
            pinata_upload_url: DEFAULT_PINATA_UPLOAD_URL.to_string(),
            pinata_gateway: DEFAULT_PINATA_GATEWAY.to_string(),
            proxy_url: DEFAULT_PROXY_URL.to_string(),
            zora_api_url: DEFAULT_ZORA_API_URL.to_string(),
            issuer_url: DEFAULT_ISSUER_URL.to_string(),
            rpc_url: DEFAULT_RPC_URL.to_string(),
            chain_id: BASE_CHAIN_ID,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            port: DEFAULT_PORT,
        }
    }
}

impl AppConfig {
    /// Build the configuration from environment variables.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            pinata_jwt: var("PINATA_JWT"),
            pinata_upload_url: var("PINATA_UPLOAD_URL").unwrap_or(defaults.pinata_upload_url),
            pinata_gateway: var("PINATA_GATEWAY").unwrap_or(defaults.pinata_gateway),
            proxy_url: var("ARTIFY_PROXY_URL").unwrap_or(defaults.proxy_url),
            zora_api_url: var("ZORA_API_URL").unwrap_or(defaults.zora_api_url),
            issuer_url: var("ISSUER_URL").unwrap_or(defaults.issuer_url),
            rpc_url: var("RPC_URL").unwrap_or(defaults.rpc_url),
            chain_id: var("CHAIN_ID")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.chain_id),
            data_dir: var("ARTIFY_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            port: var("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_unset() {
        let config = AppConfig::from_lookup(|_| None);
        assert!(config.pinata_jwt.is_none());
        assert_eq!(config.chain_id, BASE_CHAIN_ID);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.pinata_upload_url, DEFAULT_PINATA_UPLOAD_URL);
    }

    #[test]
    fn test_overrides_and_bad_numbers() {
        let vars: HashMap<&str, &str> = [
            ("PINATA_JWT", "secret"),
            ("PINATA_GATEWAY", "teal.mypinata.cloud"),
            ("CHAIN_ID", "84532"),
            ("PORT", "not-a-port"),
            ("ISSUER_URL", "  "),
        ]
        .into_iter()
        .collect();

        let config = AppConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.pinata_jwt.as_deref(), Some("secret"));
        assert_eq!(config.pinata_gateway, "teal.mypinata.cloud");
        assert_eq!(config.chain_id, 84532);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.issuer_url, DEFAULT_ISSUER_URL);
    }
}
