//! REST API types for the pinning proxy.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Health check payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: String,
    pub endpoints: Vec<String>,
}

impl HealthStatus {
    pub fn ok(endpoints: &[&str]) -> Self {
        Self {
            status: "ok".to_string(),
            service: "artify".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            endpoints: endpoints.iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// `{"error": <message>}`, the only error shape the proxy produces itself.
pub fn error_response(error: &str) -> Value {
    json!({ "error": error })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_shape() {
        assert_eq!(error_response("Method not allowed"), json!({"error": "Method not allowed"}));
    }

    #[test]
    fn test_health_serializes() {
        let value = serde_json::to_value(HealthStatus::ok(&["POST /api/upload-to-pinata"])).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["endpoints"][0], "POST /api/upload-to-pinata");
    }
}
