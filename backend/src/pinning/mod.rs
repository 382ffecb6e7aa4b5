//! Content pinning.
//!
//! - [`client`] - [`ContentStore`] trait and the [`PinningClient`] that
//!   talks to the Artify proxy endpoint
//! - [`provider`] - Server-side forwarding to Pinata with the bearer credential
//!
//! Both sides understand every response shape Pinata has used for the
//! content identifier, see [`extract_cid`].

pub mod client;
pub mod provider;

pub use client::{ContentStore, PinningClient};
pub use provider::{PinataProvider, ProviderReply};

use serde_json::Value;

/// Pull the content identifier out of a pinning response.
///
/// Checked in order: `data.cid`, `data.IpfsHash`, `cid`, `IpfsHash`.
pub fn extract_cid(response: &Value) -> Option<String> {
    let candidates = [
        response.pointer("/data/cid"),
        response.pointer("/data/IpfsHash"),
        response.get("cid"),
        response.get("IpfsHash"),
    ];

    candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .find(|s| !s.trim().is_empty())
        .map(str::to_string)
}

/// Pull a human-readable error out of a failed pinning response.
pub fn extract_error(response: &Value) -> Option<String> {
    match response.get("error") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Object(obj)) => obj
            .get("reason")
            .or_else(|| obj.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => response
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cid_shapes() {
        assert_eq!(extract_cid(&json!({"data": {"cid": "bafy1"}})).as_deref(), Some("bafy1"));
        assert_eq!(extract_cid(&json!({"data": {"IpfsHash": "Qm1"}})).as_deref(), Some("Qm1"));
        assert_eq!(extract_cid(&json!({"cid": "bafy2"})).as_deref(), Some("bafy2"));
        assert_eq!(extract_cid(&json!({"IpfsHash": "Qm2"})).as_deref(), Some("Qm2"));
        assert_eq!(extract_cid(&json!({"data": {"cid": ""}, "cid": "bafy3"})).as_deref(), Some("bafy3"));
        assert_eq!(extract_cid(&json!({"data": {}})), None);
    }

    #[test]
    fn test_error_shapes() {
        assert_eq!(extract_error(&json!({"error": "No file uploaded"})).as_deref(), Some("No file uploaded"));
        assert_eq!(
            extract_error(&json!({"error": {"reason": "INVALID_CREDENTIALS"}})).as_deref(),
            Some("INVALID_CREDENTIALS")
        );
        assert_eq!(extract_error(&json!({"message": "Unauthorized"})).as_deref(), Some("Unauthorized"));
        assert_eq!(extract_error(&json!({})), None);
    }
}
