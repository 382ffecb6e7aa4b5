//! Upload client for the Artify pinning proxy.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use super::{extract_cid, extract_error};
use crate::error::{PinningError, PinningResult};
use crate::models::{Asset, ContentId};

/// Somewhere content can be pinned.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Pin a raw file.
    async fn upload_file(&self, asset: &Asset) -> PinningResult<ContentId>;

    /// Pin a JSON document.
    async fn upload_json(&self, document: &Value) -> PinningResult<ContentId>;
}

/// Client for `POST /api/upload-to-pinata`.
#[derive(Debug, Clone)]
pub struct PinningClient {
    http: reqwest::Client,
    endpoint: String,
}

impl PinningClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    pub fn with_client(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self { http, endpoint: endpoint.into() }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn read_cid(response: reqwest::Response, fallback: &str) -> PinningResult<ContentId> {
        let status = response.status();
        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);

        if !status.is_success() {
            let message = extract_error(&body).unwrap_or_else(|| fallback.to_string());
            return Err(PinningError::Rejected { status: status.as_u16(), message });
        }

        extract_cid(&body).map(ContentId).ok_or(PinningError::MissingCid)
    }
}

#[async_trait]
impl ContentStore for PinningClient {
    async fn upload_file(&self, asset: &Asset) -> PinningResult<ContentId> {
        let part = Part::bytes(asset.bytes.clone())
            .file_name(asset.file_name.clone())
            .mime_str(&asset.mime_type)?;
        let form = Form::new().part("file", part);

        let response = self.http.post(&self.endpoint).multipart(form).send().await?;
        Self::read_cid(response, "Pinata upload failed").await
    }

    async fn upload_json(&self, document: &Value) -> PinningResult<ContentId> {
        let response = self.http.post(&self.endpoint).json(document).send().await?;
        Self::read_cid(response, "Pinata JSON upload failed").await
    }
}
