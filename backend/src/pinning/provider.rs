//! Server-side forwarding to Pinata.
//!
//! The proxy never interprets the provider's answer: the JSON body and the
//! status code are handed back as a [`ProviderReply`] and relayed as-is.

use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};

use crate::error::{PinningError, PinningResult};

/// File name used when pinning a JSON document.
pub const METADATA_FILE_NAME: &str = "metadata.json";

/// Raw provider answer.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderReply {
    pub status: u16,
    pub body: Value,
}

/// Pinata v3 uploads client holding the bearer credential.
#[derive(Clone)]
pub struct PinataProvider {
    http: reqwest::Client,
    upload_url: String,
    jwt: String,
}

impl std::fmt::Debug for PinataProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinataProvider")
            .field("upload_url", &self.upload_url)
            .finish_non_exhaustive()
    }
}

impl PinataProvider {
    pub fn new(upload_url: impl Into<String>, jwt: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            upload_url: upload_url.into(),
            jwt: jwt.into(),
        }
    }

    /// Build from configuration. Fails when no credential is set.
    pub fn from_config(config: &crate::config::AppConfig) -> PinningResult<Self> {
        let jwt = config.pinata_jwt.clone().ok_or(PinningError::MissingCredential)?;
        Ok(Self::new(config.pinata_upload_url.clone(), jwt))
    }

    /// Pin an uploaded file under its original name.
    pub async fn pin_file(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        mime_type: Option<&str>,
    ) -> PinningResult<ProviderReply> {
        let mut part = Part::bytes(bytes).file_name(file_name.to_string());
        if let Some(mime) = mime_type {
            part = part.mime_str(mime)?;
        }
        self.send(part).await
    }

    /// Pin a JSON document as `metadata.json`.
    pub async fn pin_json(&self, document: &Value) -> PinningResult<ProviderReply> {
        let bytes = serde_json::to_vec(document)?;
        let part = Part::bytes(bytes)
            .file_name(METADATA_FILE_NAME)
            .mime_str("application/json")?;
        self.send(part).await
    }

    async fn send(&self, file: Part) -> PinningResult<ProviderReply> {
        let form = Form::new().part("file", file).text("network", "public");

        let response = self
            .http
            .post(&self.upload_url)
            .bearer_auth(&self.jwt)
            .multipart(form)
            .send()
            .await?;

        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = serde_json::from_str(&text).unwrap_or_else(|_| json!({ "error": text }));

        Ok(ProviderReply { status, body })
    }
}
