//! Domain models for Artify.
//!
//! - [`ContentType`] - Kind of creator content (image, blog, video, music, code)
//! - [`Asset`] - An in-memory file handed to the uploader
//! - [`ContentDraft`] - Creator input, one variant per content type
//! - [`MetadataDocument`] - JSON document pinned for each coin
//! - [`ContentId`] - Content identifier returned by the pinning provider
//! - [`TokenData`] / [`UserData`] - Locally recorded coins per wallet

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DraftError;

// =============================================================================
// Content Type
// =============================================================================

/// Kind of content a coin represents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Image,
    Blog,
    Video,
    Music,
    Code,
}

impl ContentType {
    pub const ALL: [ContentType; 5] = [
        ContentType::Image,
        ContentType::Blog,
        ContentType::Video,
        ContentType::Music,
        ContentType::Code,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Image => "image",
            ContentType::Blog => "blog",
            ContentType::Video => "video",
            ContentType::Music => "music",
            ContentType::Code => "code",
        }
    }

    /// Icon shown next to marketplace entries.
    pub fn icon(&self) -> &'static str {
        match self {
            ContentType::Image => "🖼️",
            ContentType::Blog => "📝",
            ContentType::Video => "🎥",
            ContentType::Music => "🎵",
            ContentType::Code => "💻",
        }
    }

    /// Human label used on generated placeholder images.
    pub fn label(&self) -> &'static str {
        match self {
            ContentType::Image => "Image / Art",
            ContentType::Blog => "Blog Post",
            ContentType::Video => "Video",
            ContentType::Music => "Music / Audio",
            ContentType::Code => "GitHub Repo",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = DraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "image" => Ok(ContentType::Image),
            "blog" => Ok(ContentType::Blog),
            "video" => Ok(ContentType::Video),
            "music" => Ok(ContentType::Music),
            "code" => Ok(ContentType::Code),
            other => Err(DraftError::UnknownContentType(other.to_string())),
        }
    }
}

/// Icon for a content type stored as free text (remote or legacy records).
pub fn type_icon(content_type: &str) -> &'static str {
    content_type
        .parse::<ContentType>()
        .map(|t| t.icon())
        .unwrap_or("📄")
}

// =============================================================================
// Assets
// =============================================================================

/// A file selected by the creator, held in memory.
#[derive(Clone, PartialEq, Eq)]
pub struct Asset {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Asset {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Build an asset guessing the mime type from the file extension.
    pub fn from_path_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime_type = guess_mime(&file_name).to_string();
        Self { file_name, mime_type, bytes }
    }
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Asset")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

fn guess_mime(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "json" => "application/json",
        "md" | "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

// =============================================================================
// Creator Draft
// =============================================================================

/// Creator input for one submission.
///
/// Each variant carries only the fields its content type uses.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentDraft {
    Image {
        name: String,
        description: String,
        image: Option<Asset>,
    },
    Blog {
        name: String,
        description: String,
        url: Option<String>,
    },
    Video {
        name: String,
        description: String,
        file: Option<Asset>,
    },
    Music {
        name: String,
        description: String,
        file: Option<Asset>,
    },
    Code {
        name: String,
        description: String,
        link: Option<String>,
    },
}

/// Loose creator input as collected by a form or the CLI.
#[derive(Debug, Clone, Default)]
pub struct RawDraft {
    pub name: String,
    pub description: String,
    pub image: Option<Asset>,
    pub file: Option<Asset>,
    pub link: Option<String>,
    pub url: Option<String>,
}

impl ContentDraft {
    /// Keep only the fields the chosen content type uses.
    pub fn from_raw(content_type: ContentType, raw: RawDraft) -> Self {
        let RawDraft { name, description, image, file, link, url } = raw;
        match content_type {
            ContentType::Image => ContentDraft::Image { name, description, image },
            ContentType::Blog => ContentDraft::Blog { name, description, url },
            ContentType::Video => ContentDraft::Video { name, description, file },
            ContentType::Music => ContentDraft::Music { name, description, file },
            ContentType::Code => ContentDraft::Code { name, description, link },
        }
    }

    pub fn content_type(&self) -> ContentType {
        match self {
            ContentDraft::Image { .. } => ContentType::Image,
            ContentDraft::Blog { .. } => ContentType::Blog,
            ContentDraft::Video { .. } => ContentType::Video,
            ContentDraft::Music { .. } => ContentType::Music,
            ContentDraft::Code { .. } => ContentType::Code,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ContentDraft::Image { name, .. }
            | ContentDraft::Blog { name, .. }
            | ContentDraft::Video { name, .. }
            | ContentDraft::Music { name, .. }
            | ContentDraft::Code { name, .. } => name,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            ContentDraft::Image { description, .. }
            | ContentDraft::Blog { description, .. }
            | ContentDraft::Video { description, .. }
            | ContentDraft::Music { description, .. }
            | ContentDraft::Code { description, .. } => description,
        }
    }

    /// Check required fields. Runs before any upload.
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.name().trim().is_empty() {
            return Err(DraftError::MissingName);
        }
        if self.description().trim().is_empty() {
            return Err(DraftError::MissingDescription);
        }

        match self {
            ContentDraft::Image { image, .. } => {
                if !has_bytes(image) {
                    return Err(DraftError::MissingImage);
                }
            }
            ContentDraft::Video { file, .. } | ContentDraft::Music { file, .. } => {
                if !has_bytes(file) {
                    return Err(DraftError::MissingFile);
                }
            }
            ContentDraft::Code { link, .. } => {
                let link = link.as_deref().map(str::trim).unwrap_or_default();
                if link.is_empty() {
                    return Err(DraftError::MissingLink);
                }
                if !is_http_url(link) {
                    return Err(DraftError::InvalidLink);
                }
            }
            ContentDraft::Blog { .. } => {}
        }

        Ok(())
    }
}

fn has_bytes(asset: &Option<Asset>) -> bool {
    asset.as_ref().is_some_and(|a| !a.bytes.is_empty())
}

fn is_http_url(s: &str) -> bool {
    let lower = s.to_lowercase();
    (lower.starts_with("https://") && lower.len() > 8) || (lower.starts_with("http://") && lower.len() > 7)
}

// =============================================================================
// Content Identifiers & Metadata
// =============================================================================

/// Content identifier returned by the pinning provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(pub String);

impl ContentId {
    /// `ipfs://<cid>`
    pub fn to_uri(&self) -> String {
        format!("ipfs://{}", self.0)
    }

    /// `https://<gateway>/ipfs/<cid>`
    pub fn gateway_url(&self, gateway: &str) -> String {
        format!("https://{}/ipfs/{}", gateway.trim_end_matches('/'), self.0)
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rewrite an `ipfs://` URI to a gateway URL. Other URIs pass through.
pub fn ipfs_to_gateway(uri: &str, gateway: &str) -> String {
    match uri.strip_prefix("ipfs://") {
        Some(cid) => ContentId(cid.to_string()).gateway_url(gateway),
        None => uri.to_string(),
    }
}

/// Metadata document pinned as JSON and referenced by the coin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataDocument {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

// =============================================================================
// Local Records
// =============================================================================

/// A coin minted by a creator, recorded once the deployment is confirmed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenData {
    pub contract_address: String,
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub content_type: String,
    pub image_uri: String,
    pub metadata_uri: String,
    pub creator_address: String,
    pub created_at: String,
    pub transaction_hash: String,
}

/// All coins recorded for one wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub wallet_address: String,
    #[serde(default)]
    pub tokens: Vec<TokenData>,
    pub last_updated: String,
}

impl UserData {
    pub fn has_token(&self, contract_address: &str) -> bool {
        self.tokens
            .iter()
            .any(|t| same_address(&t.contract_address, contract_address))
    }
}

/// Case-insensitive address comparison.
pub fn same_address(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// `0x1234...abcd` form for display.
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn png() -> Option<Asset> {
        Some(Asset::new("a.png", "image/png", vec![1, 2, 3]))
    }

    #[test]
    fn test_required_fields_per_type() {
        let image = ContentDraft::Image { name: "A".into(), description: "B".into(), image: None };
        assert_eq!(image.validate(), Err(DraftError::MissingImage));

        let video = ContentDraft::Video { name: "A".into(), description: "B".into(), file: None };
        assert_eq!(video.validate(), Err(DraftError::MissingFile));

        let music = ContentDraft::Music {
            name: "A".into(),
            description: "B".into(),
            file: Some(Asset::new("a.mp3", "audio/mpeg", vec![])),
        };
        assert_eq!(music.validate(), Err(DraftError::MissingFile));

        let code = ContentDraft::Code { name: "A".into(), description: "B".into(), link: Some("  ".into()) };
        assert_eq!(code.validate(), Err(DraftError::MissingLink));

        let code = ContentDraft::Code { name: "A".into(), description: "B".into(), link: Some("github.com/x".into()) };
        assert_eq!(code.validate(), Err(DraftError::InvalidLink));

        let blog = ContentDraft::Blog { name: "A".into(), description: "B".into(), url: None };
        assert_eq!(blog.validate(), Ok(()));
    }

    #[test]
    fn test_name_and_description_checked_first() {
        for content_type in ContentType::ALL {
            let draft = ContentDraft::from_raw(
                content_type,
                RawDraft { name: " ".into(), description: "B".into(), ..Default::default() },
            );
            assert_eq!(draft.validate(), Err(DraftError::MissingName));

            let draft = ContentDraft::from_raw(
                content_type,
                RawDraft { name: "A".into(), description: "".into(), ..Default::default() },
            );
            assert_eq!(draft.validate(), Err(DraftError::MissingDescription));
        }
    }

    #[test]
    fn test_from_raw_drops_unused_fields() {
        let raw = RawDraft {
            name: "A".into(),
            description: "B".into(),
            image: png(),
            link: Some("https://github.com/a/b".into()),
            ..Default::default()
        };
        let draft = ContentDraft::from_raw(ContentType::Code, raw);
        assert_eq!(draft.content_type(), ContentType::Code);
        assert!(matches!(draft, ContentDraft::Code { link: Some(_), .. }));
        assert_eq!(draft.validate(), Ok(()));
    }

    #[test]
    fn test_metadata_shape() {
        let doc = MetadataDocument {
            name: "A".into(),
            description: "B".into(),
            content_type: ContentType::Image,
            image: "ipfs://X".into(),
            link: None,
            url: None,
            file: None,
        };
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({"name": "A", "description": "B", "type": "image", "image": "ipfs://X"})
        );
    }

    #[test]
    fn test_token_data_camel_case() {
        let token = TokenData {
            contract_address: "0xabc".into(),
            name: "Coin".into(),
            symbol: "COIN".into(),
            description: "d".into(),
            content_type: "music".into(),
            image_uri: "ipfs://img".into(),
            metadata_uri: "ipfs://meta".into(),
            creator_address: "0xcreator".into(),
            created_at: "2025-01-01T00:00:00Z".into(),
            transaction_hash: "0xtx".into(),
        };
        let value = serde_json::to_value(&token).unwrap();
        assert_eq!(value["contractAddress"], "0xabc");
        assert_eq!(value["transactionHash"], "0xtx");
    }

    #[test]
    fn test_address_helpers() {
        assert!(same_address("0xABCdef", "0xabcDEF"));
        assert_eq!(short_address("0x1234567890abcdef"), "0x1234...cdef");
        assert_eq!(short_address("0x12"), "0x12");
        assert_eq!(type_icon("video"), "🎥");
        assert_eq!(type_icon("unknown"), "📄");
        assert_eq!(ipfs_to_gateway("ipfs://Qm1", "gw.example"), "https://gw.example/ipfs/Qm1");
        assert_eq!(ipfs_to_gateway("https://x/y.png", "gw.example"), "https://x/y.png");
    }

    #[test]
    fn test_mime_guess() {
        assert_eq!(Asset::from_path_bytes("song.MP3", vec![1]).mime_type, "audio/mpeg");
        assert_eq!(Asset::from_path_bytes("noext", vec![1]).mime_type, "application/octet-stream");
    }
}
