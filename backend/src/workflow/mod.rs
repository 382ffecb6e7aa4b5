//! Submission workflow: creator draft to pinned metadata document.
//!
//! ```text
//!          submit            uploads ok
//!  Idle ───────────▶ Uploading ──────────▶ Ready
//!   ▲                  │    │
//!   └── invalid draft ─┘    └── upload failed ──▶ Error
//! ```
//!
//! Validation runs before any network call. Uploads run one after the
//! other: primary asset, placeholder cover (non-image content), metadata
//! JSON. Nothing is retried; a failed attempt is resubmitted by the caller.

pub mod placeholder;

use std::sync::Arc;

use serde::Serialize;

use crate::api::logs::{log_error, log_info, log_success, log_warning};
use crate::error::{DraftError, PinningResult, WorkflowError, WorkflowResult};
use crate::models::{Asset, ContentDraft, ContentType, MetadataDocument};
use crate::pinning::ContentStore;

/// Output of a successful submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedContent {
    pub content_type: ContentType,
    pub name: String,
    pub description: String,
    /// `ipfs://` URI of the cover image
    pub image_uri: String,
    /// `ipfs://` URI of the metadata document, handed to the minter
    pub metadata_uri: String,
    /// `ipfs://` URI of the media file (video, music)
    pub file_uri: Option<String>,
    pub metadata: MetadataDocument,
}

/// Workflow state.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionState {
    /// Waiting for input, with the last validation message if any
    Idle { error: Option<String> },
    Uploading,
    Ready(UploadedContent),
    Error(String),
}

impl Default for SubmissionState {
    fn default() -> Self {
        SubmissionState::Idle { error: None }
    }
}

/// Inputs that move the workflow.
#[derive(Debug, Clone)]
pub enum SubmissionEvent {
    Submit,
    Rejected(DraftError),
    Uploaded(UploadedContent),
    Failed(String),
    Reset,
}

impl SubmissionState {
    /// Next state, or `None` when `event` is not allowed in this state.
    pub fn next(&self, event: SubmissionEvent) -> Option<SubmissionState> {
        use SubmissionEvent as E;
        use SubmissionState as S;

        match (self, event) {
            (S::Uploading, E::Submit) => None,
            (S::Idle { .. } | S::Ready(_) | S::Error(_), E::Submit) => Some(S::Uploading),

            (S::Uploading, E::Rejected(err)) => Some(S::Idle { error: Some(err.to_string()) }),
            (S::Uploading, E::Uploaded(content)) => Some(S::Ready(content)),
            (S::Uploading, E::Failed(message)) => Some(S::Error(message)),
            (S::Idle { .. } | S::Ready(_) | S::Error(_), E::Rejected(_) | E::Uploaded(_) | E::Failed(_)) => None,

            (S::Uploading, E::Reset) => None,
            (S::Idle { .. } | S::Ready(_) | S::Error(_), E::Reset) => Some(S::default()),
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, SubmissionState::Uploading)
    }

    /// Message to show the creator, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            SubmissionState::Idle { error } => error.as_deref(),
            SubmissionState::Error(message) => Some(message),
            SubmissionState::Uploading | SubmissionState::Ready(_) => None,
        }
    }
}

/// Drives one creator's submissions against a [`ContentStore`].
pub struct SubmissionWorkflow<S: ContentStore + ?Sized> {
    store: Arc<S>,
    state: SubmissionState,
}

impl<S: ContentStore + ?Sized> SubmissionWorkflow<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store, state: SubmissionState::default() }
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    /// Clear a finished or failed submission.
    pub fn reset(&mut self) -> WorkflowResult<()> {
        self.apply(SubmissionEvent::Reset)
    }

    /// Validate, upload and move to `Ready` or `Error`.
    pub async fn submit(&mut self, draft: &ContentDraft) -> WorkflowResult<UploadedContent> {
        self.apply(SubmissionEvent::Submit)?;

        if let Err(err) = draft.validate() {
            log_warning(format!("Submission blocked: {}", err));
            self.apply(SubmissionEvent::Rejected(err.clone()))?;
            return Err(err.into());
        }

        log_info(format!("Uploading {} \"{}\"", draft.content_type(), draft.name()));
        match self.upload(draft).await {
            Ok(content) => {
                log_success(format!("Metadata pinned at {}", content.metadata_uri));
                self.apply(SubmissionEvent::Uploaded(content.clone()))?;
                Ok(content)
            }
            Err(err) => {
                log_error(format!("Upload failed: {}", err));
                self.apply(SubmissionEvent::Failed(err.to_string()))?;
                Err(err.into())
            }
        }
    }

    fn apply(&mut self, event: SubmissionEvent) -> WorkflowResult<()> {
        let next = self.state.next(event).ok_or(WorkflowError::Busy)?;
        self.state = next;
        Ok(())
    }

    async fn upload(&self, draft: &ContentDraft) -> PinningResult<UploadedContent> {
        let content_type = draft.content_type();

        let primary_uri = match primary_asset(draft) {
            Some(asset) => Some(self.store.upload_file(asset).await?.to_uri()),
            None => None,
        };

        let (image_uri, file_uri) = match (content_type, primary_uri) {
            (ContentType::Image, Some(uri)) => (uri, None),
            (_, file_uri) => {
                let cover = placeholder::render(draft.name(), content_type);
                let cover_uri = self.store.upload_file(&cover).await?.to_uri();
                (cover_uri, file_uri)
            }
        };

        let metadata = build_metadata(draft, image_uri.clone(), file_uri.clone());
        let document = serde_json::to_value(&metadata)?;
        let metadata_uri = self.store.upload_json(&document).await?.to_uri();

        Ok(UploadedContent {
            content_type,
            name: draft.name().trim().to_string(),
            description: draft.description().trim().to_string(),
            image_uri,
            metadata_uri,
            file_uri,
            metadata,
        })
    }
}

fn primary_asset(draft: &ContentDraft) -> Option<&Asset> {
    match draft {
        ContentDraft::Image { image: asset, .. }
        | ContentDraft::Video { file: asset, .. }
        | ContentDraft::Music { file: asset, .. } => asset.as_ref(),
        ContentDraft::Blog { .. } | ContentDraft::Code { .. } => None,
    }
}

/// Metadata document for a validated draft.
pub fn build_metadata(draft: &ContentDraft, image: String, file: Option<String>) -> MetadataDocument {
    let trimmed = |s: &Option<String>| {
        s.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let (link, url) = match draft {
        ContentDraft::Code { link, .. } => (trimmed(link), None),
        ContentDraft::Blog { url, .. } => (None, trimmed(url)),
        ContentDraft::Image { .. } | ContentDraft::Video { .. } | ContentDraft::Music { .. } => (None, None),
    };

    MetadataDocument {
        name: draft.name().trim().to_string(),
        description: draft.description().trim().to_string(),
        content_type: draft.content_type(),
        image,
        link,
        url,
        file,
    }
}
