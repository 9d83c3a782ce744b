pub mod approve;
pub mod attachment;
pub mod correlation;
pub mod draft;
pub mod normalize;

use reqwest::RequestBuilder;
use serde_json::{Map, Value};
use thiserror::Error;

pub use approve::{ApprovalOutcome, ApprovalRequest, ApproveClient, Platform};
pub use attachment::{AttachmentFetcher, AttachmentRef, FetchedImage};
pub use correlation::{CorrelationStore, ThreadLink, WebhookCorrelationStore};
pub use draft::{Caption, DraftClient, DraftOptions, DraftRequest, DraftResult};

/// Raw bodies shown back to users are cut to this many characters.
pub const BODY_PREVIEW_CHARS: usize = 800;

/// Who sent a request. Forwarded verbatim to every webhook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Origin {
    pub guild_id: String,
    pub channel_id: String,
    pub user: String,
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("image download failed ({}): {message}", status_label(.status))]
    Fetch {
        url: String,
        status: Option<u16>,
        message: String,
    },
    #[error("{endpoint} webhook unreachable: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} webhook returned a non-JSON response (HTTP {status})")]
    NonJson {
        endpoint: &'static str,
        status: u16,
        body: String,
    },
    #[error(
        "{endpoint} webhook reported an error (HTTP {status}): {}",
        .message.as_deref().unwrap_or("no message")
    )]
    Rejected {
        endpoint: &'static str,
        status: u16,
        message: Option<String>,
        body: String,
    },
    #[error("draft webhook returned no approval_token (HTTP {status})")]
    MissingToken { status: u16, body: String },
}

impl WorkflowError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Fetch { status, .. } => *status,
            Self::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            Self::NonJson { status, .. }
            | Self::Rejected { status, .. }
            | Self::MissingToken { status, .. } => Some(*status),
        }
    }

    pub fn body(&self) -> Option<&str> {
        match self {
            Self::NonJson { body, .. }
            | Self::Rejected { body, .. }
            | Self::MissingToken { body, .. } => Some(body.as_str()),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport { source, .. } if source.is_timeout())
    }
}

fn status_label(status: &Option<u16>) -> String {
    status
        .map(|s| format!("HTTP {}", s))
        .unwrap_or_else(|| "no status".to_string())
}

/// A webhook answer after envelope normalization.
#[derive(Debug)]
pub struct WebhookResponse {
    pub status: u16,
    pub raw: String,
    pub data: Option<Map<String, Value>>,
}

impl WebhookResponse {
    /// Fails on unusable bodies and on explicit `ok: false` / `error` envelopes.
    pub fn into_data(self, endpoint: &'static str) -> Result<Map<String, Value>, WorkflowError> {
        let Some(data) = self.data else {
            return Err(WorkflowError::NonJson {
                endpoint,
                status: self.status,
                body: self.raw,
            });
        };
        let explicit_error = match data.get("error") {
            None | Some(Value::Null) | Some(Value::Bool(false)) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        };
        if explicit_error || normalize::ok_flag(&data) == Some(false) {
            return Err(WorkflowError::Rejected {
                endpoint,
                status: self.status,
                message: normalize::error_message(&data),
                body: self.raw,
            });
        }
        Ok(data)
    }
}

/// Sends a prepared request and normalizes whatever comes back. HTTP status codes are
/// recorded but never treated as failures on their own: n8n answers 200 with error
/// envelopes and 500 with perfectly usable ones.
pub(crate) async fn dispatch(
    endpoint: &'static str,
    request: RequestBuilder,
) -> Result<WebhookResponse, WorkflowError> {
    let response = request
        .send()
        .await
        .map_err(|source| WorkflowError::Transport { endpoint, source })?;
    let status = response.status().as_u16();
    let raw = response
        .text()
        .await
        .map_err(|source| WorkflowError::Transport { endpoint, source })?;
    let data = normalize::normalize_body(&raw);
    Ok(WebhookResponse { status, raw, data })
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(concat!("autopost/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Cuts `text` to `max` characters, marking the cut with an ellipsis.
pub fn truncate_chars(text: &str, max: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{}…", head)
    } else {
        head
    }
}
