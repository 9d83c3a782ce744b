use bytes::Bytes;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error};

use super::WorkflowError;

/// Some CDNs refuse library user agents, so attachment downloads pose as a browser.
const FETCH_USER_AGENT: &str = "Mozilla/5.0 (compatible; autopost)";

#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Bytes,
    pub filename: String,
    pub content_type: String,
}

/// What the chat platform tells us about an uploaded file.
#[derive(Debug, Clone, Default)]
pub struct AttachmentRef {
    pub url: String,
    pub proxy_url: Option<String>,
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

impl AttachmentRef {
    /// The proxy URL survives attachment expiry better, so it wins when present.
    pub fn download_url(&self) -> &str {
        self.proxy_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(&self.url)
    }

    pub fn resolved_filename(&self) -> String {
        self.filename
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .unwrap_or("image.jpg")
            .to_string()
    }

    pub fn resolved_content_type(&self) -> String {
        if let Some(ct) = self
            .content_type
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            return ct.to_string();
        }
        mime_guess::from_path(self.resolved_filename())
            .first()
            .filter(|m| m.type_() == mime_guess::mime::IMAGE)
            .map(|m| m.essence_str().to_string())
            .unwrap_or_else(|| "image/jpeg".to_string())
    }
}

#[derive(Clone)]
pub struct AttachmentFetcher {
    client: Client,
    timeout: Duration,
}

impl AttachmentFetcher {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Downloads the whole attachment into memory. Not retried.
    pub async fn fetch(&self, attachment: &AttachmentRef) -> Result<FetchedImage, WorkflowError> {
        let url = attachment.download_url().to_string();
        debug!("[fetch] GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, FETCH_USER_AGENT)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                error!("[fetch] {} failed: {}", url, e);
                WorkflowError::Fetch {
                    url: url.clone(),
                    status: e.status().map(|s| s.as_u16()),
                    message: if e.is_timeout() {
                        "timed out".to_string()
                    } else {
                        e.to_string()
                    },
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            error!("[fetch] {} answered HTTP {}", url, status);
            return Err(WorkflowError::Fetch {
                url,
                status: Some(status.as_u16()),
                message: status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| WorkflowError::Fetch {
            url: url.clone(),
            status: Some(status.as_u16()),
            message: e.to_string(),
        })?;
        debug!("[fetch] {} -> {} bytes", url, bytes.len());

        Ok(FetchedImage {
            bytes,
            filename: attachment.resolved_filename(),
            content_type: attachment.resolved_content_type(),
        })
    }
}
