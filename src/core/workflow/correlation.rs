//! Client for the thread ↔ approval-token association kept by the workflow.
//!
//! The bot holds no state between interactions, so an approval issued inside a
//! draft thread (possibly after a restart) finds its token here.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

use super::normalize::text_field;
use super::{Origin, WorkflowError, dispatch};

const ENDPOINT: &str = "link-thread";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadLink {
    pub thread_id: String,
    pub approval_token: String,
    pub draft_message_id: String,
    pub stable_media_url: Option<String>,
    pub origin: Origin,
}

#[async_trait]
pub trait CorrelationStore: Send + Sync {
    /// Creates or overwrites the link for `link.thread_id`. Last write wins.
    async fn link(&self, link: &ThreadLink) -> Result<(), WorkflowError>;

    /// Returns the token linked to `thread_id`, if any.
    async fn get(&self, thread_id: &str) -> Result<Option<String>, WorkflowError>;
}

#[derive(Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
enum StoreRequest<'a> {
    Link {
        thread_id: &'a str,
        approval_token: &'a str,
        draft_message_id: &'a str,
        stable_media_url: &'a str,
        discord_guild_id: &'a str,
        discord_channel_id: &'a str,
        discord_user: &'a str,
    },
    Get {
        thread_id: &'a str,
    },
}

#[derive(Clone)]
pub struct WebhookCorrelationStore {
    client: Client,
    url: String,
    timeout: Duration,
}

impl WebhookCorrelationStore {
    pub fn new(client: Client, url: String, timeout: Duration) -> Self {
        Self {
            client,
            url,
            timeout,
        }
    }
}

#[async_trait]
impl CorrelationStore for WebhookCorrelationStore {
    async fn link(&self, link: &ThreadLink) -> Result<(), WorkflowError> {
        let body = StoreRequest::Link {
            thread_id: &link.thread_id,
            approval_token: &link.approval_token,
            draft_message_id: &link.draft_message_id,
            stable_media_url: link.stable_media_url.as_deref().unwrap_or(""),
            discord_guild_id: &link.origin.guild_id,
            discord_channel_id: &link.origin.channel_id,
            discord_user: &link.origin.user,
        };
        let request = self.client.post(&self.url).timeout(self.timeout).json(&body);
        let response = dispatch(ENDPOINT, request).await?;

        // An empty 200 is how a plain "Respond immediately" webhook acknowledges.
        if response.raw.trim().is_empty() && response.status < 400 {
            info!("[link] Linked thread {}", link.thread_id);
            return Ok(());
        }
        if response.data.is_none() && response.status < 400 {
            debug!(
                "[link] Non-JSON acknowledgement for thread {} (HTTP {})",
                link.thread_id, response.status
            );
            return Ok(());
        }
        response.into_data(ENDPOINT)?;
        info!("[link] Linked thread {}", link.thread_id);
        Ok(())
    }

    async fn get(&self, thread_id: &str) -> Result<Option<String>, WorkflowError> {
        let request = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&StoreRequest::Get { thread_id });
        let response = dispatch(ENDPOINT, request).await?;

        // "Nothing linked" usually arrives as an empty body or an empty array.
        let Some(data) = response.data else {
            debug!(
                "[link] No link data for thread {} (HTTP {})",
                thread_id, response.status
            );
            return Ok(None);
        };
        Ok(text_field(&data, "approval_token"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn link_request_is_tagged_with_action() {
        let body = StoreRequest::Link {
            thread_id: "42",
            approval_token: "tok",
            draft_message_id: "41",
            stable_media_url: "",
            discord_guild_id: "1",
            discord_channel_id: "2",
            discord_user: "u",
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "action": "link",
                "thread_id": "42",
                "approval_token": "tok",
                "draft_message_id": "41",
                "stable_media_url": "",
                "discord_guild_id": "1",
                "discord_channel_id": "2",
                "discord_user": "u",
            })
        );
    }

    #[test]
    fn get_request_carries_only_thread() {
        assert_eq!(
            serde_json::to_value(StoreRequest::Get { thread_id: "42" }).unwrap(),
            json!({ "action": "get", "thread_id": "42" })
        );
    }
}
