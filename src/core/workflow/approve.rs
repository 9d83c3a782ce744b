use reqwest::Client;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{error, info};

use super::normalize::{ok_flag, text_field};
use super::{BODY_PREVIEW_CHARS, Origin, WorkflowError, dispatch, truncate_chars};

const ENDPOINT: &str = "approve";

/// Publishing target chosen in `/approvato`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Facebook,
    Instagram,
    X,
    Tiktok,
    Signal,
    All,
}

impl Platform {
    /// Concrete destinations, in presentation order.
    pub const TARGETS: [Platform; 5] = [
        Platform::Facebook,
        Platform::Instagram,
        Platform::X,
        Platform::Tiktok,
        Platform::Signal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Facebook => "facebook",
            Platform::Instagram => "instagram",
            Platform::X => "x",
            Platform::Tiktok => "tiktok",
            Platform::Signal => "signal",
            Platform::All => "all",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Platform::Facebook => "Facebook",
            Platform::Instagram => "Instagram",
            Platform::X => "X",
            Platform::Tiktok => "TikTok",
            Platform::Signal => "Signal",
            Platform::All => "tutte",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "facebook" => Ok(Platform::Facebook),
            "instagram" => Ok(Platform::Instagram),
            "x" | "twitter" => Ok(Platform::X),
            "tiktok" => Ok(Platform::Tiktok),
            "signal" => Ok(Platform::Signal),
            "all" | "tutte" => Ok(Platform::All),
            other => Err(format!("unknown platform '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalRequest {
    pub approval_token: String,
    pub platform: Platform,
    pub origin: Origin,
}

#[derive(Serialize)]
struct ApprovePayload<'a> {
    platform: &'a str,
    approval_token: &'a str,
    discord_guild_id: &'a str,
    discord_channel_id: &'a str,
    discord_user: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApprovalOutcome {
    pub status: Option<String>,
    pub post_urls: Vec<(Platform, String)>,
}

impl ApprovalOutcome {
    fn from_data(data: &Map<String, Value>) -> Self {
        let nested = data
            .get("post_urls")
            .or_else(|| data.get("urls"))
            .and_then(Value::as_object);
        let post_urls = Platform::TARGETS
            .iter()
            .filter_map(|platform| {
                let key = platform.as_str();
                let url = nested
                    .and_then(|m| text_field(m, key))
                    .or_else(|| text_field(data, &format!("{}_post_url", key)))
                    .or_else(|| text_field(data, &format!("{}_url", key)))?;
                Some((*platform, url))
            })
            .collect();

        Self {
            status: text_field(data, "status"),
            post_urls,
        }
    }
}

#[derive(Clone)]
pub struct ApproveClient {
    client: Client,
    url: String,
    timeout: Duration,
}

impl ApproveClient {
    pub fn new(client: Client, url: String, timeout: Duration) -> Self {
        Self {
            client,
            url,
            timeout,
        }
    }

    /// Success requires an explicit `ok: true`; anything else is a reported failure.
    pub async fn approve(
        &self,
        request: &ApprovalRequest,
    ) -> Result<ApprovalOutcome, WorkflowError> {
        info!(
            "[approve] Approving token for platform={} (user {})",
            request.platform, request.origin.user
        );
        let payload = ApprovePayload {
            platform: request.platform.as_str(),
            approval_token: &request.approval_token,
            discord_guild_id: &request.origin.guild_id,
            discord_channel_id: &request.origin.channel_id,
            discord_user: &request.origin.user,
        };
        let builder = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&payload);

        let response = dispatch(ENDPOINT, builder).await.inspect_err(|e| {
            error!("[approve] request failed: {}", e);
        })?;
        let status = response.status;
        let raw = response.raw.clone();
        let data = response.into_data(ENDPOINT).inspect_err(|e| {
            error!("[approve] {}", e);
        })?;

        if ok_flag(&data) != Some(true) {
            error!(
                "[approve] no success marker in response: {}",
                truncate_chars(&raw, BODY_PREVIEW_CHARS)
            );
            return Err(WorkflowError::Rejected {
                endpoint: ENDPOINT,
                status,
                message: text_field(&data, "status")
                    .or_else(|| Some("missing ok=true".to_string())),
                body: raw,
            });
        }

        let outcome = ApprovalOutcome::from_data(&data);
        info!(
            "[approve] Workflow accepted platform={} status={}",
            request.platform,
            outcome.status.as_deref().unwrap_or("-")
        );
        Ok(outcome)
    }
}
