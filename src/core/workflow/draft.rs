use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{error, info};

use super::approve::Platform;
use super::normalize::text_field;
use super::{FetchedImage, Origin, WorkflowError, dispatch};
use crate::core::config::DraftDefaults;

const ENDPOINT: &str = "draft";

/// `/post` options as typed by the user, before defaults are applied.
#[derive(Debug, Clone, Default)]
pub struct DraftOptions {
    pub description: String,
    pub post_description: Option<String>,
    pub language: Option<String>,
    pub target: Option<String>,
    pub link: Option<String>,
    pub brand: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DraftRequest {
    pub description: String,
    pub post_description: String,
    pub language: String,
    pub target: String,
    pub link: String,
    pub brand: String,
    pub origin: Origin,
    pub image: FetchedImage,
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl DraftRequest {
    pub fn build(
        options: &DraftOptions,
        defaults: &DraftDefaults,
        origin: Origin,
        image: FetchedImage,
    ) -> Self {
        Self {
            description: options.description.trim().to_string(),
            post_description: non_blank(options.post_description.as_ref()).unwrap_or_default(),
            language: non_blank(options.language.as_ref())
                .unwrap_or_else(|| defaults.language.clone())
                .to_lowercase(),
            target: non_blank(options.target.as_ref())
                .unwrap_or_else(|| defaults.target.clone())
                .to_lowercase(),
            link: non_blank(options.link.as_ref()).unwrap_or_default(),
            brand: non_blank(options.brand.as_ref()).unwrap_or_else(|| defaults.brand.clone()),
            origin,
            image,
        }
    }

    /// Text parts in the order the workflow expects them.
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("description", self.description.clone()),
            ("post_description", self.post_description.clone()),
            ("language", self.language.clone()),
            ("target", self.target.clone()),
            ("link", self.link.clone()),
            ("brand", self.brand.clone()),
            ("discord_guild_id", self.origin.guild_id.clone()),
            ("discord_channel_id", self.origin.channel_id.clone()),
            ("discord_user", self.origin.user.clone()),
        ]
    }

    /// Fails only when the attachment's content type is not a valid MIME string.
    pub fn into_form(self) -> Result<Form, reqwest::Error> {
        let mut form = Form::new();
        for (name, value) in self.text_fields() {
            form = form.text(name, value);
        }
        let len = self.image.bytes.len() as u64;
        let part = Part::stream_with_length(self.image.bytes, len)
            .file_name(self.image.filename)
            .mime_str(&self.image.content_type)?;
        Ok(form.part("image", part))
    }
}

/// Generated copy for one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caption {
    pub platform: Platform,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftResult {
    pub approval_token: String,
    pub stable_media_url: Option<String>,
    pub captions: Vec<Caption>,
}

impl DraftResult {
    /// Returns `None` when the workflow did not mint a token. Every other field is optional.
    pub fn from_data(data: &Map<String, Value>) -> Option<Self> {
        let approval_token = text_field(data, "approval_token")?;
        let nested = data.get("captions").and_then(Value::as_object);

        let captions = Platform::TARGETS
            .iter()
            .filter_map(|platform| {
                let key = platform.as_str();
                let text = nested
                    .and_then(|m| text_field(m, key))
                    .or_else(|| text_field(data, &format!("{}_caption", key)))
                    .or_else(|| text_field(data, key))?;
                Some(Caption {
                    platform: *platform,
                    text,
                })
            })
            .collect();

        Some(Self {
            approval_token,
            stable_media_url: text_field(data, "stable_media_url"),
            captions,
        })
    }
}

#[derive(Clone)]
pub struct DraftClient {
    client: Client,
    url: String,
    timeout: Duration,
}

impl DraftClient {
    pub fn new(client: Client, url: String, timeout: Duration) -> Self {
        Self {
            client,
            url,
            timeout,
        }
    }

    pub async fn create(&self, request: DraftRequest) -> Result<DraftResult, WorkflowError> {
        info!(
            "[draft] Sending draft for brand={} language={} target={} ({} bytes image)",
            request.brand,
            request.language,
            request.target,
            request.image.bytes.len()
        );

        let form = request
            .into_form()
            .map_err(|source| WorkflowError::Transport {
                endpoint: ENDPOINT,
                source,
            })?;
        let builder = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .multipart(form);

        let response = dispatch(ENDPOINT, builder).await.inspect_err(|e| {
            error!("[draft] request failed: {}", e);
        })?;
        let status = response.status;
        let raw = response.raw.clone();
        let data = response.into_data(ENDPOINT).inspect_err(|e| {
            error!("[draft] {}", e);
        })?;

        let result = DraftResult::from_data(&data)
            .ok_or(WorkflowError::MissingToken { status, body: raw })?;
        info!(
            "[draft] Draft ready with {} caption(s)",
            result.captions.len()
        );
        Ok(result)
    }
}
