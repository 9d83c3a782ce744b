use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required env var: {0}")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Values used when the `/post` caller leaves an option blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftDefaults {
    pub language: String,
    pub target: String,
    pub brand: String,
}

impl Default for DraftDefaults {
    fn default() -> Self {
        Self {
            language: "it".to_string(),
            target: "b2b".to_string(),
            brand: "idrogrow.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookUrls {
    pub draft: String,
    pub approve: String,
    pub link_thread: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeouts {
    pub fetch: Duration,
    pub draft: Duration,
    pub approve: Duration,
    pub link: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            fetch: Duration::from_secs(15),
            draft: Duration::from_secs(150),
            approve: Duration::from_secs(60),
            link: Duration::from_secs(20),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub discord_token: String,
    pub application_id: u64,
    pub allowed_channel_id: u64,
    pub webhooks: WebhookUrls,
    pub defaults: DraftDefaults,
    pub timeouts: Timeouts,
    pub port: u16,
    pub log_level: tracing::Level,
    pub broadcast_approvals: bool,
    pub header_fallback: bool,
}

impl BotConfig {
    /// Loads `.env` (if any) and reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let discord_token = get("DISCORD_BOT_TOKEN")
            .or_else(|| get("DISCORD_TOKEN"))
            .ok_or(ConfigError::Missing("DISCORD_BOT_TOKEN or DISCORD_TOKEN"))?;

        let application_id = parse_snowflake("DISCORD_APP_ID", get("DISCORD_APP_ID"))?;
        let allowed_channel_id =
            parse_snowflake("ALLOWED_CHANNEL_ID", get("ALLOWED_CHANNEL_ID"))?;

        let webhooks = WebhookUrls {
            draft: parse_url("N8N_DRAFT_WEBHOOK_URL", get("N8N_DRAFT_WEBHOOK_URL"))?,
            approve: parse_url("N8N_APPROVE_WEBHOOK_URL", get("N8N_APPROVE_WEBHOOK_URL"))?,
            link_thread: parse_url(
                "N8N_LINK_THREAD_WEBHOOK_URL",
                get("N8N_LINK_THREAD_WEBHOOK_URL"),
            )?,
        };

        let fallback = DraftDefaults::default();
        let defaults = DraftDefaults {
            language: get("DEFAULT_LANGUAGE")
                .map(|v| v.to_lowercase())
                .unwrap_or(fallback.language),
            target: get("DEFAULT_TARGET")
                .map(|v| v.to_lowercase())
                .unwrap_or(fallback.target),
            brand: get("DEFAULT_BRAND").unwrap_or(fallback.brand),
        };

        let base = Timeouts::default();
        let timeouts = Timeouts {
            fetch: parse_secs("FETCH_TIMEOUT_SECS", get("FETCH_TIMEOUT_SECS"), base.fetch)?,
            draft: parse_secs("DRAFT_TIMEOUT_SECS", get("DRAFT_TIMEOUT_SECS"), base.draft)?,
            approve: parse_secs(
                "APPROVE_TIMEOUT_SECS",
                get("APPROVE_TIMEOUT_SECS"),
                base.approve,
            )?,
            link: parse_secs("LINK_TIMEOUT_SECS", get("LINK_TIMEOUT_SECS"), base.link)?,
        };

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                key: "PORT",
                reason: e.to_string(),
            })?,
            None => 10000,
        };

        let log_level = match get("LOG_LEVEL") {
            Some(raw) => raw.parse::<tracing::Level>().map_err(|_| ConfigError::Invalid {
                key: "LOG_LEVEL",
                reason: format!("unknown level '{}'", raw),
            })?,
            None => tracing::Level::INFO,
        };

        Ok(Self {
            discord_token,
            application_id,
            allowed_channel_id,
            webhooks,
            defaults,
            timeouts,
            port,
            log_level,
            broadcast_approvals: parse_flag(
                "BROADCAST_APPROVALS",
                get("BROADCAST_APPROVALS"),
                false,
            )?,
            header_fallback: parse_flag(
                "TOKEN_HEADER_FALLBACK",
                get("TOKEN_HEADER_FALLBACK"),
                true,
            )?,
        })
    }

    pub fn masked_token(&self) -> String {
        mask(&self.discord_token)
    }

    pub fn log_summary(&self) {
        info!("N8N_DRAFT_WEBHOOK_URL: {}", self.webhooks.draft);
        info!("N8N_APPROVE_WEBHOOK_URL: {}", self.webhooks.approve);
        info!("N8N_LINK_THREAD_WEBHOOK_URL: {}", self.webhooks.link_thread);
        info!("ALLOWED_CHANNEL_ID: {}", self.allowed_channel_id);
        info!("DISCORD_TOKEN (masked): {}", self.masked_token());
    }
}

/// Keeps the first and last four characters of a secret.
pub fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 10 {
        return "***".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}

fn parse_snowflake(key: &'static str, value: Option<String>) -> Result<u64, ConfigError> {
    let raw = value.ok_or(ConfigError::Missing(key))?;
    match raw.parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ConfigError::Invalid {
            key,
            reason: format!("'{}' is not a Discord id", raw),
        }),
    }
}

fn parse_url(key: &'static str, value: Option<String>) -> Result<String, ConfigError> {
    let raw = value.ok_or(ConfigError::Missing(key))?;
    let parsed = url::Url::parse(&raw).map_err(|e| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ConfigError::Invalid {
            key,
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    Ok(raw)
}

fn parse_secs(
    key: &'static str,
    value: Option<String>,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => match raw.parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
            _ => Err(ConfigError::Invalid {
                key,
                reason: format!("'{}' is not a positive number of seconds", raw),
            }),
        },
    }
}

fn parse_flag(
    key: &'static str,
    value: Option<String>,
    default: bool,
) -> Result<bool, ConfigError> {
    let Some(raw) = value else {
        return Ok(default);
    };
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "si" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            reason: format!("'{}' is not a boolean", raw),
        }),
    }
}

#[cfg(test)]
pub(crate) fn test_config(base: &str) -> BotConfig {
    BotConfig {
        discord_token: "test-token-0123456789".to_string(),
        application_id: 1,
        allowed_channel_id: 100,
        webhooks: WebhookUrls {
            draft: format!("{}/webhook/draft", base),
            approve: format!("{}/webhook/approve", base),
            link_thread: format!("{}/webhook/link-thread", base),
        },
        defaults: DraftDefaults::default(),
        timeouts: Timeouts {
            fetch: Duration::from_secs(5),
            draft: Duration::from_secs(5),
            approve: Duration::from_secs(5),
            link: Duration::from_secs(5),
        },
        port: 0,
        log_level: tracing::Level::INFO,
        broadcast_approvals: false,
        header_fallback: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn required() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DISCORD_BOT_TOKEN", "  abcdefghijklmnop  "),
            ("DISCORD_APP_ID", "123456789012345678"),
            ("N8N_DRAFT_WEBHOOK_URL", "https://n8n.example.com/webhook/draft"),
            ("N8N_APPROVE_WEBHOOK_URL", "https://n8n.example.com/webhook/approve"),
            (
                "N8N_LINK_THREAD_WEBHOOK_URL",
                "https://n8n.example.com/webhook/link-thread",
            ),
            ("ALLOWED_CHANNEL_ID", "987654321098765432"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<BotConfig, ConfigError> {
        BotConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn loads_required_values_and_defaults() {
        let cfg = load(&required()).unwrap();
        assert_eq!(cfg.discord_token, "abcdefghijklmnop");
        assert_eq!(cfg.application_id, 123456789012345678);
        assert_eq!(cfg.allowed_channel_id, 987654321098765432);
        assert_eq!(cfg.defaults, DraftDefaults::default());
        assert_eq!(cfg.timeouts, Timeouts::default());
        assert_eq!(cfg.port, 10000);
        assert!(!cfg.broadcast_approvals);
        assert!(cfg.header_fallback);
    }

    #[test]
    fn falls_back_to_legacy_token_name() {
        let mut vars = required();
        vars.remove("DISCORD_BOT_TOKEN");
        vars.insert("DISCORD_TOKEN", "legacy-token-value");
        assert_eq!(load(&vars).unwrap().discord_token, "legacy-token-value");
    }

    #[test]
    fn missing_webhook_is_fatal() {
        let mut vars = required();
        vars.remove("N8N_APPROVE_WEBHOOK_URL");
        assert_eq!(
            load(&vars).unwrap_err(),
            ConfigError::Missing("N8N_APPROVE_WEBHOOK_URL")
        );
    }

    #[test]
    fn blank_value_counts_as_missing() {
        let mut vars = required();
        vars.insert("ALLOWED_CHANNEL_ID", "   ");
        assert_eq!(
            load(&vars).unwrap_err(),
            ConfigError::Missing("ALLOWED_CHANNEL_ID")
        );
    }

    #[test]
    fn rejects_non_numeric_ids_and_bad_urls() {
        let mut vars = required();
        vars.insert("DISCORD_APP_ID", "my-app");
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::Invalid { key: "DISCORD_APP_ID", .. }
        ));

        let mut vars = required();
        vars.insert("N8N_DRAFT_WEBHOOK_URL", "ftp://n8n.example.com/draft");
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::Invalid { key: "N8N_DRAFT_WEBHOOK_URL", .. }
        ));
    }

    #[test]
    fn optional_overrides_are_applied() {
        let mut vars = required();
        vars.insert("DEFAULT_LANGUAGE", "EN");
        vars.insert("DEFAULT_BRAND", "example.org");
        vars.insert("PORT", "8080");
        vars.insert("BROADCAST_APPROVALS", "si");
        vars.insert("TOKEN_HEADER_FALLBACK", "off");
        vars.insert("APPROVE_TIMEOUT_SECS", "90");
        vars.insert("LOG_LEVEL", "debug");

        let cfg = load(&vars).unwrap();
        assert_eq!(cfg.defaults.language, "en");
        assert_eq!(cfg.defaults.brand, "example.org");
        assert_eq!(cfg.defaults.target, "b2b");
        assert_eq!(cfg.port, 8080);
        assert!(cfg.broadcast_approvals);
        assert!(!cfg.header_fallback);
        assert_eq!(cfg.timeouts.approve, Duration::from_secs(90));
        assert_eq!(cfg.log_level, tracing::Level::DEBUG);
    }

    #[test]
    fn rejects_zero_timeout() {
        let mut vars = required();
        vars.insert("DRAFT_TIMEOUT_SECS", "0");
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::Invalid { key: "DRAFT_TIMEOUT_SECS", .. }
        ));
    }

    #[test]
    fn mask_hides_short_and_long_secrets() {
        assert_eq!(mask("short"), "***");
        assert_eq!(mask("abcdefghijklmnop"), "abcd…mnop");
    }
}
