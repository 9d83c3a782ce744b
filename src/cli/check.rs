use anyhow::Result;

use crate::core::config::BotConfig;
use crate::core::terminal::{self, GuideSection};

pub(super) fn run_check() -> Result<()> {
    let config = BotConfig::from_env()?;

    GuideSection::new("Discord")
        .status("Token", &config.masked_token())
        .status("Application", &config.application_id.to_string())
        .status("Allowed channel", &config.allowed_channel_id.to_string())
        .print();

    GuideSection::new("n8n webhooks")
        .status("Draft", &config.webhooks.draft)
        .status("Approve", &config.webhooks.approve)
        .status("Link thread", &config.webhooks.link_thread)
        .print();

    GuideSection::new("Behaviour")
        .status(
            "Defaults",
            &format!(
                "lingua={} target={} brand={}",
                config.defaults.language, config.defaults.target, config.defaults.brand
            ),
        )
        .status(
            "Timeouts",
            &format!(
                "fetch={}s draft={}s approve={}s link={}s",
                config.timeouts.fetch.as_secs(),
                config.timeouts.draft.as_secs(),
                config.timeouts.approve.as_secs(),
                config.timeouts.link.as_secs()
            ),
        )
        .status("Health port", &config.port.to_string())
        .status("Log level", &config.log_level.to_string())
        .status("Header fallback", &config.header_fallback.to_string())
        .status("Broadcast approvals", &config.broadcast_approvals.to_string())
        .print();

    println!();
    terminal::print_success("Configuration is valid.");
    Ok(())
}
