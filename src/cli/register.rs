use anyhow::Result;
use serenity::all::{ApplicationId, Http};

use crate::core::config::BotConfig;
use crate::core::terminal;
use crate::interfaces::discord::register_commands;

pub(super) async fn run_register() -> Result<()> {
    let config = BotConfig::from_env()?;
    crate::logging::init(config.log_level, true);

    let http = Http::new(&config.discord_token);
    http.set_application_id(ApplicationId::new(config.application_id));

    terminal::print_info("Publishing slash commands...");
    let count = register_commands(&http).await?;
    terminal::print_success(&format!(
        "Registered {} global commands for application {}.",
        count, config.application_id
    ));
    terminal::print_warn("Global commands can take a few minutes to show up in clients.");
    Ok(())
}
