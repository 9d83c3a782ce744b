mod check;
mod register;
mod run;

use anyhow::{Result, bail};
use console::style;

use crate::core::terminal::{self, GuideSection, print_error};

fn print_help() {
    terminal::print_banner();

    GuideSection::new("Commands")
        .command("run", "Start the bot and the health endpoint (default)")
        .command("check", "Validate the environment and print a masked summary")
        .command("register", "Publish the /post and /approvato slash commands")
        .command("help", "Show this help")
        .print();

    GuideSection::new("Environment")
        .status("Required", "DISCORD_BOT_TOKEN, DISCORD_APP_ID, ALLOWED_CHANNEL_ID")
        .status(
            "Webhooks",
            "N8N_DRAFT_WEBHOOK_URL, N8N_APPROVE_WEBHOOK_URL, N8N_LINK_THREAD_WEBHOOK_URL",
        )
        .status("Optional", "PORT, LOG_LEVEL, DEFAULT_*, *_TIMEOUT_SECS")
        .print();

    println!(
        "\n {} {} <command>\n",
        style("Usage:").bold(),
        style("autopost").green()
    );
}

pub async fn run_main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let cmd = args.get(1).map(String::as_str).unwrap_or("run");

    match cmd {
        "run" => run::run_bot().await,
        "check" => check::run_check(),
        "register" => register::run_register().await,
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        other => {
            print_error(&format!("Unknown command '{}'", other));
            print_help();
            bail!("unknown command '{}'", other)
        }
    }
}
