pub mod commands;
pub mod surface;

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use serenity::Client;
use serenity::all::{
    ApplicationId, Command, CommandInteraction, Context, CreateInteractionResponse,
    CreateInteractionResponseMessage, EditInteractionResponse, EventHandler, GatewayIntents, Http,
    Interaction, Ready, ShardManager,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::core::bridge::Bridge;
use crate::core::config::BotConfig;
use crate::core::guard::InteractionGuard;
use crate::core::lifecycle::LifecycleComponent;
use crate::core::presenter;
use commands::{CommandArgs, ParsedCommand};
use surface::{CommandResponder, DiscordSurface, interaction_context};

/// Publishes `/post` and `/approvato` as global application commands.
pub async fn register_commands(http: &Http) -> Result<usize> {
    let registered = Command::set_global_commands(http, commands::definitions())
        .await
        .context("registering slash commands")?;
    Ok(registered.len())
}

struct Handler {
    bridge: Arc<Bridge>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("[discord] Bot connected as {}", ready.user.name);
        match register_commands(&ctx.http).await {
            Ok(n) => info!("[discord] Registered {} slash commands", n),
            Err(e) => error!("[discord] {:#}", e),
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::Command(command) = interaction else {
            return;
        };
        let fallback = command.clone();
        let http = ctx.http.clone();
        let task = tokio::spawn(handle_command(self.bridge.clone(), ctx.http, command));
        if let Err(e) = task.await {
            error!("[discord] /{} handler crashed: {}", fallback.data.name, e);
            report_crash(&http, &fallback).await;
        }
    }
}

async fn handle_command(bridge: Arc<Bridge>, http: Arc<Http>, command: CommandInteraction) {
    let ctx = interaction_context(&command);
    let name = command.data.name.clone();
    let args = CommandArgs::from_resolved(command.data.options());
    let responder = CommandResponder::new(http.clone(), command);
    let surface = DiscordSurface::new(http);

    let outcome = match commands::parse(&name, &args) {
        Ok(ParsedCommand::Draft(cmd)) => bridge.handle_draft(&responder, &surface, &ctx, cmd).await,
        Ok(ParsedCommand::Approve(cmd)) => {
            bridge.handle_approval(&responder, &surface, &ctx, cmd).await
        }
        Err(e) => {
            warn!("[discord] Unusable /{} from {}: {}", name, ctx.user, e);
            let guard = InteractionGuard::new(&responder);
            let allowed = bridge.allowed_channel_id();
            if guard
                .admit(&ctx, allowed, &presenter::channel_rejected(allowed))
                .await
            {
                guard
                    .resolve(&presenter::invalid_command(&e.to_string()))
                    .await;
            }
            return;
        }
    };
    info!("[discord] /{} from {} finished: {:?}", name, ctx.user, outcome);
}

/// Best effort: the crashed task may or may not have deferred already.
async fn report_crash(http: &Http, command: &CommandInteraction) {
    let text = presenter::unexpected_failure();
    if command
        .edit_response(http, EditInteractionResponse::new().content(&text))
        .await
        .is_ok()
    {
        return;
    }
    let reply = CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .content(text)
            .ephemeral(true),
    );
    if let Err(e) = command.create_response(http, reply).await {
        warn!("[discord] Could not report crash to user: {}", e);
    }
}

/// The gateway connection. Its loss trips the shared shutdown token.
pub struct DiscordChannel {
    config: Arc<BotConfig>,
    bridge: Arc<Bridge>,
    shutdown: CancellationToken,
    shard_manager: Option<Arc<ShardManager>>,
}

impl DiscordChannel {
    pub fn new(config: Arc<BotConfig>, bridge: Arc<Bridge>, shutdown: CancellationToken) -> Self {
        Self {
            config,
            bridge,
            shutdown,
            shard_manager: None,
        }
    }
}

#[async_trait]
impl LifecycleComponent for DiscordChannel {
    async fn on_init(&mut self) -> Result<()> {
        info!(
            "[discord] Initializing for channel {} (token {})",
            self.config.allowed_channel_id,
            self.config.masked_token()
        );
        Ok(())
    }

    async fn on_start(&mut self) -> Result<()> {
        let handler = Handler {
            bridge: self.bridge.clone(),
        };
        let mut client = Client::builder(&self.config.discord_token, GatewayIntents::GUILDS)
            .application_id(ApplicationId::new(self.config.application_id))
            .event_handler(handler)
            .await
            .context("creating Discord client")?;
        self.shard_manager = Some(client.shard_manager.clone());

        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            match client.start().await {
                Ok(()) => info!("[discord] Gateway connection closed"),
                Err(e) => error!("[discord] Client error: {:?}", e),
            }
            shutdown.cancel();
        });
        Ok(())
    }

    async fn on_shutdown(&mut self) -> Result<()> {
        info!("[discord] Shutting down gateway connection...");
        if let Some(manager) = self.shard_manager.take() {
            manager.shutdown_all().await;
        }
        Ok(())
    }
}
