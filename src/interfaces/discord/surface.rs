//! serenity-backed implementations of the bridge's platform traits.

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use serenity::all::{
    AutoArchiveDuration, ChannelId, ChannelType, CommandInteraction, CreateInteractionResponse,
    CreateInteractionResponseMessage, CreateMessage, CreateThread, EditInteractionResponse,
    GetMessages, Http, MessageId,
};
use std::sync::Arc;
use tracing::debug;

use crate::core::bridge::{ChatSurface, DraftThread};
use crate::core::guard::{InteractionContext, InteractionResponder};
use crate::core::resolver::ThreadHistory;

pub struct DiscordSurface {
    http: Arc<Http>,
}

impl DiscordSurface {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ChatSurface for DiscordSurface {
    async fn open_draft_thread(
        &self,
        channel_id: u64,
        header: &str,
        thread_name: &str,
    ) -> Result<DraftThread> {
        let channel = ChannelId::new(channel_id);
        let starter = channel
            .send_message(&self.http, CreateMessage::new().content(header))
            .await
            .context("posting draft header")?;
        let thread = channel
            .create_thread_from_message(
                &self.http,
                starter.id,
                CreateThread::new(thread_name).auto_archive_duration(AutoArchiveDuration::OneDay),
            )
            .await
            .context("starting draft thread")?;
        Ok(DraftThread {
            thread_id: thread.id.get(),
            header_message_id: starter.id.get(),
        })
    }

    async fn send_message(&self, channel_id: u64, content: &str) -> Result<()> {
        ChannelId::new(channel_id)
            .send_message(&self.http, CreateMessage::new().content(content))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ThreadHistory for DiscordSurface {
    /// Thread messages newest first, then the starter message, which lives in the
    /// parent channel under the thread's own id.
    async fn recent_messages(&self, thread_id: &str, limit: u8) -> Result<Vec<String>> {
        let thread = ChannelId::new(thread_id.parse()?);
        let mut texts: Vec<String> = thread
            .messages(&self.http, GetMessages::new().limit(limit))
            .await?
            .into_iter()
            .map(|m| m.content)
            .collect();

        let parent = thread
            .to_channel(&self.http)
            .await?
            .guild()
            .and_then(|c| c.parent_id);
        if let Some(parent) = parent {
            match parent
                .message(&self.http, MessageId::new(thread.get()))
                .await
            {
                Ok(starter) => texts.push(starter.content),
                Err(e) => debug!("[discord] No starter message for thread {}: {}", thread, e),
            }
        }
        Ok(texts)
    }
}

/// Acknowledges one slash-command interaction.
pub struct CommandResponder {
    http: Arc<Http>,
    command: CommandInteraction,
}

impl CommandResponder {
    pub fn new(http: Arc<Http>, command: CommandInteraction) -> Self {
        Self { http, command }
    }
}

#[async_trait]
impl InteractionResponder for CommandResponder {
    async fn defer_ephemeral(&self) -> Result<()> {
        self.command.defer_ephemeral(&self.http).await?;
        Ok(())
    }

    async fn edit_reply(&self, content: &str) -> Result<()> {
        self.command
            .edit_response(&self.http, EditInteractionResponse::new().content(content))
            .await?;
        Ok(())
    }

    async fn reply_ephemeral(&self, content: &str) -> Result<()> {
        self.command
            .create_response(
                &self.http,
                CreateInteractionResponse::Message(
                    CreateInteractionResponseMessage::new()
                        .content(content)
                        .ephemeral(true),
                ),
            )
            .await?;
        Ok(())
    }
}

pub fn interaction_context(command: &CommandInteraction) -> InteractionContext {
    let channel = command.channel.as_ref();
    InteractionContext {
        guild_id: command.guild_id.map(|g| g.get()),
        channel_id: command.channel_id.get(),
        parent_id: channel.and_then(|c| c.parent_id).map(|p| p.get()),
        is_thread: channel.is_some_and(|c| {
            matches!(
                c.kind,
                ChannelType::PublicThread | ChannelType::PrivateThread | ChannelType::NewsThread
            )
        }),
        user: command.user.name.clone(),
    }
}
