//! The two command flows, independent of the chat SDK.
//!
//! `/post`: fetch image → draft webhook → header + thread → link → captions.
//! `/approvato`: confirmation → token resolution → approve webhook → reply.


use anyhow::Result;
use async_trait::async_trait;
use chrono::Local;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::chunker::{CHUNK_CHARS, chunk_message};
use super::config::{BotConfig, DraftDefaults};
use super::guard::{InteractionContext, InteractionGuard, InteractionResponder};
use super::presenter::{self, DraftSummary};
use super::resolver::{ThreadHistory, TokenResolver};
use super::workflow::{
    ApprovalRequest, ApproveClient, AttachmentFetcher, AttachmentRef, CorrelationStore,
    DraftClient, DraftOptions, DraftRequest, Platform, ThreadLink, WebhookCorrelationStore,
    http_client,
};

/// Outbound side of the chat platform used by the flows.
#[async_trait]
pub trait ChatSurface: Send + Sync {
    /// Posts `header` in `channel_id` and starts a thread from that message.
    async fn open_draft_thread(
        &self,
        channel_id: u64,
        header: &str,
        thread_name: &str,
    ) -> Result<DraftThread>;

    async fn send_message(&self, channel_id: u64, content: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DraftThread {
    pub thread_id: u64,
    pub header_message_id: u64,
}

#[derive(Debug, Clone)]
pub struct DraftCommand {
    pub options: DraftOptions,
    pub attachment: AttachmentRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApproveCommand {
    pub platform: Platform,
    pub confirmed: bool,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
    /// Issued outside the allowed channel.
    Rejected,
    /// The platform refused the deferral; only a notice was sent, no work attempted.
    Abandoned,
    Cancelled,
    Failed,
    Completed,
}

pub struct Bridge {
    allowed_channel_id: u64,
    defaults: DraftDefaults,
    broadcast_approvals: bool,
    header_fallback: bool,
    fetcher: AttachmentFetcher,
    drafts: DraftClient,
    approvals: ApproveClient,
    store: Arc<dyn CorrelationStore>,
}

impl Bridge {
    pub fn from_config(config: &BotConfig) -> Self {
        let client = http_client();
        Self {
            allowed_channel_id: config.allowed_channel_id,
            defaults: config.defaults.clone(),
            broadcast_approvals: config.broadcast_approvals,
            header_fallback: config.header_fallback,
            fetcher: AttachmentFetcher::new(client.clone(), config.timeouts.fetch),
            drafts: DraftClient::new(
                client.clone(),
                config.webhooks.draft.clone(),
                config.timeouts.draft,
            ),
            approvals: ApproveClient::new(
                client.clone(),
                config.webhooks.approve.clone(),
                config.timeouts.approve,
            ),
            store: Arc::new(WebhookCorrelationStore::new(
                client,
                config.webhooks.link_thread.clone(),
                config.timeouts.link,
            )),
        }
    }

    pub fn allowed_channel_id(&self) -> u64 {
        self.allowed_channel_id
    }

    #[cfg(test)]
    pub(crate) fn with_store(mut self, store: Arc<dyn CorrelationStore>) -> Self {
        self.store = store;
        self
    }

    pub async fn handle_draft<S: ChatSurface>(
        &self,
        responder: &dyn InteractionResponder,
        surface: &S,
        ctx: &InteractionContext,
        command: DraftCommand,
    ) -> FlowOutcome {
        let guard = InteractionGuard::new(responder);
        if !guard
            .admit(
                ctx,
                self.allowed_channel_id,
                &presenter::channel_rejected(self.allowed_channel_id),
            )
            .await
        {
            return FlowOutcome::Rejected;
        }
        if !guard.defer().await {
            guard.resolve(&presenter::acknowledge_failed()).await;
            return FlowOutcome::Abandoned;
        }

        info!(
            "[post] Draft requested by {} in channel {}",
            ctx.user, ctx.channel_id
        );

        let image = match self.fetcher.fetch(&command.attachment).await {
            Ok(image) => image,
            Err(e) => {
                guard.resolve(&presenter::draft_failed(&e)).await;
                return FlowOutcome::Failed;
            }
        };

        let request = DraftRequest::build(&command.options, &self.defaults, ctx.origin(), image);
        let summary = DraftSummary::from(&request);
        let result = match self.drafts.create(request).await {
            Ok(result) => result,
            Err(e) => {
                guard.resolve(&presenter::draft_failed(&e)).await;
                return FlowOutcome::Failed;
            }
        };

        let header = presenter::draft_header(&summary, &result);
        let mut header_chunks = chunk_message(&header, CHUNK_CHARS).into_iter();
        let starter = header_chunks.next().unwrap_or_default();
        let thread = match surface
            .open_draft_thread(
                ctx.home_channel(),
                &starter,
                &presenter::thread_name(&summary.brand, Local::now()),
            )
            .await
        {
            Ok(thread) => thread,
            Err(e) => {
                error!("[post] Could not open draft thread: {}", e);
                guard
                    .resolve(&presenter::thread_failed(&result.approval_token))
                    .await;
                return FlowOutcome::Failed;
            }
        };
        let thread_id = thread.thread_id.to_string();
        info!("[post] Draft thread {} opened", thread_id);

        let link = ThreadLink {
            thread_id: thread_id.clone(),
            approval_token: result.approval_token.clone(),
            draft_message_id: thread.header_message_id.to_string(),
            stable_media_url: result.stable_media_url.clone(),
            origin: ctx.origin(),
        };
        if let Err(e) = self.store.link(&link).await {
            warn!(
                "[post] Linking thread {} failed, approvals there will need the token: {}",
                thread_id, e
            );
        }

        for chunk in header_chunks {
            if let Err(e) = surface.send_message(thread.thread_id, &chunk).await {
                warn!("[post] Header continuation not sent: {}", e);
            }
        }
        for group in presenter::caption_messages(&result) {
            for chunk in group {
                if let Err(e) = surface.send_message(thread.thread_id, &chunk).await {
                    warn!("[post] Caption message not sent: {}", e);
                    break;
                }
            }
        }

        guard
            .resolve(&presenter::draft_created(&thread_id, &result.approval_token))
            .await;
        FlowOutcome::Completed
    }

    pub async fn handle_approval<S: ChatSurface + ThreadHistory>(
        &self,
        responder: &dyn InteractionResponder,
        surface: &S,
        ctx: &InteractionContext,
        command: ApproveCommand,
    ) -> FlowOutcome {
        let guard = InteractionGuard::new(responder);
        if !guard
            .admit(
                ctx,
                self.allowed_channel_id,
                &presenter::channel_rejected(self.allowed_channel_id),
            )
            .await
        {
            return FlowOutcome::Rejected;
        }
        if !guard.defer().await {
            guard.resolve(&presenter::acknowledge_failed()).await;
            return FlowOutcome::Abandoned;
        }

        if !command.confirmed {
            info!("[approve] {} cancelled approval", ctx.user);
            guard.resolve(&presenter::approval_cancelled()).await;
            return FlowOutcome::Cancelled;
        }

        let mut resolver = TokenResolver::new(self.store.as_ref());
        if self.header_fallback {
            resolver = resolver.with_history(surface);
        }
        let thread_id = ctx.thread_id();
        let Some(resolved) = resolver
            .resolve(command.token.as_deref(), thread_id.as_deref())
            .await
        else {
            info!(
                "[approve] No token for {} in channel {}",
                ctx.user, ctx.channel_id
            );
            guard
                .resolve(&presenter::missing_token(command.platform))
                .await;
            return FlowOutcome::Failed;
        };

        info!("[approve] Token resolved via {:?}", resolved.source);
        let request = ApprovalRequest {
            approval_token: resolved.token,
            platform: command.platform,
            origin: ctx.origin(),
        };
        match self.approvals.approve(&request).await {
            Ok(outcome) => {
                guard
                    .resolve(&presenter::approved(
                        request.platform,
                        &request.approval_token,
                        &outcome,
                    ))
                    .await;
                if self.broadcast_approvals {
                    let text =
                        presenter::approval_broadcast(request.platform, &ctx.user, &outcome);
                    if let Err(e) = surface.send_message(self.allowed_channel_id, &text).await {
                        warn!("[approve] Broadcast failed: {}", e);
                    }
                }
                FlowOutcome::Completed
            }
            Err(e) => {
                guard
                    .resolve(&presenter::approval_failed(
                        request.platform,
                        &request.approval_token,
                        &e,
                    ))
                    .await;
                FlowOutcome::Failed
            }
        }
    }
}
