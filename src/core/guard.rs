use anyhow::Result;
use async_trait::async_trait;
use std::sync::Mutex;
use tracing::{debug, error, warn};

use super::workflow::truncate_chars;

/// Discord rejects interaction replies above 2000 characters.
pub const REPLY_CHARS: usize = 1990;

/// Where an interaction was issued from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionContext {
    pub guild_id: Option<u64>,
    pub channel_id: u64,
    /// Parent channel when `channel_id` is a thread.
    pub parent_id: Option<u64>,
    pub is_thread: bool,
    pub user: String,
}

impl InteractionContext {
    pub fn thread_id(&self) -> Option<String> {
        self.is_thread.then(|| self.channel_id.to_string())
    }

    /// The channel new drafts are posted in: the thread's parent when inside one.
    pub fn home_channel(&self) -> u64 {
        if self.is_thread {
            self.parent_id.unwrap_or(self.channel_id)
        } else {
            self.channel_id
        }
    }

    pub fn origin(&self) -> crate::core::workflow::Origin {
        crate::core::workflow::Origin {
            guild_id: self
                .guild_id
                .map(|g| g.to_string())
                .unwrap_or_default(),
            channel_id: self.channel_id.to_string(),
            user: self.user.clone(),
        }
    }
}

/// Accepts the allowed channel itself or any thread directly under it.
pub fn is_allowed_channel(ctx: &InteractionContext, allowed: u64) -> bool {
    ctx.channel_id == allowed || ctx.parent_id == Some(allowed)
}

/// The chat platform's acknowledgement primitives for one interaction.
#[async_trait]
pub trait InteractionResponder: Send + Sync {
    async fn defer_ephemeral(&self) -> Result<()>;
    async fn edit_reply(&self, content: &str) -> Result<()>;
    async fn reply_ephemeral(&self, content: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Received,
    Deferred,
    Resolved,
}

/// Drives one interaction through received → deferred → resolved.
///
/// `resolve` lands exactly once: as an edit when deferred, as a fresh reply when
/// deferral never happened. Later calls are no-ops.
pub struct InteractionGuard<'a> {
    responder: &'a dyn InteractionResponder,
    state: Mutex<GuardState>,
}

impl<'a> InteractionGuard<'a> {
    pub fn new(responder: &'a dyn InteractionResponder) -> Self {
        Self {
            responder,
            state: Mutex::new(GuardState::Received),
        }
    }

    pub fn state(&self) -> GuardState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn transition(&self, from: GuardState, to: GuardState) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if *state == from {
            *state = to;
            true
        } else {
            false
        }
    }

    /// Rejects interactions outside the allowed channel with an ephemeral notice.
    pub async fn admit(&self, ctx: &InteractionContext, allowed: u64, notice: &str) -> bool {
        if is_allowed_channel(ctx, allowed) {
            return true;
        }
        warn!(
            "[guard] Rejected command from {} in channel {}",
            ctx.user, ctx.channel_id
        );
        self.resolve(notice).await;
        false
    }

    /// Must succeed before any slow work starts. Returns false when the platform
    /// refused the acknowledgement; the state stays `Received`, so a following
    /// `resolve` goes out as a fresh reply.
    pub async fn defer(&self) -> bool {
        if self.state() != GuardState::Received {
            return self.state() == GuardState::Deferred;
        }
        match self.responder.defer_ephemeral().await {
            Ok(()) => self.transition(GuardState::Received, GuardState::Deferred),
            Err(e) => {
                error!("[guard] Deferring interaction failed: {}", e);
                false
            }
        }
    }

    /// Content past [`REPLY_CHARS`] is cut so the reply is never refused for length.
    pub async fn resolve(&self, content: &str) {
        let content = truncate_chars(content, REPLY_CHARS);
        let content = content.as_str();
        if self.transition(GuardState::Deferred, GuardState::Resolved) {
            if let Err(e) = self.responder.edit_reply(content).await {
                error!("[guard] Editing deferred reply failed: {}", e);
            }
        } else if self.transition(GuardState::Received, GuardState::Resolved) {
            if let Err(e) = self.responder.reply_ephemeral(content).await {
                error!("[guard] Replying to interaction failed: {}", e);
            }
        } else {
            debug!("[guard] Interaction already resolved, dropping late response");
        }
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use super::*;
    use anyhow::anyhow;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Defer,
        Edit(String),
        Reply(String),
    }

    #[derive(Default)]
    pub struct RecordingResponder {
        pub calls: Mutex<Vec<Call>>,
        pub fail_defer: bool,
    }

    impl RecordingResponder {
        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        /// Text of the single user-visible resolution.
        pub fn final_text(&self) -> Option<String> {
            self.calls().into_iter().rev().find_map(|c| match c {
                Call::Edit(t) | Call::Reply(t) => Some(t),
                Call::Defer => None,
            })
        }
    }

    #[async_trait]
    impl InteractionResponder for RecordingResponder {
        async fn defer_ephemeral(&self) -> Result<()> {
            if self.fail_defer {
                return Err(anyhow!("Unknown interaction"));
            }
            self.calls.lock().unwrap().push(Call::Defer);
            Ok(())
        }

        async fn edit_reply(&self, content: &str) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Edit(content.to_string()));
            Ok(())
        }

        async fn reply_ephemeral(&self, content: &str) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Reply(content.to_string()));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fakes::{Call, RecordingResponder};
    use super::*;

    fn ctx(channel_id: u64, parent_id: Option<u64>, is_thread: bool) -> InteractionContext {
        InteractionContext {
            guild_id: Some(1),
            channel_id,
            parent_id,
            is_thread,
            user: "mario".into(),
        }
    }

    #[test]
    fn allowed_channel_and_its_threads_pass() {
        assert!(is_allowed_channel(&ctx(100, None, false), 100));
        assert!(is_allowed_channel(&ctx(555, Some(100), true), 100));
        assert!(!is_allowed_channel(&ctx(200, None, false), 100));
        assert!(!is_allowed_channel(&ctx(555, Some(200), true), 100));
    }

    #[test]
    fn home_channel_is_parent_for_threads() {
        assert_eq!(ctx(555, Some(100), true).home_channel(), 100);
        assert_eq!(ctx(100, None, false).home_channel(), 100);
        assert_eq!(ctx(555, Some(100), true).thread_id().as_deref(), Some("555"));
        assert_eq!(ctx(100, None, false).thread_id(), None);
    }

    #[tokio::test]
    async fn deferred_interaction_resolves_by_edit_once() {
        let responder = RecordingResponder::default();
        let guard = InteractionGuard::new(&responder);
        assert!(guard.defer().await);
        assert_eq!(guard.state(), GuardState::Deferred);
        guard.resolve("first").await;
        guard.resolve("second").await;
        assert_eq!(guard.state(), GuardState::Resolved);
        assert_eq!(
            responder.calls(),
            vec![Call::Defer, Call::Edit("first".into())]
        );
    }

    #[tokio::test]
    async fn undeferred_interaction_resolves_by_reply() {
        let responder = RecordingResponder::default();
        let guard = InteractionGuard::new(&responder);
        guard.resolve("notice").await;
        guard.resolve("again").await;
        assert_eq!(responder.calls(), vec![Call::Reply("notice".into())]);
    }

    #[tokio::test]
    async fn failed_defer_keeps_received_state() {
        let responder = RecordingResponder {
            fail_defer: true,
            ..Default::default()
        };
        let guard = InteractionGuard::new(&responder);
        assert!(!guard.defer().await);
        assert_eq!(guard.state(), GuardState::Received);
    }

    #[tokio::test]
    async fn oversized_resolution_is_cut_to_one_message() {
        let responder = RecordingResponder::default();
        let guard = InteractionGuard::new(&responder);
        assert!(guard.defer().await);
        guard.resolve(&"x".repeat(4000)).await;
        let text = responder.final_text().unwrap();
        assert!(text.chars().count() <= 2000);
        assert!(text.ends_with('…'));
    }

    #[tokio::test]
    async fn defer_after_resolution_is_refused() {
        let responder = RecordingResponder::default();
        let guard = InteractionGuard::new(&responder);
        guard.resolve("done").await;
        assert!(!guard.defer().await);
        assert_eq!(responder.calls(), vec![Call::Reply("done".into())]);
    }

    #[tokio::test]
    async fn rejected_channel_gets_ephemeral_notice() {
        let responder = RecordingResponder::default();
        let guard = InteractionGuard::new(&responder);
        let admitted = guard.admit(&ctx(200, None, false), 100, "⛔").await;
        assert!(!admitted);
        assert_eq!(responder.calls(), vec![Call::Reply("⛔".into())]);
    }
}
