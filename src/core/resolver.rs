//! Finds the approval token an `/approvato` call refers to.
//!
//! Order, first hit wins: explicit option, correlation store lookup for the
//! current thread, then a scan of the thread's messages for the draft header.

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{info, warn};

use super::presenter::TOKEN_LABEL;
use super::workflow::CorrelationStore;

/// How many thread messages the header fallback looks at.
pub const HISTORY_SCAN_LIMIT: u8 = 50;

static HEADER_TOKEN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(&format!(r"{}\s*\**\s*`([^`\s]+)`", regex::escape(TOKEN_LABEL))).ok()
});

/// Read access to a thread's recent messages, newest first.
#[async_trait]
pub trait ThreadHistory: Send + Sync {
    async fn recent_messages(&self, thread_id: &str, limit: u8) -> Result<Vec<String>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Explicit,
    CorrelationStore,
    DraftHeader,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedToken {
    pub token: String,
    pub source: TokenSource,
}

/// Pulls the token out of a draft header message.
pub fn extract_header_token(message: &str) -> Option<String> {
    let re = HEADER_TOKEN.as_ref()?;
    re.captures(message)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

pub struct TokenResolver<'a> {
    store: &'a dyn CorrelationStore,
    history: Option<&'a dyn ThreadHistory>,
}

impl<'a> TokenResolver<'a> {
    pub fn new(store: &'a dyn CorrelationStore) -> Self {
        Self {
            store,
            history: None,
        }
    }

    pub fn with_history(mut self, history: &'a dyn ThreadHistory) -> Self {
        self.history = Some(history);
        self
    }

    /// `thread_id` is `Some` only when the command was issued inside a thread.
    pub async fn resolve(
        &self,
        explicit: Option<&str>,
        thread_id: Option<&str>,
    ) -> Option<ResolvedToken> {
        if let Some(token) = explicit.map(str::trim).filter(|t| !t.is_empty()) {
            return Some(ResolvedToken {
                token: token.to_string(),
                source: TokenSource::Explicit,
            });
        }

        let thread_id = thread_id?;

        match self.store.get(thread_id).await {
            Ok(Some(token)) => {
                info!("[resolver] Token for thread {} found in correlation store", thread_id);
                return Some(ResolvedToken {
                    token,
                    source: TokenSource::CorrelationStore,
                });
            }
            Ok(None) => info!("[resolver] No link stored for thread {}", thread_id),
            Err(e) => warn!("[resolver] Correlation lookup for thread {} failed: {}", thread_id, e),
        }

        let history = self.history?;
        let messages = match history.recent_messages(thread_id, HISTORY_SCAN_LIMIT).await {
            Ok(m) => m,
            Err(e) => {
                warn!("[resolver] Could not read history of thread {}: {}", thread_id, e);
                return None;
            }
        };
        let token = messages.iter().find_map(|m| extract_header_token(m))?;
        warn!(
            "[resolver] Falling back to draft header text for thread {}; no correlation link",
            thread_id
        );
        Some(ResolvedToken {
            token,
            source: TokenSource::DraftHeader,
        })
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use super::*;
    use crate::core::workflow::{ThreadLink, WorkflowError};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MemoryStore {
        pub links: Mutex<HashMap<String, String>>,
        pub lookups: Mutex<Vec<String>>,
        pub fail: bool,
    }

    impl MemoryStore {
        pub fn with_link(thread_id: &str, token: &str) -> Self {
            let store = Self::default();
            store
                .links
                .lock()
                .unwrap()
                .insert(thread_id.to_string(), token.to_string());
            store
        }
    }

    #[async_trait]
    impl CorrelationStore for MemoryStore {
        async fn link(&self, link: &ThreadLink) -> Result<(), WorkflowError> {
            self.links
                .lock()
                .unwrap()
                .insert(link.thread_id.clone(), link.approval_token.clone());
            Ok(())
        }

        async fn get(&self, thread_id: &str) -> Result<Option<String>, WorkflowError> {
            self.lookups.lock().unwrap().push(thread_id.to_string());
            if self.fail {
                return Err(WorkflowError::NonJson {
                    endpoint: "link-thread",
                    status: 500,
                    body: "boom".into(),
                });
            }
            Ok(self.links.lock().unwrap().get(thread_id).cloned())
        }
    }

    pub struct StaticHistory(pub Vec<String>);

    #[async_trait]
    impl ThreadHistory for StaticHistory {
        async fn recent_messages(&self, _thread_id: &str, _limit: u8) -> Result<Vec<String>> {
            Ok(self.0.clone())
        }
    }
}
