//! A provider that replays scripted replies.
//!
//! Used by tests across the workspace wherever a real upstream must not be
//! reached.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use vouch_core::error::ProviderError;
use vouch_core::message::Message;
use vouch_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};

pub const SCRIPTED_MODEL: &str = "scripted-model";

/// Replays queued replies in order, then repeats a default reply.
pub struct ScriptedProvider {
    queue: Mutex<VecDeque<Result<String, ProviderError>>>,
    default_reply: String,
    usage: Usage,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    /// Always answers with `content` unless a scripted reply is queued.
    pub fn replying(content: impl Into<String>) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            default_reply: content.into(),
            usage: Usage::from_parts(120, 80, None),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = usage;
        self
    }

    pub fn push_reply(&self, content: impl Into<String>) {
        self.lock_queue().push_back(Ok(content.into()));
    }

    pub fn push_error(&self, error: ProviderError) {
        self.lock_queue().push_back(Err(error));
    }

    /// Number of `complete` calls received.
    pub fn call_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Every request received, oldest first.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lock_queue(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, ProviderError>>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        let next = self
            .lock_queue()
            .pop_front()
            .unwrap_or_else(|| Ok(self.default_reply.clone()));

        next.map(|content| ProviderResponse {
            message: Message::assistant(content),
            usage: self.usage,
            model: SCRIPTED_MODEL.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_queue_then_default() {
        let provider = ScriptedProvider::replying("{}");
        provider.push_reply("first");
        provider.push_error(ProviderError::Timeout("slow".into()));

        let req = || ProviderRequest::json("m", vec![Message::user("hi")]);

        let first = provider.complete(req()).await.unwrap();
        assert_eq!(first.message.content, "first");
        assert_eq!(first.usage.total_tokens, 200);

        assert!(matches!(
            provider.complete(req()).await,
            Err(ProviderError::Timeout(_))
        ));

        let third = provider.complete(req()).await.unwrap();
        assert_eq!(third.message.content, "{}");
        assert_eq!(provider.call_count(), 3);
    }
}
