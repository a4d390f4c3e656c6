//! Shared test utilities for seedling integration tests.
//!
//! Provides stand-ins for the two external collaborators of a run:
//! - **Completion endpoint**: [`ScriptedCompletion`] replays canned replies
//!   in order and records every conversation it receives;
//!   [`FlakyTransport`] fails a fixed number of times at the transport
//!   level before answering.
//! - **Operator**: [`ScriptedConfirm`] answers the plan prompt with a fixed
//!   yes/no and records what it was shown.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use seedling_core::llm::{ChatRequest, ChatTransport, Completion, Conversation, LlmError};
use seedling_core::pipeline::Confirm;

/// Completion stub that replays scripted results in order.
#[derive(Debug, Default)]
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    calls: Mutex<Vec<Conversation>>,
}

impl ScriptedCompletion {
    /// Script of successful replies.
    pub fn new<I, S>(replies: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_results(replies.into_iter().map(|r| Ok(r.into())))
    }

    /// Script mixing replies and errors.
    pub fn with_results<I>(results: I) -> Arc<Self>
    where
        I: IntoIterator<Item = Result<String, LlmError>>,
    {
        Arc::new(Self {
            replies: Mutex::new(results.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Every conversation received so far, in order.
    pub fn calls(&self) -> Vec<Conversation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Scripted results not yet consumed.
    pub fn remaining(&self) -> usize {
        self.replies.lock().unwrap().len()
    }
}

#[async_trait]
impl Completion for ScriptedCompletion {
    async fn complete(&self, conversation: &Conversation) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(conversation.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::InvalidResponse("completion script exhausted".into())))
    }
}

/// Transport that fails with a transient error `failures` times, then
/// returns `reply` forever.
///
/// Clones share the attempt counter, so a test can keep one clone while the
/// client owns another.
#[derive(Debug, Clone)]
pub struct FlakyTransport {
    failures: u32,
    reply: String,
    attempts: Arc<AtomicU32>,
}

impl FlakyTransport {
    pub fn new(failures: u32, reply: impl Into<String>) -> Self {
        Self {
            failures,
            reply: reply.into(),
            attempts: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Number of `send` calls so far.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatTransport for FlakyTransport {
    async fn send(&self, _request: &ChatRequest<'_>) -> Result<String, LlmError> {
        let n = self.attempts.fetch_add(1, Ordering::SeqCst);
        if n < self.failures {
            return Err(LlmError::ApiError {
                status: 503,
                message: "server overloaded".into(),
            });
        }
        Ok(self.reply.clone())
    }
}

/// Operator stand-in with a fixed answer.
#[derive(Debug, Default)]
pub struct ScriptedConfirm {
    approve: bool,
    shown: Vec<String>,
}

impl ScriptedConfirm {
    pub fn approve() -> Self {
        Self {
            approve: true,
            shown: Vec::new(),
        }
    }

    pub fn reject() -> Self {
        Self {
            approve: false,
            shown: Vec::new(),
        }
    }

    /// Plan texts presented so far.
    pub fn shown(&self) -> &[String] {
        &self.shown
    }
}

impl Confirm for ScriptedConfirm {
    fn confirm(&mut self, plan_text: &str, _plan_path: &Path) -> std::io::Result<bool> {
        self.shown.push(plan_text.to_string());
        Ok(self.approve)
    }
}
