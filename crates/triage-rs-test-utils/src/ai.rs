//! [`AiClient`] stubs for workflow tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use triage_rs_core::{AiClient, AiError, AiRequest, AiResponse};

/// Returns scripted answers in order, repeating the last one.
#[derive(Debug, Clone)]
pub struct FixedAi {
    replies: Arc<Mutex<VecDeque<String>>>,
    last: Arc<Mutex<String>>,
}

impl FixedAi {
    pub fn new(reply: impl Into<String>) -> Self {
        let reply: String = reply.into();
        Self::sequence([reply])
    }

    pub fn sequence(replies: impl IntoIterator<Item = String>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into_iter().collect())),
            last: Arc::new(Mutex::new(String::new())),
        }
    }
}

#[async_trait]
impl AiClient for FixedAi {
    async fn complete(&self, _request: AiRequest) -> Result<AiResponse, AiError> {
        let mut last = self.last.lock();
        if let Some(next) = self.replies.lock().pop_front() {
            *last = next;
        }
        Ok(AiResponse { text: last.clone() })
    }
}

/// Fails every request with a provider error.
#[derive(Debug, Clone)]
pub struct FailingAi {
    message: String,
}

impl FailingAi {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl AiClient for FailingAi {
    async fn complete(&self, _request: AiRequest) -> Result<AiResponse, AiError> {
        Err(AiError::Provider(self.message.clone()))
    }
}

/// Answers with a fixed reply and keeps every request it saw.
#[derive(Debug, Clone)]
pub struct RecordingAi {
    reply: String,
    pub requests: Arc<Mutex<Vec<AiRequest>>>,
}

impl RecordingAi {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl AiClient for RecordingAi {
    async fn complete(&self, request: AiRequest) -> Result<AiResponse, AiError> {
        self.requests.lock().push(request);
        Ok(AiResponse {
            text: self.reply.clone(),
        })
    }
}
