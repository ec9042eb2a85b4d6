//! Mock backend for testing
//!
//! Replies come from a scripted queue; once the queue is empty a canned reply
//! for the request's task is returned. The most recent requests are recorded
//! so tests can assert on call counts and order.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::model_config::TaskType;

use super::types::GenerationRequest;
use super::AIBackend;

/// A scripted reply: text, or a failure with an upstream message
#[derive(Debug, Clone)]
enum Scripted {
    Text(String),
    Failure(String),
}

/// Requests kept in the call log; older ones are dropped
pub const MAX_RECORDED_CALLS: usize = 256;

/// Mock AI backend for testing
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    replies: Arc<Mutex<VecDeque<Scripted>>>,
    calls: Arc<Mutex<VecDeque<GenerationRequest>>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            ..Default::default()
        }
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self::default()
    }

    /// Queue a text reply for the next call
    pub fn push_reply(&self, text: impl Into<String>) -> &Self {
        lock(&self.replies).push_back(Scripted::Text(text.into()));
        self
    }

    /// Queue a failure for the next call
    pub fn push_failure(&self, message: impl Into<String>) -> &Self {
        lock(&self.replies).push_back(Scripted::Failure(message.into()));
        self
    }

    /// Recorded requests, oldest first
    pub fn calls(&self) -> Vec<GenerationRequest> {
        lock(&self.calls).iter().cloned().collect()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Tasks of the requests received so far, in order
    pub fn call_tasks(&self) -> Vec<TaskType> {
        lock(&self.calls).iter().map(|c| c.task).collect()
    }
}

/// Predictable reply for a task when nothing is scripted
fn canned_reply(task: TaskType) -> &'static str {
    match task {
        TaskType::Recommendation => {
            r#"{"decision": "Buy", "explanation": "Mock recommendation based on the information provided."}"#
        }
        TaskType::Vision => {
            r#"{"name": "Mock Item", "cost": 25.0, "facts": "A mock item used for testing."}"#
        }
        TaskType::Search => "null",
        TaskType::Chat => "Mock reply.",
        TaskType::QuickIdentify => "Item: Mock item\nFact: Mock items are free.",
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        {
            let mut calls = lock(&self.calls);
            if calls.len() == MAX_RECORDED_CALLS {
                calls.pop_front();
            }
            calls.push_back(request.clone());
        }

        match lock(&self.replies).pop_front() {
            Some(Scripted::Text(text)) => Ok(text),
            Some(Scripted::Failure(message)) => Err(Error::Api {
                status: 500,
                message,
            }),
            None => Ok(canned_reply(request.task).to_string()),
        }
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
