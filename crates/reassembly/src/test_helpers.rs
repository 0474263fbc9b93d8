//! Scripted backends for driver tests.

use async_trait::async_trait;
use splice_core::{Backend, BackendError, BackendResult, FinishSignal, GenerationRequest};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Returns scripted results in order and records every request it sees.
///
/// Panics if called more times than there are scripted results.
pub struct ScriptedBackend {
    responses: Mutex<VecDeque<Result<BackendResult, BackendError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedBackend {
    pub fn new(responses: Vec<Result<BackendResult, BackendError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn send(&self, request: GenerationRequest) -> Result<BackendResult, BackendError> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(request);
        let call = requests.len();

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("ScriptedBackend: no more responses (call #{call})"))
    }
}

/// Always answers with a fresh, non-overlapping chunk cut off by the length limit.
pub struct TruncatingBackend {
    calls: Mutex<u32>,
}

impl TruncatingBackend {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(0),
        }
    }

    pub fn call_count(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Backend for TruncatingBackend {
    fn name(&self) -> &str {
        "truncating"
    }

    async fn send(&self, _request: GenerationRequest) -> Result<BackendResult, BackendError> {
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        Ok(BackendResult::new(
            format!("chunk{} body{}", *calls, *calls),
            100,
            FinishSignal::LengthLimit,
        ))
    }
}

/// Answers the first call with a truncated result, then never answers
/// (or answers only after `delay`).
pub struct StallingBackend {
    calls: Mutex<u32>,
    delay: Option<Duration>,
}

impl StallingBackend {
    /// Second and later calls never complete.
    pub fn forever() -> Self {
        Self {
            calls: Mutex::new(0),
            delay: None,
        }
    }

    /// Second and later calls complete after `delay`.
    pub fn after(delay: Duration) -> Self {
        Self {
            calls: Mutex::new(0),
            delay: Some(delay),
        }
    }
}

#[async_trait]
impl Backend for StallingBackend {
    fn name(&self) -> &str {
        "stalling"
    }

    async fn send(&self, _request: GenerationRequest) -> Result<BackendResult, BackendError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            *calls
        };

        if call > 1 {
            match self.delay {
                Some(delay) => tokio::time::sleep(delay).await,
                None => std::future::pending::<()>().await,
            }
        }

        Ok(BackendResult::new(
            format!("part{call}"),
            10,
            FinishSignal::LengthLimit,
        ))
    }
}

pub fn truncated(text: &str, tokens: u32) -> Result<BackendResult, BackendError> {
    Ok(BackendResult::new(text, tokens, FinishSignal::LengthLimit))
}

pub fn finished(text: &str, tokens: u32) -> Result<BackendResult, BackendError> {
    Ok(BackendResult::new(text, tokens, FinishSignal::NaturalStop))
}
