//! Transcript replay.
//!
//! Serves recorded rounds back in order so a reassembly run can be reproduced
//! offline. A transcript is JSON:
//!
//! ```json
//! {
//!   "rounds": [
//!     { "text": "fn main() {\n    let x", "tokens": 512, "finish": "length_limit" },
//!     { "error": "connection reset", "status": 502 }
//!   ]
//! }
//! ```
//!
//! A round with an `error` field fails with an API error when `status` is
//! present and a network error otherwise. Every prompt the backend receives
//! is kept for inspection.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use splice_core::{Backend, BackendError, BackendResult, GenerationRequest};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub rounds: Vec<TranscriptRound>,
}

/// One recorded round: either a failure or a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TranscriptRound {
    Failure {
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<u16>,
    },
    Result(BackendResult),
}

impl TranscriptRound {
    fn into_outcome(self) -> Result<BackendResult, BackendError> {
        match self {
            Self::Result(result) => Ok(result),
            Self::Failure {
                error,
                status: Some(status_code),
            } => Err(BackendError::ApiError {
                status_code,
                message: error,
            }),
            Self::Failure {
                error,
                status: None,
            } => Err(BackendError::Network(error)),
        }
    }
}

impl Transcript {
    pub fn from_json(json: &str) -> splice_core::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> splice_core::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

/// A backend that answers from a [`Transcript`].
pub struct ReplayBackend {
    name: String,
    rounds: Mutex<VecDeque<TranscriptRound>>,
    prompts: Mutex<Vec<String>>,
}

impl ReplayBackend {
    pub fn new(transcript: Transcript) -> Self {
        Self {
            name: "replay".into(),
            rounds: Mutex::new(transcript.rounds.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Rounds not yet served.
    pub fn remaining(&self) -> usize {
        self.rounds.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Prompts received so far, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Backend for ReplayBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, request: GenerationRequest) -> Result<BackendResult, BackendError> {
        let call = {
            let mut prompts = self
                .prompts
                .lock()
                .map_err(|_| BackendError::InvalidResponse("replay state poisoned".into()))?;
            prompts.push(request.prompt);
            prompts.len()
        };

        let next = self
            .rounds
            .lock()
            .map_err(|_| BackendError::InvalidResponse("replay state poisoned".into()))?
            .pop_front();

        match next {
            Some(round) => {
                debug!(backend = %self.name, call, "Replaying recorded round");
                round.into_outcome()
            }
            None => Err(BackendError::Exhausted(format!(
                "transcript has no round for call #{call}"
            ))),
        }
    }
}
