//! Backend trait: the abstraction over text-generation services.
//!
//! A Backend knows how to send one [`GenerationRequest`] to a generation
//! service and hand back the fragment it produced. Vendor transport, auth
//! and transient-failure retries all live behind this trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::BackendError;
use crate::request::GenerationRequest;

/// Why the backend stopped producing output for a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishSignal {
    /// The model finished on its own.
    NaturalStop,
    /// Output was cut at the token limit.
    LengthLimit,
    /// The backend did not say.
    #[default]
    Unknown,
}

impl FinishSignal {
    /// Map a vendor finish reason onto a signal.
    ///
    /// `stop`, `end_turn` and `stop_sequence` are natural stops; `length`
    /// and `max_tokens` are length limits; anything else is unknown.
    pub fn from_reason(reason: Option<&str>) -> Self {
        match reason.map(|r| r.trim().to_ascii_lowercase()).as_deref() {
            Some("stop" | "end_turn" | "stop_sequence") => Self::NaturalStop,
            Some("length" | "max_tokens") => Self::LengthLimit,
            _ => Self::Unknown,
        }
    }

    pub fn is_length_limit(&self) -> bool {
        matches!(self, Self::LengthLimit)
    }
}

impl fmt::Display for FinishSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NaturalStop => write!(f, "natural_stop"),
            Self::LengthLimit => write!(f, "length_limit"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// What one round produced. Consumed by the merger and oracle, then dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendResult {
    /// The produced text fragment
    pub text: String,

    /// Tokens consumed by this round
    #[serde(default)]
    pub tokens: u32,

    /// Why generation stopped
    #[serde(default)]
    pub finish: FinishSignal,
}

impl BackendResult {
    pub fn new(text: impl Into<String>, tokens: u32, finish: FinishSignal) -> Self {
        Self {
            text: text.into(),
            tokens,
            finish,
        }
    }
}

/// The core Backend trait.
///
/// Implementations must be safe to share across concurrent reassembly
/// operations; each call is independent.
#[async_trait]
pub trait Backend: Send + Sync {
    /// A human-readable name for this backend (e.g., "openrouter", "replay").
    fn name(&self) -> &str;

    /// Send a request and wait for the round's fragment.
    async fn send(&self, request: GenerationRequest) -> Result<BackendResult, BackendError>;
}
