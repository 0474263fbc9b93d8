//! Error types for the splice domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all splice operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Backend errors ---
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    // --- Reassembly errors ---
    #[error("Reassembly error: {0}")]
    Reassembly(#[from] ReassemblyError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- I/O ---
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures reported by a Backend Client. Every variant is a transport
/// failure: fatal for the reassembly operation that observed it.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by backend, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Backend not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid backend response: {0}")]
    InvalidResponse(String),

    #[error("Backend has no more responses: {0}")]
    Exhausted(String),
}

impl BackendError {
    /// Whether another backend could plausibly serve the same request.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::RateLimited { .. } | Self::Network(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            Self::AuthenticationFailed(_)
            | Self::NotConfigured(_)
            | Self::InvalidResponse(_)
            | Self::Exhausted(_) => false,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ReassemblyError {
    #[error("Transport failure: {0}")]
    Transport(#[from] BackendError),

    #[error("Reassembly cancelled after {rounds} round(s)")]
    Cancelled { rounds: u32 },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ReassemblyError {
    /// Whether this error came from the Backend Client rather than the driver.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
