//! # splice core
//!
//! Domain types, traits, and error definitions for reassembling text
//! artifacts that a generation backend truncated mid-way.
//! It holds no runtime machinery; the reassembly engine and the backend
//! implementations build against the domain model defined here.

pub mod backend;
pub mod content_class;
pub mod error;
pub mod request;

// Re-export key types at crate root for ergonomics
pub use backend::{Backend, BackendResult, FinishSignal};
pub use content_class::ContentClass;
pub use error::{BackendError, Error, ReassemblyError, Result};
pub use request::{GenerationRequest, Mode};

/// Default round budget for one reassembly operation.
pub const MAX_ROUNDS: u32 = 5;
