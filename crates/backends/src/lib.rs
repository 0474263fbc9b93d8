//! Backend Client implementations for splice.
//!
//! All backends implement the `splice_core::Backend` trait. Vendor HTTP
//! transports live outside this workspace; what is here composes or
//! replays them.

pub mod fallback;
pub mod replay;

pub use fallback::FallbackBackend;
pub use replay::{ReplayBackend, Transcript, TranscriptRound};
