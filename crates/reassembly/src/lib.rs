//! # splice reassembly
//!
//! Turns a backend that stops mid-answer into one that finishes. The
//! [`CompletionDriver`] re-prompts the backend with a continuation request
//! whenever a round ends on the length limit, merges each new fragment onto
//! the text accumulated so far, and stops when the backend signals a natural
//! stop, the artifact looks complete, or the round budget runs out.
//!
//! The pieces are usable on their own:
//!
//! - [`overlap`]: strategies that find repeated text at a fragment boundary
//! - [`merger`]: [`merge`] and [`merge_with_report`]
//! - [`oracle`]: finish-signal and length/structure completeness checks
//! - [`balance`]: the delimiter/string-literal scanner behind the brace check
//! - [`prompt`]: the continuation prompt builder

pub mod artifact;
pub mod balance;
pub mod driver;
pub mod merger;
pub mod oracle;
pub mod overlap;
pub mod prompt;

#[cfg(test)]
mod test_helpers;

pub use artifact::{AccumulatedArtifact, ReassemblyOutcome, StopReason};
pub use driver::CompletionDriver;
pub use merger::{MergeReport, merge, merge_with_report};
pub use oracle::{Assessment, assess, is_complete, looks_reasonably_complete};
pub use overlap::{Overlap, Splice, Strategy};
pub use prompt::ContinuationPromptBuilder;
