//! Fragment merging.
//!
//! Joins the accumulated buffer with a continuation fragment, removing any
//! text the backend repeated. Falls back to concatenation with a single line
//! break when no overlap strategy matches, so merging always makes progress.

use serde::Serialize;
use tracing::{debug, trace};

use crate::overlap::{Overlap, Strategy};

/// The merged text plus how it was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Merged text
    pub text: String,

    /// Strategy that matched, or `None` for plain concatenation / empty fragment
    pub strategy: Option<Strategy>,

    /// Match length reported by the strategy (0 when none matched)
    pub overlap: usize,
}

/// Merge `fragment` onto `accumulated`.
pub fn merge(accumulated: &str, fragment: &str) -> String {
    merge_with_report(accumulated, fragment).text
}

/// Merge and report which strategy (if any) matched.
///
/// A candidate splice that would leave the result shorter than
/// `accumulated` is skipped in favour of the next strategy.
pub fn merge_with_report(accumulated: &str, fragment: &str) -> MergeReport {
    let fragment = fragment.trim();
    if fragment.is_empty() {
        return MergeReport {
            text: accumulated.to_string(),
            strategy: None,
            overlap: 0,
        };
    }

    if accumulated.is_empty() {
        return MergeReport {
            text: fragment.to_string(),
            strategy: None,
            overlap: 0,
        };
    }

    for strategy in Strategy::ORDER {
        let Overlap::MatchAt(splice) = strategy.detect(accumulated, fragment) else {
            trace!(%strategy, "No overlap");
            continue;
        };

        let text = splice.apply(accumulated, fragment);
        if text.len() < accumulated.len() {
            debug!(
                %strategy,
                accumulated_len = accumulated.len(),
                merged_len = text.len(),
                "Rejected overlap that would shrink the artifact"
            );
            continue;
        }

        debug!(
            %strategy,
            overlap = splice.length,
            accumulated_len = accumulated.len(),
            merged_len = text.len(),
            "Merged fragment"
        );
        return MergeReport {
            text,
            strategy: Some(strategy),
            overlap: splice.length,
        };
    }

    debug!(
        accumulated_len = accumulated.len(),
        fragment_len = fragment.len(),
        "No overlap found, concatenating"
    );
    let mut text = String::with_capacity(accumulated.len() + 1 + fragment.len());
    text.push_str(accumulated);
    text.push('\n');
    text.push_str(fragment);

    MergeReport {
        text,
        strategy: None,
        overlap: 0,
    }
}
