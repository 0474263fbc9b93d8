//! Completeness checks.
//!
//! [`is_complete`] trusts the backend's finish signal. [`looks_reasonably_complete`]
//! is the secondary length + structure heuristic the driver uses on later
//! rounds when the signal alone would keep it going.

use serde::Serialize;
use splice_core::{BackendResult, ContentClass, FinishSignal};

use crate::balance::{BraceScanner, BraceTally};

/// Fraction of the original length (as numerator / denominator) above which
/// a structurally balanced artifact is accepted.
pub const ACCEPTANCE_RATIO: (usize, usize) = (9, 10);

/// Ending characters that leave freeform text dangling.
const ABRUPT_FREEFORM_ENDINGS: &[char] = &[',', '(', '+', '*', '/', '-', '=', '&', '|', '<'];

/// Line endings that demand a continuation line in indentation-delimited content.
const CONTINUATION_ENDINGS: &[char] = &[':', '\\', ',', '(', '[', '{'];

/// A length-limit signal is the only one that means "cut short".
pub fn is_complete(result: &BackendResult) -> bool {
    match result.finish {
        FinishSignal::NaturalStop | FinishSignal::Unknown => true,
        FinishSignal::LengthLimit => false,
    }
}

/// Accept the merged artifact if it is at least as long as the original, or
/// nearly as long and structurally balanced for its content class.
pub fn looks_reasonably_complete(merged: &str, original: &str, class: ContentClass) -> bool {
    let (num, den) = ACCEPTANCE_RATIO;
    if merged.len() >= original.len() {
        return true;
    }
    merged.len().saturating_mul(den) >= original.len().saturating_mul(num)
        && is_structurally_balanced(merged, class)
}

pub fn is_structurally_balanced(text: &str, class: ContentClass) -> bool {
    match class {
        ContentClass::BraceDelimited => BraceScanner::scan(text).is_balanced(),
        ContentClass::TagDelimited => text.matches('<').count() == text.matches('>').count(),
        ContentClass::IndentationDelimited => text
            .lines()
            .rev()
            .map(str::trim_end)
            .find(|line| !line.is_empty())
            .is_none_or(|line| !line.ends_with(CONTINUATION_ENDINGS)),
        ContentClass::Freeform => text
            .trim_end()
            .chars()
            .next_back()
            .is_none_or(|ch| !ABRUPT_FREEFORM_ENDINGS.contains(&ch)),
    }
}

/// Everything the oracle knows about one artifact, for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    pub class: ContentClass,
    pub merged_len: usize,
    pub original_len: usize,
    /// Merged length as a percentage of the original, `None` when the original is empty
    pub percent: Option<u32>,
    pub balanced: bool,
    /// Brace counts, only for brace-delimited content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tally: Option<TallyReport>,
    pub looks_complete: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct TallyReport {
    pub braces: i64,
    pub parens: i64,
    pub brackets: i64,
    pub in_string: bool,
}

pub fn assess(merged: &str, original: &str, class: ContentClass) -> Assessment {
    let tally = (class == ContentClass::BraceDelimited).then(|| {
        let scanner = BraceScanner::scan(merged);
        let BraceTally {
            braces,
            parens,
            brackets,
        } = scanner.tally();
        TallyReport {
            braces,
            parens,
            brackets,
            in_string: scanner.state() != crate::balance::ScanState::Normal,
        }
    });

    Assessment {
        class,
        merged_len: merged.len(),
        original_len: original.len(),
        percent: percent_of(merged.len(), original.len()),
        balanced: is_structurally_balanced(merged, class),
        tally,
        looks_complete: looks_reasonably_complete(merged, original, class),
    }
}

/// Rough completion percentage, `None` for an empty original.
pub fn percent_of(part: usize, whole: usize) -> Option<u32> {
    if whole == 0 {
        return None;
    }
    let pct = (part as u128 * 100) / whole as u128;
    Some(u32::try_from(pct).unwrap_or(u32::MAX))
}
