//! Per-operation accumulation state and the final outcome.

use serde::Serialize;
use splice_core::{BackendResult, FinishSignal};
use tracing::debug;

use crate::merger::merge_with_report;
use crate::overlap::Strategy;

/// Why the continuation loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Backend signalled a natural (or unknown) stop
    NaturalStop,
    /// Generate mode: one round only
    SingleShot,
    /// Length/structure heuristic accepted the artifact
    LooksComplete,
    /// Round budget ran out
    BudgetExhausted,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NaturalStop => "natural_stop",
            Self::SingleShot => "single_shot",
            Self::LooksComplete => "looks_complete",
            Self::BudgetExhausted => "budget_exhausted",
        };
        f.write_str(s)
    }
}

/// The merged text built up across rounds. Owned by exactly one operation.
#[derive(Debug, Clone, Default)]
pub struct AccumulatedArtifact {
    text: String,
    tokens: u64,
    last_signal: FinishSignal,
    rounds: u32,
}

impl AccumulatedArtifact {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one round's result in. The first round seeds the text; later
    /// rounds are merged. Returns the overlap strategy that matched, if any.
    pub fn absorb(&mut self, result: BackendResult) -> Option<Strategy> {
        self.tokens += u64::from(result.tokens);
        self.last_signal = result.finish;
        self.rounds += 1;

        if self.rounds == 1 {
            self.text = result.text;
            return None;
        }

        let report = merge_with_report(&self.text, &result.text);
        debug!(
            round = self.rounds,
            strategy = report.strategy.map_or("concatenate", |s| s.as_str()),
            accumulated_len = report.text.len(),
            "Absorbed fragment"
        );
        self.text = report.text;
        report.strategy
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> u64 {
        self.tokens
    }

    pub fn last_signal(&self) -> FinishSignal {
        self.last_signal
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn finish(self, stop_reason: StopReason) -> ReassemblyOutcome {
        let truncated =
            self.last_signal.is_length_limit() || stop_reason == StopReason::BudgetExhausted;
        ReassemblyOutcome {
            text: self.text,
            tokens: self.tokens,
            finish: self.last_signal,
            truncated,
            rounds: self.rounds,
            stop_reason,
        }
    }
}

/// Result of one reassembly operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReassemblyOutcome {
    /// Final merged text
    pub text: String,
    /// Tokens summed over every round
    pub tokens: u64,
    /// Finish signal of the last round
    pub finish: FinishSignal,
    /// The artifact may be incomplete
    pub truncated: bool,
    /// Backend calls made
    pub rounds: u32,
    pub stop_reason: StopReason,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_round_seeds_untrimmed() {
        let mut artifact = AccumulatedArtifact::new();
        let strategy = artifact.absorb(BackendResult::new("  head\n", 7, FinishSignal::LengthLimit));
        assert_eq!(strategy, None);
        assert_eq!(artifact.text(), "  head\n");
        assert_eq!(artifact.rounds(), 1);
        assert_eq!(artifact.tokens(), 7);
    }

    #[test]
    fn later_rounds_merge_and_sum_tokens() {
        let mut artifact = AccumulatedArtifact::new();
        artifact.absorb(BackendResult::new("A\nB\nC", 10, FinishSignal::LengthLimit));
        let strategy = artifact.absorb(BackendResult::new("B\nC\nD", 5, FinishSignal::NaturalStop));

        assert_eq!(strategy, Some(Strategy::ExactLines));
        assert_eq!(artifact.text(), "A\nB\nC\nD");
        assert_eq!(artifact.tokens(), 15);
        assert_eq!(artifact.last_signal(), FinishSignal::NaturalStop);

        let outcome = artifact.finish(StopReason::NaturalStop);
        assert!(!outcome.truncated);
        assert_eq!(outcome.rounds, 2);
    }

    #[test]
    fn truncated_on_length_limit_or_budget() {
        let mut artifact = AccumulatedArtifact::new();
        artifact.absorb(BackendResult::new("x", 1, FinishSignal::LengthLimit));
        assert!(artifact.clone().finish(StopReason::LooksComplete).truncated);

        let mut artifact = AccumulatedArtifact::new();
        artifact.absorb(BackendResult::new("x", 1, FinishSignal::Unknown));
        assert!(artifact.clone().finish(StopReason::BudgetExhausted).truncated);
        assert!(!artifact.finish(StopReason::NaturalStop).truncated);
    }

    #[test]
    fn stop_reason_serializes_snake_case() {
        let json = serde_json::to_string(&StopReason::BudgetExhausted).unwrap();
        assert_eq!(json, "\"budget_exhausted\"");
        assert_eq!(StopReason::SingleShot.to_string(), "single_shot");
    }
}
