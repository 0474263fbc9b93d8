//! The bounded continuation loop.
//!
//! One operation is a sequential chain of backend rounds: round N's prompt is
//! built from the text merged after round N-1, so rounds never overlap. The
//! loop is an explicit state machine:
//!
//! ```text
//! Start -> AwaitingResult -> Complete
//!                |   ^
//!                v   |
//!             Continuing
//!
//! any transport error / cancellation -> Aborted
//! ```
//!
//! An aborted operation returns its error and discards whatever had been
//! merged so far.

use std::sync::Arc;
use std::time::Duration;

use splice_config::ReassemblyConfig;
use splice_core::{Backend, BackendError, BackendResult, GenerationRequest, Mode, ReassemblyError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::artifact::{AccumulatedArtifact, ReassemblyOutcome, StopReason};
use crate::oracle;
use crate::prompt::ContinuationPromptBuilder;

/// Drives one backend through as many continuation rounds as needed.
pub struct CompletionDriver {
    /// The Backend Client
    backend: Arc<dyn Backend>,

    /// Round budget per operation
    max_rounds: u32,

    /// Timeout applied to each backend call
    round_timeout: Option<Duration>,

    prompts: ContinuationPromptBuilder,
}

enum DriverState {
    Start,
    AwaitingResult(GenerationRequest),
    Continuing,
    Complete(StopReason),
    Aborted(ReassemblyError),
}

impl CompletionDriver {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            max_rounds: splice_core::MAX_ROUNDS,
            round_timeout: None,
            prompts: ContinuationPromptBuilder::default(),
        }
    }

    /// Build a driver with the round budget and timeout from configuration.
    pub fn from_config(backend: Arc<dyn Backend>, config: &ReassemblyConfig) -> Self {
        Self::new(backend)
            .with_max_rounds(config.max_rounds)
            .with_round_timeout(config.round_timeout())
    }

    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_round_timeout(mut self, timeout: Duration) -> Self {
        self.round_timeout = Some(timeout);
        self
    }

    pub fn with_prompt_builder(mut self, prompts: ContinuationPromptBuilder) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    /// Run one reassembly operation to completion.
    pub async fn reassemble(
        &self,
        request: GenerationRequest,
    ) -> Result<ReassemblyOutcome, ReassemblyError> {
        self.reassemble_with_cancel(request, CancellationToken::new())
            .await
    }

    /// Like [`reassemble`](Self::reassemble), but abandons the operation as
    /// soon as `cancel` fires. An in-flight backend call is dropped.
    pub async fn reassemble_with_cancel(
        &self,
        request: GenerationRequest,
        cancel: CancellationToken,
    ) -> Result<ReassemblyOutcome, ReassemblyError> {
        let operation = Uuid::new_v4();
        let mut artifact = AccumulatedArtifact::new();
        let mut state = DriverState::Start;

        loop {
            state = match state {
                DriverState::Start => {
                    if self.max_rounds == 0 {
                        DriverState::Aborted(ReassemblyError::InvalidRequest(
                            "round budget must be at least 1".into(),
                        ))
                    } else {
                        info!(
                            %operation,
                            backend = %self.backend.name(),
                            label = %request.display_label(),
                            mode = %request.mode,
                            class = %request.content_class,
                            max_rounds = self.max_rounds,
                            "Reassembly started"
                        );
                        DriverState::AwaitingResult(request.clone())
                    }
                }

                DriverState::AwaitingResult(round_request) => {
                    let round = artifact.rounds() + 1;
                    match self.send_round(round_request, &cancel, round).await {
                        Ok(result) => {
                            let signalled_complete = oracle::is_complete(&result);
                            debug!(
                                %operation,
                                round,
                                tokens = result.tokens,
                                signal = %result.finish,
                                fragment_len = result.text.len(),
                                "Round finished"
                            );
                            artifact.absorb(result);

                            match decide(&artifact, signalled_complete, &request, self.max_rounds) {
                                Some(reason) => DriverState::Complete(reason),
                                None => DriverState::Continuing,
                            }
                        }
                        Err(e) => DriverState::Aborted(e),
                    }
                }

                DriverState::Continuing => {
                    let prompt =
                        self.prompts
                            .build(artifact.text(), request.original_content(), &request);
                    debug!(
                        %operation,
                        next_round = artifact.rounds() + 1,
                        accumulated_len = artifact.text().len(),
                        "Requesting continuation"
                    );
                    DriverState::AwaitingResult(request.continuation(prompt))
                }

                DriverState::Complete(reason) => {
                    let outcome = artifact.finish(reason);
                    if reason == StopReason::BudgetExhausted {
                        warn!(
                            %operation,
                            rounds = outcome.rounds,
                            "Round budget exhausted, artifact may be incomplete"
                        );
                    }
                    info!(
                        %operation,
                        rounds = outcome.rounds,
                        tokens = outcome.tokens,
                        stop_reason = %outcome.stop_reason,
                        truncated = outcome.truncated,
                        text_len = outcome.text.len(),
                        "Reassembly complete"
                    );
                    return Ok(outcome);
                }

                DriverState::Aborted(err) => {
                    warn!(
                        %operation,
                        rounds = artifact.rounds(),
                        error = %err,
                        "Reassembly aborted, discarding partial text"
                    );
                    return Err(err);
                }
            };
        }
    }

    /// One backend round-trip, bounded by the round timeout and the
    /// cancellation token.
    async fn send_round(
        &self,
        request: GenerationRequest,
        cancel: &CancellationToken,
        round: u32,
    ) -> Result<BackendResult, ReassemblyError> {
        let completed = round - 1;
        if cancel.is_cancelled() {
            return Err(ReassemblyError::Cancelled { rounds: completed });
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ReassemblyError::Cancelled { rounds: completed }),
            result = self.call_backend(request, round) => result.map_err(ReassemblyError::from),
        }
    }

    async fn call_backend(
        &self,
        request: GenerationRequest,
        round: u32,
    ) -> Result<BackendResult, BackendError> {
        let Some(timeout) = self.round_timeout else {
            return self.backend.send(request).await;
        };

        match tokio::time::timeout(timeout, self.backend.send(request)).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout(format!(
                "backend '{}' did not answer round {round} within {}s",
                self.backend.name(),
                timeout.as_secs()
            ))),
        }
    }
}

/// Decide whether the loop stops after the round just absorbed.
///
/// Checked in order: the backend's finish signal, generate mode, the
/// length/structure heuristic (from round 2 on), the round budget.
fn decide(
    artifact: &AccumulatedArtifact,
    signalled_complete: bool,
    request: &GenerationRequest,
    max_rounds: u32,
) -> Option<StopReason> {
    let round = artifact.rounds();

    if signalled_complete {
        return Some(StopReason::NaturalStop);
    }
    if request.mode == Mode::Generate {
        return Some(StopReason::SingleShot);
    }
    if round > 1
        && oracle::looks_reasonably_complete(
            artifact.text(),
            request.original_content(),
            request.content_class,
        )
    {
        return Some(StopReason::LooksComplete);
    }
    if round >= max_rounds {
        return Some(StopReason::BudgetExhausted);
    }
    None
}
