//! Failover across backends for a single round.
//!
//! A round goes to the first backend in the chain. A transient failure
//! (timeout, rate limit, network error, 5xx) hands the same request to the
//! next backend. A permanent failure is returned at once and the rest of the
//! chain is never asked.

use async_trait::async_trait;
use splice_core::{Backend, BackendError, BackendResult, GenerationRequest};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Time a member gets to answer when no per-member limit was set.
pub const DEFAULT_MEMBER_TIMEOUT: Duration = Duration::from_secs(120);

pub struct FallbackBackend {
    name: String,
    default_timeout: Duration,
    members: Vec<Member>,
}

struct Member {
    backend: Arc<dyn Backend>,
    timeout: Option<Duration>,
}

impl FallbackBackend {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_timeout: DEFAULT_MEMBER_TIMEOUT,
            members: Vec::new(),
        }
    }

    /// Limit applied to members added without their own timeout.
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.members.push(Member {
            backend,
            timeout: None,
        });
        self
    }

    pub fn with_backend_timeout(mut self, backend: Arc<dyn Backend>, timeout: Duration) -> Self {
        self.members.push(Member {
            backend,
            timeout: Some(timeout),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// One member's answer, with an elapsed limit turned into `Timeout`.
    async fn attempt(
        &self,
        member: &Member,
        request: GenerationRequest,
    ) -> Result<BackendResult, BackendError> {
        let limit = member.timeout.unwrap_or(self.default_timeout);
        match tokio::time::timeout(limit, member.backend.send(request)).await {
            Ok(answer) => answer,
            Err(_) => Err(BackendError::Timeout(format!(
                "'{}' gave no answer within {}ms",
                member.backend.name(),
                limit.as_millis()
            ))),
        }
    }
}

#[async_trait]
impl Backend for FallbackBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, request: GenerationRequest) -> Result<BackendResult, BackendError> {
        let mut transient = None;

        for (position, member) in self.members.iter().enumerate() {
            let member_name = member.backend.name();
            debug!(chain = %self.name, backend = %member_name, position, "Sending round");

            match self.attempt(member, request.clone()).await {
                Ok(result) => {
                    if position > 0 {
                        info!(
                            chain = %self.name,
                            backend = %member_name,
                            skipped = position,
                            "Round served by a fallback backend"
                        );
                    }
                    return Ok(result);
                }
                Err(e) if e.is_transient() => {
                    warn!(
                        chain = %self.name,
                        backend = %member_name,
                        error = %e,
                        remaining = self.members.len() - position - 1,
                        "Transient backend failure, moving down the chain"
                    );
                    transient = Some(e);
                }
                Err(e) => {
                    warn!(
                        chain = %self.name,
                        backend = %member_name,
                        error = %e,
                        "Permanent backend failure, not falling back"
                    );
                    return Err(e);
                }
            }
        }

        Err(transient.unwrap_or_else(|| {
            BackendError::NotConfigured(format!("fallback chain '{}' has no backends", self.name))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use splice_core::{ContentClass, FinishSignal};
    use std::sync::Mutex;

    /// Answers every call the same way, after an optional delay.
    struct FixedBackend {
        name: &'static str,
        answer: Result<BackendResult, BackendError>,
        delay: Duration,
        calls: Mutex<usize>,
    }

    impl FixedBackend {
        fn ok(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                answer: Ok(BackendResult::new(
                    format!("from {name}"),
                    3,
                    FinishSignal::NaturalStop,
                )),
                delay: Duration::ZERO,
                calls: Mutex::new(0),
            })
        }

        fn failing(name: &'static str, error: BackendError) -> Arc<Self> {
            Arc::new(Self {
                name,
                answer: Err(error),
                delay: Duration::ZERO,
                calls: Mutex::new(0),
            })
        }

        fn stalled(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                answer: Err(BackendError::Network("unreachable".into())),
                delay: Duration::from_secs(3600),
                calls: Mutex::new(0),
            })
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl Backend for FixedBackend {
        fn name(&self) -> &str {
            self.name
        }

        async fn send(&self, _request: GenerationRequest) -> Result<BackendResult, BackendError> {
            *self.calls.lock().unwrap() += 1;
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.answer.clone()
        }
    }

    fn round() -> GenerationRequest {
        GenerationRequest::transform("convert", "body", ContentClass::Freeform)
    }

    fn chain(primary: Arc<FixedBackend>, secondary: Arc<FixedBackend>) -> FallbackBackend {
        FallbackBackend::new("chain")
            .with_backend(primary)
            .with_backend(secondary)
    }

    #[tokio::test]
    async fn healthy_primary_answers_alone() {
        let primary = FixedBackend::ok("primary");
        let secondary = FixedBackend::ok("secondary");

        let result = chain(primary.clone(), secondary.clone())
            .send(round())
            .await
            .unwrap();
        assert_eq!(result.text, "from primary");
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 0);
    }

    #[tokio::test]
    async fn transient_failures_move_to_next_backend() {
        let transient = [
            BackendError::ApiError {
                status_code: 503,
                message: "overloaded".into(),
            },
            BackendError::RateLimited {
                retry_after_secs: 60,
            },
            BackendError::Network("connection reset".into()),
            BackendError::Timeout("upstream".into()),
        ];

        for error in transient {
            let primary = FixedBackend::failing("primary", error.clone());
            let secondary = FixedBackend::ok("secondary");

            let result = chain(primary.clone(), secondary.clone()).send(round()).await;
            assert_eq!(result.unwrap().text, "from secondary", "after {error:?}");
            assert_eq!(primary.calls(), 1);
            assert_eq!(secondary.calls(), 1);
        }
    }

    #[tokio::test]
    async fn permanent_failures_surface_without_fallback() {
        let permanent = [
            BackendError::AuthenticationFailed("bad key".into()),
            BackendError::NotConfigured("no endpoint".into()),
            BackendError::ApiError {
                status_code: 400,
                message: "context too long".into(),
            },
            BackendError::InvalidResponse("no choices".into()),
        ];

        for error in permanent {
            let primary = FixedBackend::failing("primary", error.clone());
            let secondary = FixedBackend::ok("secondary");

            let err = chain(primary.clone(), secondary.clone())
                .send(round())
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), error.to_string());
            assert_eq!(secondary.calls(), 0, "fell back after {error:?}");
        }
    }

    #[tokio::test]
    async fn permanent_failure_after_transient_one_wins() {
        let first = FixedBackend::failing("first", BackendError::Network("refused".into()));
        let second = FixedBackend::failing(
            "second",
            BackendError::AuthenticationFailed("expired key".into()),
        );
        let third = FixedBackend::ok("third");

        let fallback = FallbackBackend::new("chain")
            .with_backend(first.clone())
            .with_backend(second.clone())
            .with_backend(third.clone());

        match fallback.send(round()).await.unwrap_err() {
            BackendError::AuthenticationFailed(msg) => assert_eq!(msg, "expired key"),
            other => panic!("Expected AuthenticationFailed, got: {other:?}"),
        }
        assert_eq!(first.calls(), 1);
        assert_eq!(third.calls(), 0);
    }

    #[tokio::test]
    async fn exhausted_chain_reports_last_transient_error() {
        let primary = FixedBackend::failing("primary", BackendError::Network("refused".into()));
        let secondary = FixedBackend::failing(
            "secondary",
            BackendError::RateLimited {
                retry_after_secs: 30,
            },
        );

        match chain(primary.clone(), secondary.clone())
            .send(round())
            .await
            .unwrap_err()
        {
            BackendError::RateLimited { retry_after_secs } => assert_eq!(retry_after_secs, 30),
            other => panic!("Expected RateLimited, got: {other:?}"),
        }
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_member_times_out_and_falls_back() {
        let stalled = FixedBackend::stalled("stalled");
        let secondary = FixedBackend::ok("secondary");

        let fallback = FallbackBackend::new("chain")
            .with_backend_timeout(stalled.clone(), Duration::from_millis(50))
            .with_backend(secondary.clone());

        let result = fallback.send(round()).await.unwrap();
        assert_eq!(result.text, "from secondary");
        assert_eq!(stalled.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn default_timeout_applies_to_plain_members() {
        let fallback = FallbackBackend::new("chain")
            .with_default_timeout(Duration::from_secs(2))
            .with_backend(FixedBackend::stalled("stalled"));

        match fallback.send(round()).await.unwrap_err() {
            BackendError::Timeout(msg) => assert!(msg.contains("2000ms"), "{msg}"),
            other => panic!("Expected Timeout, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_chain_is_not_configured() {
        let fallback = FallbackBackend::new("empty");
        assert!(fallback.is_empty());
        match fallback.send(round()).await.unwrap_err() {
            BackendError::NotConfigured(msg) => assert!(msg.contains("empty")),
            other => panic!("Expected NotConfigured, got: {other:?}"),
        }
    }
}
