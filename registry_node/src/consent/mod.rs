//! Consent-video verification capability
//!
//! The workflow engine only depends on the [`ConsentVerifier`] trait. The
//! real biometric model lives behind this boundary; what ships here is the
//! mock the product currently runs with, plus a failing double for
//! exercising the adapter-failure paths.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Judgment returned by a consent verifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentOutcome {
    pub verified: bool,
    pub confidence: f64,
    pub match_score: f64,
}

#[derive(Debug, Error)]
#[error("consent verification failed: {0}")]
pub struct VerifierError(pub String);

/// Judges whether the spoken content of `video` matches `statement`.
///
/// Invoked at most once per consent attempt; may take multiple seconds.
#[async_trait]
pub trait ConsentVerifier: Send + Sync {
    async fn verify(
        &self,
        video: &Path,
        statement: &str,
    ) -> Result<ConsentOutcome, VerifierError>;
}

/// Stub verifier: sleeps the configured delay and reports a match.
///
/// The delay is injected here, at the boundary, so the engine itself never
/// carries a hard-coded processing pause.
pub struct MockConsentVerifier {
    delay: Duration,
    confidence: f64,
    match_score: f64,
}

impl MockConsentVerifier {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            confidence: 0.92,
            match_score: 0.89,
        }
    }

    /// Mock with no processing delay, for tests
    pub fn instant() -> Self {
        Self::new(Duration::ZERO)
    }
}

#[async_trait]
impl ConsentVerifier for MockConsentVerifier {
    async fn verify(
        &self,
        video: &Path,
        _statement: &str,
    ) -> Result<ConsentOutcome, VerifierError> {
        if !video.exists() {
            return Err(VerifierError(format!(
                "video file missing: {}",
                video.display()
            )));
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(ConsentOutcome {
            verified: true,
            confidence: self.confidence,
            match_score: self.match_score,
        })
    }
}

/// Test double that always reports a non-match
pub struct RejectingConsentVerifier;

#[async_trait]
impl ConsentVerifier for RejectingConsentVerifier {
    async fn verify(
        &self,
        _video: &Path,
        _statement: &str,
    ) -> Result<ConsentOutcome, VerifierError> {
        Ok(ConsentOutcome {
            verified: false,
            confidence: 0.31,
            match_score: 0.08,
        })
    }
}

/// Test double that fails outright, as a crashed model process would
pub struct FailingConsentVerifier;

#[async_trait]
impl ConsentVerifier for FailingConsentVerifier {
    async fn verify(
        &self,
        _video: &Path,
        _statement: &str,
    ) -> Result<ConsentOutcome, VerifierError> {
        Err(VerifierError("model process exited with code 1".into()))
    }
}
