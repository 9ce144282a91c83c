use std::time::Duration;

use tokio::time::Instant;

use docpipe_core::document::DocumentPayload;

use crate::analysis::AnalysisResult;
use crate::error::OcrError;

/// Opaque reference to an in-flight long-running operation.
#[derive(Clone, Debug)]
pub struct OperationHandle {
    pub url: String,
}

/// Outcome of submitting a document for analysis.
#[derive(Debug)]
pub enum Submission {
    Complete(AnalysisResult),
    Pending(OperationHandle),
}

/// One poll of a pending operation.
#[derive(Debug)]
pub enum PollOutcome {
    Running { retry_after: Option<Duration> },
    Succeeded(AnalysisResult),
    Failed(String),
}

pub trait OcrBackend: Send + Sync {
    /// Submit a document for analysis.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the document or the transport fails.
    fn submit(
        &self,
        document: &DocumentPayload,
    ) -> impl Future<Output = Result<Submission, OcrError>> + Send;

    /// Poll a pending operation once.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a malformed status response.
    fn poll(
        &self,
        handle: &OperationHandle,
    ) -> impl Future<Output = Result<PollOutcome, OcrError>> + Send;

    fn name(&self) -> &'static str;
}

/// Bounds on the poll loop. Backends advertise their own pacing via
/// `Retry-After`; these limits cap the total wait regardless.
#[derive(Clone, Copy, Debug)]
pub struct PollLimits {
    pub interval: Duration,
    pub max_wait: Duration,
    pub max_attempts: u32,
}

impl Default for PollLimits {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_wait: Duration::from_secs(120),
            max_attempts: 60,
        }
    }
}

/// Run a document through a backend to a terminal analysis result.
///
/// Synchronous backends return after a single submit. Pending submissions
/// are polled until success, failure, the attempt cap, or the wall-clock
/// deadline, whichever comes first. Dropping the returned future cancels
/// any outstanding poll.
///
/// # Errors
///
/// Returns `OcrError::PollTimeout` when the operation never reaches a
/// terminal state within the limits, `OcrError::AnalysisFailed` on a failed
/// terminal state, or the underlying submit/poll error.
pub async fn analyze<B: OcrBackend>(
    backend: &B,
    document: &DocumentPayload,
    limits: PollLimits,
) -> Result<AnalysisResult, OcrError> {
    let handle = match backend.submit(document).await? {
        Submission::Complete(result) => {
            tracing::debug!(backend = backend.name(), "analysis completed on submit");
            return Ok(result);
        }
        Submission::Pending(handle) => handle,
    };

    let deadline = Instant::now() + limits.max_wait;
    let mut delay = limits.interval;

    for attempt in 1..=limits.max_attempts {
        if Instant::now() + delay > deadline {
            tracing::warn!(
                backend = backend.name(),
                attempt,
                "poll deadline reached before terminal state"
            );
            return Err(OcrError::PollTimeout(limits.max_wait));
        }
        tokio::time::sleep(delay).await;

        match backend.poll(&handle).await? {
            PollOutcome::Succeeded(result) => {
                tracing::debug!(backend = backend.name(), attempt, "analysis succeeded");
                return Ok(result);
            }
            PollOutcome::Failed(message) => {
                tracing::warn!(backend = backend.name(), attempt, %message, "analysis failed");
                return Err(OcrError::AnalysisFailed(message));
            }
            PollOutcome::Running { retry_after } => {
                delay = retry_after.unwrap_or(limits.interval);
            }
        }
    }

    Err(OcrError::PollTimeout(limits.max_wait))
}
