//! Test-only scripted OCR backend.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use docpipe_core::document::DocumentPayload;

use crate::analysis::AnalysisResult;
use crate::backend::{OcrBackend, OperationHandle, PollOutcome, Submission};
use crate::error::OcrError;

enum SubmitScript {
    Complete(AnalysisResult),
    Pending,
    Fail(String),
}

/// Scripted backend: either completes on submit, fails submission, or
/// returns a pending handle and replays a fixed poll script. Once the
/// script is exhausted it keeps reporting `Running`.
pub struct MockBackend {
    submit: Mutex<Option<SubmitScript>>,
    poll_script: Mutex<Vec<PollOutcome>>,
    polls: AtomicUsize,
}

impl MockBackend {
    #[must_use]
    pub fn completing(result: AnalysisResult) -> Self {
        Self {
            submit: Mutex::new(Some(SubmitScript::Complete(result))),
            poll_script: Mutex::new(Vec::new()),
            polls: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn pending(mut script: Vec<PollOutcome>) -> Self {
        script.reverse();
        Self {
            submit: Mutex::new(Some(SubmitScript::Pending)),
            poll_script: Mutex::new(script),
            polls: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn never_terminal() -> Self {
        Self::pending(Vec::new())
    }

    #[must_use]
    pub fn failing_submit(message: &str) -> Self {
        Self {
            submit: Mutex::new(Some(SubmitScript::Fail(message.into()))),
            poll_script: Mutex::new(Vec::new()),
            polls: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn poll_count(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

impl OcrBackend for MockBackend {
    async fn submit(&self, _document: &DocumentPayload) -> Result<Submission, OcrError> {
        let script = self
            .submit
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| OcrError::Other("mock submitted twice".into()))?;
        match script {
            SubmitScript::Complete(result) => Ok(Submission::Complete(result)),
            SubmitScript::Pending => Ok(Submission::Pending(OperationHandle {
                url: "mock://operation/1".into(),
            })),
            SubmitScript::Fail(message) => Err(OcrError::Rejected(message)),
        }
    }

    async fn poll(&self, _handle: &OperationHandle) -> Result<PollOutcome, OcrError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .poll_script
            .lock()
            .unwrap()
            .pop()
            .unwrap_or(PollOutcome::Running { retry_after: None }))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
