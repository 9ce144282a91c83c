//! OCR backend abstraction and cloud implementations.
//!
//! A backend either completes analysis in one round trip (Textract) or
//! returns a long-running-operation handle that the [`backend::analyze`]
//! driver polls to a terminal state under a wall-clock deadline.

pub mod analysis;
pub mod azure;
pub mod backend;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod textract;

pub use analysis::AnalysisResult;
pub use backend::{OcrBackend, PollLimits};
pub use error::OcrError;
