use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("backend rejected document: {0}")]
    Rejected(String),

    #[error("analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("response lacks block data")]
    MissingBlocks,

    #[error("missing operation location in accepted response")]
    MissingOperationLocation,

    #[error("analysis did not complete within {0:?}")]
    PollTimeout(Duration),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, OcrError>;
