use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;

use docpipe_core::document::DocumentPayload;
use docpipe_llm::error::LlmError;
use docpipe_llm::provider::LlmProvider;
use docpipe_llm::structurer::StructuredExtraction;
use docpipe_ocr::backend::{OcrBackend, analyze};
use docpipe_ocr::error::OcrError;

use super::server::AppState;

const MISSING_FIELDS: &str = "Missing file or file path";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExtractRequest {
    #[serde(default)]
    pub file_buffer: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExtractResponse {
    extracted_data: StructuredExtraction,
}

/// Request-scoped failure, mapped to the JSON error envelope at the boundary.
pub(crate) enum ApiError {
    Validation(&'static str),
    MethodNotAllowed,
    Backend(OcrError),
    Llm(LlmError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(message) => {
                tracing::warn!("request rejected: {message}");
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            Self::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                Json(json!({ "error": "Invalid request method" })),
            )
                .into_response(),
            Self::Backend(e) => {
                tracing::error!("OCR backend failure: {e}");
                internal_error(&e.to_string())
            }
            Self::Llm(e) => {
                tracing::error!("structuring failure: {e}");
                internal_error(&e.to_string())
            }
        }
    }
}

fn internal_error(details: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal Server Error", "details": details })),
    )
        .into_response()
}

pub(crate) async fn extract_handler<B, P>(
    State(state): State<AppState<B, P>>,
    payload: Result<Json<ExtractRequest>, JsonRejection>,
) -> Response
where
    B: OcrBackend + 'static,
    P: LlmProvider + 'static,
{
    match run_pipeline(&state, payload).await {
        Ok(extracted_data) => Json(ExtractResponse { extracted_data }).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn run_pipeline<B, P>(
    state: &AppState<B, P>,
    payload: Result<Json<ExtractRequest>, JsonRejection>,
) -> Result<StructuredExtraction, ApiError>
where
    B: OcrBackend + 'static,
    P: LlmProvider + 'static,
{
    let Json(request) = payload.map_err(|e| {
        tracing::warn!("request body rejected: {e}");
        ApiError::Validation("Invalid request body")
    })?;

    // Empty strings count as missing, matching a falsy-field check.
    let file_buffer = request.file_buffer.filter(|v| !v.is_empty());
    let file_path = request.file_path.filter(|v| !v.is_empty());
    let (Some(file_buffer), Some(file_path)) = (file_buffer, file_path) else {
        return Err(ApiError::Validation(MISSING_FIELDS));
    };

    let document = DocumentPayload::from_base64(&file_buffer, &file_path).map_err(|e| {
        tracing::warn!("document decode failed: {e}");
        ApiError::Validation("Invalid file encoding")
    })?;
    tracing::debug!(
        content_type = document.content_type.as_mime(),
        bytes = document.bytes.len(),
        "document decoded"
    );

    let result = analyze(state.ocr.as_ref(), &document, state.poll_limits)
        .await
        .map_err(ApiError::Backend)?;

    let text = result.into_text();
    if text.is_empty() {
        tracing::warn!("no text recognized in document, structuring anyway");
    }
    tracing::debug!(text_len = text.len(), "document text normalized");

    state
        .structurer
        .structure(&text)
        .await
        .map_err(ApiError::Llm)
}

pub(crate) async fn method_not_allowed() -> Response {
    ApiError::MethodNotAllowed.into_response()
}
