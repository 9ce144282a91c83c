//! Azure Document Intelligence backend over the raw REST API.
//!
//! Submits the document binary to the prebuilt-layout model with markdown
//! output and polls the returned `Operation-Location` until the operation
//! reaches a terminal state.

use std::time::Duration;

use serde::Deserialize;

use docpipe_core::document::DocumentPayload;

use crate::analysis::AnalysisResult;
use crate::backend::{OcrBackend, OperationHandle, PollOutcome, Submission};
use crate::error::OcrError;

const API_VERSION: &str = "2024-11-30";
const MODEL_ID: &str = "prebuilt-layout";

pub struct AzureBackend {
    client: reqwest::Client,
    endpoint: String,
    key: String,
}

#[derive(Deserialize)]
struct AnalyzeOperation {
    status: Option<String>,
    #[serde(rename = "analyzeResult")]
    analyze_result: Option<AnalyzeResultBody>,
    error: Option<ServiceError>,
}

#[derive(Deserialize)]
struct AnalyzeResultBody {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<ServiceError>,
}

#[derive(Deserialize)]
struct ServiceError {
    message: Option<String>,
}

impl AzureBackend {
    #[must_use]
    pub fn new(mut endpoint: String, key: String) -> Self {
        while endpoint.ends_with('/') {
            endpoint.pop();
        }
        Self {
            client: docpipe_core::http::default_client(),
            endpoint,
            key,
        }
    }

    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn analyze_url(&self) -> String {
        format!(
            "{}/documentintelligence/documentModels/{MODEL_ID}:analyze",
            self.endpoint
        )
    }
}

fn service_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error)
        .and_then(|e| e.message)
        .unwrap_or_else(|| "unexpected response".to_owned())
}

fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .map(Duration::from_secs)
}

impl OcrBackend for AzureBackend {
    async fn submit(&self, document: &DocumentPayload) -> Result<Submission, OcrError> {
        let response = self
            .client
            .post(self.analyze_url())
            .query(&[
                ("api-version", API_VERSION),
                ("outputContentFormat", "markdown"),
            ])
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .header("Content-Type", document.content_type.as_mime())
            .body(document.bytes.clone())
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::ACCEPTED {
            let url = response
                .headers()
                .get("operation-location")
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
                .ok_or(OcrError::MissingOperationLocation)?;
            tracing::debug!("azure accepted document, polling operation");
            return Ok(Submission::Pending(OperationHandle { url }));
        }

        let text = response.text().await?;

        if !status.is_success() {
            tracing::error!("azure analyze rejected (status {status}): {text}");
            return Err(OcrError::Rejected(service_message(&text)));
        }

        // Some deployments answer small documents inline.
        let operation: AnalyzeOperation = serde_json::from_str(&text)?;
        let content = operation
            .analyze_result
            .and_then(|r| r.content)
            .unwrap_or_default();
        Ok(Submission::Complete(AnalysisResult::Content(content)))
    }

    async fn poll(&self, handle: &OperationHandle) -> Result<PollOutcome, OcrError> {
        let response = self
            .client
            .get(&handle.url)
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .send()
            .await?;

        let status = response.status();
        let pacing = retry_after(&response);
        let text = response.text().await?;

        if !status.is_success() {
            tracing::error!("azure poll failed (status {status}): {text}");
            return Err(OcrError::Rejected(service_message(&text)));
        }

        let operation: AnalyzeOperation = serde_json::from_str(&text)?;
        match operation.status.as_deref() {
            Some("succeeded") => {
                let content = operation
                    .analyze_result
                    .and_then(|r| r.content)
                    .unwrap_or_default();
                Ok(PollOutcome::Succeeded(AnalysisResult::Content(content)))
            }
            Some("failed") => Ok(PollOutcome::Failed(
                operation
                    .error
                    .and_then(|e| e.message)
                    .unwrap_or_else(|| "analysis failed".to_owned()),
            )),
            Some("running" | "notStarted") | None => Ok(PollOutcome::Running {
                retry_after: pacing,
            }),
            Some(other) => Err(OcrError::Other(format!(
                "unknown operation status '{other}'"
            ))),
        }
    }

    fn name(&self) -> &'static str {
        "azure"
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::backend::{PollLimits, analyze};
    use docpipe_core::document::ContentType;

    const ANALYZE_PATH: &str = "/documentintelligence/documentModels/prebuilt-layout:analyze";

    fn backend(server: &MockServer) -> AzureBackend {
        AzureBackend::new(server.uri(), "test-key".into())
    }

    fn payload() -> DocumentPayload {
        DocumentPayload {
            bytes: b"%PDF-1.7".to_vec(),
            content_type: ContentType::Pdf,
        }
    }

    fn fast_limits() -> PollLimits {
        PollLimits {
            interval: Duration::from_millis(5),
            max_wait: Duration::from_millis(250),
            max_attempts: 10,
        }
    }

    #[tokio::test]
    async fn submit_returns_pending_handle() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ANALYZE_PATH))
            .and(query_param("outputContentFormat", "markdown"))
            .and(header("Ocp-Apim-Subscription-Key", "test-key"))
            .and(header("Content-Type", "application/pdf"))
            .respond_with(
                ResponseTemplate::new(202)
                    .insert_header("Operation-Location", format!("{}/op/1", server.uri())),
            )
            .mount(&server)
            .await;

        let submission = backend(&server).submit(&payload()).await.unwrap();
        match submission {
            Submission::Pending(handle) => assert!(handle.url.ends_with("/op/1")),
            Submission::Complete(_) => panic!("expected pending operation"),
        }
    }

    #[tokio::test]
    async fn accepted_without_operation_location_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ANALYZE_PATH))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        let err = backend(&server).submit(&payload()).await.unwrap_err();
        assert!(matches!(err, OcrError::MissingOperationLocation));
    }

    #[tokio::test]
    async fn rejection_surfaces_service_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ANALYZE_PATH))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"code": "InvalidRequest", "message": "content is corrupt"}
            })))
            .mount(&server)
            .await;

        let err = backend(&server).submit(&payload()).await.unwrap_err();
        assert!(matches!(err, OcrError::Rejected(m) if m == "content is corrupt"));
    }

    #[tokio::test]
    async fn inline_result_completes_without_polling() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ANALYZE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "succeeded",
                "analyzeResult": {"content": "# Receipt"}
            })))
            .mount(&server)
            .await;

        let result = analyze(&backend(&server), &payload(), fast_limits())
            .await
            .unwrap();
        assert_eq!(result.into_text(), "# Receipt");
    }

    #[tokio::test]
    async fn polls_until_succeeded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ANALYZE_PATH))
            .respond_with(
                ResponseTemplate::new(202)
                    .insert_header("Operation-Location", format!("{}/op/2", server.uri())),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/op/2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "running"})),
            )
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/op/2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "succeeded",
                "analyzeResult": {"content": "Name: Alice"}
            })))
            .mount(&server)
            .await;

        let result = analyze(&backend(&server), &payload(), fast_limits())
            .await
            .unwrap();
        assert_eq!(result.into_text(), "Name: Alice");
    }

    #[tokio::test]
    async fn failed_operation_carries_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ANALYZE_PATH))
            .respond_with(
                ResponseTemplate::new(202)
                    .insert_header("Operation-Location", format!("{}/op/3", server.uri())),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/op/3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "failed",
                "error": {"message": "page limit exceeded"}
            })))
            .mount(&server)
            .await;

        let err = analyze(&backend(&server), &payload(), fast_limits())
            .await
            .unwrap_err();
        assert!(matches!(err, OcrError::AnalysisFailed(m) if m == "page limit exceeded"));
    }

    #[tokio::test]
    async fn never_terminal_operation_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ANALYZE_PATH))
            .respond_with(
                ResponseTemplate::new(202)
                    .insert_header("Operation-Location", format!("{}/op/4", server.uri())),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/op/4"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "running"})),
            )
            .mount(&server)
            .await;

        let err = analyze(&backend(&server), &payload(), fast_limits())
            .await
            .unwrap_err();
        assert!(matches!(err, OcrError::PollTimeout(_)));
    }
}
