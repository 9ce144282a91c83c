//! End-to-end pipeline tests: decoded payload through OCR analysis,
//! text normalization, and LLM structuring, with scripted backends.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use docpipe_core::document::{ContentType, DocumentPayload};
use docpipe_llm::Structurer;
use docpipe_llm::mock::MockProvider;
use docpipe_ocr::analysis::{AnalysisResult, Block, BlockKind};
use docpipe_ocr::backend::{PollLimits, PollOutcome, analyze};
use docpipe_ocr::error::OcrError;
use docpipe_ocr::mock::MockBackend;

fn line_blocks(texts: &[&str]) -> AnalysisResult {
    AnalysisResult::Blocks(
        texts
            .iter()
            .map(|t| Block {
                kind: BlockKind::Line,
                text: (*t).into(),
            })
            .collect(),
    )
}

fn fast_limits() -> PollLimits {
    PollLimits {
        interval: Duration::from_millis(5),
        max_wait: Duration::from_millis(200),
        max_attempts: 10,
    }
}

fn pdf_payload() -> DocumentPayload {
    let encoded = STANDARD.encode(b"%PDF-1.7 synthetic");
    DocumentPayload::from_base64(&encoded, "statement.pdf").unwrap()
}

#[tokio::test]
async fn blocks_pipeline_produces_structured_extraction() {
    let payload = pdf_payload();
    assert_eq!(payload.content_type, ContentType::Pdf);

    let backend = MockBackend::completing(line_blocks(&["Name: Alice", "Age: 30"]));
    let result = analyze(&backend, &payload, fast_limits()).await.unwrap();
    let text = result.into_text();
    assert_eq!(text, "Name: Alice\nAge: 30\n");

    let provider = MockProvider::with_responses(vec![r#"{"Name":"Alice","Age":"30"}"#.into()]);
    let prompts = provider.last_messages.clone();
    let structurer = Structurer::new(provider);
    let extraction = structurer.structure(&text).await.unwrap();

    assert_eq!(extraction["Name"], "Alice");
    assert_eq!(extraction["Age"], "30");
    // The extracted text reaches the model verbatim as the user message.
    assert_eq!(prompts.lock().unwrap()[1].content, "Name: Alice\nAge: 30\n");
}

#[tokio::test]
async fn long_running_pipeline_polls_to_completion() {
    let backend = MockBackend::pending(vec![
        PollOutcome::Running { retry_after: None },
        PollOutcome::Succeeded(AnalysisResult::Content("Invoice total: 42".into())),
    ]);

    let result = analyze(&backend, &pdf_payload(), fast_limits())
        .await
        .unwrap();
    assert_eq!(result.into_text(), "Invoice total: 42");
    assert_eq!(backend.poll_count(), 2);
}

#[tokio::test]
async fn stuck_operation_fails_instead_of_hanging() {
    let backend = MockBackend::never_terminal();
    let err = analyze(&backend, &pdf_payload(), fast_limits())
        .await
        .unwrap_err();
    assert!(matches!(err, OcrError::PollTimeout(_)));
}

#[tokio::test]
async fn empty_document_text_still_structures() {
    let backend = MockBackend::completing(AnalysisResult::Blocks(Vec::new()));
    let text = analyze(&backend, &pdf_payload(), fast_limits())
        .await
        .unwrap()
        .into_text();
    assert!(text.is_empty());

    let structurer = Structurer::new(MockProvider::with_responses(vec!["{}".into()]));
    let extraction = structurer.structure(&text).await.unwrap();
    assert!(extraction.is_empty());
}
