//! AWS Textract backend: synchronous `AnalyzeDocument` with form and table
//! detection. Credentials come from the standard AWS env chain
//! (`AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`).

use aws_config::{BehaviorVersion, Region};
use aws_sdk_textract::Client;
use aws_sdk_textract::error::DisplayErrorContext;
use aws_sdk_textract::primitives::Blob;
use aws_sdk_textract::types::{BlockType, Document, FeatureType};

use docpipe_core::document::DocumentPayload;

use crate::analysis::{AnalysisResult, Block, BlockKind};
use crate::backend::{OcrBackend, OperationHandle, PollOutcome, Submission};
use crate::error::OcrError;

pub struct TextractBackend {
    client: Client,
}

impl TextractBackend {
    pub async fn new(region: &str) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_owned()))
            .load()
            .await;
        Self {
            client: Client::new(&config),
        }
    }

    /// Build from a pre-configured SDK client (custom endpoint or credentials).
    #[must_use]
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl OcrBackend for TextractBackend {
    async fn submit(&self, document: &DocumentPayload) -> Result<Submission, OcrError> {
        let input = Document::builder()
            .bytes(Blob::new(document.bytes.clone()))
            .build();

        let output = self
            .client
            .analyze_document()
            .document(input)
            .feature_types(FeatureType::Forms)
            .feature_types(FeatureType::Tables)
            .send()
            .await
            .map_err(|e| OcrError::Rejected(format!("{}", DisplayErrorContext(e))))?;

        let blocks = output.blocks.ok_or(OcrError::MissingBlocks)?;
        tracing::debug!(blocks = blocks.len(), "textract analysis returned");

        let blocks = blocks
            .into_iter()
            .map(|b| Block {
                kind: match b.block_type {
                    Some(BlockType::Line) => BlockKind::Line,
                    Some(BlockType::Word) => BlockKind::Word,
                    Some(BlockType::Page) => BlockKind::Page,
                    _ => BlockKind::Other,
                },
                text: b.text.unwrap_or_default(),
            })
            .collect();

        Ok(Submission::Complete(AnalysisResult::Blocks(blocks)))
    }

    async fn poll(&self, _handle: &OperationHandle) -> Result<PollOutcome, OcrError> {
        // AnalyzeDocument completes inline; nothing ever reaches here.
        Err(OcrError::Other(
            "textract analysis is synchronous and has no pending operations".into(),
        ))
    }

    fn name(&self) -> &'static str {
        "textract"
    }
}
