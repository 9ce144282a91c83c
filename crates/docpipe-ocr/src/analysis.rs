//! Backend-agnostic analysis results and text normalization.

/// Element kind within a block-oriented analysis result. Only `Line` blocks
/// contribute to the normalized text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockKind {
    Page,
    Line,
    Word,
    Other,
}

#[derive(Clone, Debug)]
pub struct Block {
    pub kind: BlockKind,
    pub text: String,
}

/// Structured OCR output, uninterpreted until normalization.
#[derive(Clone, Debug)]
pub enum AnalysisResult {
    /// Block list as returned by Textract-style backends, in backend order.
    Blocks(Vec<Block>),
    /// Pre-normalized content string (Azure markdown output).
    Content(String),
}

impl AnalysisResult {
    /// Normalize to a single plain-text blob.
    ///
    /// Block results concatenate every `Line` block's text followed by a
    /// newline, preserving the backend's ordering. Content results are taken
    /// verbatim. No text found yields an empty string, not an error.
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Content(content) => content,
            Self::Blocks(blocks) => {
                let mut text = String::new();
                for block in blocks {
                    if block.kind == BlockKind::Line {
                        text.push_str(&block.text);
                        text.push('\n');
                    }
                }
                text
            }
        }
    }
}
