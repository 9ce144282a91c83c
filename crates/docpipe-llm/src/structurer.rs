//! Structuring client: fixed two-message prompt that turns extracted text
//! into a key-value JSON object via a chat completion.

use serde_json::{Map, Value};

use crate::error::LlmError;
use crate::provider::{LlmProvider, Message};

/// Field titles mapped to extracted values, as returned to the caller.
pub type StructuredExtraction = Map<String, Value>;

const SYSTEM_PROMPT: &str = "Extract data as key value pairs according to their appropriate \
     titles. Respond with a single JSON object mapping each title to its value.";

pub struct Structurer<P> {
    provider: P,
}

impl<P: LlmProvider> Structurer<P> {
    #[must_use]
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Structure extracted document text into key-value pairs.
    ///
    /// The extracted text is passed verbatim as the user message. The model
    /// response must parse to a JSON object; anything else is a
    /// `StructuredParse` failure.
    ///
    /// # Errors
    ///
    /// Returns an error on provider failure or an unparseable response.
    pub async fn structure(&self, extracted_text: &str) -> Result<StructuredExtraction, LlmError> {
        if extracted_text.is_empty() {
            tracing::warn!("structuring empty extracted text");
        }

        let messages = [Message::system(SYSTEM_PROMPT), Message::user(extracted_text)];
        let raw = self.provider.chat(&messages).await?;
        tracing::debug!(
            provider = self.provider.name(),
            response_len = raw.len(),
            "structuring response received"
        );
        parse_structured(&raw)
    }
}

/// Parse a model response into a JSON object, tolerating markdown code fences.
fn parse_structured(raw: &str) -> Result<StructuredExtraction, LlmError> {
    let candidate = strip_code_fence(raw.trim());
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(LlmError::StructuredParse(format!(
            "expected a JSON object, got {}",
            value_kind(&other)
        ))),
        Err(e) => Err(LlmError::StructuredParse(format!(
            "response is not valid JSON: {e}"
        ))),
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (e.g. "json") up to the first newline. Single-line
    // fences have no newline; keep everything after the opening fence.
    let body = rest.find('\n').map_or(rest, |i| &rest[i + 1..]);
    body.rsplit_once("```").map_or(body, |(inner, _)| inner).trim()
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockProvider;

    #[tokio::test]
    async fn structures_plain_json_response() {
        let provider =
            MockProvider::with_responses(vec![r#"{"Name":"Alice","Age":"30"}"#.into()]);
        let structurer = Structurer::new(provider);
        let extraction = structurer.structure("Name: Alice\nAge: 30\n").await.unwrap();
        assert_eq!(extraction["Name"], "Alice");
        assert_eq!(extraction["Age"], "30");
    }

    #[tokio::test]
    async fn strips_markdown_code_fence() {
        let provider =
            MockProvider::with_responses(vec!["```json\n{\"Total\": \"42\"}\n```".into()]);
        let structurer = Structurer::new(provider);
        let extraction = structurer.structure("Total: 42").await.unwrap();
        assert_eq!(extraction["Total"], "42");
    }

    #[tokio::test]
    async fn non_object_response_is_parse_error() {
        let provider = MockProvider::with_responses(vec!["[1, 2, 3]".into()]);
        let structurer = Structurer::new(provider);
        let err = structurer.structure("text").await.unwrap_err();
        assert!(matches!(err, LlmError::StructuredParse(m) if m.contains("array")));
    }

    #[tokio::test]
    async fn prose_response_is_parse_error() {
        let provider = MockProvider::with_responses(vec!["Sure! Here are the fields.".into()]);
        let structurer = Structurer::new(provider);
        assert!(matches!(
            structurer.structure("text").await.unwrap_err(),
            LlmError::StructuredParse(_)
        ));
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let structurer = Structurer::new(MockProvider::failing());
        assert!(matches!(
            structurer.structure("text").await.unwrap_err(),
            LlmError::Other(_)
        ));
    }

    #[tokio::test]
    async fn empty_text_still_reaches_provider() {
        let provider = MockProvider::with_responses(vec!["{}".into()]);
        let structurer = Structurer::new(provider);
        let extraction = structurer.structure("").await.unwrap();
        assert!(extraction.is_empty());
    }

    #[tokio::test]
    async fn single_line_code_fence_is_stripped() {
        let provider = MockProvider::with_responses(vec!["```{\"Total\": \"42\"}```".into()]);
        let structurer = Structurer::new(provider);
        let extraction = structurer.structure("Total: 42").await.unwrap();
        assert_eq!(extraction["Total"], "42");
    }

    #[test]
    fn single_line_fence_keeps_body() {
        assert_eq!(strip_code_fence("```{\"a\":1}```"), "{\"a\":1}");
    }

    #[test]
    fn fence_without_terminator_is_tolerated() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn unfenced_text_passes_through() {
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
    }
}
