//! LLM provider abstraction and the key-value structuring client.

pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod openai;
pub mod provider;
pub mod structurer;

pub use error::LlmError;
pub use provider::LlmProvider;
pub use structurer::{StructuredExtraction, Structurer};
