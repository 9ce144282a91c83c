//! Configuration loading and the shared document payload model.

pub mod config;
pub mod document;
pub mod http;

pub use config::Config;
pub use document::{ContentType, DocumentPayload, PayloadError};
