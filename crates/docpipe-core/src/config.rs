use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub ocr: OcrConfig,
    pub llm: LlmConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Maximum accepted request body size in bytes.
    pub max_body_size: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrBackendKind {
    Textract,
    Azure,
}

#[derive(Debug, Deserialize)]
pub struct OcrConfig {
    pub backend: OcrBackendKind,
    /// AWS region for the Textract backend.
    pub region: String,
    pub poll_interval_ms: u64,
    pub poll_max_wait_secs: u64,
    pub poll_max_attempts: u32,
}

#[derive(Debug, Deserialize)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
}

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist. Credentials are
    /// never read from the file: `OPENAI_API_KEY`, `AZURE_ENDPOINT`,
    /// `AZURE_KEY`, and the AWS credential chain stay env-only.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("DOCPIPE_OCR_BACKEND") {
            match v.to_lowercase().as_str() {
                "textract" => self.ocr.backend = OcrBackendKind::Textract,
                "azure" => self.ocr.backend = OcrBackendKind::Azure,
                other => tracing::warn!("unknown DOCPIPE_OCR_BACKEND '{other}', keeping config"),
            }
        }
        if let Ok(v) = std::env::var("DOCPIPE_BIND") {
            self.server.bind = v;
        }
        if let Ok(v) = std::env::var("DOCPIPE_PORT")
            && let Ok(port) = v.parse()
        {
            self.server.port = port;
        }
        if let Ok(v) = std::env::var("DOCPIPE_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("DOCPIPE_LLM_MODEL") {
            self.llm.model = v;
        }
    }

    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind: "127.0.0.1".into(),
                port: 4000,
                max_body_size: 20 * 1024 * 1024,
            },
            ocr: OcrConfig {
                backend: OcrBackendKind::Textract,
                region: "us-east-1".into(),
                poll_interval_ms: 1000,
                poll_max_wait_secs: 120,
                poll_max_attempts: 60,
            },
            llm: LlmConfig {
                base_url: "https://api.openai.com/v1".into(),
                model: "gpt-3.5-turbo".into(),
            },
        }
    }
}
