use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;

use docpipe_core::config::{Config, OcrBackendKind};
use docpipe_gateway::GatewayServer;
use docpipe_llm::openai::OpenAiProvider;
use docpipe_llm::structurer::Structurer;
use docpipe_ocr::azure::AzureBackend;
use docpipe_ocr::backend::{OcrBackend, PollLimits};
use docpipe_ocr::textract::TextractBackend;

#[derive(Parser)]
#[command(name = "docpipe", version, about = "Document extraction gateway: cloud OCR + LLM structuring")]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "docpipe.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("ctrl-c received, shutting down");
            let _ = shutdown_tx.send(true);
        }
    });

    match config.ocr.backend {
        OcrBackendKind::Textract => {
            tracing::info!(region = %config.ocr.region, "starting with the textract backend");
            let backend = TextractBackend::new(&config.ocr.region).await;
            run_gateway(&config, backend, shutdown_rx).await
        }
        OcrBackendKind::Azure => {
            let endpoint =
                std::env::var("AZURE_ENDPOINT").context("AZURE_ENDPOINT is not set")?;
            let key = std::env::var("AZURE_KEY").context("AZURE_KEY is not set")?;
            tracing::info!("starting with the azure backend");
            run_gateway(&config, AzureBackend::new(endpoint, key), shutdown_rx).await
        }
    }
}

async fn run_gateway<B: OcrBackend + 'static>(
    config: &Config,
    backend: B,
    shutdown_rx: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let api_key = std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY is not set")?;
    let provider = OpenAiProvider::new(
        api_key,
        config.llm.base_url.clone(),
        config.llm.model.clone(),
    );

    let limits = PollLimits {
        interval: Duration::from_millis(config.ocr.poll_interval_ms),
        max_wait: Duration::from_secs(config.ocr.poll_max_wait_secs),
        max_attempts: config.ocr.poll_max_attempts,
    };

    GatewayServer::new(
        &config.server.bind,
        config.server.port,
        backend,
        Structurer::new(provider),
        shutdown_rx,
    )
    .with_max_body_size(config.server.max_body_size)
    .with_poll_limits(limits)
    .serve()
    .await?;

    Ok(())
}
