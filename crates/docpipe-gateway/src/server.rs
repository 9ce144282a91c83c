use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::watch;

use docpipe_llm::provider::LlmProvider;
use docpipe_llm::structurer::Structurer;
use docpipe_ocr::backend::{OcrBackend, PollLimits};

use crate::error::GatewayError;
use crate::router::build_router;

pub(crate) struct AppState<B, P> {
    pub ocr: Arc<B>,
    pub structurer: Arc<Structurer<P>>,
    pub poll_limits: PollLimits,
}

impl<B, P> Clone for AppState<B, P> {
    fn clone(&self) -> Self {
        Self {
            ocr: Arc::clone(&self.ocr),
            structurer: Arc::clone(&self.structurer),
            poll_limits: self.poll_limits,
        }
    }
}

pub struct GatewayServer<B, P> {
    addr: SocketAddr,
    max_body_size: usize,
    poll_limits: PollLimits,
    ocr: Arc<B>,
    structurer: Arc<Structurer<P>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl<B, P> GatewayServer<B, P>
where
    B: OcrBackend + 'static,
    P: LlmProvider + 'static,
{
    #[must_use]
    pub fn new(
        bind: &str,
        port: u16,
        ocr: B,
        structurer: Structurer<P>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        let addr: SocketAddr = format!("{bind}:{port}").parse().unwrap_or_else(|e| {
            tracing::warn!("invalid bind '{bind}': {e}, falling back to 127.0.0.1:{port}");
            SocketAddr::from(([127, 0, 0, 1], port))
        });

        if bind == "0.0.0.0" {
            tracing::warn!("gateway binding to 0.0.0.0, reachable from all interfaces");
        }

        Self {
            addr,
            max_body_size: 20 * 1024 * 1024,
            poll_limits: PollLimits::default(),
            ocr: Arc::new(ocr),
            structurer: Arc::new(structurer),
            shutdown_rx,
        }
    }

    #[must_use]
    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    #[must_use]
    pub fn with_poll_limits(mut self, limits: PollLimits) -> Self {
        self.poll_limits = limits;
        self
    }

    /// Start the HTTP gateway server.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind or encounters a fatal I/O error.
    pub async fn serve(self) -> Result<(), GatewayError> {
        let state = AppState {
            ocr: self.ocr,
            structurer: self.structurer,
            poll_limits: self.poll_limits,
        };

        let router = build_router(state, self.max_body_size);

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| GatewayError::Bind {
                addr: self.addr.to_string(),
                source: e,
            })?;
        tracing::info!("gateway listening on {}", self.addr);

        let mut shutdown_rx = self.shutdown_rx;
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                while !*shutdown_rx.borrow_and_update() {
                    if shutdown_rx.changed().await.is_err() {
                        std::future::pending::<()>().await;
                    }
                }
                tracing::info!("gateway shutting down");
            })
            .await
            .map_err(|e| GatewayError::Server(format!("{e}")))?;

        Ok(())
    }
}
