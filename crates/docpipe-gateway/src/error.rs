use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("gateway server error: {0}")]
    Server(String),
}
