//! HTTP surface for document extraction: one POST endpoint, fixed CORS,
//! graceful shutdown.

mod error;
mod handlers;
mod router;
mod server;

pub use error::GatewayError;
pub use server::GatewayServer;
