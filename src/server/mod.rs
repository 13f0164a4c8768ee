mod handle;
mod http;

pub use handle::{RequestGuard, ServerHandle};
pub use http::HttpServer;

use crate::error::Result;
use async_trait::async_trait;
use tokio::time::Instant;

/// The contract the shutdown coordinator drives.
#[async_trait]
pub trait Server: Send + Sync + 'static {
    /// Bind and serve until told to stop.
    ///
    /// Returns `Ok(())` once the server has been asked to stop accepting
    /// connections. Any error means the listener never came up or died.
    async fn listen_and_serve(&self) -> Result<()>;

    /// Toggle HTTP keep-alive for responses written from now on
    fn set_keep_alives_enabled(&self, enabled: bool);

    /// Stop accepting connections and wait for in-flight requests until
    /// `deadline`, failing with [`crate::MingoError::DrainTimeout`] past it.
    async fn shutdown(&self, deadline: Instant) -> Result<()>;
}
