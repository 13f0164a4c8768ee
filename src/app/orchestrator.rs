use super::AppContext;
use crate::config::MingoConfig;
use crate::error::Result;
use crate::lifecycle::Lifecycle;
use crate::server::{HttpServer, ServerHandle};
use crate::store::{InMemoryStore, SharedStore};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Owns the server and everything that decides when it stops
pub struct MingoApp {
    pub(super) config: MingoConfig,
    pub(super) context: AppContext,
    pub(super) lifecycle: Lifecycle,
    pub(super) store: SharedStore,
    pub(super) server: Arc<HttpServer>,
    pub(super) cancellation_token: CancellationToken,
}

impl MingoApp {
    /// Build the application from an immutable configuration and context
    pub fn new(config: MingoConfig, context: AppContext) -> Result<Self> {
        let lifecycle = Lifecycle::new();
        let store = InMemoryStore::shared();
        let server = Self::build_server(&config, &context, &lifecycle, &store)?;

        Ok(Self {
            config,
            context,
            lifecycle,
            store,
            server: Arc::new(server),
            cancellation_token: CancellationToken::new(),
        })
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.clone()
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    pub fn store(&self) -> SharedStore {
        Arc::clone(&self.store)
    }

    pub fn server_handle(&self) -> ServerHandle {
        self.server.handle()
    }

    /// Cancelling this token abandons the run without a graceful drain
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }
}
