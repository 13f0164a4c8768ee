use super::{AppContext, MingoApp};
use crate::config::MingoConfig;
use crate::error::Result;
use crate::http::{build_router, AppState};
use crate::lifecycle::Lifecycle;
use crate::server::HttpServer;
use crate::store::SharedStore;
use std::sync::Arc;
use tracing::{debug, error};

impl MingoApp {
    /// Wire the router to the shared state and wrap it in a server
    pub(super) fn build_server(
        config: &MingoConfig,
        context: &AppContext,
        lifecycle: &Lifecycle,
        store: &SharedStore,
    ) -> Result<HttpServer> {
        debug!(target: "service", "Building HTTP server for {}", config.server.address());

        let state = AppState {
            lifecycle: lifecycle.clone(),
            store: Arc::clone(store),
            clock: Arc::clone(&context.clock),
            started_at: context.started_at,
        };

        let router = build_router(state, &config.server).map_err(|e| {
            error!(target: "service", "Failed to build routes: {}", e);
            e
        })?;

        Ok(HttpServer::new(&config.server, router))
    }
}
