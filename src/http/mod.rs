//! Routes, handlers and request middleware served by [`HttpServer`].
//!
//! [`HttpServer`]: crate::server::HttpServer

mod assets;
mod handlers;
mod middleware;


pub use handlers::escape_html;
pub use middleware::{access_line, access_log, trace_requests};

use crate::clock::SharedClock;
use crate::config::ServerConfig;
use crate::error::{MingoError, Result};
use crate::lifecycle::Lifecycle;
use crate::request_id::{ClockIdGenerator, IdGenerator};
use crate::store::SharedStore;
use axum::{middleware as axum_middleware, routing::get, Router};
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;
use tower_http::{services::ServeDir, timeout::TimeoutLayer};
use tracing::info;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Lifecycle,
    pub store: SharedStore,
    pub clock: SharedClock,
    pub started_at: DateTime<Utc>,
}

/// Build the application router with its middleware stack.
///
/// Fails if `static_dir` is configured but doesn't exist.
pub fn build_router(state: AppState, config: &ServerConfig) -> Result<Router> {
    let ids: Arc<dyn IdGenerator> = Arc::new(ClockIdGenerator::new(state.clock.clone()));
    let clock = state.clock.clone();

    let router = Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route(
            "/crud",
            get(handlers::list_people)
                .delete(handlers::delete_person)
                .put(handlers::replace_people),
        )
        .route(
            "/edit",
            get(handlers::edit_row)
                .post(handlers::insert_person)
                .put(handlers::update_person),
        );

    let router = match config.static_dir.as_deref() {
        Some(dir) => {
            if !Path::new(dir).is_dir() {
                return Err(MingoError::StaticDirMissing {
                    path: dir.to_string(),
                });
            }
            info!(target: "server", "Serving /static from {}", dir);
            router.nest_service("/static", ServeDir::new(dir))
        }
        None => router
            .route("/static/", get(assets::embedded_index))
            .route("/static/*path", get(assets::embedded_asset)),
    };

    Ok(router
        .with_state(state)
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(axum_middleware::from_fn_with_state(clock, access_log))
        .layer(axum_middleware::from_fn_with_state(ids, trace_requests)))
}
