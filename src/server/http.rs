use super::{Server, ServerHandle};
use crate::config::ServerConfig;
use crate::error::{MingoError, Result};
use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::{self, Next},
    response::Response,
    Router,
};
use parking_lot::Mutex;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// axum-backed HTTP server with a bounded graceful drain
pub struct HttpServer {
    address: String,
    router: Router,
    handle: ServerHandle,
    stop: CancellationToken,
    drained: CancellationToken,
    serve_task: Mutex<Option<AbortHandle>>,
}

impl HttpServer {
    /// Create a server for `host:port` from the config serving `router`
    pub fn new(config: &ServerConfig, router: Router) -> Self {
        Self::with_address(config.address(), router)
    }

    pub fn with_address(address: impl Into<String>, router: Router) -> Self {
        Self {
            address: address.into(),
            router,
            handle: ServerHandle::new(),
            stop: CancellationToken::new(),
            drained: CancellationToken::new(),
            serve_task: Mutex::new(None),
        }
    }

    pub fn handle(&self) -> ServerHandle {
        self.handle.clone()
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    async fn bind(&self) -> Result<(TcpListener, SocketAddr)> {
        let bind_error = |source| MingoError::Bind {
            address: self.address.clone(),
            source,
        };

        let listener = TcpListener::bind(&self.address).await.map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;
        Ok((listener, local_addr))
    }
}

#[async_trait]
impl Server for HttpServer {
    async fn listen_and_serve(&self) -> Result<()> {
        if self.stop.is_cancelled() {
            self.handle.notify_listening(None);
            self.drained.cancel();
            return Ok(());
        }

        let (listener, local_addr) = match self.bind().await {
            Ok(bound) => bound,
            Err(e) => {
                error!(target: "server", "Could not listen on {}: {}", self.address, e);
                self.handle.notify_listening(None);
                return Err(e);
            }
        };

        info!(target: "server", "Listening on {}", local_addr);

        let app = self
            .router
            .clone()
            .layer(middleware::from_fn_with_state(
                self.handle.clone(),
                connection_control,
            ))
            .into_make_service_with_connect_info::<SocketAddr>();

        // shutdown() cancels `stop` before taking this lock, so it either
        // sees the task or we see the cancellation
        let task = {
            let mut serve_task = self.serve_task.lock();
            if self.stop.is_cancelled() {
                debug!(target: "server", "Shutdown requested while binding {}", local_addr);
                self.handle.notify_listening(None);
                self.drained.cancel();
                return Ok(());
            }

            let stop = self.stop.clone();
            let drained = self.drained.clone();
            let task = tokio::spawn(async move {
                let result = axum::serve(listener, app)
                    .with_graceful_shutdown(async move { stop.cancelled().await })
                    .await;
                drained.cancel();
                result
            });
            *serve_task = Some(task.abort_handle());
            task
        };
        self.handle.notify_listening(Some(local_addr));

        tokio::select! {
            _ = self.stop.cancelled() => {
                debug!(target: "server", "Listener on {} stopped accepting", local_addr);
                Ok(())
            }
            joined = task => match joined {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(MingoError::server(format!("Server error: {}", e))),
                Err(e) if e.is_cancelled() => Ok(()),
                Err(e) => Err(MingoError::server(format!("Server task failed: {}", e))),
            },
        }
    }

    fn set_keep_alives_enabled(&self, enabled: bool) {
        self.handle.set_keep_alives_enabled(enabled);
    }

    async fn shutdown(&self, deadline: Instant) -> Result<()> {
        let budget = deadline.saturating_duration_since(Instant::now());

        info!(
            target: "server",
            "Stopping listener on {}, draining {} in-flight request(s)",
            self.address,
            self.handle.in_flight()
        );
        self.stop.cancel();

        if self.serve_task.lock().is_none() {
            debug!(target: "server", "Listener was never started, nothing to drain");
            return Ok(());
        }

        match tokio::time::timeout_at(deadline, self.drained.cancelled()).await {
            Ok(()) => {
                info!(target: "server", "All connections drained");
                Ok(())
            }
            Err(_) => {
                warn!(
                    target: "server",
                    "Drain deadline reached with {} request(s) still in flight",
                    self.handle.in_flight()
                );
                if let Some(task) = self.serve_task.lock().take() {
                    task.abort();
                }
                Err(MingoError::DrainTimeout { budget })
            }
        }
    }
}

/// Counts in-flight requests and closes connections once keep-alives are off
async fn connection_control(
    State(handle): State<ServerHandle>,
    request: Request,
    next: Next,
) -> Response {
    let _guard = handle.track_request();
    let mut response = next.run(request).await;

    if !handle.keep_alives_enabled() {
        response
            .headers_mut()
            .insert(header::CONNECTION, HeaderValue::from_static("close"));
    }

    response
}
