use super::MingoApp;
use crate::error::{MingoError, Result};
use crate::server::Server;
use crate::shutdown::{OsSignals, ShutdownCoordinator, ShutdownOutcome, SignalSource};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

impl MingoApp {
    /// Serve until SIGINT or SIGTERM, then drain and return.
    ///
    /// An unclean drain is reported as an error so the caller can exit with
    /// a distinct status.
    pub async fn run(&self) -> Result<()> {
        let signals = OsSignals::register()?;
        let outcome = self.run_with_signals(signals).await?;
        outcome.into_result()
    }

    /// Serve until `signals` delivers a shutdown request
    pub async fn run_with_signals<G: SignalSource>(&self, signals: G) -> Result<ShutdownOutcome> {
        info!(
            target: "service",
            "{} starting as {} on {}",
            self.context.progname,
            self.context.username,
            self.context.hostname
        );

        // Listen for signals before binding so a Ctrl-C during startup is honoured
        let shutdown = ShutdownCoordinator::new(
            self.lifecycle.clone(),
            self.config.shutdown.drain_timeout(),
        )
        .spawn(signals, Arc::clone(&self.server), &self.cancellation_token);

        let server = Arc::clone(&self.server);
        let mut serving = tokio::spawn(async move { server.listen_and_serve().await });

        match self.server.handle().listening().await {
            Some(addr) => {
                if self.lifecycle.try_transition_to_running() {
                    info!(target: "service", "Running, listening on {}", addr);
                } else {
                    info!(target: "service", "Shutdown requested before startup completed");
                }
            }
            None => warn!(target: "service", "Listener did not start"),
        }

        let joined = tokio::select! {
            joined = &mut serving => joined,
            _ = self.cancellation_token.cancelled() => {
                warn!(target: "service", "Run cancelled, closing listener without draining");
                if let Err(e) = self.server.shutdown(Instant::now()).await {
                    debug!(target: "service", "Listener closed abruptly: {}", e);
                }
                serving.await
            }
        };
        let served = joined
            .map_err(|e| MingoError::server(format!("Listener task failed: {}", e)))
            .and_then(|result| result);
        if let Err(e) = served {
            error!(target: "service", "Server stopped unexpectedly: {}", e);
            self.lifecycle.transition_to_stopping();
            shutdown.abort();
            return Err(e);
        }

        shutdown.cancelled().await;
        let outcome = shutdown.wait().await?;
        info!(target: "service", "Shutdown complete: {:?}", outcome);

        Ok(outcome)
    }
}
