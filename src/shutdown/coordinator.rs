use super::{CoordinatorPhase, ShutdownOutcome, SignalSource};
use crate::error::{MingoError, Result};
use crate::lifecycle::Lifecycle;
use crate::server::Server;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Default bound on how long in-flight requests may take to finish
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Turns the first shutdown signal into a bounded drain of the server
pub struct ShutdownCoordinator {
    lifecycle: Lifecycle,
    drain_timeout: Duration,
}

impl ShutdownCoordinator {
    pub fn new(lifecycle: Lifecycle, drain_timeout: Duration) -> Self {
        Self {
            lifecycle,
            drain_timeout,
        }
    }

    pub fn drain_timeout(&self) -> Duration {
        self.drain_timeout
    }

    /// Start waiting for a signal on a background task.
    ///
    /// Returns immediately. The handle's token is a child of `base` and is
    /// cancelled exactly once, after the drain has returned or timed out.
    /// Cancelling `base` aborts the sequence.
    pub fn spawn<G, S>(self, signals: G, server: Arc<S>, base: &CancellationToken) -> ShutdownHandle
    where
        G: SignalSource,
        S: Server + ?Sized,
    {
        let token = base.child_token();
        let phase = Arc::new(AtomicU8::new(CoordinatorPhase::AwaitingSignal.as_u8()));

        let task = tokio::spawn(self.run(
            signals,
            server,
            base.clone(),
            token.clone(),
            Arc::clone(&phase),
        ));

        ShutdownHandle { token, phase, task }
    }

    async fn run<G, S>(
        self,
        mut signals: G,
        server: Arc<S>,
        base: CancellationToken,
        token: CancellationToken,
        phase: Arc<AtomicU8>,
    ) -> ShutdownOutcome
    where
        G: SignalSource,
        S: Server + ?Sized,
    {
        let received = tokio::select! {
            received = signals.recv() => received,
            _ = base.cancelled() => None,
        };

        let signal = match received {
            Some(signal) => signal,
            None => {
                if !base.is_cancelled() {
                    warn!(target: "shutdown", "Signal source closed, graceful shutdown is unavailable");
                    base.cancelled().await;
                }
                phase.store(CoordinatorPhase::Done.as_u8(), Ordering::SeqCst);
                return ShutdownOutcome::Aborted;
            }
        };

        // Single shot: later signals are not observed
        signals.stop();
        let _cancel_on_exit = token.drop_guard();
        phase.store(CoordinatorPhase::Draining.as_u8(), Ordering::SeqCst);

        info!(target: "shutdown", "Server is shutting down after {}", signal);

        server.set_keep_alives_enabled(false);
        self.lifecycle.transition_to_stopping();

        let started = Instant::now();
        let deadline = started + self.drain_timeout;

        let drained = tokio::select! {
            drained = timeout_at(deadline, server.shutdown(deadline)) => match drained {
                Ok(result) => result,
                Err(_) => Err(MingoError::DrainTimeout { budget: self.drain_timeout }),
            },
            _ = base.cancelled() => Err(MingoError::Shutdown {
                message: "drain aborted by parent cancellation".to_string(),
            }),
        };

        let outcome = match drained {
            Ok(()) => {
                let elapsed = started.elapsed();
                info!(target: "shutdown", "Drain completed in {:?}", elapsed);
                ShutdownOutcome::Drained { signal, elapsed }
            }
            Err(MingoError::DrainTimeout { .. }) => {
                error!(
                    target: "shutdown",
                    "Could not gracefully shutdown the server: drain exceeded {:?}",
                    self.drain_timeout
                );
                ShutdownOutcome::DrainTimedOut {
                    signal,
                    timeout: self.drain_timeout,
                }
            }
            Err(e) => {
                error!(target: "shutdown", "Could not gracefully shutdown the server: {}", e);
                ShutdownOutcome::DrainFailed {
                    signal,
                    message: e.to_string(),
                }
            }
        };

        phase.store(CoordinatorPhase::Done.as_u8(), Ordering::SeqCst);
        outcome
    }
}

/// Observes a spawned [`ShutdownCoordinator`]
pub struct ShutdownHandle {
    token: CancellationToken,
    phase: Arc<AtomicU8>,
    task: JoinHandle<ShutdownOutcome>,
}

impl ShutdownHandle {
    /// Token cancelled when the shutdown sequence has finished
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    pub fn phase(&self) -> CoordinatorPhase {
        CoordinatorPhase::from_u8(self.phase.load(Ordering::SeqCst))
    }

    /// Wait for the sequence to finish and report how it went
    pub async fn wait(self) -> Result<ShutdownOutcome> {
        self.task
            .await
            .map_err(|e| MingoError::system(format!("Shutdown coordinator failed: {}", e)))
    }

    /// Stop the coordinator without shutting anything down
    pub fn abort(self) {
        self.task.abort();
    }
}
