use super::ShutdownSignal;
use crate::error::{MingoError, Result};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Delivers process shutdown signals to the coordinator
#[async_trait]
pub trait SignalSource: Send + 'static {
    /// Wait for the next signal. `None` means no signal can ever arrive.
    async fn recv(&mut self) -> Option<ShutdownSignal>;

    /// Drop interest in further signals
    fn stop(&mut self);
}

/// SIGINT and SIGTERM from the operating system
pub struct OsSignals {
    #[cfg(unix)]
    interrupt: Option<tokio::signal::unix::Signal>,
    #[cfg(unix)]
    terminate: Option<tokio::signal::unix::Signal>,
    #[cfg(not(unix))]
    active: bool,
}

impl OsSignals {
    /// Register the handlers.
    ///
    /// Must be called inside a tokio runtime. Failure leaves the process
    /// without a graceful shutdown path, so callers treat it as fatal.
    pub fn register() -> Result<Self> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let interrupt =
                signal(SignalKind::interrupt()).map_err(MingoError::SignalRegistration)?;
            let terminate =
                signal(SignalKind::terminate()).map_err(MingoError::SignalRegistration)?;

            debug!(target: "shutdown", "Registered SIGINT and SIGTERM handlers");
            Ok(Self {
                interrupt: Some(interrupt),
                terminate: Some(terminate),
            })
        }

        #[cfg(not(unix))]
        {
            debug!(target: "shutdown", "Registered Ctrl+C handler");
            Ok(Self { active: true })
        }
    }
}

#[async_trait]
impl SignalSource for OsSignals {
    #[cfg(unix)]
    async fn recv(&mut self) -> Option<ShutdownSignal> {
        let (interrupt, terminate) = match (self.interrupt.as_mut(), self.terminate.as_mut()) {
            (Some(interrupt), Some(terminate)) => (interrupt, terminate),
            _ => return None,
        };

        let signal = tokio::select! {
            Some(()) = interrupt.recv() => ShutdownSignal::Interrupt,
            Some(()) = terminate.recv() => ShutdownSignal::Terminate,
            else => return None,
        };

        info!(target: "shutdown", "Received {} signal", signal);
        Some(signal)
    }

    #[cfg(not(unix))]
    async fn recv(&mut self) -> Option<ShutdownSignal> {
        if !self.active {
            return None;
        }
        tokio::signal::ctrl_c().await.ok()?;
        info!(target: "shutdown", "Received Ctrl+C");
        Some(ShutdownSignal::Interrupt)
    }

    fn stop(&mut self) {
        #[cfg(unix)]
        {
            self.interrupt = None;
            self.terminate = None;
        }
        #[cfg(not(unix))]
        {
            self.active = false;
        }
        debug!(target: "shutdown", "Stopped listening for shutdown signals");
    }
}

/// Signal source driven from code, for tests and embedding
pub struct ManualSignals {
    receiver: Option<mpsc::UnboundedReceiver<ShutdownSignal>>,
}

/// Sends signals to a [`ManualSignals`] source
#[derive(Clone, Debug)]
pub struct SignalTrigger {
    sender: mpsc::UnboundedSender<ShutdownSignal>,
}

impl ManualSignals {
    pub fn new() -> (Self, SignalTrigger) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                receiver: Some(receiver),
            },
            SignalTrigger { sender },
        )
    }
}

impl SignalTrigger {
    /// Deliver a signal. Returns false once the source stopped listening.
    pub fn trigger(&self, signal: ShutdownSignal) -> bool {
        self.sender.send(signal).is_ok()
    }
}

#[async_trait]
impl SignalSource for ManualSignals {
    async fn recv(&mut self) -> Option<ShutdownSignal> {
        self.receiver.as_mut()?.recv().await
    }

    fn stop(&mut self) {
        self.receiver = None;
    }
}
