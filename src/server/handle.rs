use parking_lot::Mutex;
use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
};
use tokio::sync::Notify;

/// A handle to observe a running [`super::HttpServer`].
///
/// `ServerHandle` reports the bound address once the listener is up, tracks
/// in-flight requests and carries the keep-alive switch.
#[derive(Clone, Debug)]
pub struct ServerHandle {
    inner: Arc<HandleInner>,
}

#[derive(Debug)]
struct HandleInner {
    addr: Mutex<Option<SocketAddr>>,
    addr_notify: Notify,
    bind_attempted: AtomicBool,
    in_flight: AtomicUsize,
    keep_alive: AtomicBool,
}

impl ServerHandle {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(HandleInner {
                addr: Mutex::new(None),
                addr_notify: Notify::new(),
                bind_attempted: AtomicBool::new(false),
                in_flight: AtomicUsize::new(0),
                keep_alive: AtomicBool::new(true),
            }),
        }
    }

    /// Wait until the server has tried to bind.
    ///
    /// # Returns
    ///
    /// The local address when the bind succeeded, otherwise `None`.
    pub async fn listening(&self) -> Option<SocketAddr> {
        let notified = self.inner.addr_notify.notified();

        if self.inner.bind_attempted.load(Ordering::SeqCst) {
            return *self.inner.addr.lock();
        }

        notified.await;

        *self.inner.addr.lock()
    }

    /// Number of requests currently being handled
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    pub fn keep_alives_enabled(&self) -> bool {
        self.inner.keep_alive.load(Ordering::SeqCst)
    }

    pub(crate) fn set_keep_alives_enabled(&self, enabled: bool) {
        self.inner.keep_alive.store(enabled, Ordering::SeqCst);
    }

    pub(crate) fn notify_listening(&self, addr: Option<SocketAddr>) {
        *self.inner.addr.lock() = addr;
        self.inner.bind_attempted.store(true, Ordering::SeqCst);
        self.inner.addr_notify.notify_waiters();
    }

    /// Count a request as in flight until the guard is dropped
    pub fn track_request(&self) -> RequestGuard {
        self.inner.in_flight.fetch_add(1, Ordering::SeqCst);
        RequestGuard {
            handle: self.clone(),
        }
    }
}

impl Default for ServerHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps one request counted as in flight
#[derive(Debug)]
pub struct RequestGuard {
    handle: ServerHandle,
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        self.handle.inner.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
