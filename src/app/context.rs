use crate::clock::SharedClock;
use crate::error::Result;
use crate::system;
use chrono::{DateTime, Utc};
use std::fmt;

/// Process identity captured once at startup
#[derive(Clone)]
pub struct AppContext {
    pub progname: String,
    pub username: String,
    pub hostname: String,
    pub started_at: DateTime<Utc>,
    pub clock: SharedClock,
}

impl AppContext {
    pub fn new(
        progname: impl Into<String>,
        username: impl Into<String>,
        hostname: impl Into<String>,
        clock: SharedClock,
    ) -> Self {
        Self {
            progname: progname.into(),
            username: username.into(),
            hostname: hostname.into(),
            started_at: clock.now(),
            clock,
        }
    }

    /// Look up the user and host this process runs as
    pub fn detect(progname: impl Into<String>, clock: SharedClock) -> Result<Self> {
        let username = system::username()?;
        let hostname = system::hostname()?;
        Ok(Self::new(progname, username, hostname, clock))
    }
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("progname", &self.progname)
            .field("username", &self.username)
            .field("hostname", &self.hostname)
            .field("started_at", &self.started_at)
            .finish()
    }
}
