use crate::error::{MingoError, Result};
use std::fmt;
use std::time::Duration;

/// Operating system request to stop the process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupt => f.write_str("SIGINT"),
            Self::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Where the coordinator is in its one-way sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorPhase {
    AwaitingSignal,
    Draining,
    Done,
}

impl CoordinatorPhase {
    pub(crate) const fn as_u8(self) -> u8 {
        match self {
            Self::AwaitingSignal => 0,
            Self::Draining => 1,
            Self::Done => 2,
        }
    }

    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::AwaitingSignal,
            1 => Self::Draining,
            _ => Self::Done,
        }
    }
}

/// How the shutdown sequence ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownOutcome {
    Drained {
        signal: ShutdownSignal,
        elapsed: Duration,
    },
    DrainTimedOut {
        signal: ShutdownSignal,
        timeout: Duration,
    },
    DrainFailed {
        signal: ShutdownSignal,
        message: String,
    },
    /// The base token was cancelled before any signal arrived
    Aborted,
}

impl ShutdownOutcome {
    pub fn signal(&self) -> Option<ShutdownSignal> {
        match self {
            Self::Drained { signal, .. }
            | Self::DrainTimedOut { signal, .. }
            | Self::DrainFailed { signal, .. } => Some(*signal),
            Self::Aborted => None,
        }
    }

    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Drained { .. } | Self::Aborted)
    }

    /// Map an unclean drain to the error the CLI turns into an exit code
    pub fn into_result(self) -> Result<()> {
        match self {
            Self::Drained { .. } | Self::Aborted => Ok(()),
            Self::DrainTimedOut { timeout, .. } => Err(MingoError::DrainTimeout { budget: timeout }),
            Self::DrainFailed { message, .. } => Err(MingoError::Shutdown { message }),
        }
    }
}
