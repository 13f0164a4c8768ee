use std::time::Duration;
use thiserror::Error;

/// Process exit codes reported to the operating system.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const BAD_FLAG: i32 = 1;
    pub const HELP: i32 = 2;
    pub const UNKNOWN_USER: i32 = 3;
    pub const UNKNOWN_HOST: i32 = 4;
    pub const PORT_UNAVAILABLE: i32 = 5;
    pub const GRACEFUL_SHUTDOWN_FAILED: i32 = 6;
    pub const CONFIG: i32 = 7;
}

#[derive(Error, Debug)]
pub enum MingoError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Unable to bind on {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {details}")]
    Server { details: String },

    /// `budget` is the time between the shutdown request and its deadline
    #[error("Graceful drain did not finish within {budget:?}")]
    DrainTimeout { budget: Duration },

    #[error("Could not gracefully shutdown the server: {message}")]
    Shutdown { message: String },

    #[error("Failed to register signal handler: {0}")]
    SignalRegistration(#[source] std::io::Error),

    #[error("Unable to determine username")]
    UnknownUser,

    #[error("Unable to determine hostname")]
    UnknownHost,

    #[error("Static directory does not exist: {path}")]
    StaticDirMissing { path: String },

    #[error("System error: {message}")]
    System { message: String },
}

impl MingoError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn server<S: Into<String>>(details: S) -> Self {
        Self::Server {
            details: details.into(),
        }
    }

    /// Exit code the CLI reports for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::UnknownUser => exit_code::UNKNOWN_USER,
            Self::UnknownHost => exit_code::UNKNOWN_HOST,
            Self::Bind { .. } => exit_code::PORT_UNAVAILABLE,
            Self::DrainTimeout { .. } | Self::Shutdown { .. } => {
                exit_code::GRACEFUL_SHUTDOWN_FAILED
            }
            Self::Config(_) | Self::Serialization(_) | Self::StaticDirMissing { .. } => {
                exit_code::CONFIG
            }
            Self::Io(_) | Self::Server { .. } | Self::SignalRegistration(_) | Self::System { .. } => {
                exit_code::BAD_FLAG
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, MingoError>;
