use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MingoConfig {
    pub server: ServerConfig,
    pub shutdown: ShutdownConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServerConfig {
    /// IP address to bind to
    #[serde(default = "default_server_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Serve /static/* from this directory instead of the embedded assets
    #[serde(default)]
    pub static_dir: Option<String>,

    /// Per-request processing limit in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ShutdownConfig {
    /// How long in-flight requests get to finish after a shutdown signal
    #[serde(default = "default_drain_timeout")]
    pub drain_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Default level filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: component, json, pretty or compact
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Write logs to this file instead of stderr
    #[serde(default)]
    pub file: Option<String>,
}

/// Values from the command line that win over file and environment
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub port: Option<u16>,
    pub static_dir: Option<String>,
    pub drain_timeout_secs: Option<u64>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl ShutdownConfig {
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }
}

impl MingoConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("mingo.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::load_with_overrides(path, &ConfigOverrides::default())
    }

    /// Load defaults, then the optional file, then `MINGO_` environment
    /// variables, then command line overrides
    pub fn load_with_overrides<P: AsRef<Path>>(
        path: P,
        overrides: &ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("server.host", default_server_host())?
            .set_default("server.port", default_server_port())?
            .set_default("server.request_timeout_secs", default_request_timeout())?
            .set_default("shutdown.drain_timeout_secs", default_drain_timeout())?
            .set_default("logging.level", default_log_level())?
            .set_default("logging.format", default_log_format())?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // MINGO_SERVER__PORT=9090 style variables
            .add_source(
                Environment::with_prefix("MINGO")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_override_option("server.port", overrides.port)?
            .set_override_option("server.static_dir", overrides.static_dir.clone())?
            .set_override_option("shutdown.drain_timeout_secs", overrides.drain_timeout_secs)?
            .set_override_option("logging.level", overrides.log_level.clone())?
            .set_override_option("logging.format", overrides.log_format.clone())?
            .build()?;

        let config: MingoConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::Message(
                "Server host must not be empty".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigError::Message(
                "Server port 0 out of range [1:65535]".to_string(),
            ));
        }

        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        if self.shutdown.drain_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "Drain timeout must be greater than 0".to_string(),
            ));
        }

        if !matches!(
            self.logging.format.as_str(),
            "component" | "json" | "pretty" | "compact"
        ) {
            return Err(ConfigError::Message(format!(
                "Unknown log format '{}'",
                self.logging.format
            )));
        }

        Ok(())
    }

    /// Render as TOML, e.g. for `--print-config`
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for MingoConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_server_host(),
                port: default_server_port(),
                static_dir: None,
                request_timeout_secs: default_request_timeout(),
            },
            shutdown: ShutdownConfig {
                drain_timeout_secs: default_drain_timeout(),
            },
            logging: LoggingConfig {
                level: default_log_level(),
                format: default_log_format(),
                file: None,
            },
        }
    }
}

// Default value functions
fn default_server_host() -> String {
    "0.0.0.0".to_string()
}
fn default_server_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    10
}

fn default_drain_timeout() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "component".to_string()
}
