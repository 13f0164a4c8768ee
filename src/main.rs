use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use mingo::logging::init_logging;
use mingo::{exit_code, AppContext, ConfigOverrides, MingoApp, MingoConfig, MingoError, SystemClock};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

#[derive(Parser, Debug)]
#[command(name = "mingo")]
#[command(about = "Minimal HTTP server with graceful shutdown")]
#[command(version)]
#[command(long_about = "A minimal HTTP server exposing a health endpoint, a static file mount \
and an HTMX-driven CRUD playground. SIGINT or SIGTERM stop new connections and give in-flight \
requests a bounded time to finish before the process exits.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "mingo.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Port to listen on
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
    port: Option<u16>,

    /// Serve /static from this directory instead of the embedded assets
    #[arg(short = 'd', long = "dir", value_name = "DIR")]
    static_dir: Option<String>,

    /// Seconds in-flight requests get to finish after a shutdown signal
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    drain_timeout: Option<u64>,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable debug logging (most verbose)
    #[arg(long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Override log format (component, json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: component, json, pretty, or compact")]
    log_format: Option<String>,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration and exit without starting the server")]
    validate_config: bool,

    /// Print effective configuration and exit
    #[arg(long, help = "Print the effective configuration in TOML format and exit")]
    print_config: bool,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let log_level = if self.debug {
            Some("debug")
        } else if self.verbose {
            Some("info")
        } else if self.quiet {
            Some("error")
        } else {
            None
        };

        ConfigOverrides {
            port: self.port,
            static_dir: self.static_dir.clone(),
            drain_timeout_secs: self.drain_timeout,
            log_level: log_level.map(str::to_string),
            log_format: self.log_format.clone(),
        }
    }
}

#[tokio::main]
async fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            let code = match e.kind() {
                ErrorKind::DisplayHelp
                | ErrorKind::DisplayVersion
                | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => exit_code::HELP,
                _ => exit_code::BAD_FLAG,
            };
            std::process::exit(code);
        }
    };

    let mut log_guard = None;
    let code = match run(args, &mut log_guard).await {
        Ok(()) => exit_code::SUCCESS,
        Err(e) => report_failure(&e),
    };

    // process::exit skips destructors; flush the log file first
    drop(log_guard);
    std::process::exit(code);
}

fn report_failure(e: &anyhow::Error) -> i32 {
    error!("{:#}", e);
    eprintln!("Error: {:#}", e);
    e.downcast_ref::<MingoError>()
        .map_or(exit_code::BAD_FLAG, MingoError::exit_code)
}

async fn run(args: Args, log_guard: &mut Option<WorkerGuard>) -> Result<()> {
    let config = MingoConfig::load_with_overrides(&args.config, &args.overrides())
        .map_err(MingoError::from)
        .with_context(|| format!("Failed to load configuration from {}", args.config))?;

    if args.print_config {
        println!("{}", config.to_toml().map_err(MingoError::from)?);
        return Ok(());
    }

    config.validate().map_err(MingoError::from)?;
    if args.validate_config {
        println!("✓ Configuration is valid");
        return Ok(());
    }

    let clock = SystemClock::shared();
    let context = AppContext::detect(env!("CARGO_PKG_NAME"), clock.clone())?;

    *log_guard = init_logging(&config.logging, clock, &context.hostname)?;

    info!("Starting {} v{}", context.progname, env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let app = MingoApp::new(config, context)?;
    app.run().await?;

    info!("Exited cleanly");
    Ok(())
}
