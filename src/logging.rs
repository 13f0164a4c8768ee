use crate::clock::SharedClock;
use crate::config::LoggingConfig;
use crate::error::{MingoError, Result};
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::Path;
use tracing::{Event, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Renders `<timestamp> | <hostname> | <component> | <message>` lines.
///
/// The component is the event target with the crate prefix removed, so
/// `info!(target: "access", ..)` logs under `access` and events from
/// `mingo::app::runtime` log under `app`.
#[derive(Debug, Clone)]
pub struct ComponentFormat {
    clock: SharedClock,
    hostname: String,
}

impl ComponentFormat {
    pub fn new(clock: SharedClock, hostname: impl Into<String>) -> Self {
        Self {
            clock,
            hostname: hostname.into(),
        }
    }
}

impl<S, N> FormatEvent<S, N> for ComponentFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(
            writer,
            "{} | {} | {} | ",
            format_timestamp(self.clock.now()),
            self.hostname,
            component_name(event.metadata().target())
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Map an event target to the component shown in log lines
pub fn component_name(target: &str) -> &str {
    if target == "mingo" {
        return "main";
    }

    match target.strip_prefix("mingo::") {
        Some(path) => path.split("::").next().unwrap_or(path),
        None => target,
    }
}

/// UTC timestamp with milliseconds, trailing zeros trimmed
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    let seconds = instant.format("%Y-%m-%dT%H:%M:%S");
    let millis = instant.timestamp_subsec_millis();
    if millis == 0 {
        return format!("{}Z", seconds);
    }

    let fraction = format!("{:03}", millis);
    format!("{}.{}Z", seconds, fraction.trim_end_matches('0'))
}

/// Install the global subscriber.
///
/// Returns the guard of the background file writer when logging to a file;
/// it must be kept alive for the lifetime of the process.
pub fn init_logging(
    config: &LoggingConfig,
    clock: SharedClock,
    hostname: &str,
) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},hyper=warn", config.level)));

    let (writer, guard) = match config.file.as_deref() {
        Some(file) => {
            let (writer, guard) = file_writer(Path::new(file))?;
            (writer, Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let fmt_layer = match config.format.as_str() {
        "json" => tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(writer)
            .boxed(),
        "compact" => tracing_subscriber::fmt::layer()
            .compact()
            .with_target(false)
            .with_writer(writer)
            .boxed(),
        "pretty" => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_writer(writer)
            .boxed(),
        _ => tracing_subscriber::fmt::layer()
            .event_format(ComponentFormat::new(clock, hostname))
            .with_writer(writer)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .try_init()
        .map_err(|e| MingoError::system(format!("Failed to initialize logging: {}", e)))?;

    Ok(guard)
}

fn file_writer(path: &Path) -> Result<(BoxMakeWriter, WorkerGuard)> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| MingoError::system(format!("Invalid log file path: {}", path.display())))?;

    std::fs::create_dir_all(directory)?;
    let appender = tracing_appender::rolling::never(directory, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    Ok((BoxMakeWriter::new(non_blocking), guard))
}
