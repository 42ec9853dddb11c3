//! Logging setup
//!
//! All logs go to stderr so that command output on stdout stays machine
//! readable. Structured fields are used throughout, e.g.
//!
//! ```rust,ignore
//! debug!(mode = "go", path = %path.display(), "would mount");
//! ```

use clap::ValueEnum;
use std::fmt as std_fmt;
use std::io;
use std::str::FromStr;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::{self, format::Writer, FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Plain text without timestamps
    Text,
    /// One JSON object per event
    Json,
    /// GitHub Actions workflow commands
    Github,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "" | "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "github" => Ok(Self::Github),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

impl LogFormat {
    /// Pick the format: explicit flag, then GitHub Actions, then config
    pub fn resolve(flag: Option<Self>, configured: &str) -> Result<Self, String> {
        if let Some(format) = flag {
            return Ok(format);
        }
        if std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true") {
            return Ok(Self::Github);
        }
        configured.parse()
    }
}

/// Filter directive for a `-v` count
fn filter_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "hoard=warn",
        1 => "hoard=info",
        _ => "hoard=debug",
    }
}

/// Build the level filter; `RUST_LOG` wins over the `-v` count
fn env_filter(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directive(verbosity)))
}

/// Formats events as GitHub Actions workflow commands
struct GithubFormatter;

impl<S, N> FormatEvent<S, N> for GithubFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std_fmt::Result {
        match *event.metadata().level() {
            Level::ERROR => write!(writer, "::error::")?,
            Level::WARN => write!(writer, "::warning::")?,
            Level::DEBUG | Level::TRACE => write!(writer, "::debug::")?,
            Level::INFO => {}
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// Install the global subscriber
pub fn init(verbosity: u8, format: LogFormat) {
    let filter = env_filter(verbosity);

    match format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(false)
                        .without_time()
                        .with_writer(io::stderr),
                )
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_file(false)
                        .with_line_number(false)
                        .with_ansi(false)
                        .with_writer(io::stderr)
                        .json(),
                )
                .init();
        }
        LogFormat::Github => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .event_format(GithubFormatter)
                        .with_ansi(false)
                        .with_writer(io::stderr),
                )
                .init();
        }
    }
}
