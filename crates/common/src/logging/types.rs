//! Logger settings.

use std::path::PathBuf;

use tracing_appender::rolling::Rotation;
use tracing_subscriber::fmt::format::FmtSpan;

/// Line format of a log sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl LogFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            Self::Json
        } else {
            Self::Compact
        }
    }
}

/// Rolling log file next to the node's data.
#[derive(Debug, Clone)]
pub struct LogFileSink {
    pub directory: PathBuf,
    /// File name stem, the appender adds the date (`drivechain.2026-01-01`).
    pub prefix: String,
    pub rotation: Rotation,
    pub format: LogFormat,
}

impl LogFileSink {
    /// Daily rotated compact logs.
    pub fn daily(directory: PathBuf, prefix: String) -> Self {
        Self {
            directory,
            prefix,
            rotation: Rotation::DAILY,
            format: LogFormat::Compact,
        }
    }

    pub fn rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub service_name: String,
    pub stdout_format: LogFormat,
    /// Span lifecycle events written to stdout. Defaults to `CLOSE`, which carries
    /// the span's busy time.
    pub span_events: FmtSpan,
    pub file_sink: Option<LogFileSink>,
}

impl LoggerConfig {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            stdout_format: LogFormat::Compact,
            span_events: FmtSpan::CLOSE,
            file_sink: None,
        }
    }

    pub fn stdout_format(mut self, format: LogFormat) -> Self {
        self.stdout_format = format;
        self
    }

    pub fn span_events(mut self, span_events: FmtSpan) -> Self {
        self.span_events = span_events;
        self
    }

    pub fn file_sink(mut self, sink: LogFileSink) -> Self {
        self.file_sink = Some(sink);
        self
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::new("drivechain")
    }
}
