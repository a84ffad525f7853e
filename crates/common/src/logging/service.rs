//! Logging initialization for binaries, driven by the `[logging]` config section.

use std::path::PathBuf;

use tracing::info;

use super::{init, LogFileSink, LogFormat, LoggerConfig};

/// Configuration parameters for logging initialization.
#[derive(Debug)]
pub struct LoggingInitConfig<'a> {
    pub service_name: &'a str,
    /// Directory for file-based logging
    pub log_dir: Option<&'a PathBuf>,
    /// Prefix for log file names
    pub log_file_prefix: Option<&'a str>,
    /// Use JSON format instead of compact
    pub json_format: Option<bool>,
    /// Log file prefix used when the config names none
    pub default_log_prefix: &'a str,
}

impl LoggingInitConfig<'_> {
    /// Translates the binary-facing settings into a [`LoggerConfig`].
    pub fn to_logger_config(&self) -> LoggerConfig {
        let format = LogFormat::from_json_flag(self.json_format.unwrap_or(false));
        let lconfig = LoggerConfig::new(self.service_name).stdout_format(format);

        match self.log_dir {
            Some(dir) => {
                let prefix = self.log_file_prefix.unwrap_or(self.default_log_prefix);
                lconfig.file_sink(LogFileSink::daily(dir.clone(), prefix.to_owned()).format(format))
            }
            None => lconfig,
        }
    }
}

/// Initialize logging from configuration.
pub fn init_logging_from_config(config: LoggingInitConfig<'_>) {
    let lconfig = config.to_logger_config();
    let file_sink = lconfig.file_sink.clone();

    init(lconfig);

    if let Some(sink) = &file_sink {
        info!(
            log_dir = %sink.directory.display(),
            log_prefix = %sink.prefix,
            "file logging enabled"
        );
    }
}
