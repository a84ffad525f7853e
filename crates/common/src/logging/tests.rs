use std::path::PathBuf;

use tracing_subscriber::fmt::format::FmtSpan;

use super::{manager::build_filter, *};

#[test]
fn test_logger_config_defaults() {
    let config = LoggerConfig::default();
    assert_eq!(config.service_name, "drivechain");
    assert_eq!(config.stdout_format, LogFormat::Compact);
    assert_eq!(config.span_events, FmtSpan::CLOSE);
    assert!(config.file_sink.is_none());
}

#[test]
fn test_logger_config_builders() {
    let dir = tempfile::tempdir().unwrap();
    let config = LoggerConfig::new("scdb-test")
        .stdout_format(LogFormat::Json)
        .span_events(FmtSpan::NONE)
        .file_sink(
            LogFileSink::daily(dir.path().to_path_buf(), "node".to_string())
                .rotation(Rotation::HOURLY)
                .format(LogFormat::Json),
        );

    assert_eq!(config.stdout_format, LogFormat::Json);
    assert_eq!(config.span_events, FmtSpan::NONE);
    let sink = config.file_sink.unwrap();
    assert_eq!(sink.directory, dir.path());
    assert_eq!(sink.prefix, "node");
    assert_eq!(sink.format, LogFormat::Json);
}

#[test]
fn test_init_config_without_log_dir() {
    let lconfig = LoggingInitConfig {
        service_name: "drivechain-node",
        log_dir: None,
        log_file_prefix: Some("ignored"),
        json_format: None,
        default_log_prefix: "drivechain",
    }
    .to_logger_config();

    assert_eq!(lconfig.service_name, "drivechain-node");
    assert!(lconfig.file_sink.is_none());
    assert_eq!(lconfig.stdout_format, LogFormat::Compact);
}

#[test]
fn test_init_config_file_sink_uses_default_prefix() {
    let dir = PathBuf::from("/tmp/drivechain-logs");
    let lconfig = LoggingInitConfig {
        service_name: "drivechain-node",
        log_dir: Some(&dir),
        log_file_prefix: None,
        json_format: Some(true),
        default_log_prefix: "drivechain",
    }
    .to_logger_config();

    let sink = lconfig.file_sink.unwrap();
    assert_eq!(sink.directory, dir);
    assert_eq!(sink.prefix, "drivechain");
    assert_eq!(sink.format, LogFormat::Json);
    assert_eq!(lconfig.stdout_format, LogFormat::Json);
}

#[test]
fn test_filter_quiets_sled() {
    assert!(build_filter().to_string().contains("sled=warn"));
}
