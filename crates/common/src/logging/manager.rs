//! Global subscriber setup.

use tracing::*;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::{
    filter::Directive,
    fmt::{format::FmtSpan, layer, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use super::types::{LogFormat, LoggerConfig};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// `INFO` unless `RUST_LOG` says otherwise. sled's page cache is held at `WARN`.
pub(crate) fn build_filter() -> EnvFilter {
    let sled_quiet: Directive = "sled=warn".parse().unwrap_or_else(|_| Level::WARN.into());
    EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy()
        .add_directive(sled_quiet)
}

fn sink_layer<W>(format: LogFormat, writer: W, ansi: bool, spans: FmtSpan) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let base = layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_span_events(spans);
    match format {
        LogFormat::Json => base.json().with_filter(build_filter()).boxed(),
        LogFormat::Compact => base.compact().with_filter(build_filter()).boxed(),
    }
}

/// Installs the global subscriber. Call once per process.
pub fn init(config: LoggerConfig) {
    let mut layers = vec![sink_layer(
        config.stdout_format,
        std::io::stdout,
        true,
        config.span_events.clone(),
    )];

    if let Some(sink) = &config.file_sink {
        let appender = RollingFileAppender::new(sink.rotation.clone(), &sink.directory, &sink.prefix);
        layers.push(sink_layer(sink.format, appender, false, FmtSpan::NONE));
    }

    tracing_subscriber::registry().with(layers).init();

    info!(service_name = %config.service_name, "logging initialized");
}
