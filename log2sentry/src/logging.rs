//! Subscriber setup for the binary. Diagnostics go to stderr so stdout only
//! carries the run summary.

use log2sentry_core::log2json::SentryJsonFormat;
use tracing_subscriber::EnvFilter;

use crate::cli::LogFormat;

pub fn init(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::SentryJson => builder
            .event_format(SentryJsonFormat::new().with_project("log2sentry"))
            .init(),
    }
}
