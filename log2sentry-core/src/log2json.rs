//! # log2json: Sentry-format JSON lines from `tracing` events
//!
//! [`SentryJsonFormat`] is a `tracing_subscriber` event formatter that writes
//! each event as one line of Sentry JSON. Files written this way are exactly
//! the input that [`crate::prepare`] splits into units.
//!
//! ```no_run
//! use log2sentry_core::log2json::SentryJsonFormat;
//!
//! tracing_subscriber::fmt()
//!     .event_format(SentryJsonFormat::new().with_project("backend"))
//!     .init();
//! ```

use std::fmt;

use chrono::Utc;
use serde::Serialize;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use uuid::Uuid;

/// Rendered strings longer than this many characters are shortened.
pub const DEFAULT_STRING_MAX_LENGTH: usize = 400;

/// Param lists longer than this are shortened.
pub const DEFAULT_LIST_MAX_LENGTH: usize = 50;

/// Keeps the first `max` characters and appends `...` when `value` is longer.
pub fn shorten_str(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &value[..cut]),
        None => value.to_string(),
    }
}

/// Keeps the first `max` items, followed by `...` and a count of the rest.
pub fn shorten_list(mut items: Vec<String>, max: usize) -> Vec<String> {
    if items.len() > max {
        let rest = items.len() - max;
        items.truncate(max);
        items.push("...".to_string());
        items.push(format!("({rest} more elements)"));
    }
    items
}

/// Numeric severity as Sentry expects it (Python logging levels).
pub fn sentry_level(level: &Level) -> u8 {
    match *level {
        Level::TRACE => 5,
        Level::DEBUG => 10,
        Level::INFO => 20,
        Level::WARN => 30,
        Level::ERROR => 40,
    }
}

#[derive(Debug, Clone)]
pub struct SentryJsonFormat {
    project: Option<String>,
    server_name: String,
    string_max_length: usize,
    list_max_length: usize,
}

impl Default for SentryJsonFormat {
    fn default() -> Self {
        Self::new()
    }
}

impl SentryJsonFormat {
    /// Server name defaults to the machine's host name, then `localhost`.
    pub fn new() -> Self {
        Self {
            project: None,
            server_name: local_host_name(),
            string_max_length: DEFAULT_STRING_MAX_LENGTH,
            list_max_length: DEFAULT_LIST_MAX_LENGTH,
        }
    }

    pub fn with_string_max_length(mut self, max: usize) -> Self {
        self.string_max_length = max;
        self
    }

    pub fn with_list_max_length(mut self, max: usize) -> Self {
        self.list_max_length = max;
        self
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn with_server_name(mut self, server_name: impl Into<String>) -> Self {
        self.server_name = server_name.into();
        self
    }
}

fn local_host_name() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

#[derive(Serialize)]
struct SentryEvent<'a> {
    event_id: String,
    message: &'a str,
    timestamp: String,
    level: u8,
    logger: &'a str,
    culprit: &'a str,
    server_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    project: Option<&'a str>,
    #[serde(rename = "sentry.interfaces.Message")]
    message_interface: MessageInterface<'a>,
    #[serde(rename = "sentry.interfaces.Exception", skip_serializing_if = "Option::is_none")]
    exception: Option<ExceptionInterface<'a>>,
}

#[derive(Serialize)]
struct MessageInterface<'a> {
    message: &'a str,
    params: &'a [String],
}

#[derive(Serialize)]
struct ExceptionInterface<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    value: &'a str,
    module: &'a str,
}

/// Collects the message, an `error` field and every other field as a param.
#[derive(Default)]
struct FieldCollector {
    message: String,
    error: Option<String>,
    params: Vec<String>,
}

impl FieldCollector {
    fn record(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.message = value,
            "error" => {
                self.params.push(format!("error={value}"));
                self.error = Some(value);
            }
            name => self.params.push(format!("{name}={value}")),
        }
    }
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.record(field, value.to_string());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.record(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record(field, format!("{value:?}"));
    }
}

impl<S, N> FormatEvent<S, N> for SentryJsonFormat
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
        let meta = event.metadata();
        let mut fields = FieldCollector::default();
        event.record(&mut fields);

        let module = meta.module_path().unwrap_or_else(|| meta.target());
        let span_name = ctx.lookup_current().map(|span| span.name());
        let culprit = span_name.unwrap_or(module);

        let message = shorten_str(&fields.message, self.string_max_length);
        let params = shorten_list(
            fields
                .params
                .iter()
                .map(|p| shorten_str(p, self.string_max_length))
                .collect(),
            self.list_max_length,
        );
        let error = fields
            .error
            .as_deref()
            .map(|value| shorten_str(value, self.string_max_length));

        let record = SentryEvent {
            event_id: Uuid::new_v4().simple().to_string(),
            message: &message,
            timestamp: Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            level: sentry_level(meta.level()),
            logger: meta.target(),
            culprit,
            server_name: &self.server_name,
            project: self.project.as_deref(),
            message_interface: MessageInterface {
                message: &message,
                params: &params,
            },
            exception: error.as_deref().map(|value| ExceptionInterface {
                kind: "error",
                value,
                module,
            }),
        };

        let line = serde_json::to_string(&record).unwrap_or_else(|_| "{}".to_string());
        writeln!(writer, "{line}")
    }
}
