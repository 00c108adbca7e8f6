//! Companion `.header` files: the HTTP headers an external client sends with
//! each unit.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::contract::Credentials;

/// Extension of header files; replaces the data file's extension.
pub const HEADER_EXTENSION: &str = "header";

/// Sentry protocol version announced in `X-Sentry-Auth`.
pub const SENTRY_PROTOCOL_VERSION: &str = "3";

/// Body type of every unit: base64 text of zlib data.
pub const UNIT_CONTENT_TYPE: &str = "application/octet-stream";

/// Sibling of `data_path` with the `.header` extension.
pub fn header_path(data_path: &Path) -> PathBuf {
    data_path.with_extension(HEADER_EXTENSION)
}

/// Unix time in seconds with microsecond fraction.
pub fn unix_timestamp() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Renders and writes header files for one batch.
#[derive(Debug, Clone)]
pub struct HeaderWriter {
    client: String,
    credentials: Credentials,
}

impl HeaderWriter {
    pub fn new(client: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            client: client.into(),
            credentials,
        }
    }

    pub fn client(&self) -> &str {
        &self.client
    }

    /// Three header lines joined by `\n`, without a trailing newline.
    pub fn render(&self, timestamp: f64) -> String {
        [
            format!("User-Agent: {}", self.client),
            format!(
                "X-Sentry-Auth: Sentry sentry_version={}, sentry_client={}, sentry_timestamp={:.6}, sentry_key={}, sentry_secret={}",
                SENTRY_PROTOCOL_VERSION,
                self.client,
                timestamp,
                self.credentials.public_key,
                self.credentials.secret_key
            ),
            format!("Content-Type: {UNIT_CONTENT_TYPE}"),
        ]
        .join("\n")
    }

    /// Writes the header file for `data_path`, stamped with the current time.
    pub fn write_for(&self, data_path: &Path) -> io::Result<PathBuf> {
        let path = header_path(data_path);
        fs::write(&path, self.render(unix_timestamp()))?;
        Ok(path)
    }
}
