//! # contract: shared data model and seams
//!
//! Credentials parsed from the command line and the [`VersionProvider`] trait
//! used to render the client identifier in every header file.
//!
//! ## Mocking & Testing
//! - [`VersionProvider`] is annotated for `mockall`; `MockVersionProvider` is
//!   exported under the default `test-export-mocks` feature.

use std::fmt;
use std::str::FromStr;

use mockall::automock;

use crate::error::CredentialsError;

/// Client name reported in `User-Agent` and `sentry_client`.
pub const CLIENT_NAME: &str = "log2sentry";

/// Rendered in place of a version when no provider knows one.
pub const UNKNOWN_VERSION: &str = "unknown";

/// Sentry project key pair, parsed from `PUBLIC-KEY:SECRET-KEY`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub public_key: String,
    pub secret_key: String,
}

impl Credentials {
    pub fn new(public_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            secret_key: secret_key.into(),
        }
    }
}

impl FromStr for Credentials {
    type Err = CredentialsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [public_key, secret_key] => Ok(Credentials::new(*public_key, *secret_key)),
            _ => Err(CredentialsError::Malformed { parts: parts.len() }),
        }
    }
}

// The secret never reaches logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("public_key", &self.public_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Source of the version string embedded in the client identifier.
/// Resolved once at startup; `None` means the version is not available.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait VersionProvider {
    fn version(&self) -> Option<String>;
}

/// A provider backed by a value known up front (e.g. a compile-time package version).
#[derive(Debug, Clone, Default)]
pub struct StaticVersion(Option<String>);

impl StaticVersion {
    pub fn new(version: Option<&str>) -> Self {
        Self(version.map(str::to_owned))
    }
}

impl VersionProvider for StaticVersion {
    fn version(&self) -> Option<String> {
        self.0.clone()
    }
}

/// `log2sentry/<version>`, falling back to `log2sentry/unknown`.
pub fn client_identifier(provider: &dyn VersionProvider) -> String {
    let version = provider
        .version()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_VERSION.to_string());
    format!("{CLIENT_NAME}/{version}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_pair() {
        let creds: Credentials = "AAA:BBB".parse().unwrap();
        assert_eq!(creds.public_key, "AAA");
        assert_eq!(creds.secret_key, "BBB");
    }

    #[test]
    fn empty_secret_is_still_two_parts() {
        let creds: Credentials = "AAA:".parse().unwrap();
        assert_eq!(creds.public_key, "AAA");
        assert_eq!(creds.secret_key, "");
    }

    #[test]
    fn rejects_missing_or_extra_colons() {
        assert!(matches!(
            "AAANoColon".parse::<Credentials>(),
            Err(CredentialsError::Malformed { parts: 1 })
        ));
        assert!(matches!(
            "A:B:C".parse::<Credentials>(),
            Err(CredentialsError::Malformed { parts: 3 })
        ));
    }

    #[test]
    fn debug_output_redacts_secret() {
        let creds = Credentials::new("AAA", "topsecret");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("AAA"));
        assert!(!rendered.contains("topsecret"));
    }

    #[test]
    fn client_identifier_uses_provider_version() {
        let mut provider = MockVersionProvider::new();
        provider
            .expect_version()
            .times(1)
            .return_const(Some("0.4.0".to_string()));
        assert_eq!(client_identifier(&provider), "log2sentry/0.4.0");
    }

    #[test]
    fn client_identifier_falls_back_to_unknown() {
        assert_eq!(
            client_identifier(&StaticVersion::new(None)),
            "log2sentry/unknown"
        );
        assert_eq!(
            client_identifier(&StaticVersion::new(Some("  "))),
            "log2sentry/unknown"
        );
    }
}
