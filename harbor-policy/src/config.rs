//! Registry connection configuration.

use std::time::Duration;

use crate::error::{Error, Result};

/// Default request timeout applied by the HTTP transport.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings handed to the HTTP transport.
///
/// Built once per invocation and passed in explicitly; there is no
/// process-wide client.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// API base, e.g. `https://harbor.example.com/api/v2.0`.
    pub api_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Verify the server certificate.
    pub verify_tls: bool,
    pub timeout: Duration,
}

impl RegistryConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            username: None,
            password: None,
            verify_tls: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set whichever credentials are present. Basic auth is only sent with a username.
    pub fn with_optional_credentials(mut self, username: Option<String>, password: Option<String>) -> Self {
        self.username = username;
        self.password = password;
        self
    }

    pub fn with_verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Base URL without a trailing slash, checked for an http(s) scheme.
    pub fn base_url(&self) -> Result<&str> {
        let url = self.api_url.trim_end_matches('/');
        if url.starts_with("http://") || url.starts_with("https://") {
            Ok(url)
        } else {
            Err(Error::Config(format!(
                "api_url must start with http:// or https://, got '{}'",
                self.api_url
            )))
        }
    }
}
