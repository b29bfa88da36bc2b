//! HTTP transport for the registry API.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::config::RegistryConfig;
use crate::error::Result;

/// Request methods used against the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// Whether the method changes registry state.
    pub fn is_mutating(self) -> bool {
        !matches!(self, Method::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// Unclassified response: status code and raw body text.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Send one request and return whatever the registry answered.
///
/// Implementations do not interpret status codes; that is the job of
/// [`RegistryClient`](super::RegistryClient).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<RawResponse>;
}

/// reqwest-backed transport carrying credentials and TLS settings on every call.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let base_url = config.base_url()?.to_string();
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(!config.verify_tls)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<RawResponse> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };
        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_ref());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(%method, %path, status, "registry request");

        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn only_get_is_read_only() {
        assert!(!Method::Get.is_mutating());
        assert!(Method::Post.is_mutating());
        assert!(Method::Put.is_mutating());
        assert!(Method::Delete.is_mutating());
    }

    #[test]
    fn transport_rejects_bad_base_url() {
        let config = RegistryConfig::new("ftp://harbor.local");
        assert!(matches!(HttpTransport::new(&config), Err(Error::Config(_))));
    }
}
