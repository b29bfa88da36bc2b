//! Typed registry client.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::http::{Method, RawResponse, Transport};
use crate::error::{Error, Result, classify};
use crate::resources::project::Project;

/// Largest page the registry serves for project listings.
pub const PROJECT_PAGE_SIZE: usize = 100;

/// A classified (2xx) response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    /// True when the registry sent no content at all.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Registry API client shared by all reconcilers.
///
/// Every call is classified before it is returned: a non-2xx answer
/// never reaches the caller as a response.
#[derive(Clone)]
pub struct RegistryClient {
    transport: Arc<dyn Transport>,
}

impl RegistryClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.send(Method::Get, path, None).await
    }

    pub async fn post<T: Serialize + ?Sized>(&self, path: &str, payload: &T) -> Result<ApiResponse> {
        let body = serde_json::to_value(payload)?;
        self.send(Method::Post, path, Some(&body)).await
    }

    pub async fn put<T: Serialize + ?Sized>(&self, path: &str, payload: &T) -> Result<ApiResponse> {
        let body = serde_json::to_value(payload)?;
        self.send(Method::Put, path, Some(&body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.send(Method::Delete, path, None).await
    }

    /// GET and decode the body as `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.get(path).await?;
        decode(path, &response.body)
    }

    /// Resolve a project by exact name.
    ///
    /// The registry matches `?name=` fuzzily and pages the result, so every
    /// page is walked and filtered again here until the exact name shows up.
    pub async fn find_project(&self, name: &str) -> Result<Project> {
        let encoded = urlencoding::encode(name);
        for page in 1.. {
            let path = format!("/projects?name={encoded}&page={page}&page_size={PROJECT_PAGE_SIZE}");
            let response = self.get(&path).await?;
            let projects: Vec<Project> = if response.is_empty() {
                Vec::new()
            } else {
                decode::<Option<Vec<Project>>>(&path, &response.body)?.unwrap_or_default()
            };

            let last_page = projects.len() < PROJECT_PAGE_SIZE;
            if let Some(project) = projects.into_iter().find(|p| p.name == name) {
                return Ok(project);
            }
            if last_page {
                break;
            }
        }
        Err(Error::ProjectNotFound(name.to_string()))
    }

    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<ApiResponse> {
        let RawResponse { status, body } = self.transport.send(method, path, body).await?;
        classify(status, &body)?;
        Ok(ApiResponse { status, body })
    }
}

pub(crate) fn decode<T: DeserializeOwned>(path: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|source| Error::Decode {
        path: path.to_string(),
        source,
    })
}
