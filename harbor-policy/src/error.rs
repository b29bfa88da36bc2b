//! Error types for registry reconciliation.

use thiserror::Error;

/// Errors that abort a reconciliation run.
///
/// Every non-2xx response is mapped onto one of the status variants by
/// [`classify`]; nothing is retried locally.
#[derive(Debug, Error)]
pub enum Error {
    /// The referenced project does not exist.
    #[error("Project not found")]
    ProjectNotFound(String),

    #[error("User need to log in first.")]
    Unauthorized,

    #[error("User does not have permission of admin role.")]
    Forbidden,

    #[error("Unexpected internal errors.")]
    ServerError,

    /// Any other non-2xx status, kept verbatim for diagnosis.
    #[error("Unknown HTTP status code: {status}\nBody: {body}")]
    UnknownStatus { status: u16, body: String },

    /// Connection, TLS or timeout failure below the HTTP layer.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The registry answered with a body that does not match the resource shape.
    #[error("invalid response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A retention policy was created but the project still carries no `retention_id`.
    #[error("retention policy created for project {project} but no retention_id was recorded")]
    MissingRetentionId { project: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Map a response status onto the error taxonomy. 2xx passes through.
pub fn classify(status: u16, body: &str) -> Result<()> {
    match status {
        200..=299 => Ok(()),
        401 => Err(Error::Unauthorized),
        403 => Err(Error::Forbidden),
        500 => Err(Error::ServerError),
        _ => Err(Error::UnknownStatus {
            status,
            body: body.to_string(),
        }),
    }
}
