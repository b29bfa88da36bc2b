//! Clients for the registry API.
//!
//! - `http`: the transport capability and its reqwest implementation
//! - `registry`: typed GET/POST/PUT/DELETE with status classification

pub mod http;
pub mod registry;

pub use http::{HttpTransport, Method, RawResponse, Transport};
pub use registry::{ApiResponse, RegistryClient};
