//! harbor-policy: declarative management of Harbor policy resources.
//!
//! Reconciles declared state with the live registry for:
//! - tag retention policies (per project)
//! - the system-wide scan-all schedule
//! - tag immutability rules (per project)
//!
//! Each run fetches the current resource, compares canonical forms and
//! either stops, previews the delta (check mode) or applies the minimal
//! writes and re-fetches to report the result.

pub mod clients;
pub mod config;
pub mod diff;
pub mod error;
pub mod reconciler;
pub mod report;
pub mod resources;
pub mod test_util;

pub use clients::{HttpTransport, RegistryClient, Transport};
pub use config::RegistryConfig;
pub use error::{Error, Result};
pub use reconciler::{Reconciler, RunMode};
pub use report::{Diff, Failure, RunResult};
