//! Registry resource kinds and their canonical forms.
//!
//! Each kind owns two pure conversions: declared input to the wire payload
//! the registry expects, and fetched wire data to a comparable canonical
//! value with server-assigned fields removed.

pub mod immutability;
pub mod project;
pub mod retention;
pub mod schedule;

use serde::{Deserialize, Deserializer, Serialize};

pub use immutability::{ImmutabilityDecl, ImmutableRule, RemoteImmutableRule};
pub use project::Project;
pub use retention::{RetentionPolicy, RetentionRule};
pub use schedule::{ScanSchedule, Schedule, ScheduleType};

/// Selector kind used by every rule the registry UI creates.
pub const DOUBLESTAR: &str = "doublestar";

/// Pattern selector on repositories or tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    pub kind: String,
    pub decoration: String,
    pub pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<String>,
}

impl Selector {
    pub fn doublestar(decoration: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            kind: DOUBLESTAR.to_string(),
            decoration: decoration.into(),
            pattern: pattern.into(),
            extras: None,
        }
    }
}

/// A canonical item together with the server identifier it was stripped of.
#[derive(Debug, Clone, PartialEq)]
pub struct Identified<T> {
    pub id: i64,
    pub item: T,
}

/// Treat an explicit `null` the same as a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
