//! Project lookup record.

use serde::{Deserialize, Deserializer, Serialize};

/// The subset of a registry project the reconcilers need.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub project_id: i64,
    pub name: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub metadata: ProjectMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// The registry stores metadata values as strings; numbers are accepted too.
    #[serde(default, deserialize_with = "lenient_id")]
    pub retention_id: Option<i64>,
}

impl Project {
    pub fn retention_id(&self) -> Option<i64> {
        self.metadata.retention_id
    }
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Int(i64),
        Text(String),
    }

    match Option::<Repr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Repr::Int(id)) => Ok(Some(id)),
        Some(Repr::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Repr::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
