//! Tag retention policy.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Selector, null_as_default};
use crate::clients::registry::decode;
use crate::error::Result;

pub const RETENTIONS_PATH: &str = "/retentions";

pub fn retention_path(id: i64) -> String {
    format!("{RETENTIONS_PATH}/{id}")
}

/// One retention rule, in the shape the registry API uses.
///
/// Rule ids assigned by the server are not part of this type and are
/// dropped on decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetentionRule {
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub priority: i64,
    pub action: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub params: BTreeMap<String, Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub scope_selectors: BTreeMap<String, Vec<Selector>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tag_selectors: Vec<Selector>,
    pub template: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionScope {
    pub level: String,
    #[serde(rename = "ref")]
    pub reference: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerSettings {
    #[serde(default)]
    pub cron: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionTrigger {
    pub kind: String,
    pub settings: TriggerSettings,
}

/// Canonical retention policy of one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    pub algorithm: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rules: Vec<RetentionRule>,
    pub scope: RetentionScope,
    pub trigger: RetentionTrigger,
}

impl RetentionPolicy {
    /// Build the policy a project should carry: rules OR-combined, scheduled by `cron`.
    pub fn desired(rules: Vec<RetentionRule>, project_id: i64, cron: impl Into<String>) -> Self {
        Self {
            algorithm: "or".to_string(),
            rules,
            scope: RetentionScope {
                level: "project".to_string(),
                reference: project_id,
            },
            trigger: RetentionTrigger {
                kind: "Schedule".to_string(),
                settings: TriggerSettings { cron: cron.into() },
            },
        }
    }

    /// Canonicalize a fetched policy body.
    pub fn from_wire(path: &str, body: &str) -> Result<Self> {
        decode(path, body)
    }
}
