//! Run result handed back to the caller.

use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

/// Difference recorded for a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Diff {
    /// Singleton resources: the snapshot before and after.
    Snapshot { before: Value, after: Value },
    /// Set-valued resources: items created and items removed.
    Set { added: Value, removed: Value },
}

/// Outcome of one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunResult {
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<Diff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention_policy: Option<Value>,
}

impl RunResult {
    pub fn unchanged() -> Self {
        Self::default()
    }

    /// Record a before/after pair and mark the run changed.
    pub fn set_changes<B: Serialize, A: Serialize>(&mut self, before: &B, after: &A) -> Result<()> {
        self.diff = Some(Diff::Snapshot {
            before: serde_json::to_value(before)?,
            after: serde_json::to_value(after)?,
        });
        self.changed = true;
        Ok(())
    }

    /// Record added/removed items and mark the run changed.
    pub fn set_items<T: Serialize>(&mut self, added: &[T], removed: &[T]) -> Result<()> {
        self.diff = Some(Diff::Set {
            added: serde_json::to_value(added)?,
            removed: serde_json::to_value(removed)?,
        });
        self.changed = true;
        Ok(())
    }

    pub fn set_retention_policy<P: Serialize>(&mut self, policy: &P) -> Result<()> {
        self.retention_policy = Some(serde_json::to_value(policy)?);
        self.changed = true;
        Ok(())
    }
}

/// Record emitted when a run aborts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Failure {
    pub failed: bool,
    pub changed: bool,
    pub msg: String,
}

impl Failure {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            failed: true,
            changed: false,
            msg: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unchanged_serializes_bare() {
        let value = serde_json::to_value(RunResult::unchanged()).unwrap();
        assert_eq!(value, json!({"changed": false}));
    }

    #[test]
    fn snapshot_diff_shape() {
        let mut result = RunResult::unchanged();
        result.set_changes(&json!({}), &json!({"a": 1})).unwrap();
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"changed": true, "diff": {"before": {}, "after": {"a": 1}}})
        );
    }

    #[test]
    fn set_diff_shape() {
        let mut result = RunResult::unchanged();
        result.set_items(&["new"], &["old"]).unwrap();
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"changed": true, "diff": {"added": ["new"], "removed": ["old"]}})
        );
    }

    #[test]
    fn failure_shape() {
        assert_eq!(
            serde_json::to_value(Failure::new("Project not found")).unwrap(),
            json!({"failed": true, "changed": false, "msg": "Project not found"})
        );
    }
}
