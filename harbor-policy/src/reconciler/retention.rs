//! Retention policy reconciler.

use async_trait::async_trait;
use tracing::{info, warn};

use super::{Reconciler, RunMode};
use crate::clients::RegistryClient;
use crate::diff;
use crate::error::{Error, Result};
use crate::report::RunResult;
use crate::resources::RetentionRule;
use crate::resources::retention::{RETENTIONS_PATH, RetentionPolicy, retention_path};

/// Declared retention policy of one project.
#[derive(Debug, Clone)]
pub struct RetentionSpec {
    pub project: String,
    pub rules: Vec<RetentionRule>,
    pub schedule_cron: String,
    /// Write the policy even when it already matches.
    pub force: bool,
}

pub struct RetentionReconciler {
    client: RegistryClient,
}

impl RetentionReconciler {
    pub fn new(client: RegistryClient) -> Self {
        Self { client }
    }

    async fn fetch(&self, id: i64) -> Result<RetentionPolicy> {
        let path = retention_path(id);
        let response = self.client.get(&path).await?;
        RetentionPolicy::from_wire(&path, &response.body)
    }
}

#[async_trait]
impl Reconciler for RetentionReconciler {
    type Spec = RetentionSpec;

    async fn reconcile(&self, spec: &Self::Spec, mode: RunMode) -> Result<RunResult> {
        info!(project = %spec.project, "Reconciling retention policy");

        let project = self.client.find_project(&spec.project).await?;
        let desired =
            RetentionPolicy::desired(spec.rules.clone(), project.project_id, &spec.schedule_cron);
        let mut result = RunResult::unchanged();

        let Some(retention_id) = project.retention_id() else {
            if mode.is_check() {
                info!(project = %spec.project, "Retention policy would be created");
                result.set_retention_policy(&desired)?;
                return Ok(result);
            }

            info!(project = %spec.project, "Creating retention policy");
            self.client.post(RETENTIONS_PATH, &desired).await?;

            let project = self.client.find_project(&spec.project).await?;
            let retention_id = project
                .retention_id()
                .ok_or_else(|| Error::MissingRetentionId {
                    project: spec.project.clone(),
                })?;
            let after = self.fetch(retention_id).await?;
            if after != desired {
                warn!(project = %spec.project, retention_id, "Created retention policy differs from declared state");
            }
            result.set_retention_policy(&after)?;
            return Ok(result);
        };

        let before = self.fetch(retention_id).await?;
        let delta = diff::compare(before, desired, spec.force);
        if !delta.changed {
            info!(project = %spec.project, retention_id, "Retention policy up to date");
            return Ok(result);
        }

        if mode.is_check() {
            info!(project = %spec.project, retention_id, "Retention policy would be updated");
            result.set_changes(&delta.before, &delta.after)?;
            return Ok(result);
        }

        info!(project = %spec.project, retention_id, force = spec.force, "Updating retention policy");
        self.client.put(&retention_path(retention_id), &delta.after).await?;

        let after = self.fetch(retention_id).await?;
        if after != delta.after {
            warn!(project = %spec.project, retention_id, "Retention policy differs from declared state after update");
        }
        result.set_changes(&delta.before, &after)?;
        Ok(result)
    }
}
