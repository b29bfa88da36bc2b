//! Tag immutability reconciler.
//!
//! Rules are matched by every field, never by id. The registry has no
//! update call for these rules, so an edited rule is replaced: the old one
//! is deleted and the new one created.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{Reconciler, RunMode};
use crate::clients::RegistryClient;
use crate::diff;
use crate::error::Result;
use crate::report::RunResult;
use crate::resources::immutability::{self, ImmutabilityDecl, ImmutableRule, rule_path, rules_path};
use crate::resources::Identified;

/// Declared immutability rules of one project.
#[derive(Debug, Clone)]
pub struct TagImmutabilitySpec {
    pub project: String,
    pub rules: Vec<ImmutabilityDecl>,
}

pub struct TagImmutabilityReconciler {
    client: RegistryClient,
}

impl TagImmutabilityReconciler {
    pub fn new(client: RegistryClient) -> Self {
        Self { client }
    }

    async fn fetch(&self, project_id: i64) -> Result<Vec<Identified<ImmutableRule>>> {
        let path = rules_path(project_id);
        let response = self.client.get(&path).await?;
        immutability::from_wire(&path, &response.body, project_id)
    }
}

fn items(rules: &[Identified<ImmutableRule>]) -> Vec<ImmutableRule> {
    rules.iter().map(|r| r.item.clone()).collect()
}

#[async_trait]
impl Reconciler for TagImmutabilityReconciler {
    type Spec = TagImmutabilitySpec;

    async fn reconcile(&self, spec: &Self::Spec, mode: RunMode) -> Result<RunResult> {
        info!(project = %spec.project, rules = spec.rules.len(), "Reconciling tag immutability rules");

        let project = self.client.find_project(&spec.project).await?;
        let project_id = project.project_id;
        let desired = ImmutableRule::desired_list(&spec.rules, project_id);

        let before = self.fetch(project_id).await?;
        let delta = diff::partition(&before, &desired);
        let mut result = RunResult::unchanged();

        if delta.is_empty() {
            info!(project = %spec.project, "Tag immutability rules up to date");
            return Ok(result);
        }

        if mode.is_check() {
            info!(
                project = %spec.project,
                create = delta.to_create.len(),
                delete = delta.to_delete.len(),
                "Tag immutability rules would be changed"
            );
            let removed: Vec<ImmutableRule> = delta.to_delete.iter().map(|d| d.item.clone()).collect();
            result.set_items(&delta.to_create, &removed)?;
            return Ok(result);
        }

        info!(
            project = %spec.project,
            create = delta.to_create.len(),
            delete = delta.to_delete.len(),
            "Applying tag immutability rules"
        );
        let path = rules_path(project_id);
        for rule in &delta.to_create {
            debug!(project_id, "Creating immutability rule");
            self.client.post(&path, rule).await?;
        }
        for rule_id in delta.delete_ids() {
            debug!(project_id, rule_id, "Deleting immutability rule");
            self.client.delete(&rule_path(project_id, rule_id)).await?;
        }

        let after = self.fetch(project_id).await?;
        if !diff::partition(&after, &desired).is_empty() {
            warn!(project = %spec.project, "Tag immutability rules differ from declared state after update");
        }
        let (added, removed) = diff::added_removed(&items(&before), &items(&after));
        if added.is_empty() && removed.is_empty() {
            warn!(project = %spec.project, "Tag immutability writes left the rules unchanged");
            return Ok(result);
        }
        result.set_items(&added, &removed)?;
        Ok(result)
    }
}
