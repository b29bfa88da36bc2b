//! Scan-all schedule reconciler.

use async_trait::async_trait;
use tracing::{info, warn};

use super::{Reconciler, RunMode};
use crate::clients::RegistryClient;
use crate::diff;
use crate::error::Result;
use crate::report::RunResult;
use crate::resources::schedule::{SCAN_ALL_SCHEDULE_PATH, ScanSchedule, ScheduleType};

/// Declared system-wide scan-all schedule.
#[derive(Debug, Clone)]
pub struct ScanScheduleSpec {
    pub cron: String,
    pub kind: ScheduleType,
}

pub struct ScanScheduleReconciler {
    client: RegistryClient,
}

impl ScanScheduleReconciler {
    pub fn new(client: RegistryClient) -> Self {
        Self { client }
    }

    async fn fetch(&self) -> Result<ScanSchedule> {
        let response = self.client.get(SCAN_ALL_SCHEDULE_PATH).await?;
        ScanSchedule::from_wire(SCAN_ALL_SCHEDULE_PATH, &response.body)
    }
}

#[async_trait]
impl Reconciler for ScanScheduleReconciler {
    type Spec = ScanScheduleSpec;

    async fn reconcile(&self, spec: &Self::Spec, mode: RunMode) -> Result<RunResult> {
        info!(cron = %spec.cron, kind = ?spec.kind, "Reconciling scan-all schedule");

        let desired = ScanSchedule::desired(&spec.cron, spec.kind);
        let before = self.fetch().await?;
        let delta = diff::compare(before, desired, false);
        let mut result = RunResult::unchanged();

        if !delta.changed {
            info!("Scan-all schedule up to date");
            return Ok(result);
        }

        if mode.is_check() {
            info!(configured = delta.before.is_configured(), "Scan-all schedule would be updated");
            result.set_changes(&delta.before, &delta.after)?;
            return Ok(result);
        }

        info!(configured = delta.before.is_configured(), "Updating scan-all schedule");
        self.client.put(SCAN_ALL_SCHEDULE_PATH, &delta.after).await?;

        let after = self.fetch().await?;
        if after != delta.after {
            warn!("Scan-all schedule differs from declared state after update");
        }
        result.set_changes(&delta.before, &after)?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::Method;
    use crate::error::Error;
    use crate::report::Diff;
    use crate::test_util::FakeRegistry;
    use serde_json::json;

    fn weekly() -> ScanScheduleSpec {
        ScanScheduleSpec {
            cron: "0 0 0 * * 0".to_string(),
            kind: ScheduleType::Custom,
        }
    }

    fn reconciler(fake: &std::sync::Arc<FakeRegistry>) -> ScanScheduleReconciler {
        ScanScheduleReconciler::new(RegistryClient::new(fake.clone()))
    }

    #[tokio::test]
    async fn unconfigured_schedule_is_created() {
        let fake = FakeRegistry::new();

        let result = reconciler(&fake).reconcile(&weekly(), RunMode::Apply).await.unwrap();

        assert!(result.changed);
        assert_eq!(
            fake.mutating_requests(),
            vec![(Method::Put, SCAN_ALL_SCHEDULE_PATH.to_string())]
        );
        let Some(Diff::Snapshot { before, after }) = result.diff else {
            panic!("expected snapshot diff");
        };
        assert_eq!(before, json!({}));
        assert_eq!(after, json!({"schedule": {"type": "Custom", "cron": "0 0 0 * * 0"}}));
    }

    #[tokio::test]
    async fn second_run_is_unchanged() {
        let fake = FakeRegistry::new();
        let reconciler = reconciler(&fake);

        assert!(reconciler.reconcile(&weekly(), RunMode::Apply).await.unwrap().changed);
        assert!(!reconciler.reconcile(&weekly(), RunMode::Apply).await.unwrap().changed);
        assert_eq!(fake.count(Method::Put), 1);
    }

    #[tokio::test]
    async fn matching_schedule_is_left_alone() {
        let fake = FakeRegistry::new();
        fake.set_scan_schedule(json!({
            "schedule": {"type": "Custom", "cron": "0 0 0 * * 0", "next_scheduled_time": "2030-01-06T00:00:00Z"}
        }));

        let result = reconciler(&fake).reconcile(&weekly(), RunMode::Apply).await.unwrap();

        assert!(!result.changed);
        assert!(fake.mutating_requests().is_empty());
    }

    #[tokio::test]
    async fn type_change_is_applied() {
        let fake = FakeRegistry::new();
        fake.set_scan_schedule(json!({"schedule": {"type": "Daily", "cron": "0 0 0 * * *"}}));
        let spec = ScanScheduleSpec {
            cron: "0 0 * * * *".to_string(),
            kind: ScheduleType::Hourly,
        };

        let result = reconciler(&fake).reconcile(&spec, RunMode::Apply).await.unwrap();

        assert!(result.changed);
        assert_eq!(fake.scan_schedule().unwrap()["schedule"]["type"], "Hourly");
    }

    #[tokio::test]
    async fn manual_schedule_is_replaced() {
        let fake = FakeRegistry::new();
        fake.set_scan_schedule(json!({"schedule": {"type": "Manual", "cron": ""}}));

        let result = reconciler(&fake).reconcile(&weekly(), RunMode::Apply).await.unwrap();

        assert!(result.changed);
        assert_eq!(
            fake.mutating_requests(),
            vec![(Method::Put, SCAN_ALL_SCHEDULE_PATH.to_string())]
        );
        assert_eq!(fake.scan_schedule().unwrap()["schedule"]["type"], "Custom");
    }

    #[tokio::test]
    async fn check_mode_does_not_write() {
        let fake = FakeRegistry::new();

        let result = reconciler(&fake).reconcile(&weekly(), RunMode::Check).await.unwrap();

        assert!(result.changed);
        assert!(fake.mutating_requests().is_empty());
        assert!(fake.scan_schedule().is_none());
    }

    #[tokio::test]
    async fn server_error_on_write_is_classified() {
        let fake = FakeRegistry::new();
        fake.fail_on(Method::Put, SCAN_ALL_SCHEDULE_PATH, 500);

        let err = reconciler(&fake).reconcile(&weekly(), RunMode::Apply).await.unwrap_err();

        assert!(matches!(err, Error::ServerError));
    }

    #[tokio::test]
    async fn unauthorized_read_is_classified() {
        let fake = FakeRegistry::new();
        fake.fail_on(Method::Get, SCAN_ALL_SCHEDULE_PATH, 401);

        let err = reconciler(&fake).reconcile(&weekly(), RunMode::Apply).await.unwrap_err();

        assert!(matches!(err, Error::Unauthorized));
        assert!(fake.mutating_requests().is_empty());
    }
}
