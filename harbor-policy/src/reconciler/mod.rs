//! Reconcilers for registry policy resources.
//!
//! Each reconciler fetches the live resource, canonicalizes it, compares it
//! with the declared state and, unless running in check mode, issues the
//! writes needed to converge before re-fetching to report what the
//! registry actually holds.

pub mod retention;
pub mod scan_schedule;
pub mod tag_immutability;

use async_trait::async_trait;

use crate::error::Result;
use crate::report::RunResult;

pub use retention::{RetentionReconciler, RetentionSpec};
pub use scan_schedule::{ScanScheduleReconciler, ScanScheduleSpec};
pub use tag_immutability::{TagImmutabilityReconciler, TagImmutabilitySpec};

/// Whether a run may change the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunMode {
    #[default]
    Apply,
    /// Compute and report the delta without any write.
    Check,
}

impl RunMode {
    pub fn from_check_flag(check: bool) -> Self {
        if check { RunMode::Check } else { RunMode::Apply }
    }

    pub fn is_check(self) -> bool {
        self == RunMode::Check
    }
}

/// Trait for resource reconcilers.
#[async_trait]
pub trait Reconciler: Send + Sync {
    /// The declared state for this resource kind.
    type Spec: Send + Sync;

    /// Converge the registry towards `spec` and report what changed.
    async fn reconcile(&self, spec: &Self::Spec, mode: RunMode) -> Result<RunResult>;
}
