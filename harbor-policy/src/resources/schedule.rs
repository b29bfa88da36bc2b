//! System-wide scan-all schedule.

use serde::{Deserialize, Serialize};

use crate::clients::registry::decode;
use crate::error::Result;

pub const SCAN_ALL_SCHEDULE_PATH: &str = "/system/scanAll/schedule";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum ScheduleType {
    #[value(name = "None")]
    None,
    #[value(name = "Hourly")]
    Hourly,
    #[value(name = "Daily")]
    Daily,
    #[value(name = "Weekly")]
    Weekly,
    #[default]
    #[value(name = "Custom")]
    Custom,
}

impl ScheduleType {
    pub fn as_str(self) -> &'static str {
        match self {
            ScheduleType::None => "None",
            ScheduleType::Hourly => "Hourly",
            ScheduleType::Daily => "Daily",
            ScheduleType::Weekly => "Weekly",
            ScheduleType::Custom => "Custom",
        }
    }
}

/// Schedule as stored by the registry. `kind` stays a string because the
/// registry reports types (`Manual`, `Schedule`) that cannot be declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub cron: String,
}

/// Canonical scan-all schedule. `schedule: None` means nothing is configured
/// and serializes as an empty mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSchedule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
}

impl ScanSchedule {
    pub fn desired(cron: impl Into<String>, kind: ScheduleType) -> Self {
        Self {
            schedule: Some(Schedule {
                kind: kind.as_str().to_string(),
                cron: cron.into(),
            }),
        }
    }

    /// Canonicalize a fetched schedule body.
    ///
    /// The registry answers 200 with no content when no schedule exists.
    pub fn from_wire(path: &str, body: &str) -> Result<Self> {
        if body.is_empty() {
            return Ok(Self::default());
        }
        decode(path, body)
    }

    pub fn is_configured(&self) -> bool {
        self.schedule.is_some()
    }
}
