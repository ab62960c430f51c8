//! Serializable view of the idle timer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::monitor::{ceil_seconds, MonitorSnapshot};

/// Idle timer state as reported to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub enabled: bool,
    pub warning_remaining_seconds: Option<u64>,
    pub idle_remaining_seconds: Option<u64>,
    pub last_activity: Option<DateTime<Utc>>,
}

impl TimerState {
    /// Project a monitor snapshot onto remaining seconds as of `now`
    pub fn from_snapshot(snapshot: &MonitorSnapshot, now: Instant) -> Self {
        let remaining = |deadline: Option<Instant>| {
            deadline.map(|d| ceil_seconds(d.saturating_duration_since(now)))
        };

        Self {
            enabled: snapshot.enabled,
            warning_remaining_seconds: remaining(snapshot.warning_deadline),
            idle_remaining_seconds: remaining(snapshot.idle_deadline),
            last_activity: snapshot.last_activity_at,
        }
    }
}
