//! Timer controller owning the warning and idle deadlines

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::debug;

use super::policy::ExpiryPolicy;

/// A deadline that came due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerFire {
    Warning,
    Idle,
}

/// Point-in-time view of the controller, published to observers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonitorSnapshot {
    pub enabled: bool,
    /// Epoch the current deadlines were armed under
    pub epoch: u64,
    pub last_activity: Option<Instant>,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub warning_deadline: Option<Instant>,
    pub idle_deadline: Option<Instant>,
}

/// Holds at most one armed (warning, idle) pair.
///
/// The controller never sleeps on its own; whoever drives it asks for
/// [`TimerController::next_deadline`] and calls [`TimerController::fire_due`]
/// once that instant has passed.
#[derive(Debug)]
pub struct TimerController {
    policy: ExpiryPolicy,
    enabled: bool,
    epoch: u64,
    last_activity: Option<Instant>,
    last_activity_at: Option<DateTime<Utc>>,
    warning_deadline: Option<Instant>,
    idle_deadline: Option<Instant>,
}

impl TimerController {
    pub fn new(policy: ExpiryPolicy) -> Self {
        Self {
            policy,
            enabled: false,
            epoch: 0,
            last_activity: None,
            last_activity_at: None,
            warning_deadline: None,
            idle_deadline: None,
        }
    }

    /// Tag subsequent fires with `epoch`
    pub fn set_epoch(&mut self, epoch: u64) {
        self.epoch = epoch;
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Start a fresh idle period measured from `now`
    pub fn reset_timer(&mut self, now: Instant) {
        if !self.enabled {
            return;
        }

        self.last_activity = Some(now);
        self.last_activity_at = Some(Utc::now());
        self.clear_timeouts();

        self.warning_deadline = self.policy.warning_offset().map(|offset| now + offset);
        self.idle_deadline = self.policy.idle_offset().map(|offset| now + offset);
        debug!(
            "Idle timer armed: warning in {:?}, idle in {:?}",
            self.policy.warning_offset(),
            self.policy.idle_offset()
        );
    }

    /// Disarm both deadlines without scheduling new ones
    pub fn clear_timeouts(&mut self) {
        self.warning_deadline = None;
        self.idle_deadline = None;
    }

    /// Returns true if the flag actually changed
    pub fn set_enabled(&mut self, enabled: bool, now: Instant) -> bool {
        if self.enabled == enabled {
            return false;
        }
        self.enabled = enabled;
        if enabled {
            self.reset_timer(now);
        } else {
            self.clear_timeouts();
        }
        true
    }

    /// Earliest armed deadline, if any
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.warning_deadline, self.idle_deadline) {
            (Some(w), Some(i)) => Some(w.min(i)),
            (w, i) => w.or(i),
        }
    }

    /// Disarm and return every deadline at or before `now`, warning first
    pub fn fire_due(&mut self, now: Instant) -> Vec<TimerFire> {
        let mut fired = Vec::new();
        if self.warning_deadline.is_some_and(|d| d <= now) {
            self.warning_deadline = None;
            fired.push(TimerFire::Warning);
        }
        if self.idle_deadline.is_some_and(|d| d <= now) {
            self.idle_deadline = None;
            fired.push(TimerFire::Idle);
        }
        fired
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        MonitorSnapshot {
            enabled: self.enabled,
            epoch: self.epoch,
            last_activity: self.last_activity,
            last_activity_at: self.last_activity_at,
            warning_deadline: self.warning_deadline,
            idle_deadline: self.idle_deadline,
        }
    }
}
