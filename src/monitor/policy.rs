//! Session expiry policy: when the warning and idle callbacks are due

use std::time::Duration;

use crate::config::IdleSettings;

/// Maps the configured durations to callback offsets measured from a reset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    settings: IdleSettings,
    has_warning: bool,
}

impl ExpiryPolicy {
    pub fn new(settings: IdleSettings, has_warning: bool) -> Self {
        Self {
            settings,
            has_warning,
        }
    }

    /// Offset of the idle callback, `None` when monitoring is switched off
    pub fn idle_offset(&self) -> Option<Duration> {
        self.settings
            .is_active()
            .then_some(self.settings.idle_duration)
    }

    /// Offset of the warning callback.
    ///
    /// A lead time at or beyond the idle duration clamps to zero so the
    /// warning fires straight away instead of being scheduled in the past.
    pub fn warning_offset(&self) -> Option<Duration> {
        let idle = self.idle_offset()?;
        if !self.has_warning || self.settings.warning_lead_time.is_zero() {
            return None;
        }
        Some(idle.saturating_sub(self.settings.warning_lead_time))
    }

    /// Initial countdown of the warning surface, in whole seconds
    pub fn countdown_seconds(&self) -> u64 {
        let lead = self
            .settings
            .warning_lead_time
            .min(self.settings.idle_duration);
        ceil_seconds(lead)
    }
}

/// Round a duration up to whole seconds
pub fn ceil_seconds(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(idle_ms: i64, warning_ms: i64, has_warning: bool) -> ExpiryPolicy {
        ExpiryPolicy::new(IdleSettings::from_millis(idle_ms, warning_ms), has_warning)
    }

    #[test]
    fn warning_precedes_idle_by_lead_time() {
        let p = policy(5000, 2000, true);
        assert_eq!(p.idle_offset(), Some(Duration::from_millis(5000)));
        assert_eq!(p.warning_offset(), Some(Duration::from_millis(3000)));
        assert_eq!(p.countdown_seconds(), 2);
    }

    #[test]
    fn zero_lead_or_missing_callback_skips_warning() {
        assert_eq!(policy(5000, 0, true).warning_offset(), None);
        assert_eq!(policy(5000, 2000, false).warning_offset(), None);
        assert_eq!(policy(5000, 0, true).idle_offset(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn lead_beyond_idle_clamps_to_immediate() {
        let p = policy(2000, 5000, true);
        assert_eq!(p.warning_offset(), Some(Duration::ZERO));
        assert_eq!(p.countdown_seconds(), 2);
    }

    #[test]
    fn zero_idle_disables_everything() {
        let p = policy(0, 1000, true);
        assert_eq!(p.idle_offset(), None);
        assert_eq!(p.warning_offset(), None);
    }

    #[test]
    fn countdown_rounds_up() {
        assert_eq!(ceil_seconds(Duration::from_millis(1500)), 2);
        assert_eq!(ceil_seconds(Duration::from_millis(1000)), 1);
        assert_eq!(ceil_seconds(Duration::ZERO), 0);
    }
}
