//! Warning surface state machine

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::monitor::ceil_seconds;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningState {
    Hidden,
    /// Counting down towards `deadline`, the same idle deadline the timer uses
    Showing { deadline: Instant },
}

/// Result of a one-second tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Counting(u64),
    /// Countdown reached zero; the surface is hidden and logout is owed
    Expired,
    /// Surface was not showing
    Idle,
}

/// What the presentation layer renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningView {
    pub is_open: bool,
    pub countdown: u64,
}

/// The "are you still there?" modal.
///
/// The displayed countdown is recomputed from the idle deadline on every
/// tick, so it cannot drift away from the moment the monitor logs out.
#[derive(Debug, Clone)]
pub struct WarningSurface {
    initial_countdown: u64,
    countdown: u64,
    state: WarningState,
}

impl WarningSurface {
    pub fn new(initial_countdown: u64) -> Self {
        Self {
            initial_countdown,
            countdown: initial_countdown,
            state: WarningState::Hidden,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, WarningState::Showing { .. })
    }

    pub fn countdown(&self) -> u64 {
        self.countdown
    }

    /// Show the surface. Returns false if it was already showing.
    pub fn open(&mut self, deadline: Instant, now: Instant) -> bool {
        if self.is_open() {
            return false;
        }
        self.countdown = remaining_seconds(deadline, now).min(self.initial_countdown);
        self.state = WarningState::Showing { deadline };
        true
    }

    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        let WarningState::Showing { deadline } = self.state else {
            return TickOutcome::Idle;
        };

        let next = self
            .countdown
            .saturating_sub(1)
            .min(remaining_seconds(deadline, now));
        if next == 0 {
            self.hide();
            return TickOutcome::Expired;
        }

        self.countdown = next;
        TickOutcome::Counting(next)
    }

    /// User chose to stay signed in; true if the surface was showing
    pub fn stay(&mut self) -> bool {
        self.close()
    }

    /// User chose to log out straight away; true if the surface was showing
    pub fn logout_now(&mut self) -> bool {
        self.close()
    }

    /// Enter the hidden state, restoring the countdown for the next showing
    pub fn hide(&mut self) {
        self.state = WarningState::Hidden;
        self.countdown = self.initial_countdown;
    }

    pub fn view(&self) -> WarningView {
        WarningView {
            is_open: self.is_open(),
            countdown: self.countdown,
        }
    }

    fn close(&mut self) -> bool {
        let was_open = self.is_open();
        self.hide();
        was_open
    }
}

fn remaining_seconds(deadline: Instant, now: Instant) -> u64 {
    ceil_seconds(deadline.saturating_duration_since(now))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn counts_down_to_expiry_one_second_at_a_time() {
        let start = Instant::now();
        let mut surface = WarningSurface::new(5);
        assert!(surface.open(start + secs(5), start));
        assert_eq!(surface.view(), WarningView { is_open: true, countdown: 5 });

        for (tick, expected) in (1..=4).zip([4, 3, 2, 1]) {
            assert_eq!(surface.tick(start + secs(tick)), TickOutcome::Counting(expected));
        }
        assert_eq!(surface.tick(start + secs(5)), TickOutcome::Expired);
        assert!(!surface.is_open());
        assert_eq!(surface.tick(start + secs(6)), TickOutcome::Idle);
    }

    #[test]
    fn late_tick_follows_the_deadline() {
        let start = Instant::now();
        let mut surface = WarningSurface::new(10);
        surface.open(start + secs(10), start);

        assert_eq!(surface.tick(start + secs(4)), TickOutcome::Counting(6));
        assert_eq!(surface.tick(start + secs(11)), TickOutcome::Expired);
    }

    #[test]
    fn open_is_capped_by_remaining_time() {
        let start = Instant::now();
        let mut surface = WarningSurface::new(60);
        surface.open(start + Duration::from_millis(2500), start);
        assert_eq!(surface.countdown(), 3);
        assert!(!surface.open(start + secs(60), start));
        assert_eq!(surface.countdown(), 3);
    }

    #[test]
    fn stay_hides_and_restores_initial_countdown() {
        let start = Instant::now();
        let mut surface = WarningSurface::new(5);
        surface.open(start + secs(5), start);
        surface.tick(start + secs(1));
        surface.tick(start + secs(2));
        assert_eq!(surface.countdown(), 3);

        assert!(surface.stay());
        assert_eq!(surface.view(), WarningView { is_open: false, countdown: 5 });
        assert!(!surface.stay());

        surface.open(start + secs(20), start + secs(15));
        assert_eq!(surface.countdown(), 5);
    }

    #[test]
    fn logout_now_only_counts_when_showing() {
        let start = Instant::now();
        let mut surface = WarningSurface::new(5);
        assert!(!surface.logout_now());
        surface.open(start + secs(5), start);
        assert!(surface.logout_now());
        assert!(!surface.is_open());
    }

    #[test]
    fn zero_countdown_expires_on_first_tick() {
        let start = Instant::now();
        let mut surface = WarningSurface::new(0);
        surface.open(start, start);
        assert_eq!(surface.tick(start + secs(1)), TickOutcome::Expired);
    }
}
