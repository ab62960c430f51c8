//! Activity sensor: the global input surface and the reset throttle

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use tokio::{sync::broadcast, time::Instant};
use tracing::debug;

/// Length of the window in which activity signals collapse into one reset
pub const THROTTLE_WINDOW: Duration = Duration::from_secs(1);

/// Interaction categories that count as user presence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    PointerDown,
    PointerMove,
    KeyPress,
    Scroll,
    TouchStart,
    Click,
    Wheel,
}

impl ActivityKind {
    pub const ALL: [ActivityKind; 7] = [
        ActivityKind::PointerDown,
        ActivityKind::PointerMove,
        ActivityKind::KeyPress,
        ActivityKind::Scroll,
        ActivityKind::TouchStart,
        ActivityKind::Click,
        ActivityKind::Wheel,
    ];

    /// DOM event name the browser reports for this category
    pub fn event_name(&self) -> &'static str {
        match self {
            ActivityKind::PointerDown => "mousedown",
            ActivityKind::PointerMove => "mousemove",
            ActivityKind::KeyPress => "keypress",
            ActivityKind::Scroll => "scroll",
            ActivityKind::TouchStart => "touchstart",
            ActivityKind::Click => "click",
            ActivityKind::Wheel => "wheel",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_name())
    }
}

impl FromStr for ActivityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        ActivityKind::ALL
            .into_iter()
            .find(|kind| kind.event_name() == name || serde_name(kind) == name)
            .ok_or_else(|| format!("Unknown activity event: {}", s))
    }
}

fn serde_name(kind: &ActivityKind) -> &'static str {
    match kind {
        ActivityKind::PointerDown => "pointer_down",
        ActivityKind::PointerMove => "pointer_move",
        ActivityKind::KeyPress => "key_press",
        ActivityKind::Scroll => "scroll",
        ActivityKind::TouchStart => "touch_start",
        ActivityKind::Click => "click",
        ActivityKind::Wheel => "wheel",
    }
}

/// Global input surface that listeners attach to.
///
/// Cloning shares the same underlying channel. Dropping a receiver returned
/// by [`InputSurface::subscribe`] detaches that listener.
#[derive(Debug, Clone)]
pub struct InputSurface {
    tx: broadcast::Sender<ActivityKind>,
}

impl InputSurface {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    /// Publish an interaction; returns how many listeners saw it
    pub fn emit(&self, kind: ActivityKind) -> usize {
        // No listeners is the normal state while signed out
        self.tx.send(kind).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ActivityKind> {
        self.tx.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for InputSurface {
    fn default() -> Self {
        Self::new()
    }
}

/// Coalesces bursts of activity into a single reset per window.
#[derive(Debug, Default, Clone)]
pub struct ActivityThrottle {
    window_end: Option<Instant>,
}

impl ActivityThrottle {
    pub fn new() -> Self {
        Self { window_end: None }
    }

    /// Record an activity signal. Returns true if it opened a new window.
    pub fn observe(&mut self, now: Instant) -> bool {
        if self.window_end.is_some() {
            return false;
        }
        self.window_end = Some(now + THROTTLE_WINDOW);
        debug!("Activity throttle window opened");
        true
    }

    /// Close the window if it has elapsed; true means a reset is owed
    pub fn due(&mut self, now: Instant) -> bool {
        match self.window_end {
            Some(end) if now >= end => {
                self.window_end = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.window_end = None;
    }

    pub fn window_end(&self) -> Option<Instant> {
        self.window_end
    }
}
