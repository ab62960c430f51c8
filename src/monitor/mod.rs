//! Idle session monitor
//!
//! Watches user activity, warns before the session expires and reports the
//! expiry to the hosting session layer.

pub mod activity;
pub mod controller;
pub mod policy;
pub mod task;

// Re-export main types
pub use activity::{ActivityKind, ActivityThrottle, InputSurface, THROTTLE_WINDOW};
pub use controller::{MonitorSnapshot, TimerController, TimerFire};
pub use policy::{ceil_seconds, ExpiryPolicy};
pub use task::{Callback, FireCallback, IdleMonitor, IdleOptions};
