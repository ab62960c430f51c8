//! Idle warning surface
//!
//! A modal with a live countdown that lets the user stay signed in or log
//! out straight away, and logs out by itself when the countdown runs out.

pub mod modal;
pub mod surface;

pub use modal::WarningModal;
pub use surface::{TickOutcome, WarningState, WarningSurface, WarningView};
