//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod session_events;

// Re-export main functions
pub use session_events::{session_events_task, SessionEvent};
