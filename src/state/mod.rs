//! State management module
//!
//! This module contains the session host state and the views it reports.

pub mod app_state;
pub mod session_state;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use session_state::{SessionState, IDLE_LOGOUT_NOTICE};
pub use timer_state::TimerState;
