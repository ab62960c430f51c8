//! Helpdesk Session - session host for the helpdesk front end
//!
//! This library signs users in and out through an auth provider and expires
//! idle sessions: it watches user activity, shows a warning with a live
//! countdown before the deadline and logs the user out when it passes.

pub mod config;
pub mod monitor;
pub mod warning;
pub mod state;
pub mod api;
pub mod services;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::{Config, IdleSettings};
pub use monitor::{IdleMonitor, IdleOptions, InputSurface};
pub use state::AppState;
pub use api::create_router;
pub use utils::signals::shutdown_signal;
