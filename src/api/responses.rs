//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    services::User,
    state::{SessionState, TimerState},
    warning::WarningView,
};

/// Credentials for login and signup
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// A user interaction reported by the browser
#[derive(Debug, Clone, Deserialize)]
pub struct ActivityRequest {
    /// DOM event name, e.g. `mousemove`
    pub event: String,
}

/// API response structure for session changes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub authenticated: bool,
    pub user: Option<User>,
    pub notice: Option<String>,
}

impl SessionResponse {
    /// Create a new session response
    pub fn new(status: &str, message: String, session: SessionState) -> Self {
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            authenticated: session.is_authenticated(),
            user: session.user,
            notice: session.notice,
        }
    }

    /// Create an authenticated response
    pub fn signed_in(message: String, session: SessionState) -> Self {
        Self::new("authenticated", message, session)
    }

    /// Create a signed-out response
    pub fn signed_out(message: String, session: SessionState) -> Self {
        Self::new("signed-out", message, session)
    }
}

/// Acknowledgement for activity and timer commands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl AckResponse {
    pub fn ok(message: String) -> Self {
        Self {
            status: "ok".to_string(),
            message,
            timestamp: Utc::now(),
        }
    }
}

/// Idle timer status with server metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdleStatusResponse {
    pub timer: TimerState,
    pub warning: WarningView,
    pub idle_timeout_seconds: u64,
    pub warning_lead_seconds: u64,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
