//! Authenticated session state

use serde::{Deserialize, Serialize};

use crate::services::User;

/// Message shown on the login surface after an idle expiry
pub const IDLE_LOGOUT_NOTICE: &str = "You have been logged out due to inactivity.";

/// Who is signed in, plus the message carried to the login surface
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub user: Option<User>,
    pub notice: Option<String>,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Record a sign-in, dropping any notice from the previous session
    pub fn sign_in(&mut self, user: User) {
        self.user = Some(user);
        self.notice = None;
    }

    /// Record a sign-out. Returns false if nobody was signed in.
    pub fn sign_out(&mut self, notice: Option<String>) -> bool {
        if self.user.take().is_none() {
            return false;
        }
        self.notice = notice;
        true
    }
}
