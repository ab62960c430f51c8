//! Authentication provider used by the session host

use std::{collections::HashMap, sync::Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

const MIN_PASSWORD_LEN: usize = 6;

/// A signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uid: String,
    pub email: String,
    pub signed_in_at: DateTime<Utc>,
}

/// External authentication collaborator.
///
/// The session host only needs these four operations; credential checks are
/// entirely up to the implementation.
pub trait AuthProvider: Send + Sync {
    fn signup(&self, email: &str, password: &str) -> Result<User, String>;
    fn login(&self, email: &str, password: &str) -> Result<User, String>;
    fn logout(&self) -> Result<(), String>;
    fn current_user(&self) -> Option<User>;
}

#[derive(Debug)]
struct Account {
    uid: String,
    password: String,
}

/// In-process account table, enough to drive the session host locally
#[derive(Debug, Default)]
pub struct LocalAuth {
    accounts: Mutex<HashMap<String, Account>>,
    current: Mutex<Option<User>>,
}

impl LocalAuth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an auth provider with pre-registered accounts
    pub fn with_accounts<I>(accounts: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let auth = Self::new();
        for (email, password) in accounts {
            auth.register(&email, &password)?;
        }
        Ok(auth)
    }

    fn register(&self, email: &str, password: &str) -> Result<String, String> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            ));
        }

        let mut accounts = self
            .accounts
            .lock()
            .map_err(|e| format!("Failed to lock accounts: {}", e))?;
        if accounts.contains_key(&email) {
            return Err(format!("Account already exists: {}", email));
        }

        let uid = format!("local-{}", accounts.len() + 1);
        accounts.insert(
            email.clone(),
            Account {
                uid: uid.clone(),
                password: password.to_string(),
            },
        );
        debug!("Registered account {} ({})", email, uid);
        Ok(email)
    }

    fn sign_in(&self, email: String, uid: String) -> Result<User, String> {
        let user = User {
            uid,
            email,
            signed_in_at: Utc::now(),
        };
        let mut current = self
            .current
            .lock()
            .map_err(|e| format!("Failed to lock current user: {}", e))?;
        *current = Some(user.clone());
        Ok(user)
    }
}

impl AuthProvider for LocalAuth {
    fn signup(&self, email: &str, password: &str) -> Result<User, String> {
        let email = self.register(email, password)?;
        let uid = self
            .accounts
            .lock()
            .map_err(|e| format!("Failed to lock accounts: {}", e))?
            .get(&email)
            .map(|account| account.uid.clone())
            .ok_or_else(|| format!("Account vanished during signup: {}", email))?;

        info!("Signed up {}", email);
        self.sign_in(email, uid)
    }

    fn login(&self, email: &str, password: &str) -> Result<User, String> {
        let email = normalize_email(email)?;
        let uid = {
            let accounts = self
                .accounts
                .lock()
                .map_err(|e| format!("Failed to lock accounts: {}", e))?;
            match accounts.get(&email) {
                Some(account) if account.password == password => account.uid.clone(),
                _ => {
                    warn!("Login failed for {}", email);
                    return Err("Invalid email or password".to_string());
                }
            }
        };

        info!("Logged in {}", email);
        self.sign_in(email, uid)
    }

    fn logout(&self) -> Result<(), String> {
        let mut current = self
            .current
            .lock()
            .map_err(|e| format!("Failed to lock current user: {}", e))?;
        if let Some(user) = current.take() {
            info!("Logged out {}", user.email);
        }
        Ok(())
    }

    fn current_user(&self) -> Option<User> {
        self.current.lock().ok().and_then(|user| user.clone())
    }
}

fn normalize_email(email: &str) -> Result<String, String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(format!("Invalid email address: {}", email)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_account_can_log_in_and_out() {
        let auth =
            LocalAuth::with_accounts([("Agent@Example.com".to_string(), "hunter22".to_string())])
                .unwrap();

        let user = auth.login("agent@example.com", "hunter22").unwrap();
        assert_eq!(user.email, "agent@example.com");
        assert_eq!(auth.current_user(), Some(user));

        auth.logout().unwrap();
        assert_eq!(auth.current_user(), None);
        auth.logout().unwrap();
    }

    #[test]
    fn wrong_password_is_rejected() {
        let auth =
            LocalAuth::with_accounts([("agent@example.com".to_string(), "hunter22".to_string())])
                .unwrap();
        assert!(auth.login("agent@example.com", "nope").is_err());
        assert!(auth.login("nobody@example.com", "hunter22").is_err());
        assert_eq!(auth.current_user(), None);
    }

    #[test]
    fn signup_validates_and_signs_in() {
        let auth = LocalAuth::new();
        assert!(auth.signup("not-an-email", "hunter22").is_err());
        assert!(auth.signup("new@example.com", "short").is_err());

        let user = auth.signup("new@example.com", "hunter22").unwrap();
        assert_eq!(auth.current_user().map(|u| u.uid), Some(user.uid));
        assert!(auth.signup("new@example.com", "hunter22").is_err());
    }
}
