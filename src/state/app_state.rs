//! Main application state management

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Instant as StdInstant,
};

use chrono::{DateTime, Utc};
use tokio::{sync::mpsc, time::Instant};
use tracing::{debug, info, warn};

use super::{SessionState, TimerState, IDLE_LOGOUT_NOTICE};
use crate::{
    config::IdleSettings,
    monitor::{ActivityKind, Callback, FireCallback, IdleMonitor, IdleOptions, InputSurface},
    services::{AuthProvider, User},
    tasks::SessionEvent,
    warning::{WarningModal, WarningView},
};

/// Hosting session layer: owns the signed-in session and wires the idle
/// monitor and warning modal to it.
pub struct AppState {
    pub auth: Arc<dyn AuthProvider>,
    pub session: Arc<Mutex<SessionState>>,
    /// Global input surface activity is reported on
    pub input: InputSurface,
    pub monitor: IdleMonitor,
    pub warning: WarningModal,
    pub settings: IdleSettings,
    /// Server metadata
    pub start_time: StdInstant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl AppState {
    /// Create the state and spawn its idle monitor.
    ///
    /// The returned receiver carries monitor and modal events and must be
    /// drained by [`crate::tasks::session_events_task`].
    pub fn new(
        port: u16,
        host: String,
        settings: IdleSettings,
        auth: Arc<dyn AuthProvider>,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let input = InputSurface::new();

        let restored = auth.current_user();
        let options = IdleOptions::new(
            settings,
            emitter(&event_tx, |epoch| SessionEvent::Idle { epoch }),
        )
        .with_warning(emitter(&event_tx, |epoch| SessionEvent::Warning { epoch }))
        .enabled(restored.is_some());
        let (monitor, _task) = IdleMonitor::spawn(options, input.clone());

        let continue_monitor = monitor.clone();
        let on_continue: Callback = Arc::new(move || continue_monitor.reset_timer());
        // The modal has no epoch of its own; tag its requests with the
        // monitor's epoch at the moment they are raised
        let logout_monitor = monitor.clone();
        let request_logout = emitter(&event_tx, |epoch| SessionEvent::LogoutRequested { epoch });
        let on_logout: Callback = Arc::new(move || request_logout(logout_monitor.epoch()));
        let warning = WarningModal::new(
            monitor.policy().countdown_seconds(),
            on_continue,
            on_logout,
        );

        if let Some(user) = &restored {
            info!("Restored session for {}", user.email);
        }

        let state = Self {
            auth,
            session: Arc::new(Mutex::new(SessionState {
                user: restored,
                notice: None,
            })),
            input,
            monitor,
            warning,
            settings,
            start_time: StdInstant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
        };
        (state, event_rx)
    }

    /// Sign in with existing credentials and start idle monitoring
    pub fn login(&self, email: &str, password: &str) -> Result<User, String> {
        let user = self.auth.login(email, password)?;
        self.begin_session(user.clone(), "login")?;
        Ok(user)
    }

    /// Register, sign in and start idle monitoring
    pub fn signup(&self, email: &str, password: &str) -> Result<User, String> {
        let user = self.auth.signup(email, password)?;
        self.begin_session(user.clone(), "signup")?;
        Ok(user)
    }

    /// Explicit logout. Returns false if nobody was signed in.
    pub fn logout(&self) -> Result<bool, String> {
        self.end_session(None, "logout")
    }

    /// Idle expiry: end the session and leave a notice for the login surface.
    ///
    /// `epoch` is the monitor epoch the expiry was raised under; a request
    /// overtaken by a reset, logout or login is ignored.
    pub fn expire_session(&self, epoch: u64) -> Result<bool, String> {
        let mut session = self.lock_session()?;
        if !self.is_current(epoch) {
            return Ok(false);
        }
        let ended = session.sign_out(Some(IDLE_LOGOUT_NOTICE.to_string()));
        drop(session);
        if ended {
            self.teardown("idle-timeout");
        }
        Ok(ended)
    }

    /// Show the idle warning counting down to the monitor's expiry deadline
    pub fn show_warning(&self, epoch: u64) -> Result<bool, String> {
        let session = self.lock_session()?;
        if !session.is_authenticated() || !self.is_current(epoch) {
            return Ok(false);
        }
        let Some(deadline) = self.monitor.snapshot().idle_deadline else {
            warn!("Idle warning requested without an armed expiry");
            return Ok(false);
        };
        self.warning.open(deadline)
    }

    /// "Stay logged in" from the warning; resets the idle timer
    pub fn stay_logged_in(&self) -> Result<bool, String> {
        let stayed = self.warning.continue_session()?;
        if stayed {
            self.record_action("stay-logged-in");
        }
        Ok(stayed)
    }

    /// "Logout now" from the warning
    pub fn logout_from_warning(&self) -> Result<bool, String> {
        self.warning.logout_now()?;
        self.logout()
    }

    /// Report a user interaction on the global input surface
    pub fn record_activity(&self, kind: ActivityKind) -> usize {
        self.input.emit(kind)
    }

    pub fn get_session(&self) -> Result<SessionState, String> {
        Ok(self.lock_session()?.clone())
    }

    pub fn get_timer_state(&self) -> TimerState {
        TimerState::from_snapshot(&self.monitor.snapshot(), Instant::now())
    }

    pub fn get_warning_view(&self) -> Result<WarningView, String> {
        self.warning.view()
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    /// Stop the idle monitor task
    pub fn shutdown(&self) {
        self.monitor.shutdown();
        if let Err(e) = self.warning.close() {
            warn!("Failed to close idle warning: {}", e);
        }
    }

    fn begin_session(&self, user: User, action: &str) -> Result<(), String> {
        {
            let mut session = self.lock_session()?;
            session.sign_in(user);
            // Advances the epoch while the lock is held, so events raised
            // for an earlier session are recognised as stale
            self.monitor.set_enabled(true);
        }

        self.warning.close()?;
        self.record_action(action);
        Ok(())
    }

    fn end_session(&self, notice: Option<String>, action: &str) -> Result<bool, String> {
        let ended = self.lock_session()?.sign_out(notice);
        if ended {
            self.teardown(action);
        }
        Ok(ended)
    }

    fn teardown(&self, action: &str) {
        self.monitor.set_enabled(false);
        if let Err(e) = self.warning.close() {
            warn!("Failed to close idle warning: {}", e);
        }
        // The session is over locally even if the provider call fails
        if let Err(e) = self.auth.logout() {
            warn!("Auth provider logout failed: {}", e);
        }

        info!("Session ended ({})", action);
        self.record_action(action);
    }

    fn is_current(&self, epoch: u64) -> bool {
        let current = self.monitor.epoch();
        if epoch != current {
            debug!("Ignoring event from epoch {} (now {})", epoch, current);
        }
        epoch == current
    }

    fn lock_session(&self) -> Result<MutexGuard<'_, SessionState>, String> {
        self.session
            .lock()
            .map_err(|e| format!("Failed to lock session state: {}", e))
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }
}

fn emitter(
    tx: &mpsc::UnboundedSender<SessionEvent>,
    event: fn(u64) -> SessionEvent,
) -> FireCallback {
    let tx = tx.clone();
    Arc::new(move |epoch| {
        if let Err(e) = tx.send(event(epoch)) {
            warn!("Failed to deliver session event: {}", e);
        }
    })
}
