//! Warning modal driver: runs the one-second countdown of a [`WarningSurface`]

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::{
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, error, info};

use super::surface::{TickOutcome, WarningSurface, WarningView};
use crate::monitor::Callback;

const TICK: Duration = Duration::from_secs(1);

/// Owns the warning surface and its ticker task.
///
/// Every transition to hidden happens under the surface lock, so exactly one
/// of continue, logout-now or automatic expiry wins a given showing.
pub struct WarningModal {
    surface: Arc<Mutex<WarningSurface>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
    on_continue: Callback,
    on_logout: Callback,
}

impl WarningModal {
    pub fn new(initial_countdown: u64, on_continue: Callback, on_logout: Callback) -> Self {
        Self {
            surface: Arc::new(Mutex::new(WarningSurface::new(initial_countdown))),
            ticker: Mutex::new(None),
            on_continue,
            on_logout,
        }
    }

    /// Show the modal counting down to `deadline`. Returns false if already open.
    pub fn open(&self, deadline: Instant) -> Result<bool, String> {
        let opened = {
            let mut surface = self.lock_surface()?;
            let opened = surface.open(deadline, Instant::now());
            if opened {
                info!("Idle warning shown, {}s until logout", surface.countdown());
            }
            opened
        };

        if opened {
            let ticker = tokio::spawn(countdown_task(
                Arc::clone(&self.surface),
                Arc::clone(&self.on_logout),
            ));
            self.replace_ticker(Some(ticker))?;
        }
        Ok(opened)
    }

    /// "Stay logged in": hide and invoke the continue callback
    pub fn continue_session(&self) -> Result<bool, String> {
        let was_open = self.lock_surface()?.stay();
        if was_open {
            self.replace_ticker(None)?;
            info!("User chose to stay logged in");
            (self.on_continue)();
        }
        Ok(was_open)
    }

    /// "Logout now": hide and invoke the logout callback
    pub fn logout_now(&self) -> Result<bool, String> {
        let was_open = self.lock_surface()?.logout_now();
        if was_open {
            self.replace_ticker(None)?;
            info!("User chose to log out from the idle warning");
            (self.on_logout)();
        }
        Ok(was_open)
    }

    /// Hide without invoking any callback, e.g. when the session already ended
    pub fn close(&self) -> Result<(), String> {
        self.lock_surface()?.hide();
        self.replace_ticker(None)
    }

    pub fn view(&self) -> Result<WarningView, String> {
        Ok(self.lock_surface()?.view())
    }

    fn lock_surface(&self) -> Result<std::sync::MutexGuard<'_, WarningSurface>, String> {
        self.surface
            .lock()
            .map_err(|e| format!("Failed to lock warning surface: {}", e))
    }

    fn replace_ticker(&self, ticker: Option<JoinHandle<()>>) -> Result<(), String> {
        let mut slot = self
            .ticker
            .lock()
            .map_err(|e| format!("Failed to lock warning ticker: {}", e))?;
        if let Some(previous) = std::mem::replace(&mut *slot, ticker) {
            previous.abort();
        }
        Ok(())
    }
}

impl Drop for WarningModal {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.ticker.lock() {
            if let Some(ticker) = slot.take() {
                ticker.abort();
            }
        }
    }
}

async fn countdown_task(surface: Arc<Mutex<WarningSurface>>, on_logout: Callback) {
    let mut ticks = interval_at(Instant::now() + TICK, TICK);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticks.tick().await;

        let outcome = match surface.lock() {
            Ok(mut surface) => surface.tick(Instant::now()),
            Err(e) => {
                error!("Failed to lock warning surface: {}", e);
                break;
            }
        };

        match outcome {
            TickOutcome::Counting(remaining) => debug!("Idle warning countdown: {}s", remaining),
            TickOutcome::Expired => {
                info!("Idle warning countdown expired");
                on_logout();
                break;
            }
            TickOutcome::Idle => break,
        }
    }
}
