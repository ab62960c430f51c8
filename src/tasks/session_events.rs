//! Session event background task

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::state::AppState;

/// Events raised by the idle monitor and the warning modal, each tagged
/// with the monitor epoch it was raised under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Warning lead time reached; show the warning surface
    Warning { epoch: u64 },
    /// Idle duration reached; expire the session
    Idle { epoch: u64 },
    /// The warning surface asked for a logout
    LogoutRequested { epoch: u64 },
}

/// Background task that applies monitor and modal events to the session
pub async fn session_events_task(
    state: Arc<AppState>,
    mut events: mpsc::UnboundedReceiver<SessionEvent>,
) {
    info!("Starting session event task");

    while let Some(event) = events.recv().await {
        debug!("Session event: {:?}", event);
        handle_event(&state, event);
    }

    info!("Session event channel closed");
}

fn handle_event(state: &AppState, event: SessionEvent) {
    match event {
        SessionEvent::Warning { epoch } => match state.show_warning(epoch) {
            Ok(true) => {}
            Ok(false) => debug!("Idle warning not shown"),
            Err(e) => error!("Failed to show idle warning: {}", e),
        },
        SessionEvent::Idle { epoch } | SessionEvent::LogoutRequested { epoch } => {
            match state.expire_session(epoch) {
                Ok(true) => info!("Session expired after inactivity"),
                Ok(false) => debug!("Session already ended or expiry superseded"),
                Err(e) => error!("Failed to expire session: {}", e),
            }
        }
    }
}
