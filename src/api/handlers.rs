//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use tracing::{debug, error, info, warn};

use crate::{
    monitor::ActivityKind,
    state::{AppState, SessionState},
    warning::WarningView,
};
use super::responses::{
    AckResponse, ActivityRequest, Credentials, HealthResponse, IdleStatusResponse,
    SessionResponse,
};

/// Handle GET /session - Current session and any login notice
pub async fn session_handler(State(state): State<Arc<AppState>>) -> Result<Json<SessionResponse>, StatusCode> {
    let session = current_session(&state)?;
    let response = if session.is_authenticated() {
        SessionResponse::signed_in("Signed in".to_string(), session)
    } else {
        SessionResponse::signed_out("Not signed in".to_string(), session)
    };
    Ok(Json(response))
}

/// Handle POST /session/login - Sign in and start idle monitoring
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<SessionResponse>, StatusCode> {
    match state.login(&credentials.email, &credentials.password) {
        Ok(user) => {
            info!("Login endpoint called - {} signed in", user.email);
            Ok(Json(SessionResponse::signed_in(
                format!("Signed in as {}", user.email),
                current_session(&state)?,
            )))
        }
        Err(e) => {
            warn!("Login rejected: {}", e);
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

/// Handle POST /session/signup - Register, sign in and start idle monitoring
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<SessionResponse>, StatusCode> {
    match state.signup(&credentials.email, &credentials.password) {
        Ok(user) => {
            info!("Signup endpoint called - {} registered", user.email);
            Ok(Json(SessionResponse::signed_in(
                format!("Account created for {}", user.email),
                current_session(&state)?,
            )))
        }
        Err(e) => {
            warn!("Signup rejected: {}", e);
            Err(StatusCode::BAD_REQUEST)
        }
    }
}

/// Handle POST /session/logout - End the session
pub async fn logout_handler(State(state): State<Arc<AppState>>) -> Result<Json<SessionResponse>, StatusCode> {
    match state.logout() {
        Ok(ended) => {
            info!("Logout endpoint called - session ended: {}", ended);
            let message = if ended { "Signed out" } else { "No active session" };
            Ok(Json(SessionResponse::signed_out(
                message.to_string(),
                current_session(&state)?,
            )))
        }
        Err(e) => {
            error!("Failed to log out: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /activity - Report a user interaction
pub async fn activity_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ActivityRequest>,
) -> Result<Json<AckResponse>, StatusCode> {
    let kind: ActivityKind = request.event.parse().map_err(|e| {
        debug!("Rejected activity: {}", e);
        StatusCode::BAD_REQUEST
    })?;
    require_session(&state)?;

    let listeners = state.record_activity(kind);
    Ok(Json(AckResponse::ok(format!(
        "Recorded {} ({} listener(s))",
        kind, listeners
    ))))
}

/// Handle POST /idle/reset - Force a fresh idle countdown
pub async fn idle_reset_handler(State(state): State<Arc<AppState>>) -> Result<Json<AckResponse>, StatusCode> {
    require_session(&state)?;
    state.monitor.reset_timer();
    info!("Idle reset endpoint called");
    Ok(Json(AckResponse::ok("Idle timer reset".to_string())))
}

/// Handle POST /idle/clear - Disarm the idle countdown
pub async fn idle_clear_handler(State(state): State<Arc<AppState>>) -> Result<Json<AckResponse>, StatusCode> {
    require_session(&state)?;
    state.monitor.clear_timeouts();
    info!("Idle clear endpoint called");
    Ok(Json(AckResponse::ok("Idle timer cleared".to_string())))
}

/// Handle GET /idle/status - Timer state and server metadata
pub async fn idle_status_handler(State(state): State<Arc<AppState>>) -> Result<Json<IdleStatusResponse>, StatusCode> {
    let warning = warning_view(&state)?;
    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(IdleStatusResponse {
        timer: state.get_timer_state(),
        warning,
        idle_timeout_seconds: state.settings.idle_duration.as_secs(),
        warning_lead_seconds: state.settings.warning_lead_time.as_secs(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /warning - What the warning modal should render
pub async fn warning_handler(State(state): State<Arc<AppState>>) -> Result<Json<WarningView>, StatusCode> {
    Ok(Json(warning_view(&state)?))
}

/// Handle POST /warning/continue - "Stay logged in"
pub async fn warning_continue_handler(State(state): State<Arc<AppState>>) -> Result<Json<WarningView>, StatusCode> {
    require_session(&state)?;
    match state.stay_logged_in() {
        Ok(stayed) => {
            info!("Warning continue endpoint called - modal was open: {}", stayed);
            Ok(Json(warning_view(&state)?))
        }
        Err(e) => {
            error!("Failed to continue session: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /warning/logout - "Logout now"
pub async fn warning_logout_handler(State(state): State<Arc<AppState>>) -> Result<Json<SessionResponse>, StatusCode> {
    match state.logout_from_warning() {
        Ok(ended) => {
            info!("Warning logout endpoint called - session ended: {}", ended);
            Ok(Json(SessionResponse::signed_out(
                "Signed out".to_string(),
                current_session(&state)?,
            )))
        }
        Err(e) => {
            error!("Failed to log out from warning: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

fn current_session(state: &AppState) -> Result<SessionState, StatusCode> {
    state.get_session().map_err(|e| {
        error!("Failed to get session state: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

fn require_session(state: &AppState) -> Result<(), StatusCode> {
    if current_session(state)?.is_authenticated() {
        Ok(())
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

fn warning_view(state: &AppState) -> Result<WarningView, StatusCode> {
    state.get_warning_view().map_err(|e| {
        error!("Failed to get warning view: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}
