//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers and response structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/session", get(session_handler))
        .route("/session/login", post(login_handler))
        .route("/session/signup", post(signup_handler))
        .route("/session/logout", post(logout_handler))
        .route("/activity", post(activity_handler))
        .route("/idle/reset", post(idle_reset_handler))
        .route("/idle/clear", post(idle_clear_handler))
        .route("/idle/status", get(idle_status_handler))
        .route("/warning", get(warning_handler))
        .route("/warning/continue", post(warning_continue_handler))
        .route("/warning/logout", post(warning_logout_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
