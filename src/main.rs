//! Helpdesk Session - session host with idle-timeout monitoring
//!
//! This is the main entry point for the helpdesk-session server.

use std::{future::IntoFuture, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, warn};

use helpdesk_session::{
    config::Config,
    services::LocalAuth,
    state::AppState,
    api::create_router,
    tasks::session_events_task,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("helpdesk_session={},tower_http=info", config.log_level()))
        .init();

    info!("Starting helpdesk-session server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, idle timeout={}min, warning={}min",
          config.host, config.port, config.idle_timeout, config.idle_warning);

    let settings = config.idle_settings();
    if !settings.is_active() {
        warn!("Idle timeout is not positive, idle monitoring is disabled");
    }

    let accounts = config.seed_accounts().map_err(anyhow::Error::msg)?;
    if accounts.is_empty() {
        info!("No seed accounts configured, users must sign up first");
    }
    let auth = LocalAuth::with_accounts(accounts).map_err(anyhow::Error::msg)?;

    // Create application state; this also starts the idle monitor
    let (state, events) = AppState::new(config.port, config.host.clone(), settings, Arc::new(auth));
    let state = Arc::new(state);

    // Start the session event background task
    tokio::spawn(session_events_task(Arc::clone(&state), events));

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /session/login     - Sign in");
    info!("  POST /session/signup    - Register and sign in");
    info!("  POST /session/logout    - Sign out");
    info!("  GET  /session           - Current session");
    info!("  POST /activity          - Report user activity");
    info!("  POST /idle/reset        - Reset idle timer");
    info!("  POST /idle/clear        - Clear idle timer");
    info!("  GET  /idle/status       - Idle timer status");
    info!("  GET  /warning           - Idle warning state");
    info!("  POST /warning/continue  - Stay logged in");
    info!("  POST /warning/logout    - Logout now");
    info!("  GET  /health            - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app).into_future();

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    state.shutdown();
    info!("Server shutdown complete");
    Ok(())
}
