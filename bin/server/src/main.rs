use bitbucket_oauth_realm::Realm;
use bitbucket_oauth_server::{auth::AppState, config::ServerConfig, router};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    config
        .session
        .validate()
        .expect("invalid session configuration");
    let credentials = config
        .credentials()
        .expect("failed to load realm credentials");
    tracing::info!(
        client_id = %credentials.client_id(),
        team = credentials.team_name().unwrap_or("<none>"),
        "Loaded configuration"
    );
    if credentials.team_name().is_none() {
        tracing::warn!("no team configured; every login will be refused");
    }
    if config.root_url.is_none() {
        tracing::warn!("root_url is not set; logins cannot start");
    }

    let realm =
        Realm::connect(credentials, &config.provider).expect("failed to build provider client");

    // Create application state
    let app_state = Arc::new(AppState::new(realm, config.root_url, config.session));

    // Spawn periodic session cleanup task
    let cleanup_state = app_state.clone();
    let cleanup_interval_secs = app_state.session_config.cleanup_interval_seconds;
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(cleanup_interval_secs));
        loop {
            interval.tick().await;
            let count = cleanup_state.sessions.purge_expired().await;
            if count > 0 {
                tracing::debug!(deleted_sessions = count, "Periodic session cleanup");
            }
        }
    });

    let app = router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}
