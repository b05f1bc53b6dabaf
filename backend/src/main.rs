use std::{sync::Arc, time::Duration};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use portal_backend::{
    config::Config,
    routes::build_router,
    services::session_sweeper::spawn_session_sweeper,
    state::AppState,
    utils::time::{Clock, SystemClock},
};

fn mask_secret(s: &str) -> String {
    if s.is_empty() {
        return "<empty>".into();
    }
    let prefix = s.chars().take(4).collect::<String>();
    format!("{}*** (len={})", prefix, s.len())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portal_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load()?;
    tracing::info!(
        access_token_secret = %mask_secret(&config.access_token_secret),
        refresh_token_secret = %mask_secret(&config.refresh_token_secret),
        token_issuer = %config.token_issuer,
        access_token_ttl_minutes = config.access_token_ttl_minutes,
        refresh_token_ttl_days = config.refresh_token_ttl_days,
        cookie_secure = config.cookie_secure,
        cookie_same_site = ?config.cookie_same_site,
        session_sweep_interval_seconds = config.session_sweep_interval_seconds,
        "Loaded configuration from environment/.env"
    );

    let addr = config.bind_addr;
    let sweep_every = config.session_sweep_interval_seconds;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let state = AppState::in_memory(config, clock.clone());

    let _sweeper = (sweep_every > 0).then(|| {
        spawn_session_sweeper(
            state.sessions.clone(),
            clock.clone(),
            Duration::from_secs(sweep_every),
        )
    });

    let app = build_router(state);

    // Start server
    tracing::info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
