use std::time::Duration;

use anyhow::{Context, Result};
use bml_agents::ConciergeConfig;
use bml_api::{build_router, spawn_session_janitor, ApiConfig, ApiState};
use bml_observability::init_tracing;

const JANITOR_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("bml_api");

    let api_config = ApiConfig::from_env();
    let concierge_config = ConciergeConfig::from_env();
    let session_ttl_minutes = concierge_config.booking_session_ttl.num_minutes();

    let state = ApiState::new(&api_config, concierge_config);
    let _janitor = spawn_session_janitor(state.agent.clone(), JANITOR_INTERVAL);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&api_config.bind)
        .await
        .with_context(|| format!("failed to bind {}", api_config.bind))?;
    tracing::info!(
        bind = %api_config.bind,
        session_ttl_minutes,
        "bamboolino concierge api started"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
