use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use studyrag_backend::config::AppConfig;
use studyrag_backend::logging;
use studyrag_backend::server;
use studyrag_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("Failed to load configuration")?;
    logging::init(&config.server);

    let bind_addr = format!("127.0.0.1:{}", config.server.port);
    let state = AppState::initialize(config).await?;

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;
    tracing::info!("Listening on {}", addr);

    let app: Router = server::router::router(state);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
