use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::TcpListener;

use mailtext::config::Settings;
use mailtext::logging::init_tracing;
use mailtext::server::{AppState, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::new().context("Failed to load configuration")?;
    init_tracing(&settings.logging);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("Invalid server host/port")?;

    tracing::info!(
        %addr,
        default_column = %settings.batch.default_column,
        max_upload_mb = settings.server.max_upload_mb,
        "Server initialized"
    );

    let router = create_router(AppState::new(settings));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, router).await?;

    Ok(())
}
