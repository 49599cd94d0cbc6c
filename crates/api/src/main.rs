use anyhow::Context;

use rocketcart_api::app::{self, services::AppServices};
use rocketcart_api::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rocketcart_observability::init();

    let config = Config::from_env().context("invalid configuration")?;
    let services = AppServices::from_config(&config).await?;
    let app = app::build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server terminated")?;
    Ok(())
}
