use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cohort_builder::{router, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("cohort_builder=info".parse()?)
                .add_directive("api=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;
    let state = Arc::new(AppState::from_config(&config).await?);
    let app = router(state);

    let addr = config.bind_addr();
    info!("Cohort builder API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
