use std::sync::Arc;

use chiron::{config::Config, db, routes::create_router, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    init_logging();

    let pool = db::connect(&config.database_url, config.database_pool_size)?;
    tracing::info!(database = %config.database_url, "Database ready");

    let addr = config.bind_addr;
    let state = Arc::new(AppState::new(config, pool));
    let app = create_router(state);

    tracing::info!(address = %addr, "Server listening");
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("chiron=debug,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
