use std::net::SocketAddr;
use std::path::Path;

use tracing::info;
use tracing_subscriber::EnvFilter;

use bathscape_api::api::{create_router, AppState};
use bathscape_api::config::Config;
use bathscape_api::{db, ingest};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_url).await?;

    if let Some(seed_dir) = &config.seed_dir {
        info!(seed_dir = %seed_dir, "Seeding catalog before serving");
        ingest::bootstrap(
            &pool,
            Path::new(seed_dir),
            config.similarity_sample_per_category,
            config.similarity_peers_per_image,
        )
        .await?;
    }

    // Engines are built once and shared; handlers never construct their own.
    let state = AppState::new(pool);
    let app = create_router(state);

    let addr = SocketAddr::new(config.host.parse()?, config.port);
    info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
