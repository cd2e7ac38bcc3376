use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crawl_extract::{AppState, api::routes::create_router, config::Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logging();

    // Load configuration
    let config = Config::load()?;
    let server_addr = config.server_addr;
    if config.crawl.api_url.is_none() {
        tracing::warn!("CRAWL4AI_API_URL is not set; crawl requests will fail");
    }

    let app = create_router(AppState::new(config));

    let listener = TcpListener::bind(server_addr).await?;
    tracing::info!("Listening on {}", server_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("crawl_extract=info,tower_http=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
