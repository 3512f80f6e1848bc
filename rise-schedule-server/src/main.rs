mod handlers;
mod server;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rise_schedule_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let state = match server::load_state() {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to load seed practices: {}", e);
            return Err(e);
        }
    };

    server::start_server(state).await
}
