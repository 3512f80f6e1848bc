use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Result;
use rise_schedule_core::prelude::*;
use tokio::net::TcpListener;

use crate::handlers::{AppState, create_app};

/// Builds the shared state from `SEED_FILE` and `SEED_CREATED_BY`.
pub fn load_state() -> Result<AppState> {
    let practices = match env::var("SEED_FILE") {
        Ok(path) => {
            let practices = load_practices(&path)?;
            tracing::info!("loaded {} practices from {}", practices.len(), path);
            practices
        }
        Err(_) => Practice::defaults(),
    };

    let seed_author =
        env::var("SEED_CREATED_BY").unwrap_or_else(|_| DEFAULT_SEED_AUTHOR.to_string());

    Ok(AppState {
        practices: Arc::new(practices),
        seed_author: Arc::from(seed_author),
    })
}

pub async fn start_server(state: AppState) -> Result<()> {
    let app = create_app(state);

    let port = env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()
        .unwrap_or(3000);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!("Rise Schedule Server starting on {}", addr);

    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
