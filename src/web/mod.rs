//! Operator control surface
//!
//! A small HTTP API next to the scrape loop: liveness, a status snapshot
//! (scrape state plus stored/unannounced counts) and a manual scrape trigger.

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::WebConfig,
    database::Database,
    ingestor::{ScrapeStateManager, ScrapeTriggerSender},
};

pub mod api;

/// Web server configuration and setup
pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(config: &WebConfig, state: AppState) -> Result<Self> {
        let app = create_router(state);
        let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
        Ok(Self { app, addr })
    }

    pub async fn serve(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        axum::serve(listener, self.app).await?;
        Ok(())
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub database: Database,
    pub state_manager: ScrapeStateManager,
    pub trigger_tx: ScrapeTriggerSender,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::health_check))
        .nest("/api/v1", api_v1_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(api::get_status))
        .route("/scrape", post(api::trigger_scrape))
}
