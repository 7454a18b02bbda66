use axum::{extract::State, http::StatusCode, response::Json};
use serde::Serialize;
use serde_json::json;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{error, info, warn};

use super::AppState;
use crate::ingestor::ScrapeState;
use crate::models::{JobCounts, ProcessingTrigger};

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub version: &'static str,
    pub scrape: ScrapeState,
    pub jobs: JobCounts,
}

#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub accepted: bool,
    pub message: String,
}

pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn get_status(
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, StatusCode> {
    let jobs = match state.database.job_counts().await {
        Ok(counts) => counts,
        Err(e) => {
            error!("Failed to count stored jobs: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    Ok(Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION"),
        scrape: state.state_manager.snapshot().await,
        jobs,
    }))
}

/// Queue a manual scrape. Requests made while one is already queued are
/// folded into it.
pub async fn trigger_scrape(
    State(state): State<AppState>,
) -> (StatusCode, Json<TriggerResponse>) {
    let running = state.state_manager.is_running().await;

    match state.trigger_tx.try_send(ProcessingTrigger::Manual) {
        Ok(()) | Err(TrySendError::Full(_)) => {
            info!("Manual scrape requested");
            let message = if running {
                "A scrape is running; another will follow it".to_string()
            } else {
                "Scrape queued".to_string()
            };
            (
                StatusCode::ACCEPTED,
                Json(TriggerResponse {
                    accepted: true,
                    message,
                }),
            )
        }
        Err(TrySendError::Closed(_)) => {
            warn!("Manual scrape requested but the scheduler is not running");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(TriggerResponse {
                    accepted: false,
                    message: "Scheduler is not running".to_string(),
                }),
            )
        }
    }
}
