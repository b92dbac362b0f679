//! HTTP surface over [`RepairCheckService`].
//!
//! Routes:
//! - `GET /health`
//! - `GET /devices`
//! - `GET /devices/{id}/repair-check`

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode as HttpStatus,
    routing::get,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::model::{DeviceView, RepairCheck, StatusCode};
use crate::service::RepairCheckService;

pub fn router(service: Arc<RepairCheckService>) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/devices", get(list_devices))
        .route("/devices/{id}/repair-check", get(repair_check))
        .with_state(service)
}

/// Serve the API on an already bound listener until the future is dropped or fails.
pub async fn serve(listener: TcpListener, service: Arc<RepairCheckService>) -> Result<()> {
    let addr = listener.local_addr().context("Failed to read listener address")?;
    info!(%addr, "Serving device weather API");
    axum::serve(listener, router(service)).await.context("HTTP server failed")
}

// GET /devices
async fn list_devices(State(service): State<Arc<RepairCheckService>>) -> Json<Vec<DeviceView>> {
    Json(service.list_devices())
}

// GET /devices/{id}/repair-check
async fn repair_check(
    State(service): State<Arc<RepairCheckService>>,
    Path(id): Path<String>,
) -> (HttpStatus, Json<RepairCheck>) {
    let check = service.check_repair_feasibility(&id).await;
    (http_status(check.status), Json(check))
}

fn http_status(status: StatusCode) -> HttpStatus {
    match status {
        StatusCode::Ok => HttpStatus::OK,
        StatusCode::DeviceNotFound => HttpStatus::NOT_FOUND,
        StatusCode::ProviderUnavailable => HttpStatus::BAD_GATEWAY,
    }
}
