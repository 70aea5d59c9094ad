//! Health-Check-Endpunkt fuer Roulette
//!
//! Endpoint: `GET /health`
//! Response: JSON mit Status, Version, Uptime und verbundenen Sitzungen.
//! Waehrend des Shutdowns antwortet der Endpunkt mit 503.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::metrics::RouletteMetriken;

/// Status des Health-Checks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Antwort des Health-Check-Endpunkts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub online_users: i64,
    pub timestamp: DateTime<Utc>,
}

/// Geteilter Zustand fuer den Health-Check-Handler
#[derive(Clone)]
pub struct HealthState {
    start_time: Arc<Instant>,
    bereit: Arc<AtomicBool>,
    metriken: Option<RouletteMetriken>,
}

impl HealthState {
    pub fn neu(metriken: Option<RouletteMetriken>) -> Self {
        Self {
            start_time: Arc::new(Instant::now()),
            bereit: Arc::new(AtomicBool::new(true)),
            metriken,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn ist_bereit(&self) -> bool {
        self.bereit.load(Ordering::Relaxed)
    }

    /// Wird beim Shutdown auf `false` gesetzt
    pub fn bereit_setzen(&self, bereit: bool) {
        self.bereit.store(bereit, Ordering::Relaxed);
    }

    fn antwort(&self) -> (StatusCode, HealthResponse) {
        let status = if self.ist_bereit() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        };
        let http_status = match status {
            HealthStatus::Healthy => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        };
        let response = HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.uptime_seconds(),
            online_users: self
                .metriken
                .as_ref()
                .map(|m| m.online_users.get())
                .unwrap_or_default(),
            timestamp: Utc::now(),
        };
        (http_status, response)
    }
}

/// Axum-Router fuer den `/health`-Endpunkt
pub fn health_router(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(state)
}

async fn health_handler(State(state): State<HealthState>) -> impl IntoResponse {
    let (http_status, response) = state.antwort();
    (http_status, Json(response))
}
