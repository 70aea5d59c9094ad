//! Prometheus-kompatible Metriken fuer Roulette
//!
//! Registrierte Metriken:
//! - `roulette_online_users` – Gauge: Verbundene Sitzungen
//! - `roulette_waiting_users` – Gauge: Eintraege im Warte-Pool
//! - `roulette_active_matches` – Gauge: Aktive Matches
//! - `roulette_matches_total` – Counter: Gebildete Matches
//! - `roulette_messages_relayed_total` – Counter: Zugestellte Nachrichten
//! - `roulette_messages_blocked_total` – Counter: Von der Moderation blockiert
//! - `roulette_reports_total` – Counter: Eingegangene Meldungen
//! - `roulette_suspensions_total` – Counter: Ausgeloeste Sperren
//! - `roulette_http_requests_total` – Counter: HTTP-Anfragen (method, path, status)
//! - `roulette_http_request_duration_seconds` – Histogram: HTTP-Antwortzeit

use anyhow::Result;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use roulette_core::{Statistik, StatistikSenke};
use std::sync::Arc;

/// Alle Roulette-Prometheus-Metriken
#[derive(Clone)]
pub struct RouletteMetriken {
    pub registry: Arc<Registry>,

    // Momentaufnahme
    pub online_users: IntGauge,
    pub waiting_users: IntGauge,
    pub active_matches: IntGauge,

    // Ereignisse
    pub matches_total: IntCounter,
    pub messages_relayed_total: IntCounter,
    pub messages_blocked_total: IntCounter,
    pub reports_total: IntCounter,
    pub suspensions_total: IntCounter,

    // HTTP
    pub http_requests_total: IntCounterVec,
    pub http_request_duration_seconds: HistogramVec,
}

fn gauge(registry: &Registry, name: &str, hilfe: &str) -> Result<IntGauge> {
    let g = IntGauge::with_opts(Opts::new(name, hilfe))?;
    registry.register(Box::new(g.clone()))?;
    Ok(g)
}

fn zaehler(registry: &Registry, name: &str, hilfe: &str) -> Result<IntCounter> {
    let c = IntCounter::with_opts(Opts::new(name, hilfe))?;
    registry.register(Box::new(c.clone()))?;
    Ok(c)
}

impl RouletteMetriken {
    /// Erstellt und registriert alle Metriken in einer neuen Registry
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        let online_users = gauge(&registry, "roulette_online_users", "Verbundene Sitzungen")?;
        let waiting_users = gauge(&registry, "roulette_waiting_users", "Wartende Teilnehmer")?;
        let active_matches = gauge(&registry, "roulette_active_matches", "Aktive Matches")?;

        let matches_total = zaehler(&registry, "roulette_matches_total", "Gebildete Matches")?;
        let messages_relayed_total = zaehler(
            &registry,
            "roulette_messages_relayed_total",
            "An den Partner zugestellte Nachrichten",
        )?;
        let messages_blocked_total = zaehler(
            &registry,
            "roulette_messages_blocked_total",
            "Von der Moderation blockierte Nachrichten",
        )?;
        let reports_total = zaehler(&registry, "roulette_reports_total", "Eingegangene Meldungen")?;
        let suspensions_total =
            zaehler(&registry, "roulette_suspensions_total", "Ausgeloeste Sperren")?;

        let http_requests_total = IntCounterVec::new(
            Opts::new("roulette_http_requests_total", "Gesamtanzahl HTTP-Anfragen"),
            &["method", "path", "status"],
        )?;
        registry.register(Box::new(http_requests_total.clone()))?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "roulette_http_request_duration_seconds",
                "HTTP-Antwortzeit in Sekunden",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
            &["method", "path"],
        )?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;

        // Prozess-Metriken (CPU, RSS, offene FDs) nur wo /proc existiert
        #[cfg(target_os = "linux")]
        registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        Ok(Self {
            registry: Arc::new(registry),
            online_users,
            waiting_users,
            active_matches,
            matches_total,
            messages_relayed_total,
            messages_blocked_total,
            reports_total,
            suspensions_total,
            http_requests_total,
            http_request_duration_seconds,
        })
    }

    /// Exportiert alle Metriken im Prometheus-Textformat
    pub fn exportieren(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

fn als_i64(wert: usize) -> i64 {
    i64::try_from(wert).unwrap_or(i64::MAX)
}

impl StatistikSenke for RouletteMetriken {
    fn statistik_aktualisieren(&self, statistik: &Statistik) {
        self.online_users.set(als_i64(statistik.online_users));
        self.waiting_users.set(als_i64(statistik.waiting_users));
        self.active_matches.set(als_i64(statistik.active_matches));
    }

    fn match_gebildet(&self) {
        self.matches_total.inc();
    }

    fn nachricht_weitergeleitet(&self) {
        self.messages_relayed_total.inc();
    }

    fn nachricht_blockiert(&self) {
        self.messages_blocked_total.inc();
    }

    fn meldung_eingegangen(&self) {
        self.reports_total.inc();
    }

    fn sperre_ausgeloest(&self) {
        self.suspensions_total.inc();
    }
}

/// Axum-Router fuer den `/metrics`-Endpunkt
pub fn metrics_router(metriken: RouletteMetriken) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metriken)
}

async fn metrics_handler(State(metriken): State<RouletteMetriken>) -> impl IntoResponse {
    match metriken.exportieren() {
        Ok(text) => (
            StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Metriken-Export fehlgeschlagen: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
