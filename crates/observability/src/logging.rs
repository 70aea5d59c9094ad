//! Structured Logging Setup via tracing-subscriber
//!
//! Konfigurierbar per Umgebungsvariable (ueberschreibt die Konfigdatei):
//! - `ROULETTE_LOG_LEVEL`: Filter-Ausdruck (z.B. `info` oder `roulette_signaling=debug`)
//! - `ROULETTE_LOG_FORMAT`: Format (text/json), Standard: text

use tracing_subscriber::{fmt, EnvFilter};

pub const ENV_LOG_LEVEL: &str = "ROULETTE_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "ROULETTE_LOG_FORMAT";

/// Initialisiert das Logging-System
///
/// `level` und `format` stammen aus der Konfiguration und gelten nur wenn
/// die Umgebungsvariablen nicht gesetzt sind.
pub fn logging_initialisieren(level: &str, format: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env(ENV_LOG_LEVEL)
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let ergebnis = match log_format(format).as_str() {
        "json" => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_current_span(true)
            .try_init(),
        _ => fmt().with_env_filter(filter).with_target(true).try_init(),
    };
    ergebnis.map_err(|e| anyhow::anyhow!("Logging bereits initialisiert: {e}"))
}

/// Effektives Log-Format: Umgebung vor Konfiguration, ungueltig -> `text`
pub fn log_format(konfiguriert: &str) -> String {
    let format = std::env::var(ENV_LOG_FORMAT).unwrap_or_else(|_| konfiguriert.to_string());
    if log_format_gueltig(&format) {
        format
    } else {
        "text".to_string()
    }
}

pub fn log_format_gueltig(format: &str) -> bool {
    matches!(format, "text" | "json")
}
