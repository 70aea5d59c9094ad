//! Roulette Server – Einstiegspunkt
//!
//! Laedt die Konfiguration, initialisiert das Logging und startet den Server.

use anyhow::Result;
use roulette_server::{config::ServerConfig, config::ENV_CONFIG, Server};

#[tokio::main]
async fn main() -> Result<()> {
    let config_pfad = std::env::var(ENV_CONFIG).unwrap_or_else(|_| "config.toml".into());
    let config = ServerConfig::laden(&config_pfad)?;

    roulette_observability::logging_initialisieren(&config.logging.level, &config.logging.format)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        "Roulette Server wird initialisiert"
    );

    Server::neu(config).starten().await
}
