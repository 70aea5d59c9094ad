//! Roulette Server – Zusammenbau aller Komponenten
//!
//! Erstellt den gemeinsamen Zustand, startet den TCP Signaling-Server,
//! den Observability-Server und die periodische Wartung. Alle Tasks
//! haengen an einem gemeinsamen Shutdown-Signal.

pub mod config;

use anyhow::Result;
use config::ServerConfig;
use roulette_observability::{observability_server_starten, HealthState, RouletteMetriken};
use roulette_signaling::{Kollaborateure, RouletteState, SignalingServer};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;

/// Der Roulette-Server
pub struct Server {
    config: ServerConfig,
}

impl Server {
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet den Server und laeuft bis Ctrl+C
    pub async fn starten(self) -> Result<()> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Shutdown-Signal empfangen"),
                Err(e) => tracing::error!(fehler = %e, "Signal-Handler fehlgeschlagen"),
            }
            let _ = shutdown_tx.send(true);
        });

        self.laufen(shutdown_rx).await
    }

    /// Laeuft bis `shutdown_rx` ein `true`-Signal empfaengt
    ///
    /// Gibt erst zurueck wenn alle Verbindungen und Hintergrund-Tasks
    /// beendet sind.
    pub async fn laufen(self, mut shutdown_rx: watch::Receiver<bool>) -> Result<()> {
        let metriken = RouletteMetriken::neu()?;
        let health = HealthState::neu(Some(metriken.clone()));

        let state = RouletteState::neu(
            self.config.signaling_config(),
            Kollaborateure {
                statistik: Arc::new(metriken.clone()),
                ..Default::default()
            },
        );

        // Internes Signal: wird auch gesetzt wenn ein Task vorzeitig endet
        let (stopp_tx, stopp_rx) = watch::channel(false);
        let tcp_addr: SocketAddr = self.config.tcp_bind_adresse().parse()?;
        let mut tasks = JoinSet::new();

        let signaling = SignalingServer::neu(Arc::clone(&state), tcp_addr);
        let rx = stopp_rx.clone();
        tasks.spawn(async move { signaling.starten(rx).await.map_err(anyhow::Error::from) });

        if self.config.observability.aktiviert {
            let obs_addr: SocketAddr = self.config.observability_bind_adresse().parse()?;
            let rx = stopp_rx.clone();
            let (m, h) = (metriken.clone(), health.clone());
            tasks.spawn(async move { observability_server_starten(obs_addr, m, h, rx).await });
        }

        let rx = stopp_rx.clone();
        let intervall = self.config.bereinigung_intervall();
        let wartungs_state = Arc::clone(&state);
        tasks.spawn(async move {
            wartung(wartungs_state, intervall, rx).await;
            Ok(())
        });

        health.bereit_setzen(true);
        tracing::info!(
            name = %self.config.server.name,
            tcp = %tcp_addr,
            observability = self.config.observability.aktiviert,
            "Roulette Server bereit"
        );

        let mut fehler = None;
        tokio::select! {
            _ = shutdown_abwarten(&mut shutdown_rx) => {}
            Some(ergebnis) = tasks.join_next() => {
                fehler = task_fehler(ergebnis);
            }
        }

        health.bereit_setzen(false);
        tracing::info!("Server wird heruntergefahren");
        let _ = stopp_tx.send(true);

        while let Some(ergebnis) = tasks.join_next().await {
            if let Some(e) = task_fehler(ergebnis) {
                fehler.get_or_insert(e);
            }
        }

        tracing::info!("Server gestoppt");
        match fehler {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

async fn shutdown_abwarten(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow() {
        if rx.changed().await.is_err() {
            return;
        }
    }
}

fn task_fehler(ergebnis: Result<Result<()>, tokio::task::JoinError>) -> Option<anyhow::Error> {
    match ergebnis {
        Ok(Ok(())) => None,
        Ok(Err(e)) => {
            tracing::error!(fehler = %e, "Server-Task fehlgeschlagen");
            Some(e)
        }
        Err(e) if e.is_cancelled() => None,
        Err(e) => {
            tracing::error!(fehler = %e, "Server-Task abgestuerzt");
            Some(anyhow::anyhow!("Server-Task abgestuerzt: {e}"))
        }
    }
}

/// Periodische Wartung: alte Nachrichten und verfallene Pool-Eintraege
pub async fn wartung(
    state: Arc<RouletteState>,
    intervall: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(intervall);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // Der erste Tick kommt sofort
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let nachrichten = state.chat.bereinigen();
                let wartende = state.lifecycle.veraltete_entfernen();
                if nachrichten > 0 || wartende > 0 {
                    tracing::debug!(
                        matches = nachrichten,
                        wartende = wartende,
                        "Wartung abgeschlossen"
                    );
                }
                state.lifecycle.statistik_melden();
            }
            _ = shutdown_abwarten(&mut shutdown_rx) => break,
        }
    }
    tracing::debug!("Wartung beendet");
}
