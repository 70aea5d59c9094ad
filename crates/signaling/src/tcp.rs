//! TCP-Listener – Bindet Socket, akzeptiert Verbindungen
//!
//! Der `SignalingServer` akzeptiert Verbindungen und startet fuer jede
//! einen eigenen tokio-Task mit einer `ClientConnection`. Beim Shutdown
//! wartet er bis alle Verbindungen ihren Trennungspfad durchlaufen haben.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::connection::ClientConnection;
use crate::server_state::RouletteState;

/// TCP-Signaling-Server
pub struct SignalingServer {
    state: Arc<RouletteState>,
    bind_addr: SocketAddr,
}

impl SignalingServer {
    pub fn neu(state: Arc<RouletteState>, bind_addr: SocketAddr) -> Self {
        Self { state, bind_addr }
    }

    /// Bindet den Socket und akzeptiert Verbindungen
    ///
    /// Laeuft bis `shutdown_rx` ein `true`-Signal empfaengt.
    pub async fn starten(self, shutdown_rx: watch::Receiver<bool>) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.bind_addr).await?;
        self.starten_mit_listener(listener, shutdown_rx).await
    }

    /// Wie `starten`, mit bereits gebundenem Listener
    pub async fn starten_mit_listener(
        self,
        listener: TcpListener,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> std::io::Result<()> {
        let lokale_addr = listener.local_addr()?;
        tracing::info!(
            adresse = %lokale_addr,
            server = %self.state.config.server_name,
            "TCP Signaling-Server gestartet"
        );

        let mut verbindungen = JoinSet::new();

        loop {
            tokio::select! {
                ergebnis = listener.accept() => {
                    match ergebnis {
                        Ok((stream, peer_addr)) => {
                            let online = self.state.registry.online_anzahl();
                            if online >= self.state.config.max_clients as usize {
                                tracing::warn!(
                                    peer = %peer_addr,
                                    max = self.state.config.max_clients,
                                    "Server voll, Verbindung abgelehnt"
                                );
                                drop(stream);
                                continue;
                            }

                            if let Err(e) = stream.set_nodelay(true) {
                                tracing::debug!(peer = %peer_addr, fehler = %e, "TCP_NODELAY nicht gesetzt");
                            }

                            let verbindung = ClientConnection::neu(Arc::clone(&self.state), peer_addr);
                            let shutdown_rx_clone = shutdown_rx.clone();
                            verbindungen.spawn(async move {
                                verbindung.verarbeiten(stream, shutdown_rx_clone).await
                            });
                        }
                        Err(e) => {
                            tracing::error!(fehler = %e, "TCP-Accept-Fehler");
                            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                        }
                    }
                }

                // Beendete Verbindungs-Tasks einsammeln
                Some(beendet) = verbindungen.join_next() => {
                    if let Err(e) = beendet {
                        tracing::error!(fehler = %e, "Verbindungs-Task abgebrochen");
                    }
                }

                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!("Signaling-Server: Shutdown-Signal empfangen");
                        break;
                    }
                }
            }
        }

        // Jede Verbindung sieht dasselbe Signal und trennt sich selbst
        let offen = verbindungen.len();
        if offen > 0 {
            tracing::info!(verbindungen = offen, "Warte auf offene Verbindungen");
        }
        while let Some(beendet) = verbindungen.join_next().await {
            if let Err(e) = beendet {
                tracing::error!(fehler = %e, "Verbindungs-Task abgebrochen");
            }
        }

        tracing::info!("TCP Signaling-Server gestoppt");
        Ok(())
    }

    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
