//! Client-Connection – Verwaltet eine einzelne Verbindung
//!
//! Jede Verbindung bekommt eine `ClientConnection` in einem eigenen
//! tokio-Task. Beim Start wird eine anonyme Sitzung registriert, beim Ende
//! laeuft immer der normale Trennungspfad.
//!
//! ## Ablauf
//! ```text
//! verbinden -> user:connected
//!     |
//!     v
//! select! { Frame | Send-Queue | Keepalive | Timeout | Shutdown }
//!     |
//!     v
//! trennen (Match beenden, Pool verlassen, Sitzung entfernen)
//! ```
//!
//! Schliesst der Broadcaster die Send-Queue (Ueberlauf), endet die
//! Verbindung nachdem die gepufferten Ereignisse geschrieben sind.
//!
//! ## Keepalive
//! - Server sendet alle `keepalive_sek` einen Ping
//! - Kommt `verbindungs_timeout_sek` lang kein Frame, wird getrennt

use futures_util::{SinkExt, StreamExt};
use roulette_core::UserId;
use roulette_protocol::events::{Notification, NotificationKind, PingMessage};
use roulette_protocol::{ClientEvent, ErrorCode, ServerEvent, ServerRohCodec};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::codec::Framed;

use crate::dispatcher::{jetzt_ms, MessageDispatcher};
use crate::server_state::RouletteState;

/// Verarbeitet eine einzelne Client-Verbindung
///
/// Liest Frames als rohes JSON, dekodiert sie selbst zu `ClientEvent` und
/// dispatcht an den `MessageDispatcher`. Unbekannte Ereignisse werden mit
/// `INVALID_REQUEST` beantwortet, die Verbindung bleibt bestehen.
pub struct ClientConnection {
    state: Arc<RouletteState>,
    peer_addr: SocketAddr,
}

impl ClientConnection {
    pub fn neu(state: Arc<RouletteState>, peer_addr: SocketAddr) -> Self {
        Self { state, peer_addr }
    }

    /// Startet die Verarbeitungsschleife
    ///
    /// Laeuft bis der Client trennt, die Verbindung ausfaellt oder ein
    /// Shutdown-Signal eingeht. Gibt die User-ID der Sitzung zurueck.
    pub async fn verarbeiten<S>(self, stream: S, mut shutdown_rx: watch::Receiver<bool>) -> UserId
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let peer_addr = self.peer_addr;
        let config = Arc::clone(&self.state.config);
        let keepalive_intervall = Duration::from_secs(config.keepalive_sek.max(1));
        let timeout_dauer = Duration::from_secs(config.verbindungs_timeout_sek.max(1));

        let user_id = UserId::new();
        let (_, mut sende_rx) = self.state.lifecycle.verbinden(user_id);
        tracing::info!(peer = %peer_addr, user_id = %user_id, "Neue Verbindung");

        let mut framed = Framed::new(stream, ServerRohCodec::with_max_size(config.max_frame_bytes));
        let dispatcher = MessageDispatcher::neu(Arc::clone(&self.state));

        let mut letzter_empfang = Instant::now();
        let mut naechster_ping = Instant::now() + keepalive_intervall;

        loop {
            tokio::select! {
                // Eingehender Frame
                frame = framed.next() => {
                    match frame {
                        Some(Ok(wert)) => {
                            letzter_empfang = Instant::now();
                            let antwort = match serde_json::from_value::<ClientEvent>(wert) {
                                Ok(ereignis) => dispatcher.dispatch(ereignis, user_id).await,
                                Err(e) => {
                                    tracing::debug!(user_id = %user_id, fehler = %e, "Ungueltiges Ereignis");
                                    Some(ServerEvent::fehler(
                                        ErrorCode::InvalidRequest,
                                        format!("Ungueltiges Ereignis: {e}"),
                                    ))
                                }
                            };
                            if let Some(antwort) = antwort {
                                if let Err(e) = framed.send(antwort).await {
                                    tracing::warn!(user_id = %user_id, fehler = %e, "Senden fehlgeschlagen");
                                    break;
                                }
                            }
                        }
                        Some(Err(e)) => {
                            // Nach einem Framing-Fehler ist der Stream nicht mehr synchron
                            tracing::warn!(user_id = %user_id, fehler = %e, "Frame-Lesefehler");
                            let _ = framed
                                .send(ServerEvent::fehler(ErrorCode::InvalidRequest, e.to_string()))
                                .await;
                            break;
                        }
                        None => {
                            tracing::info!(user_id = %user_id, "Verbindung vom Client getrennt");
                            break;
                        }
                    }
                }

                // Ausgehendes Ereignis aus dem Broadcaster
                ausgehend = sende_rx.recv() => {
                    let Some(ausgehend) = ausgehend else {
                        // Queue nach Ueberlauf geschlossen
                        tracing::warn!(user_id = %user_id, "Send-Queue geschlossen, Verbindung wird getrennt");
                        break;
                    };
                    if let Err(e) = framed.send(ausgehend).await {
                        tracing::warn!(user_id = %user_id, fehler = %e, "Zustellung fehlgeschlagen");
                        break;
                    }
                }

                // Stille Verbindung
                _ = tokio::time::sleep_until(letzter_empfang + timeout_dauer) => {
                    tracing::warn!(user_id = %user_id, "Verbindungs-Timeout");
                    break;
                }

                // Keepalive-Ping
                _ = tokio::time::sleep_until(naechster_ping) => {
                    let ping = ServerEvent::Ping(PingMessage { timestamp_ms: jetzt_ms() });
                    if let Err(e) = framed.send(ping).await {
                        tracing::warn!(user_id = %user_id, fehler = %e, "Ping-Senden fehlgeschlagen");
                        break;
                    }
                    naechster_ping = Instant::now() + keepalive_intervall;
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!(user_id = %user_id, "Shutdown-Signal, Verbindung wird getrennt");
                        let abschied = ServerEvent::Notification(Notification {
                            kind: NotificationKind::Warning,
                            title: "Server".into(),
                            message: "Server wird heruntergefahren".into(),
                            duration_ms: None,
                        });
                        let _ = framed.send(abschied).await;
                        break;
                    }
                }
            }
        }

        dispatcher.client_cleanup(&user_id);
        tracing::info!(peer = %peer_addr, user_id = %user_id, "Verbindungs-Task beendet");
        user_id
    }
}
