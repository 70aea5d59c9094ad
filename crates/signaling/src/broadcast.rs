//! Event-Broadcaster – Stellt Server-Ereignisse an einzelne Clients zu
//!
//! Jeder verbundene Client hat eine begrenzte Send-Queue. Zustellung ist
//! hoechstens einmal (kein Retry, kein Replay).
//!
//! Bei voller Queue entscheidet die Art des Ereignisses:
//! - fluechtige Ereignisse (Tippen, Signale, Statistik) werden verworfen
//! - alle anderen (z.B. `match:ended`) schliessen die Queue des Clients.
//!   Seine Verbindung endet dann ueber den normalen Trennungspfad, ein
//!   Client kann also nie einen Zustandswechsel verpassen und weiterlaufen.

use dashmap::DashMap;
use roulette_core::UserId;
use roulette_protocol::ServerEvent;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Standard-Groesse der Send-Queue pro Client
pub const STANDARD_SEND_QUEUE: usize = 64;

// ---------------------------------------------------------------------------
// ClientSender
// ---------------------------------------------------------------------------

/// Ergebnis eines Einreihungsversuchs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zustellung {
    Eingereiht,
    /// Fluechtiges Ereignis bei voller Queue verworfen
    Verworfen,
    /// Queue voll bei zustandsrelevantem Ereignis, Client wird getrennt
    Ueberlauf,
    /// Client bereits getrennt
    Geschlossen,
}

/// Handle auf die Send-Queue eines verbundenen Clients
#[derive(Clone, Debug)]
pub struct ClientSender {
    pub user_id: UserId,
    pub tx: mpsc::Sender<ServerEvent>,
}

impl ClientSender {
    /// Reiht ein Ereignis nicht-blockierend ein
    pub fn senden(&self, ereignis: ServerEvent) -> Zustellung {
        let name = ereignis.name();
        let verwerfbar = ereignis.ist_verwerfbar();
        match self.tx.try_send(ereignis) {
            Ok(()) => Zustellung::Eingereiht,
            Err(mpsc::error::TrySendError::Full(_)) if verwerfbar => {
                tracing::debug!(user_id = %self.user_id, ereignis = name, "Send-Queue voll, Ereignis verworfen");
                Zustellung::Verworfen
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(user_id = %self.user_id, ereignis = name, "Send-Queue uebergelaufen, Client wird getrennt");
                Zustellung::Ueberlauf
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(user_id = %self.user_id, ereignis = name, "Send-Queue geschlossen (Client getrennt)");
                Zustellung::Geschlossen
            }
        }
    }
}

// ---------------------------------------------------------------------------
// EventBroadcaster
// ---------------------------------------------------------------------------

/// Zustellung von Ereignissen an verbundene Clients
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct EventBroadcaster {
    inner: Arc<EventBroadcasterInner>,
}

struct EventBroadcasterInner {
    clients: DashMap<UserId, ClientSender>,
    queue_groesse: usize,
}

impl EventBroadcaster {
    pub fn neu() -> Self {
        Self::mit_queue_groesse(STANDARD_SEND_QUEUE)
    }

    pub fn mit_queue_groesse(queue_groesse: usize) -> Self {
        Self {
            inner: Arc::new(EventBroadcasterInner {
                clients: DashMap::new(),
                queue_groesse: queue_groesse.max(1),
            }),
        }
    }

    /// Registriert einen Client und gibt seine Empfangs-Queue zurueck
    ///
    /// Die `ClientConnection` liest aus dieser Queue und schreibt auf den Socket.
    pub fn client_registrieren(&self, user_id: UserId) -> mpsc::Receiver<ServerEvent> {
        let (tx, rx) = mpsc::channel(self.inner.queue_groesse);
        self.inner.clients.insert(user_id, ClientSender { user_id, tx });
        tracing::debug!(user_id = %user_id, "Client im Broadcaster registriert");
        rx
    }

    pub fn client_entfernen(&self, user_id: &UserId) {
        if self.inner.clients.remove(user_id).is_some() {
            tracing::debug!(user_id = %user_id, "Client aus Broadcaster entfernt");
        }
    }

    /// Sendet ein Ereignis an einen einzelnen Client
    ///
    /// Gibt `true` zurueck wenn der Client gefunden und das Ereignis eingereiht wurde.
    /// Bei einem Ueberlauf wird der Sender entfernt; die Verbindung liest noch
    /// den Rest ihrer Queue und endet dann.
    pub fn an_user_senden(&self, user_id: &UserId, ereignis: ServerEvent) -> bool {
        let zustellung = match self.inner.clients.get(user_id) {
            Some(sender) => sender.senden(ereignis),
            None => {
                tracing::debug!(user_id = %user_id, ereignis = ereignis.name(), "Senden an unbekannten Client");
                return false;
            }
        };
        // Der DashMap-Eintrag ist hier wieder freigegeben
        if zustellung == Zustellung::Ueberlauf {
            self.client_entfernen(user_id);
        }
        zustellung == Zustellung::Eingereiht
    }

    /// Sendet ein fluechtiges Ereignis an alle verbundenen Clients
    ///
    /// Gibt die Anzahl der Clients zurueck bei denen es eingereiht wurde.
    pub fn an_alle_senden(&self, ereignis: &ServerEvent) -> usize {
        let empfaenger: Vec<UserId> = self.inner.clients.iter().map(|e| *e.key()).collect();
        empfaenger
            .iter()
            .filter(|id| self.an_user_senden(id, ereignis.clone()))
            .count()
    }

    pub fn client_anzahl(&self) -> usize {
        self.inner.clients.len()
    }

    pub fn ist_registriert(&self, user_id: &UserId) -> bool {
        self.inner.clients.contains_key(user_id)
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
