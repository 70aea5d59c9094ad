//! roulette-signaling – TCP-Verbindungen, Match-Lebenszyklus und Relays
//!
//! ## Architektur
//!
//! ```text
//! TCP Listener (SignalingServer)
//!     |
//!     v
//! ClientConnection (pro Verbindung ein Task)
//!     |
//!     v
//! MessageDispatcher  (einzige Stelle fuer Fehler -> ErrorCode)
//!     |
//!     +-- MatchHandler   (start, skip, end)
//!     +-- ChatHandler    (send, typing, read)
//!     +-- SignalHandler  (offer, answer, ice)
//!     +-- UserHandler    (update, report, block, stats)
//!
//! LifecycleController – Alle Match-Uebergaenge unter einem Guard
//! EventBroadcaster    – Begrenzte Send-Queue pro Benutzer
//! ```

pub mod broadcast;
pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod server_state;
pub mod tcp;

// Bequeme Re-Exporte
pub use broadcast::EventBroadcaster;
pub use connection::ClientConnection;
pub use dispatcher::MessageDispatcher;
pub use error::{SignalingError, SignalingResult};
pub use lifecycle::{LifecycleController, StartErgebnis};
pub use server_state::{Kollaborateure, RouletteState, SignalingConfig};
pub use tcp::SignalingServer;
