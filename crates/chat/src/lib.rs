//! roulette-chat – Nachrichtenspeicher der Match-Chats
//!
//! Nachrichten existieren nur im Arbeitsspeicher und nur solange das Match
//! besteht. Zusaetzlich entfernt eine periodische Bereinigung alle Matches
//! deren neueste Nachricht aelter als die Aufbewahrungsdauer ist.
//!
//! Moderation und Zustellung passieren ausserhalb: der Speicher sieht nur
//! bereits freigegebene Inhalte.

pub mod error;
pub mod service;


// Bequeme Re-Exporte
pub use error::{ChatError, ChatResult};
pub use service::{ChatConfig, ChatService};
