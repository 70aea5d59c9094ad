//! Handler fuer alle Client-Ereignisse
//!
//! Jeder Handler ist fuer einen Ereignisbereich zustaendig und hat Zugriff
//! auf den gemeinsamen `RouletteState`. Fehler werden nicht selbst gemeldet,
//! die Abbildung auf Fehler-Codes macht der Dispatcher.

pub mod chat_handler;
pub mod match_handler;
pub mod signal_handler;
pub mod user_handler;
