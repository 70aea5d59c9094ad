//! Fehlertypen fuer das Moderations-Gate

use roulette_core::UserId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModerationError {
    /// Ein Benutzer kann sich nicht selbst melden
    #[error("Selbst-Meldung nicht moeglich: {0}")]
    SelbstMeldung(UserId),

    /// Externer Klassifikator nicht erreichbar oder fehlerhaft
    #[error("Klassifikator-Fehler: {0}")]
    Klassifikator(String),
}

pub type ModerationResult<T> = Result<T, ModerationError>;
