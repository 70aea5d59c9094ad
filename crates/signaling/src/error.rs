//! Fehlertypen fuer den Signaling-Service

use roulette_chat::ChatError;
use roulette_core::{RouletteError, UserId};
use roulette_matching::MatchingError;
use roulette_moderation::ModerationError;
use thiserror::Error;

/// Fehlertyp fuer den Signaling-Service
#[derive(Debug, Error)]
pub enum SignalingError {
    /// IO-Fehler (TCP, Socket)
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    /// Benutzer ist nicht (mehr) registriert
    #[error("Benutzer nicht gefunden: {0}")]
    BenutzerNichtGefunden(UserId),

    /// Aktion erfordert ein aktives Match
    #[error("Kein aktives Match: {0}")]
    KeinAktivesMatch(UserId),

    /// Benutzer wurde nach zu vielen Meldungen gesperrt
    #[error("Benutzer ist gesperrt: {0}")]
    Gesperrt(UserId),

    /// Inhalt wurde von der Moderation abgelehnt
    #[error("Inhalt blockiert")]
    InhaltBlockiert,

    /// Ungueltige Client-Anfrage
    #[error("Ungueltige Anfrage: {0}")]
    UngueltigeAnfrage(String),

    #[error(transparent)]
    Matching(#[from] MatchingError),

    #[error(transparent)]
    Moderation(#[from] ModerationError),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error(transparent)]
    Kern(#[from] RouletteError),

    /// Interner Fehler
    #[error("Interner Fehler: {0}")]
    Intern(String),
}

impl SignalingError {
    /// Erstellt einen internen Fehler
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }

    /// Erstellt einen Eingabefehler
    pub fn anfrage(msg: impl Into<String>) -> Self {
        Self::UngueltigeAnfrage(msg.into())
    }

    /// Benutzer unbekannt, egal auf welcher Ebene festgestellt
    pub fn ist_benutzer_unbekannt(&self) -> bool {
        matches!(
            self,
            Self::BenutzerNichtGefunden(_)
                | Self::Matching(MatchingError::BenutzerNichtGefunden(_))
                | Self::Kern(RouletteError::BenutzerNichtGefunden(_))
        )
    }
}

/// Result-Typ fuer den Signaling-Service
pub type SignalingResult<T> = Result<T, SignalingError>;
