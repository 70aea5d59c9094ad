//! Fehlertypen fuer Roulette
//!
//! Gemeinsamer Fehler-Enum der ueber Crate-Grenzen hinweg transportiert
//! wird. Untermodule definieren eigene Fehler und konvertieren via `#[from]`.

use thiserror::Error;

use crate::types::UserId;

/// Globaler Result-Alias fuer Roulette
pub type Result<T> = std::result::Result<T, RouletteError>;

/// Alle gemeinsamen Fehler im Roulette-System
#[derive(Debug, Error)]
pub enum RouletteError {
    #[error("Benutzer nicht gefunden: {0}")]
    BenutzerNichtGefunden(UserId),

    /// Profil- oder Filterwerte ausserhalb der erlaubten Bereiche
    #[error("Ungueltige Eingabe: {0}")]
    UngueltigeEingabe(String),
}

impl RouletteError {
    /// Erstellt einen Eingabefehler
    pub fn eingabe(msg: impl Into<String>) -> Self {
        Self::UngueltigeEingabe(msg.into())
    }
}
