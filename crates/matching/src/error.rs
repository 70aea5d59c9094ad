//! Fehlertypen fuer Registry und Matching-Engine

use roulette_core::{RouletteError, UserId};
use thiserror::Error;

/// Fehlertyp fuer das Matching
///
/// "Kein Partner gefunden" ist kein Fehler sondern `Ok(None)`.
#[derive(Debug, Error)]
pub enum MatchingError {
    /// Benutzer ist nicht (mehr) in der Registry
    #[error("Benutzer nicht gefunden: {0}")]
    BenutzerNichtGefunden(UserId),

    /// Benutzer ist bereits Teil eines aktiven Matches
    #[error("Benutzer ist bereits in einem aktiven Match: {0}")]
    BereitsImMatch(UserId),

    /// Filter ist in sich widerspruechlich
    #[error("Ungueltiger Filter: {0}")]
    UngueltigerFilter(String),

    #[error(transparent)]
    Kern(#[from] RouletteError),
}

/// Result-Typ fuer das Matching
pub type MatchingResult<T> = Result<T, MatchingError>;
