//! Fehlertypen fuer das Chat-Crate

use thiserror::Error;

/// Chat-Fehlertypen
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Ungueltige Eingabe: {0}")]
    UngueltigeEingabe(String),

    #[error("Nachricht zu lang: {laenge} Zeichen (Maximum: {max})")]
    ZuLang { laenge: usize, max: usize },
}

pub type ChatResult<T> = Result<T, ChatError>;
