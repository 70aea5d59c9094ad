//! roulette-moderation – Moderations-Gate fuer Chat-Inhalte und Meldungen
//!
//! Jede Nachricht passiert das Gate bevor sie gespeichert oder weitergeleitet
//! wird. Basis ist eine Wortliste (Teilstring, ohne Gross-/Kleinschreibung),
//! optional ergaenzt durch einen externen Klassifikator. Fehler im
//! Pruefpfad lassen Inhalte durch (fail open).
//!
//! Meldungen sammeln sich pro gemeldetem Benutzer. Beim Erreichen der
//! Warnungs-Schwelle wird genau einmal eine Sperre ausgeloest.

pub mod classifier;
pub mod error;
pub mod gate;

pub use classifier::{EmpfohleneAktion, InhaltsKlassifikator, Kategorien, SicherheitsUrteil};
pub use error::{ModerationError, ModerationResult};
pub use gate::{MeldungsErgebnis, ModerationConfig, ModerationGate};
