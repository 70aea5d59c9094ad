//! roulette-core – Gemeinsame Typen, Traits und Fehlertypen
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen Roulette-Crates gemeinsam genutzt werden: IDs, das Datenmodell
//! (Sitzung, Filter, Match, Nachricht, Meldung) und die Schnittstellen zu
//! externen Kollaborateuren (Sperr-Speicher, Profil-Speicher, Telemetrie).

pub mod collaborators;
pub mod error;
pub mod model;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use collaborators::{
    InMemorySperrSpeicher, KeinProfilSpeicher, KeineStatistik, ProfilSpeicher, SperrSpeicher,
    Statistik, StatistikSenke,
};
pub use error::{Result, RouletteError};
pub use model::{
    inhalt_vorschau, AgeRange, EndReason, Gender, GenderFilter, Match, MatchFilter, Message, MessageType,
    ProfileUpdate, Report, ReportReason, ReportStatus, UserSession, UserStatus,
};
pub use types::{MatchId, MessageId, ReportId, UserId};
