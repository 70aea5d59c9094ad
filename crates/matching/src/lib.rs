//! roulette-matching – Sitzungs-Registry und Matching-Engine
//!
//! ## Architektur
//!
//! ```text
//! SessionRegistry  – Wer ist verbunden, mit welchem Profil und Status
//!     (DashMap, pro Benutzer ein Eintrag)
//!
//! MatchingEngine   – Warte-Pool + aktive Matches + gegenseitige Ausschluesse
//!     (ein parking_lot::Mutex, kurze Scan-und-Mutations-Abschnitte)
//!
//! filter           – Einseitige Filterpruefung, bidirektional kombiniert
//! ```

pub mod engine;
pub mod error;
pub mod filter;
pub mod registry;

// Bequeme Re-Exporte
pub use engine::{MatchingConfig, MatchingEngine};
pub use error::{MatchingError, MatchingResult};
pub use filter::{filter_erfuellt, kompatibel, MIN_REPUTATION_VERIFIZIERT};
pub use registry::SessionRegistry;
