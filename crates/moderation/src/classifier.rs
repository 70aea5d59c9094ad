//! Schnittstelle zum externen Inhalts-Klassifikator
//!
//! Ein Klassifikator liefert fuer Text oder Bilddaten ein Sicherheitsurteil
//! mit Konfidenzwerten pro Kategorie und einer empfohlenen Aktion.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ModerationResult;

/// Empfohlene Reaktion auf einen Inhalt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmpfohleneAktion {
    Allow,
    Warn,
    Block,
    Report,
}

/// Konfidenz pro Kategorie (0.0 bis 1.0)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Kategorien {
    pub adult: f32,
    pub violence: f32,
    pub hate: f32,
    pub self_harm: f32,
}

/// Ergebnis einer Klassifikation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SicherheitsUrteil {
    pub is_safe: bool,
    pub confidence: f32,
    pub categories: Kategorien,
    pub action: EmpfohleneAktion,
}

impl SicherheitsUrteil {
    /// Urteil fuer unbedenkliche Inhalte (auch Fallback bei Fehlern)
    pub fn sicher() -> Self {
        Self {
            is_safe: true,
            confidence: 1.0,
            categories: Kategorien::default(),
            action: EmpfohleneAktion::Allow,
        }
    }

    /// Ob der Inhalt weitergeleitet werden darf
    ///
    /// `warn` laesst den Inhalt durch, `block` und `report` nicht.
    pub fn erlaubt(&self) -> bool {
        self.is_safe && matches!(self.action, EmpfohleneAktion::Allow | EmpfohleneAktion::Warn)
    }
}

/// Externer Klassifikator fuer Text- und Bildinhalte
#[async_trait]
pub trait InhaltsKlassifikator: Send + Sync + 'static {
    async fn text_pruefen(&self, inhalt: &str) -> ModerationResult<SicherheitsUrteil>;

    async fn bild_pruefen(&self, frame: &[u8]) -> ModerationResult<SicherheitsUrteil>;
}
