//! Schnittstellen zu externen Kollaborateuren
//!
//! Der Kern spricht nur ueber diese Traits mit der Aussenwelt:
//! - `SperrSpeicher`   – schreibt Sperren wenn die Meldungs-Schwelle erreicht ist
//! - `ProfilSpeicher`  – persistiert Profilfelder (Identitaets-/Profil-Store)
//! - `StatistikSenke`  – nimmt aggregierte Zaehler entgegen (Telemetrie)
//!
//! Fuer Betrieb ohne externe Systeme und fuer Tests gibt es In-Memory- bzw.
//! No-op-Implementierungen.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::UserSession;
use crate::types::UserId;

// ---------------------------------------------------------------------------
// Sperr-Speicher
// ---------------------------------------------------------------------------

/// Externer Ban-/Sperr-Speicher
#[async_trait]
pub trait SperrSpeicher: Send + Sync + 'static {
    /// Schreibt eine Sperre fuer den Benutzer
    async fn benutzer_sperren(&self, user_id: UserId, grund: &str) -> Result<()>;
}

/// Sperr-Speicher im Arbeitsspeicher (Standard ohne externes System)
#[derive(Debug, Default)]
pub struct InMemorySperrSpeicher {
    sperren: Mutex<Vec<(UserId, String)>>,
}

impl InMemorySperrSpeicher {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Anzahl aller geschriebenen Sperren
    pub fn anzahl(&self) -> usize {
        self.sperren.lock().len()
    }

    /// Anzahl der Sperren fuer einen Benutzer
    pub fn sperren_fuer(&self, user_id: &UserId) -> usize {
        self.sperren
            .lock()
            .iter()
            .filter(|(uid, _)| uid == user_id)
            .count()
    }
}

#[async_trait]
impl SperrSpeicher for InMemorySperrSpeicher {
    async fn benutzer_sperren(&self, user_id: UserId, grund: &str) -> Result<()> {
        tracing::info!(user_id = %user_id, grund = grund, "Benutzer gesperrt (in-memory)");
        self.sperren.lock().push((user_id, grund.to_string()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Profil-Speicher
// ---------------------------------------------------------------------------

/// Externer Identitaets-/Profil-Speicher
#[async_trait]
pub trait ProfilSpeicher: Send + Sync + 'static {
    /// Schreibt die aktuellen Profilfelder einer Sitzung
    async fn profil_speichern(&self, sitzung: &UserSession) -> Result<()>;
}

/// Profil-Speicher der nichts persistiert (anonymer Betrieb)
#[derive(Debug, Default, Clone, Copy)]
pub struct KeinProfilSpeicher;

#[async_trait]
impl ProfilSpeicher for KeinProfilSpeicher {
    async fn profil_speichern(&self, _sitzung: &UserSession) -> Result<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Statistik / Telemetrie
// ---------------------------------------------------------------------------

/// Aggregierte Momentaufnahme des Systems
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistik {
    pub online_users: usize,
    pub waiting_users: usize,
    pub active_matches: usize,
}

/// Empfaenger fuer Telemetrie-Daten
///
/// Alle Methoden haben leere Standard-Implementierungen, eine Senke
/// ueberschreibt nur was sie interessiert. Aufrufe erfolgen synchron und
/// duerfen nicht blockieren.
pub trait StatistikSenke: Send + Sync + 'static {
    /// Neue Momentaufnahme nach einer Zustandsaenderung
    fn statistik_aktualisieren(&self, _statistik: &Statistik) {}

    fn match_gebildet(&self) {}

    fn nachricht_weitergeleitet(&self) {}

    fn nachricht_blockiert(&self) {}

    fn meldung_eingegangen(&self) {}

    fn sperre_ausgeloest(&self) {}
}

/// Senke die alles verwirft
#[derive(Debug, Default, Clone, Copy)]
pub struct KeineStatistik;

impl StatistikSenke for KeineStatistik {}
