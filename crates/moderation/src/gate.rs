//! Moderations-Gate
//!
//! Prueft Chat-Inhalte und Video-Frames, nimmt Meldungen entgegen und loest
//! bei Erreichen der Warnungs-Schwelle genau eine Sperre aus.

use dashmap::{DashMap, DashSet};
use parking_lot::RwLock;
use roulette_core::{inhalt_vorschau, Report, ReportId, SperrSpeicher, UserId};
use std::sync::Arc;

use crate::classifier::{InhaltsKlassifikator, SicherheitsUrteil};
use crate::error::{ModerationError, ModerationResult};

/// Standard-Wortliste
pub const STANDARD_BLOCKIERTE_WOERTER: &[&str] = &["spam", "scam"];

/// Anzahl Warnungen bis zur automatischen Sperre
pub const STANDARD_WARNUNGS_SCHWELLE: u32 = 3;

/// Konfiguration des Gates
#[derive(Debug, Clone)]
pub struct ModerationConfig {
    pub blockierte_woerter: Vec<String>,
    pub warnungs_schwelle: u32,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            blockierte_woerter: STANDARD_BLOCKIERTE_WOERTER
                .iter()
                .map(|w| w.to_string())
                .collect(),
            warnungs_schwelle: STANDARD_WARNUNGS_SCHWELLE,
        }
    }
}

/// Ergebnis einer eingereichten Meldung
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeldungsErgebnis {
    pub report_id: ReportId,
    /// Warnungen des gemeldeten Benutzers nach dieser Meldung
    pub warnungen: u32,
    /// Diese Meldung hat die Sperre ausgeloest
    pub sperre_ausgeloest: bool,
}

fn wort_normalisieren(wort: &str) -> Option<String> {
    let w = wort.trim().to_lowercase();
    (!w.is_empty()).then_some(w)
}

/// Moderations-Gate fuer Inhalte und Meldungen
pub struct ModerationGate {
    woerter: RwLock<Vec<String>>,
    schwelle: u32,
    klassifikator: Option<Arc<dyn InhaltsKlassifikator>>,
    sperr_speicher: Arc<dyn SperrSpeicher>,
    meldungen: DashMap<UserId, Vec<Report>>,
    warnungen: DashMap<UserId, u32>,
    gesperrt: DashSet<UserId>,
}

impl ModerationGate {
    pub fn neu(config: ModerationConfig, sperr_speicher: Arc<dyn SperrSpeicher>) -> Self {
        let mut woerter: Vec<String> = Vec::new();
        for wort in config.blockierte_woerter.iter().filter_map(|w| wort_normalisieren(w)) {
            if !woerter.contains(&wort) {
                woerter.push(wort);
            }
        }

        Self {
            woerter: RwLock::new(woerter),
            schwelle: config.warnungs_schwelle.max(1),
            klassifikator: None,
            sperr_speicher,
            meldungen: DashMap::new(),
            warnungen: DashMap::new(),
            gesperrt: DashSet::new(),
        }
    }

    /// Setzt einen externen Klassifikator
    pub fn mit_klassifikator(mut self, klassifikator: Arc<dyn InhaltsKlassifikator>) -> Self {
        self.klassifikator = Some(klassifikator);
        self
    }

    // -----------------------------------------------------------------------
    // Inhaltspruefung
    // -----------------------------------------------------------------------

    /// Prueft einen Text, `true` = darf weitergeleitet werden
    ///
    /// Fehler des Klassifikators lassen den Inhalt durch.
    pub async fn check_text(&self, inhalt: &str) -> bool {
        let klein = inhalt.to_lowercase();
        let treffer = self
            .woerter
            .read()
            .iter()
            .any(|w| klein.contains(w.as_str()));
        if treffer {
            tracing::warn!(vorschau = %inhalt_vorschau(inhalt), "Blockiertes Wort erkannt");
            return false;
        }

        let Some(klassifikator) = &self.klassifikator else {
            return true;
        };

        match klassifikator.text_pruefen(inhalt).await {
            Ok(urteil) if !urteil.erlaubt() => {
                tracing::warn!(
                    aktion = ?urteil.action,
                    konfidenz = urteil.confidence,
                    "Klassifikator hat Text blockiert"
                );
                false
            }
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(fehler = %e, "Textpruefung fehlgeschlagen, Inhalt wird durchgelassen");
                true
            }
        }
    }

    /// Prueft einen Video-Frame ueber den Klassifikator
    ///
    /// Ohne Klassifikator oder bei Fehlern gilt der Frame als sicher.
    pub async fn check_frame(&self, frame: &[u8]) -> SicherheitsUrteil {
        let Some(klassifikator) = &self.klassifikator else {
            return SicherheitsUrteil::sicher();
        };

        match klassifikator.bild_pruefen(frame).await {
            Ok(urteil) => {
                if !urteil.erlaubt() {
                    tracing::warn!(aktion = ?urteil.action, bytes = frame.len(), "Frame abgelehnt");
                }
                urteil
            }
            Err(e) => {
                tracing::warn!(fehler = %e, "Framepruefung fehlgeschlagen, Frame gilt als sicher");
                SicherheitsUrteil::sicher()
            }
        }
    }

    // -----------------------------------------------------------------------
    // Wortliste
    // -----------------------------------------------------------------------

    /// Fuegt ein Wort hinzu, `false` wenn es schon vorhanden oder leer war
    pub fn wort_hinzufuegen(&self, wort: &str) -> bool {
        let Some(wort) = wort_normalisieren(wort) else {
            return false;
        };
        let mut woerter = self.woerter.write();
        if woerter.contains(&wort) {
            return false;
        }
        tracing::info!(wort = %wort, "Blockiertes Wort hinzugefuegt");
        woerter.push(wort);
        true
    }

    /// Entfernt ein Wort, `false` wenn es nicht vorhanden war
    pub fn wort_entfernen(&self, wort: &str) -> bool {
        let Some(wort) = wort_normalisieren(wort) else {
            return false;
        };
        let mut woerter = self.woerter.write();
        let vorher = woerter.len();
        woerter.retain(|w| *w != wort);
        let entfernt = woerter.len() != vorher;
        if entfernt {
            tracing::info!(wort = %wort, "Blockiertes Wort entfernt");
        }
        entfernt
    }

    pub fn blockierte_woerter(&self) -> Vec<String> {
        self.woerter.read().clone()
    }

    // -----------------------------------------------------------------------
    // Meldungen
    // -----------------------------------------------------------------------

    /// Speichert eine Meldung und erhoeht den Warnungszaehler
    ///
    /// Erreicht der Zaehler genau die Schwelle, wird der Benutzer gesperrt und
    /// der Sperr-Speicher einmal aufgerufen. Fehler des Sperr-Speichers werden
    /// geloggt, die lokale Sperre bleibt bestehen.
    pub async fn file_report(&self, report: Report) -> ModerationResult<MeldungsErgebnis> {
        if report.reporter_id == report.reported_user_id {
            return Err(ModerationError::SelbstMeldung(report.reporter_id));
        }

        let gemeldet = report.reported_user_id;
        let report_id = report.id;

        self.meldungen.entry(gemeldet).or_default().push(report);
        let warnungen = {
            let mut zaehler = self.warnungen.entry(gemeldet).or_insert(0);
            *zaehler += 1;
            *zaehler
        };

        tracing::info!(
            report_id = %report_id,
            gemeldet = %gemeldet,
            warnungen,
            "Meldung gespeichert"
        );

        let sperre_ausgeloest = warnungen == self.schwelle;
        if sperre_ausgeloest {
            self.gesperrt.insert(gemeldet);
            let grund = format!("{warnungen} Meldungen");
            tracing::warn!(user_id = %gemeldet, warnungen, "Benutzer automatisch gesperrt");
            if let Err(e) = self.sperr_speicher.benutzer_sperren(gemeldet, &grund).await {
                tracing::error!(user_id = %gemeldet, fehler = %e, "Sperre konnte nicht gespeichert werden");
            }
        }

        Ok(MeldungsErgebnis {
            report_id,
            warnungen,
            sperre_ausgeloest,
        })
    }

    pub fn ist_gesperrt(&self, user_id: &UserId) -> bool {
        self.gesperrt.contains(user_id)
    }

    /// Alle Meldungen gegen einen Benutzer
    pub fn meldungen_fuer(&self, user_id: &UserId) -> Vec<Report> {
        self.meldungen
            .get(user_id)
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    pub fn meldungen_anzahl(&self, user_id: &UserId) -> usize {
        self.meldungen.get(user_id).map(|m| m.len()).unwrap_or(0)
    }

    pub fn warnungen(&self, user_id: &UserId) -> u32 {
        self.warnungen.get(user_id).map(|w| *w).unwrap_or(0)
    }

    /// Verwirft Meldungen, Warnungen und lokale Sperre eines getrennten Benutzers
    ///
    /// Benutzer-IDs gelten nur fuer eine Verbindung. Ausgeloeste Sperren
    /// liegen bereits im Sperr-Speicher.
    pub fn benutzer_vergessen(&self, user_id: &UserId) {
        let meldungen = self.meldungen.remove(user_id).map(|(_, m)| m.len()).unwrap_or(0);
        self.warnungen.remove(user_id);
        self.gesperrt.remove(user_id);
        if meldungen > 0 {
            tracing::debug!(user_id = %user_id, meldungen, "Meldungen verworfen");
        }
    }
}
