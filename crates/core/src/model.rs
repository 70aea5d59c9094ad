//! Datenmodell des Roulette-Kerns
//!
//! Alle Typen sind reine Werte ohne eigene Synchronisation. Die geteilten
//! Strukturen (Registry, Warte-Pool, aktive Matches) liegen in den
//! jeweiligen Service-Crates und kapseln ihren Zugriff selbst.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RouletteError};
use crate::types::{MatchId, MessageId, ReportId, UserId};

/// Startwert der Reputation einer neuen Sitzung
pub const START_REPUTATION: u32 = 100;

/// Erlaubter Altersbereich fuer Profilangaben
pub const MIN_ALTER: u8 = 13;
pub const MAX_ALTER: u8 = 120;

/// Maximale Anzahl Interessen-Tags pro Profil
pub const MAX_INTERESSEN: usize = 20;

/// Laenge der Inhalts-Vorschau in Logs (Zeichen)
pub const VORSCHAU_ZEICHEN: usize = 20;

/// Kuerzt Nachrichteninhalt fuer Log-Ausgaben
///
/// Inhalte werden nie vollstaendig geloggt.
pub fn inhalt_vorschau(inhalt: &str) -> &str {
    match inhalt.char_indices().nth(VORSCHAU_ZEICHEN) {
        Some((ende, _)) => &inhalt[..ende],
        None => inhalt,
    }
}

// ---------------------------------------------------------------------------
// Benutzer-Sitzung
// ---------------------------------------------------------------------------

/// Selbst angegebenes Geschlecht
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Lebenszyklus-Status einer Sitzung
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Online,
    Searching,
    Matched,
    Disconnected,
}

/// Ephemerer Zustand eines verbundenen Teilnehmers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSession {
    pub id: UserId,
    pub username: Option<String>,
    pub gender: Option<Gender>,
    pub age: Option<u8>,
    pub country: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    pub is_premium: bool,
    pub reputation: u32,
    pub status: UserStatus,
    pub joined_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl UserSession {
    /// Erstellt eine neue anonyme Sitzung (Status `online`, Reputation 100)
    pub fn neu(id: UserId) -> Self {
        let jetzt = Utc::now();
        Self {
            id,
            username: None,
            gender: None,
            age: None,
            country: None,
            interests: Vec::new(),
            is_premium: false,
            reputation: START_REPUTATION,
            status: UserStatus::Online,
            joined_at: jetzt,
            last_active: jetzt,
        }
    }

    /// Uebernimmt die gesetzten Felder eines Profil-Updates
    ///
    /// Validiert vor dem Schreiben, bei einem Fehler bleibt die Sitzung unveraendert.
    pub fn profil_anwenden(&mut self, update: ProfileUpdate) -> Result<()> {
        update.validieren()?;

        if let Some(username) = update.username {
            self.username = Some(username);
        }
        if let Some(gender) = update.gender {
            self.gender = Some(gender);
        }
        if let Some(age) = update.age {
            self.age = Some(age);
        }
        if let Some(country) = update.country {
            self.country = Some(country);
        }
        if let Some(interests) = update.interests {
            self.interests = interests;
        }
        self.last_active = Utc::now();
        Ok(())
    }

    /// Zieht Reputation ab (nie unter 0, nie steigend)
    pub fn reputation_abziehen(&mut self, abzug: u32) {
        self.reputation = self.reputation.saturating_sub(abzug);
    }
}

/// Teilaktualisierung der Profilfelder (`user:update`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub interests: Option<Vec<String>>,
}

impl ProfileUpdate {
    /// Prueft Alter und Anzahl der Interessen
    pub fn validieren(&self) -> Result<()> {
        if let Some(age) = self.age {
            if !(MIN_ALTER..=MAX_ALTER).contains(&age) {
                return Err(RouletteError::eingabe(format!(
                    "Alter {age} ausserhalb von {MIN_ALTER}..={MAX_ALTER}"
                )));
            }
        }
        if let Some(interests) = &self.interests {
            if interests.len() > MAX_INTERESSEN {
                return Err(RouletteError::eingabe(format!(
                    "Zu viele Interessen: {} (Maximum: {MAX_INTERESSEN})",
                    interests.len()
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// Gewuenschtes Geschlecht des Gegenuebers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenderFilter {
    Any,
    Male,
    Female,
    Other,
}

impl GenderFilter {
    /// Prueft ob ein (evtl. nicht angegebenes) Geschlecht akzeptiert wird
    ///
    /// Ein konkreter Wunsch wird von einem Gegenueber ohne Angabe nicht erfuellt.
    pub fn akzeptiert(self, gender: Option<Gender>) -> bool {
        let gewuenscht = match self {
            Self::Any => return true,
            Self::Male => Gender::Male,
            Self::Female => Gender::Female,
            Self::Other => Gender::Other,
        };
        gender == Some(gewuenscht)
    }
}

/// Geschlossener Altersbereich `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeRange {
    pub min: u8,
    pub max: u8,
}

impl AgeRange {
    pub fn enthaelt(&self, age: u8) -> bool {
        (self.min..=self.max).contains(&age)
    }
}

/// Einseitiges Kompatibilitaets-Praedikat einer Match-Anfrage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchFilter {
    #[serde(default)]
    pub gender: Option<GenderFilter>,
    #[serde(default)]
    pub age_range: Option<AgeRange>,
    /// Erlaubte Laender (leer = alle)
    #[serde(default, alias = "country")]
    pub countries: Vec<String>,
    /// Mindestens ein gemeinsames Interesse erforderlich (leer = keine Pruefung)
    #[serde(default)]
    pub interests: Vec<String>,
    /// Nur Gegenueber mit Mindest-Reputation
    #[serde(default)]
    pub only_verified: bool,
}

impl MatchFilter {
    /// Weist widerspruechliche Filter ab (z.B. `min > max`)
    pub fn validieren(&self) -> Result<()> {
        if let Some(bereich) = self.age_range {
            if bereich.min > bereich.max {
                return Err(RouletteError::eingabe(format!(
                    "Ungueltiger Altersbereich: {} > {}",
                    bereich.min, bereich.max
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Match
// ---------------------------------------------------------------------------

/// Grund fuer das Ende eines Matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    UserLeft,
    OtherLeft,
    Skip,
    Reported,
}

impl EndReason {
    pub fn als_str(self) -> &'static str {
        match self {
            Self::UserLeft => "user_left",
            Self::OtherLeft => "other_left",
            Self::Skip => "skip",
            Self::Reported => "reported",
        }
    }
}

impl std::fmt::Display for EndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.als_str())
    }
}

/// Bestaetigte Paarung zweier Teilnehmer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    /// Snapshot des anfragenden Teilnehmers
    pub user1: UserSession,
    /// Snapshot des wartenden Teilnehmers
    pub user2: UserSession,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Dauer in Millisekunden, gesetzt beim Beenden
    pub duration_ms: Option<i64>,
    pub end_reason: Option<EndReason>,
}

impl Match {
    /// Erstellt ein neues aktives Match
    pub fn neu(user1: UserSession, user2: UserSession) -> Self {
        Self {
            id: MatchId::new(),
            user1,
            user2,
            started_at: Utc::now(),
            ended_at: None,
            duration_ms: None,
            end_reason: None,
        }
    }

    pub fn ist_aktiv(&self) -> bool {
        self.ended_at.is_none()
    }

    /// Prueft ob ein Benutzer an diesem Match teilnimmt
    pub fn enthaelt(&self, user_id: &UserId) -> bool {
        self.user1.id == *user_id || self.user2.id == *user_id
    }

    /// Gibt die ID des jeweils anderen Teilnehmers zurueck
    pub fn partner_von(&self, user_id: &UserId) -> Option<UserId> {
        if self.user1.id == *user_id {
            Some(self.user2.id)
        } else if self.user2.id == *user_id {
            Some(self.user1.id)
        } else {
            None
        }
    }

    /// Beide Teilnehmer-IDs
    pub fn teilnehmer(&self) -> [UserId; 2] {
        [self.user1.id, self.user2.id]
    }

    /// Setzt Ende, Dauer und Grund
    ///
    /// Gibt `false` zurueck wenn das Match bereits beendet war (keine Aenderung).
    pub fn beenden(&mut self, grund: EndReason, jetzt: DateTime<Utc>) -> bool {
        if !self.ist_aktiv() {
            return false;
        }
        self.ended_at = Some(jetzt);
        self.duration_ms = Some((jetzt - self.started_at).num_milliseconds());
        self.end_reason = Some(grund);
        true
    }
}

// ---------------------------------------------------------------------------
// Nachricht
// ---------------------------------------------------------------------------

/// Nachrichtentyp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    System,
    Emoji,
    Sticker,
}

/// Chat-Zeile innerhalb eines Matches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub match_id: MatchId,
    pub sender_id: UserId,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub message_type: MessageType,
    pub is_read: bool,
}

// ---------------------------------------------------------------------------
// Meldung
// ---------------------------------------------------------------------------

/// Kategorie einer Meldung
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportReason {
    InappropriateContent,
    Harassment,
    Spam,
    Underage,
    Other,
}

/// Bearbeitungsstatus einer Meldung
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    Reviewed,
    ActionTaken,
    Dismissed,
}

/// Beschwerde eines Teilnehmers gegen sein Gegenueber
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub reporter_id: UserId,
    pub reported_user_id: UserId,
    pub match_id: Option<MatchId>,
    pub reason: ReportReason,
    pub description: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub status: ReportStatus,
}

impl Report {
    /// Erstellt eine neue Meldung im Status `pending`
    pub fn neu(
        reporter_id: UserId,
        reported_user_id: UserId,
        match_id: Option<MatchId>,
        reason: ReportReason,
        description: Option<String>,
    ) -> Self {
        Self {
            id: ReportId::new(),
            reporter_id,
            reported_user_id,
            match_id,
            reason,
            description,
            timestamp: Utc::now(),
            status: ReportStatus::Pending,
        }
    }
}
