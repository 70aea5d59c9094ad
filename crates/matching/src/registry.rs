//! Sitzungs-Registry – Wer ist verbunden, mit welchem Profil und Status
//!
//! Haelt pro verbundenem Teilnehmer genau eine `UserSession`. Die Registry
//! ist die einzige Quelle fuer Profil, Reputation und Status. Die
//! Matching-Engine arbeitet mit Snapshots daraus.

use chrono::Utc;
use dashmap::DashMap;
use roulette_core::{MatchFilter, ProfileUpdate, UserId, UserSession, UserStatus};
use std::sync::Arc;

use crate::error::{MatchingError, MatchingResult};

/// Registry aller verbundenen Teilnehmer
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<RegistryInner>,
}

#[derive(Default)]
struct RegistryInner {
    sitzungen: DashMap<UserId, UserSession>,
    /// Zuletzt verwendeter Filter pro Benutzer (fuer `match:skip`)
    letzte_filter: DashMap<UserId, MatchFilter>,
}

impl SessionRegistry {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Legt eine neue Sitzung an (Status `online`, Reputation 100)
    ///
    /// Eine bestehende Sitzung mit derselben ID wird ersetzt.
    pub fn registrieren(&self, user_id: UserId) -> UserSession {
        let sitzung = UserSession::neu(user_id);
        self.inner.sitzungen.insert(user_id, sitzung.clone());
        tracing::info!(user_id = %user_id, "Sitzung registriert");
        sitzung
    }

    /// Entfernt eine Sitzung vollstaendig
    pub fn entfernen(&self, user_id: &UserId) -> Option<UserSession> {
        self.inner.letzte_filter.remove(user_id);
        let entfernt = self.inner.sitzungen.remove(user_id).map(|(_, s)| s);
        if entfernt.is_some() {
            tracing::info!(user_id = %user_id, "Sitzung entfernt");
        }
        entfernt
    }

    /// Snapshot einer Sitzung
    pub fn sitzung(&self, user_id: &UserId) -> Option<UserSession> {
        self.inner.sitzungen.get(user_id).map(|s| s.clone())
    }

    pub fn ist_registriert(&self, user_id: &UserId) -> bool {
        self.inner.sitzungen.contains_key(user_id)
    }

    pub fn status(&self, user_id: &UserId) -> Option<UserStatus> {
        self.inner.sitzungen.get(user_id).map(|s| s.status)
    }

    /// Setzt den Status und aktualisiert `last_active`
    pub fn status_setzen(&self, user_id: &UserId, status: UserStatus) -> MatchingResult<()> {
        let mut sitzung = self
            .inner
            .sitzungen
            .get_mut(user_id)
            .ok_or(MatchingError::BenutzerNichtGefunden(*user_id))?;
        sitzung.status = status;
        sitzung.last_active = Utc::now();
        Ok(())
    }

    /// Wendet ein Profil-Update an und gibt den neuen Snapshot zurueck
    ///
    /// Ungueltige Updates lassen die Sitzung unveraendert.
    pub fn profil_aktualisieren(
        &self,
        user_id: &UserId,
        update: ProfileUpdate,
    ) -> MatchingResult<UserSession> {
        let mut sitzung = self
            .inner
            .sitzungen
            .get_mut(user_id)
            .ok_or(MatchingError::BenutzerNichtGefunden(*user_id))?;
        sitzung.profil_anwenden(update)?;
        Ok(sitzung.clone())
    }

    /// Zieht Reputation ab und gibt den neuen Wert zurueck
    pub fn reputation_abziehen(&self, user_id: &UserId, abzug: u32) -> Option<u32> {
        self.inner.sitzungen.get_mut(user_id).map(|mut s| {
            s.reputation_abziehen(abzug);
            s.reputation
        })
    }

    pub fn aktivitaet_markieren(&self, user_id: &UserId) {
        if let Some(mut s) = self.inner.sitzungen.get_mut(user_id) {
            s.last_active = Utc::now();
        }
    }

    /// Merkt sich den Filter der letzten Match-Anfrage
    pub fn filter_merken(&self, user_id: UserId, filter: Option<MatchFilter>) {
        match filter {
            Some(f) => {
                self.inner.letzte_filter.insert(user_id, f);
            }
            None => {
                self.inner.letzte_filter.remove(&user_id);
            }
        }
    }

    pub fn letzter_filter(&self, user_id: &UserId) -> Option<MatchFilter> {
        self.inner.letzte_filter.get(user_id).map(|f| f.clone())
    }

    /// Anzahl aller verbundenen Teilnehmer
    pub fn online_anzahl(&self) -> usize {
        self.inner.sitzungen.len()
    }

    pub fn anzahl_mit_status(&self, status: UserStatus) -> usize {
        self.inner
            .sitzungen
            .iter()
            .filter(|s| s.status == status)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roulette_core::{AgeRange, Gender};

    #[test]
    fn registrieren_und_entfernen() {
        let registry = SessionRegistry::neu();
        let id = UserId::new();

        let s = registry.registrieren(id);
        assert_eq!(s.status, UserStatus::Online);
        assert_eq!(registry.online_anzahl(), 1);
        assert!(registry.ist_registriert(&id));

        assert!(registry.entfernen(&id).is_some());
        assert!(registry.entfernen(&id).is_none());
        assert_eq!(registry.online_anzahl(), 0);
    }

    #[test]
    fn status_fuer_unbekannten_benutzer() {
        let registry = SessionRegistry::neu();
        let res = registry.status_setzen(&UserId::new(), UserStatus::Searching);
        assert!(matches!(res, Err(MatchingError::BenutzerNichtGefunden(_))));
    }

    #[test]
    fn status_zaehlen() {
        let registry = SessionRegistry::neu();
        let a = UserId::new();
        let b = UserId::new();
        registry.registrieren(a);
        registry.registrieren(b);
        registry.status_setzen(&a, UserStatus::Searching).unwrap();

        assert_eq!(registry.anzahl_mit_status(UserStatus::Searching), 1);
        assert_eq!(registry.anzahl_mit_status(UserStatus::Online), 1);
        assert_eq!(registry.status(&a), Some(UserStatus::Searching));
    }

    #[test]
    fn profil_update_validiert() {
        let registry = SessionRegistry::neu();
        let id = UserId::new();
        registry.registrieren(id);

        let neu = registry
            .profil_aktualisieren(
                &id,
                ProfileUpdate {
                    gender: Some(Gender::Female),
                    age: Some(22),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(neu.age, Some(22));

        let fehler = registry.profil_aktualisieren(
            &id,
            ProfileUpdate {
                age: Some(200),
                ..Default::default()
            },
        );
        assert!(matches!(fehler, Err(MatchingError::Kern(_))));
        assert_eq!(registry.sitzung(&id).unwrap().age, Some(22));
    }

    #[test]
    fn reputation_sinkt_saettigend() {
        let registry = SessionRegistry::neu();
        let id = UserId::new();
        registry.registrieren(id);

        assert_eq!(registry.reputation_abziehen(&id, 10), Some(90));
        assert_eq!(registry.reputation_abziehen(&id, 500), Some(0));
        assert_eq!(registry.reputation_abziehen(&UserId::new(), 10), None);
    }

    #[test]
    fn letzter_filter_wird_gemerkt_und_beim_entfernen_geloescht() {
        let registry = SessionRegistry::neu();
        let id = UserId::new();
        registry.registrieren(id);

        let filter = MatchFilter {
            age_range: Some(AgeRange { min: 20, max: 25 }),
            ..Default::default()
        };
        registry.filter_merken(id, Some(filter.clone()));
        assert_eq!(registry.letzter_filter(&id), Some(filter));

        registry.filter_merken(id, None);
        assert_eq!(registry.letzter_filter(&id), None);

        registry.filter_merken(id, Some(MatchFilter::default()));
        registry.entfernen(&id);
        assert_eq!(registry.letzter_filter(&id), None);
    }
}
