//! Matching-Engine – Warte-Pool, aktive Matches, Ausschluesse
//!
//! Der gesamte Engine-Zustand liegt hinter einem einzigen `parking_lot::Mutex`.
//! Jede Operation ist ein kurzer Scan-und-Mutations-Abschnitt ohne `.await`,
//! dadurch erscheint ein neues Match fuer beide Teilnehmer atomar. Der Aufrufer
//! benachrichtigt die Parteien erst nachdem die Methode zurueckgekehrt ist.
//!
//! ## Warte-Pool
//!
//! - Reihenfolge = Einfuegereihenfolge, erster kompatibler Eintrag gewinnt
//! - hoechstens ein Eintrag pro Benutzer
//! - Eintraege aelter als `warte_timeout` werden beim Scan uebersprungen;
//!   entfernt werden sie nur ueber `veraltete_entfernen`, damit der Aufrufer
//!   den Status der Betroffenen mitfuehren kann

use chrono::Utc;
use parking_lot::Mutex;
use roulette_core::{EndReason, Match, MatchFilter, MatchId, UserId, UserSession, UserStatus};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::{MatchingError, MatchingResult};
use crate::filter::{kompatibel, MIN_REPUTATION_VERIFIZIERT};

/// Standard-Wartezeit bevor ein Pool-Eintrag als veraltet gilt
pub const STANDARD_WARTE_TIMEOUT: Duration = Duration::from_secs(30);

/// Konfiguration der Matching-Engine
#[derive(Debug, Clone)]
pub struct MatchingConfig {
    pub warte_timeout: Duration,
    pub min_reputation_verifiziert: u32,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            warte_timeout: STANDARD_WARTE_TIMEOUT,
            min_reputation_verifiziert: MIN_REPUTATION_VERIFIZIERT,
        }
    }
}

/// Ein im Pool geparkter Teilnehmer
#[derive(Debug, Clone)]
struct WarteEintrag {
    sitzung: UserSession,
    filter: Option<MatchFilter>,
    eingereiht_am: Instant,
}

impl WarteEintrag {
    fn ist_veraltet(&self, jetzt: Instant, timeout: Duration) -> bool {
        jetzt.duration_since(self.eingereiht_am) > timeout
    }
}

#[derive(Default)]
struct EngineInner {
    pool: VecDeque<WarteEintrag>,
    aktive: HashMap<MatchId, Match>,
    benutzer_match: HashMap<UserId, MatchId>,
    /// Paare die nie wieder zusammengefuehrt werden (nach Meldung/Blockierung)
    ausschluesse: HashMap<UserId, HashSet<UserId>>,
}

impl EngineInner {
    fn ist_ausgeschlossen(&self, a: &UserId, b: &UserId) -> bool {
        self.ausschluesse.get(a).is_some_and(|s| s.contains(b))
    }

    fn aus_pool_entfernen(&mut self, user_id: &UserId) -> bool {
        let vorher = self.pool.len();
        self.pool.retain(|e| e.sitzung.id != *user_id);
        self.pool.len() != vorher
    }

    fn veraltete_entfernen(&mut self, timeout: Duration) -> Vec<UserId> {
        let jetzt = Instant::now();
        let mut entfernt = Vec::new();
        self.pool.retain(|e| {
            let veraltet = e.ist_veraltet(jetzt, timeout);
            if veraltet {
                entfernt.push(e.sitzung.id);
            }
            !veraltet
        });
        entfernt
    }
}

/// Paart wartende Teilnehmer anhand bidirektionaler Filter
///
/// Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct MatchingEngine {
    config: MatchingConfig,
    inner: Arc<Mutex<EngineInner>>,
}

impl MatchingEngine {
    pub fn neu(config: MatchingConfig) -> Self {
        Self {
            config,
            inner: Arc::new(Mutex::new(EngineInner::default())),
        }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Sucht einen Partner fuer `sitzung` oder reiht sie in den Pool ein
    ///
    /// `Ok(Some(match))` wenn ein kompatibler Partner gefunden wurde, beide
    /// Teilnehmer sind dann nicht mehr im Pool. `Ok(None)` wenn die Sitzung
    /// jetzt wartet.
    pub fn match_anfordern(
        &self,
        sitzung: UserSession,
        filter: Option<MatchFilter>,
    ) -> MatchingResult<Option<Match>> {
        if let Some(f) = &filter {
            f.validieren()
                .map_err(|e| MatchingError::UngueltigerFilter(e.to_string()))?;
        }

        let user_id = sitzung.id;
        let min_rep = self.config.min_reputation_verifiziert;
        let mut inner = self.inner.lock();

        if inner.benutzer_match.contains_key(&user_id) {
            return Err(MatchingError::BereitsImMatch(user_id));
        }

        inner.aus_pool_entfernen(&user_id);

        let jetzt = Instant::now();
        let timeout = self.config.warte_timeout;
        let kandidat = inner.pool.iter().position(|e| {
            e.sitzung.id != user_id
                && !e.ist_veraltet(jetzt, timeout)
                && !inner.ist_ausgeschlossen(&user_id, &e.sitzung.id)
                && kompatibel(
                    &sitzung,
                    filter.as_ref(),
                    &e.sitzung,
                    e.filter.as_ref(),
                    min_rep,
                )
        });

        let Some(partner) = kandidat.and_then(|i| inner.pool.remove(i)) else {
            inner.pool.push_back(WarteEintrag {
                sitzung,
                filter,
                eingereiht_am: Instant::now(),
            });
            tracing::debug!(user_id = %user_id, wartend = inner.pool.len(), "Kein Partner, wartet");
            return Ok(None);
        };

        let mut anfragender = sitzung;
        let mut wartender = partner.sitzung;
        anfragender.status = UserStatus::Matched;
        wartender.status = UserStatus::Matched;

        let m = Match::neu(anfragender, wartender);
        for teilnehmer in m.teilnehmer() {
            inner.benutzer_match.insert(teilnehmer, m.id);
        }
        inner.aktive.insert(m.id, m.clone());

        tracing::info!(
            match_id = %m.id,
            user1 = %m.user1.id,
            user2 = %m.user2.id,
            "Match gebildet"
        );
        Ok(Some(m))
    }

    /// Entfernt einen Teilnehmer aus dem Pool (Suche abgebrochen)
    pub fn aus_warteschlange_entfernen(&self, user_id: &UserId) -> bool {
        self.inner.lock().aus_pool_entfernen(user_id)
    }

    /// Aktualisiert den Profil-Snapshot eines wartenden Teilnehmers
    pub fn wartende_sitzung_aktualisieren(&self, sitzung: &UserSession) {
        let mut inner = self.inner.lock();
        if let Some(eintrag) = inner.pool.iter_mut().find(|e| e.sitzung.id == sitzung.id) {
            eintrag.sitzung = sitzung.clone();
        }
    }

    /// Beendet ein aktives Match
    ///
    /// Idempotent: ein bereits beendetes oder unbekanntes Match liefert `None`.
    pub fn match_beenden(&self, match_id: &MatchId, grund: EndReason) -> Option<Match> {
        let mut inner = self.inner.lock();
        let mut m = inner.aktive.remove(match_id)?;
        for teilnehmer in m.teilnehmer() {
            if inner.benutzer_match.get(&teilnehmer) == Some(match_id) {
                inner.benutzer_match.remove(&teilnehmer);
            }
        }
        drop(inner);

        m.beenden(grund, Utc::now());
        tracing::info!(
            match_id = %m.id,
            grund = %grund,
            dauer_ms = m.duration_ms.unwrap_or_default(),
            "Match beendet"
        );
        Some(m)
    }

    /// Aktives Match eines Teilnehmers
    pub fn aktives_match_von(&self, user_id: &UserId) -> Option<Match> {
        let inner = self.inner.lock();
        inner
            .benutzer_match
            .get(user_id)
            .and_then(|id| inner.aktive.get(id))
            .cloned()
    }

    pub fn match_laden(&self, match_id: &MatchId) -> Option<Match> {
        self.inner.lock().aktive.get(match_id).cloned()
    }

    /// Zwei Teilnehmer werden nie wieder gepaart
    pub fn ausschluss_hinzufuegen(&self, a: UserId, b: UserId) {
        let mut inner = self.inner.lock();
        inner.ausschluesse.entry(a).or_default().insert(b);
        inner.ausschluesse.entry(b).or_default().insert(a);
    }

    pub fn ist_ausgeschlossen(&self, a: &UserId, b: &UserId) -> bool {
        self.inner.lock().ist_ausgeschlossen(a, b)
    }

    /// Entfernt alle Spuren eines getrennten Teilnehmers ausser aktiven Matches
    ///
    /// Aktive Matches werden ausschliesslich ueber `match_beenden` abgebaut.
    pub fn benutzer_vergessen(&self, user_id: &UserId) {
        let mut inner = self.inner.lock();
        inner.aus_pool_entfernen(user_id);
        if let Some(partner) = inner.ausschluesse.remove(user_id) {
            for p in partner {
                if let Some(set) = inner.ausschluesse.get_mut(&p) {
                    set.remove(user_id);
                    if set.is_empty() {
                        inner.ausschluesse.remove(&p);
                    }
                }
            }
        }
    }

    /// Verwirft veraltete Pool-Eintraege und gibt deren Benutzer zurueck
    pub fn veraltete_entfernen(&self) -> Vec<UserId> {
        self.inner.lock().veraltete_entfernen(self.config.warte_timeout)
    }

    pub fn ist_wartend(&self, user_id: &UserId) -> bool {
        self.inner.lock().pool.iter().any(|e| e.sitzung.id == *user_id)
    }

    pub fn wartend_anzahl(&self) -> usize {
        self.inner.lock().pool.len()
    }

    pub fn aktive_anzahl(&self) -> usize {
        self.inner.lock().aktive.len()
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::neu(MatchingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roulette_core::{Gender, GenderFilter};

    fn sitzung(gender: Option<Gender>) -> UserSession {
        let mut s = UserSession::neu(UserId::new());
        s.gender = gender;
        s.status = UserStatus::Searching;
        s
    }

    fn nur(gender: GenderFilter) -> Option<MatchFilter> {
        Some(MatchFilter {
            gender: Some(gender),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn zwei_ohne_filter_werden_gepaart() {
        let engine = MatchingEngine::default();
        let a = sitzung(None);
        let b = sitzung(None);

        assert!(engine.match_anfordern(a.clone(), None).unwrap().is_none());
        assert!(engine.ist_wartend(&a.id));

        let m = engine.match_anfordern(b.clone(), None).unwrap().expect("Match erwartet");
        assert_eq!(m.user1.id, b.id);
        assert_eq!(m.user2.id, a.id);
        assert_eq!(m.user1.status, UserStatus::Matched);
        assert_eq!(m.user2.status, UserStatus::Matched);
        assert_eq!(engine.wartend_anzahl(), 0);
        assert_eq!(engine.aktive_anzahl(), 1);
        assert_eq!(engine.aktives_match_von(&a.id).map(|m| m.id), Some(m.id));
    }

    #[tokio::test]
    async fn kein_self_match_und_kein_doppelter_eintrag() {
        let engine = MatchingEngine::default();
        let a = sitzung(None);

        assert!(engine.match_anfordern(a.clone(), None).unwrap().is_none());
        assert!(engine.match_anfordern(a.clone(), None).unwrap().is_none());
        assert_eq!(engine.wartend_anzahl(), 1);
    }

    #[tokio::test]
    async fn inkompatible_filter_bleiben_wartend() {
        let engine = MatchingEngine::default();
        let b = sitzung(Some(Gender::Male));
        let a = sitzung(Some(Gender::Female));

        assert!(engine.match_anfordern(b.clone(), None).unwrap().is_none());
        assert!(engine
            .match_anfordern(a.clone(), nur(GenderFilter::Female))
            .unwrap()
            .is_none());
        assert!(engine.ist_wartend(&a.id));
        assert!(engine.ist_wartend(&b.id));
    }

    #[tokio::test]
    async fn filter_des_wartenden_zaehlt_ebenfalls() {
        let engine = MatchingEngine::default();
        let wartend = sitzung(Some(Gender::Female));
        let anfragend = sitzung(Some(Gender::Male));

        engine
            .match_anfordern(wartend.clone(), nur(GenderFilter::Female))
            .unwrap();
        assert!(engine.match_anfordern(anfragend, None).unwrap().is_none());
        assert_eq!(engine.wartend_anzahl(), 2);
    }

    #[tokio::test]
    async fn aeltester_kompatibler_eintrag_gewinnt() {
        let engine = MatchingEngine::default();
        // Beide wollen nur Frauen und passen daher nicht zueinander
        let mann1 = sitzung(Some(Gender::Male));
        let mann2 = sitzung(Some(Gender::Male));
        let frau = sitzung(Some(Gender::Female));

        engine.match_anfordern(mann1.clone(), nur(GenderFilter::Female)).unwrap();
        engine.match_anfordern(mann2.clone(), nur(GenderFilter::Female)).unwrap();
        assert_eq!(engine.wartend_anzahl(), 2);

        let m = engine.match_anfordern(frau.clone(), None).unwrap().unwrap();
        assert_eq!(m.partner_von(&frau.id), Some(mann1.id));
        assert!(engine.ist_wartend(&mann2.id));
    }

    #[tokio::test(start_paused = true)]
    async fn veraltete_eintraege_werden_nie_gepaart() {
        let engine = MatchingEngine::default();
        let alt = sitzung(None);
        engine.match_anfordern(alt.clone(), None).unwrap();

        tokio::time::advance(Duration::from_secs(31)).await;

        let neu = sitzung(None);
        assert!(engine.match_anfordern(neu.clone(), None).unwrap().is_none());
        assert!(engine.ist_wartend(&neu.id));

        // Der Scan entfernt nichts, das bleibt der Bereinigung vorbehalten
        assert!(engine.ist_wartend(&alt.id));
        assert_eq!(engine.veraltete_entfernen(), vec![alt.id]);
        assert!(!engine.ist_wartend(&alt.id));
    }

    #[tokio::test(start_paused = true)]
    async fn genau_dreissig_sekunden_ist_noch_gueltig() {
        let engine = MatchingEngine::default();
        let a = sitzung(None);
        engine.match_anfordern(a.clone(), None).unwrap();

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(engine.veraltete_entfernen().is_empty());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(engine.veraltete_entfernen(), vec![a.id]);
    }

    #[tokio::test]
    async fn bereits_im_match_ist_fehler() {
        let engine = MatchingEngine::default();
        let a = sitzung(None);
        let b = sitzung(None);
        engine.match_anfordern(a.clone(), None).unwrap();
        engine.match_anfordern(b.clone(), None).unwrap();

        let res = engine.match_anfordern(a.clone(), None);
        assert!(matches!(res, Err(MatchingError::BereitsImMatch(id)) if id == a.id));
    }

    #[tokio::test]
    async fn ungueltiger_filter_aendert_nichts() {
        let engine = MatchingEngine::default();
        let filter = MatchFilter {
            age_range: Some(roulette_core::AgeRange { min: 40, max: 20 }),
            ..Default::default()
        };
        let res = engine.match_anfordern(sitzung(None), Some(filter));
        assert!(matches!(res, Err(MatchingError::UngueltigerFilter(_))));
        assert_eq!(engine.wartend_anzahl(), 0);
    }

    #[tokio::test]
    async fn match_beenden_ist_idempotent() {
        let engine = MatchingEngine::default();
        let a = sitzung(None);
        let b = sitzung(None);
        engine.match_anfordern(a.clone(), None).unwrap();
        let m = engine.match_anfordern(b.clone(), None).unwrap().unwrap();

        let beendet = engine.match_beenden(&m.id, EndReason::Skip).unwrap();
        assert_eq!(beendet.end_reason, Some(EndReason::Skip));
        assert!(beendet.duration_ms.is_some());
        assert!(engine.match_beenden(&m.id, EndReason::UserLeft).is_none());
        assert!(engine.aktives_match_von(&a.id).is_none());
        assert_eq!(engine.aktive_anzahl(), 0);
    }

    #[tokio::test]
    async fn ausgeschlossene_paare_werden_nicht_erneut_gepaart() {
        let engine = MatchingEngine::default();
        let a = sitzung(None);
        let b = sitzung(None);
        engine.ausschluss_hinzufuegen(a.id, b.id);
        assert!(engine.ist_ausgeschlossen(&b.id, &a.id));

        engine.match_anfordern(a.clone(), None).unwrap();
        assert!(engine.match_anfordern(b.clone(), None).unwrap().is_none());

        engine.benutzer_vergessen(&a.id);
        assert!(!engine.ist_wartend(&a.id));
        assert!(!engine.ist_ausgeschlossen(&b.id, &a.id));
    }

    #[tokio::test]
    async fn gleichzeitige_anfragen_bilden_genau_ein_match() {
        let engine = MatchingEngine::default();
        let a = sitzung(None);
        let b = sitzung(None);

        let e1 = engine.clone();
        let e2 = engine.clone();
        let (s1, s2) = (a.clone(), b.clone());
        let t1 = tokio::spawn(async move { e1.match_anfordern(s1, None).unwrap() });
        let t2 = tokio::spawn(async move { e2.match_anfordern(s2, None).unwrap() });
        let r1 = t1.await.unwrap();
        let r2 = t2.await.unwrap();

        assert_eq!(r1.is_some() as u8 + r2.is_some() as u8, 1);
        assert_eq!(engine.aktive_anzahl(), 1);
        assert_eq!(engine.wartend_anzahl(), 0);
        let m = engine.aktives_match_von(&a.id).unwrap();
        assert!(m.enthaelt(&b.id));
    }
}
