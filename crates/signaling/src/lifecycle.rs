//! Lifecycle-Controller – Einziger Weg fuer Match-Zustandsuebergaenge
//!
//! ```text
//! online -> searching -> matched -> online
//!    |          |           |
//!    +----------+-----------+--> disconnected (Registry-Eintrag entfernt)
//! ```
//!
//! Alle Uebergaenge laufen unter einem kurzen Uebergangs-Guard. Innerhalb
//! des Guards gibt es kein `.await`; ausgehende Ereignisse werden nur per
//! `try_send` eingereiht. Dadurch entspricht die Ereignisreihenfolge jedes
//! Benutzers der Reihenfolge der Uebergaenge, ein `match:ended` kann das
//! zugehoerige `match:found` nie ueberholen.
//!
//! `abbauen` ist der einzige Pfad auf dem ein Match endet.

use parking_lot::Mutex;
use roulette_chat::ChatService;
use roulette_core::{
    EndReason, Match, MatchFilter, MatchId, ProfileUpdate, Report, Statistik, StatistikSenke,
    UserId, UserSession, UserStatus,
};
use roulette_matching::{MatchingEngine, MatchingError, SessionRegistry};
use roulette_moderation::{MeldungsErgebnis, ModerationGate};
use roulette_protocol::events::{BlockTarget, ReportRequest};
use roulette_protocol::ServerEvent;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::broadcast::EventBroadcaster;
use crate::error::{SignalingError, SignalingResult};

/// Ergebnis einer Match-Anfrage
#[derive(Debug, Clone, PartialEq)]
pub enum StartErgebnis {
    /// Partner gefunden, beide wurden benachrichtigt
    Gefunden(Match),
    /// Kein Partner, Benutzer wartet im Pool
    Wartend,
}

/// Orchestriert Matchbildung, Skip, Ende, Meldung und Trennung
#[derive(Clone)]
pub struct LifecycleController {
    registry: SessionRegistry,
    engine: MatchingEngine,
    moderation: Arc<ModerationGate>,
    chat: Arc<ChatService>,
    broadcaster: EventBroadcaster,
    statistik: Arc<dyn StatistikSenke>,
    reputation_abzug: u32,
    uebergang: Arc<Mutex<()>>,
}

impl LifecycleController {
    pub fn neu(
        registry: SessionRegistry,
        engine: MatchingEngine,
        moderation: Arc<ModerationGate>,
        chat: Arc<ChatService>,
        broadcaster: EventBroadcaster,
        statistik: Arc<dyn StatistikSenke>,
        reputation_abzug: u32,
    ) -> Self {
        Self {
            registry,
            engine,
            moderation,
            chat,
            broadcaster,
            statistik,
            reputation_abzug,
            uebergang: Arc::new(Mutex::new(())),
        }
    }

    // -----------------------------------------------------------------------
    // Verbindung
    // -----------------------------------------------------------------------

    /// Registriert eine neue anonyme Sitzung und ihre Send-Queue
    ///
    /// Das erste Ereignis in der Queue ist `user:connected`.
    pub fn verbinden(&self, user_id: UserId) -> (UserSession, mpsc::Receiver<ServerEvent>) {
        let rx = self.broadcaster.client_registrieren(user_id);
        let sitzung = self.registry.registrieren(user_id);
        self.broadcaster
            .an_user_senden(&user_id, ServerEvent::UserConnected(sitzung.clone()));
        self.statistik_melden();
        self.statistik_verteilen();
        (sitzung, rx)
    }

    /// Trennt einen Benutzer endgueltig
    ///
    /// Ein aktives Match endet mit `other_left` (nur der Partner wird
    /// benachrichtigt), der Pool-Eintrag und die Sitzung werden entfernt.
    /// Mehrfacher Aufruf ist wirkungslos.
    pub fn trennen(&self, user_id: &UserId) {
        {
            let _guard = self.uebergang.lock();
            if let Some(m) = self.engine.aktives_match_von(user_id) {
                self.abbauen(&m.id, EndReason::OtherLeft, Some(*user_id));
            }
            self.engine.benutzer_vergessen(user_id);
            self.moderation.benutzer_vergessen(user_id);
            self.registry.entfernen(user_id);
            self.broadcaster.client_entfernen(user_id);
        }
        self.statistik_melden();
        self.statistik_verteilen();
        tracing::info!(user_id = %user_id, "Benutzer getrennt");
    }

    // -----------------------------------------------------------------------
    // Matching
    // -----------------------------------------------------------------------

    /// `match:start` – sucht einen Partner oder reiht in den Pool ein
    pub fn starten(
        &self,
        user_id: UserId,
        filter: Option<MatchFilter>,
    ) -> SignalingResult<StartErgebnis> {
        if self.moderation.ist_gesperrt(&user_id) {
            return Err(SignalingError::Gesperrt(user_id));
        }
        if let Some(f) = &filter {
            f.validieren()
                .map_err(|e| MatchingError::UngueltigerFilter(e.to_string()))?;
        }

        let ergebnis = {
            let _guard = self.uebergang.lock();
            self.suche_starten(user_id, filter)
        };
        self.statistik_melden();
        ergebnis
    }

    /// `match:skip` – beendet das aktuelle Match und sucht sofort neu
    ///
    /// Die neue Suche verwendet den zuletzt angegebenen Filter. Gibt das
    /// beendete Match und das Ergebnis der neuen Suche zurueck.
    pub fn ueberspringen(&self, user_id: UserId) -> SignalingResult<(Match, StartErgebnis)> {
        if self.moderation.ist_gesperrt(&user_id) {
            return Err(SignalingError::Gesperrt(user_id));
        }

        let ergebnis = {
            let _guard = self.uebergang.lock();
            if !self.registry.ist_registriert(&user_id) {
                return Err(SignalingError::BenutzerNichtGefunden(user_id));
            }
            let m = self
                .engine
                .aktives_match_von(&user_id)
                .ok_or(SignalingError::KeinAktivesMatch(user_id))?;

            let beendet = self
                .abbauen(&m.id, EndReason::Skip, None)
                .ok_or(SignalingError::KeinAktivesMatch(user_id))?;
            let filter = self.registry.letzter_filter(&user_id);
            self.suche_starten(user_id, filter)
                .map(|neu| (beendet, neu))
        };
        self.statistik_melden();
        ergebnis
    }

    /// `match:end` – beendet das Match oder bricht eine laufende Suche ab
    ///
    /// Idempotent: ohne Match und ohne Suche passiert nichts.
    pub fn beenden(&self, user_id: UserId) -> SignalingResult<Option<Match>> {
        let beendet = {
            let _guard = self.uebergang.lock();
            if !self.registry.ist_registriert(&user_id) {
                return Err(SignalingError::BenutzerNichtGefunden(user_id));
            }
            match self.engine.aktives_match_von(&user_id) {
                Some(m) => self.abbauen(&m.id, EndReason::UserLeft, None),
                None => {
                    if self.engine.aus_warteschlange_entfernen(&user_id) {
                        self.registry.status_setzen(&user_id, UserStatus::Online)?;
                        tracing::debug!(user_id = %user_id, "Suche abgebrochen");
                    }
                    None
                }
            }
        };
        self.statistik_melden();
        Ok(beendet)
    }

    /// Gemeinsamer Suchpfad fuer Start und Skip (Guard muss gehalten werden)
    fn suche_starten(
        &self,
        user_id: UserId,
        filter: Option<MatchFilter>,
    ) -> SignalingResult<StartErgebnis> {
        if !self.registry.ist_registriert(&user_id) {
            return Err(SignalingError::BenutzerNichtGefunden(user_id));
        }
        if self.engine.aktives_match_von(&user_id).is_some() {
            return Err(MatchingError::BereitsImMatch(user_id).into());
        }

        self.registry.filter_merken(user_id, filter.clone());
        self.registry.status_setzen(&user_id, UserStatus::Searching)?;
        let sitzung = self
            .registry
            .sitzung(&user_id)
            .ok_or(SignalingError::BenutzerNichtGefunden(user_id))?;
        self.broadcaster
            .an_user_senden(&user_id, ServerEvent::MatchSearching);

        self.veraltete_zuruecksetzen();
        match self.engine.match_anfordern(sitzung, filter) {
            Ok(Some(m)) => {
                for teilnehmer in m.teilnehmer() {
                    if let Err(e) = self.registry.status_setzen(&teilnehmer, UserStatus::Matched) {
                        tracing::error!(user_id = %teilnehmer, fehler = %e, "Status nach Match nicht gesetzt");
                    }
                }
                for teilnehmer in m.teilnehmer() {
                    self.broadcaster
                        .an_user_senden(&teilnehmer, ServerEvent::match_gefunden(m.clone()));
                }
                self.statistik.match_gebildet();
                Ok(StartErgebnis::Gefunden(m))
            }
            Ok(None) => Ok(StartErgebnis::Wartend),
            Err(e) => {
                let _ = self.registry.status_setzen(&user_id, UserStatus::Online);
                Err(e.into())
            }
        }
    }

    /// Verwirft veraltete Pool-Eintraege (Guard muss gehalten werden)
    ///
    /// Betroffene Benutzer gehen still zurueck auf `online`.
    fn veraltete_zuruecksetzen(&self) -> usize {
        let veraltet = self.engine.veraltete_entfernen();
        for user_id in &veraltet {
            let _ = self.registry.status_setzen(user_id, UserStatus::Online);
            tracing::debug!(user_id = %user_id, "Suche nach Timeout verworfen");
        }
        veraltet.len()
    }

    /// Periodische Bereinigung des Warte-Pools
    pub fn veraltete_entfernen(&self) -> usize {
        let anzahl = {
            let _guard = self.uebergang.lock();
            self.veraltete_zuruecksetzen()
        };
        if anzahl > 0 {
            self.statistik_melden();
        }
        anzahl
    }

    /// Baut ein Match ab (Guard muss gehalten werden)
    ///
    /// Alle verbliebenen Teilnehmer gehen auf `online` und erhalten
    /// `match:ended`. Die Nachrichten des Matches werden verworfen.
    /// Gibt `None` zurueck wenn das Match bereits beendet war.
    fn abbauen(
        &self,
        match_id: &MatchId,
        grund: EndReason,
        verlassender: Option<UserId>,
    ) -> Option<Match> {
        let m = self.engine.match_beenden(match_id, grund)?;
        self.chat.match_nachrichten_loeschen(&m.id);

        for teilnehmer in m.teilnehmer() {
            if Some(teilnehmer) == verlassender {
                continue;
            }
            let _ = self.registry.status_setzen(&teilnehmer, UserStatus::Online);
            self.broadcaster
                .an_user_senden(&teilnehmer, ServerEvent::match_beendet(grund));
        }
        Some(m)
    }

    // -----------------------------------------------------------------------
    // Moderation
    // -----------------------------------------------------------------------

    /// `user:report` – Meldung einreichen, Reputation senken, Match beenden
    pub async fn melden(
        &self,
        user_id: UserId,
        anfrage: ReportRequest,
    ) -> SignalingResult<MeldungsErgebnis> {
        if !self.registry.ist_registriert(&user_id) {
            return Err(SignalingError::BenutzerNichtGefunden(user_id));
        }
        let gemeldet = anfrage.reported_user_id;
        if !self.registry.ist_registriert(&gemeldet) {
            return Err(SignalingError::anfrage("Gemeldeter Benutzer ist nicht verbunden"));
        }
        let match_id = self
            .engine
            .aktives_match_von(&user_id)
            .filter(|m| m.enthaelt(&gemeldet))
            .map(|m| m.id);

        let report = Report::neu(
            user_id,
            gemeldet,
            match_id,
            anfrage.reason,
            anfrage.description,
        );
        let ergebnis = self.moderation.file_report(report).await?;

        self.statistik.meldung_eingegangen();
        if ergebnis.sperre_ausgeloest {
            self.statistik.sperre_ausgeloest();
        }

        {
            let _guard = self.uebergang.lock();
            // Waehrend der Pruefung getrennt: nichts mehr an der ID festhalten
            if !self.registry.ist_registriert(&gemeldet) {
                self.moderation.benutzer_vergessen(&gemeldet);
            } else {
                self.ziel_sanktionieren(user_id, gemeldet, &ergebnis);
            }

            self.broadcaster.an_user_senden(
                &user_id,
                ServerEvent::erfolg(
                    "Meldung gesendet",
                    "Deine Meldung wurde gespeichert und wird geprueft.",
                ),
            );
        }

        self.statistik_melden();
        tracing::info!(
            reporter = %user_id,
            gemeldet = %gemeldet,
            warnungen = ergebnis.warnungen,
            "Meldung verarbeitet"
        );
        Ok(ergebnis)
    }

    /// Folgen einer Meldung fuer den noch verbundenen Gemeldeten
    ///
    /// Muss unter dem Uebergangs-Lock laufen.
    fn ziel_sanktionieren(&self, user_id: UserId, gemeldet: UserId, ergebnis: &MeldungsErgebnis) {
        if let Some(reputation) = self.registry.reputation_abziehen(&gemeldet, self.reputation_abzug) {
            tracing::debug!(user_id = %gemeldet, reputation, "Reputation gesenkt");
        }
        if let Some(sitzung) = self.registry.sitzung(&gemeldet) {
            self.engine.wartende_sitzung_aktualisieren(&sitzung);
        }

        self.engine.ausschluss_hinzufuegen(user_id, gemeldet);
        if let Some(m) = self
            .engine
            .aktives_match_von(&user_id)
            .filter(|m| m.enthaelt(&gemeldet))
        {
            self.abbauen(&m.id, EndReason::Reported, None);
        }

        // Gesperrte Benutzer verlassen den Pool sofort
        if ergebnis.sperre_ausgeloest && self.engine.aus_warteschlange_entfernen(&gemeldet) {
            let _ = self.registry.status_setzen(&gemeldet, UserStatus::Online);
        }
    }

    /// `user:block` – Match beenden und das Paar dauerhaft trennen
    pub fn blockieren(&self, user_id: UserId, ziel: UserId) -> SignalingResult<()> {
        if user_id == ziel {
            return Err(SignalingError::anfrage("Selbst-Blockierung nicht moeglich"));
        }

        {
            let _guard = self.uebergang.lock();
            if !self.registry.ist_registriert(&user_id) {
                return Err(SignalingError::BenutzerNichtGefunden(user_id));
            }
            if !self.registry.ist_registriert(&ziel) {
                return Err(SignalingError::anfrage("Blockierter Benutzer ist nicht verbunden"));
            }

            self.engine.ausschluss_hinzufuegen(user_id, ziel);
            if let Some(m) = self
                .engine
                .aktives_match_von(&user_id)
                .filter(|m| m.enthaelt(&ziel))
            {
                self.abbauen(&m.id, EndReason::Reported, None);
            }

            self.broadcaster
                .an_user_senden(&user_id, ServerEvent::UserBlocked(BlockTarget { user_id: ziel }));
            self.broadcaster.an_user_senden(
                &user_id,
                ServerEvent::erfolg("Benutzer blockiert", "Ihr werdet nicht erneut verbunden."),
            );
        }

        self.statistik_melden();
        tracing::info!(user_id = %user_id, ziel = %ziel, "Benutzer blockiert");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Profil
    // -----------------------------------------------------------------------

    /// `user:update` – Profilfelder uebernehmen und bestaetigen
    pub fn profil_aktualisieren(
        &self,
        user_id: UserId,
        update: ProfileUpdate,
    ) -> SignalingResult<UserSession> {
        let sitzung = self.registry.profil_aktualisieren(&user_id, update)?;
        self.engine.wartende_sitzung_aktualisieren(&sitzung);
        self.broadcaster
            .an_user_senden(&user_id, ServerEvent::UserConnected(sitzung.clone()));
        self.statistik_verteilen();
        tracing::info!(user_id = %user_id, "Profil aktualisiert");
        Ok(sitzung)
    }

    // -----------------------------------------------------------------------
    // Relay-Hilfen
    // -----------------------------------------------------------------------

    /// Fuehrt `f` mit dem aktiven Match des Benutzers unter dem Guard aus
    ///
    /// `None` wenn der Benutzer in keinem aktiven Match ist. Waehrend `f`
    /// laeuft kann das Match nicht enden.
    pub fn im_aktiven_match<R>(&self, user_id: &UserId, f: impl FnOnce(&Match) -> R) -> Option<R> {
        let _guard = self.uebergang.lock();
        let m = self.engine.aktives_match_von(user_id)?;
        Some(f(&m))
    }

    /// Stellt ein Ereignis dem Partner im aktiven Match zu
    ///
    /// Gibt `false` zurueck wenn kein Match besteht oder die Zustellung scheitert.
    pub fn an_partner_senden(&self, user_id: &UserId, ereignis: ServerEvent) -> bool {
        self.im_aktiven_match(user_id, |m| {
            m.partner_von(user_id)
                .map(|partner| self.broadcaster.an_user_senden(&partner, ereignis))
        })
        .flatten()
        .unwrap_or(false)
    }

    // -----------------------------------------------------------------------
    // Statistik
    // -----------------------------------------------------------------------

    /// Aktuelle Zaehler
    pub fn statistik(&self) -> Statistik {
        Statistik {
            online_users: self.registry.online_anzahl(),
            waiting_users: self.engine.wartend_anzahl(),
            active_matches: self.engine.aktive_anzahl(),
        }
    }

    /// Schiebt die aktuellen Zaehler in die Telemetrie-Senke
    pub fn statistik_melden(&self) {
        self.statistik.statistik_aktualisieren(&self.statistik());
    }

    /// Sendet `stats:update` an alle verbundenen Clients
    ///
    /// Bei Verbindung, Trennung und Profilaenderung. Das Ereignis ist
    /// fluechtig und wird bei voller Queue verworfen.
    pub fn statistik_verteilen(&self) {
        let ereignis = ServerEvent::StatsUpdate(self.statistik());
        let empfaenger = self.broadcaster.an_alle_senden(&ereignis);
        tracing::trace!(empfaenger, "Statistik verteilt");
    }
}
