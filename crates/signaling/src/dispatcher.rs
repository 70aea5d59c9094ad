//! Message-Dispatcher – Routet Client-Ereignisse an die richtigen Handler
//!
//! Der Dispatcher empfaengt dekodierte `ClientEvent`s von einer
//! `ClientConnection`, ruft den zustaendigen Handler auf und gibt die
//! direkte Antwort zurueck (falls es eine gibt).
//!
//! ## Fehler-Codes
//! Dies ist die einzige Stelle an der Fehler auf Wire-Codes abgebildet
//! werden. Jeder Ereignisbereich hat einen Standard-Code, einige Fehler
//! haben ueberall denselben Code (unbekannter Benutzer, blockierter Inhalt).

use roulette_core::UserId;
use roulette_protocol::events::PongMessage;
use roulette_protocol::{ClientEvent, ErrorCode, ServerEvent};
use std::sync::Arc;

use crate::error::SignalingError;
use crate::handlers::{chat_handler, match_handler, signal_handler, user_handler};
use crate::server_state::RouletteState;

/// Zentraler Ereignis-Dispatcher
pub struct MessageDispatcher {
    state: Arc<RouletteState>,
}

impl MessageDispatcher {
    pub fn neu(state: Arc<RouletteState>) -> Self {
        Self { state }
    }

    /// Verarbeitet ein Client-Ereignis
    ///
    /// Gibt `None` zurueck wenn keine direkte Antwort gesendet werden soll.
    /// Ereignisse an andere Teilnehmer laufen ueber den Broadcaster.
    pub async fn dispatch(&self, ereignis: ClientEvent, user_id: UserId) -> Option<ServerEvent> {
        let name = ereignis.name();
        tracing::trace!(user_id = %user_id, ereignis = name, "Ereignis empfangen");

        let (ergebnis, standard_code) = match ereignis {
            // -------------------------------------------------------------------
            // Keepalive und Statistik
            // -------------------------------------------------------------------
            ClientEvent::Ping(ping) => {
                return Some(ServerEvent::Pong(PongMessage {
                    echo_timestamp_ms: ping.timestamp_ms,
                    server_timestamp_ms: jetzt_ms(),
                }));
            }
            ClientEvent::Pong(pong) => {
                let rtt = jetzt_ms().saturating_sub(pong.echo_timestamp_ms);
                tracing::trace!(user_id = %user_id, rtt_ms = rtt, "Pong empfangen");
                return None;
            }
            ClientEvent::StatsRequest => return Some(user_handler::handle_statistik(&self.state)),

            // -------------------------------------------------------------------
            // Matching
            // -------------------------------------------------------------------
            ClientEvent::MatchStart(filter) => (
                match_handler::handle_match_start(filter, user_id, &self.state),
                ErrorCode::MatchStartError,
            ),
            ClientEvent::MatchSkip => (
                match_handler::handle_match_skip(user_id, &self.state),
                ErrorCode::SkipError,
            ),
            ClientEvent::MatchEnd => (
                match_handler::handle_match_end(user_id, &self.state),
                ErrorCode::InternalError,
            ),

            // -------------------------------------------------------------------
            // Nachrichten
            // -------------------------------------------------------------------
            ClientEvent::MessageSend(anfrage) => (
                chat_handler::handle_nachricht_senden(anfrage, user_id, &self.state).await,
                ErrorCode::MessageSendError,
            ),
            ClientEvent::MessageTyping(indikator) => (
                chat_handler::handle_tippen(indikator, user_id, &self.state),
                ErrorCode::InternalError,
            ),
            ClientEvent::MessageRead(anfrage) => (
                chat_handler::handle_gelesen(anfrage, user_id, &self.state),
                ErrorCode::InternalError,
            ),

            // -------------------------------------------------------------------
            // Signal-Relay (keine Antwort, keine Fehler)
            // -------------------------------------------------------------------
            ClientEvent::SignalOffer(payload) => {
                signal_handler::handle_signal(ServerEvent::SignalOffer(payload), user_id, &self.state);
                return None;
            }
            ClientEvent::SignalAnswer(payload) => {
                signal_handler::handle_signal(ServerEvent::SignalAnswer(payload), user_id, &self.state);
                return None;
            }
            ClientEvent::SignalIce(payload) => {
                signal_handler::handle_signal(ServerEvent::SignalIce(payload), user_id, &self.state);
                return None;
            }

            // -------------------------------------------------------------------
            // Benutzer
            // -------------------------------------------------------------------
            ClientEvent::UserReport(anfrage) => (
                user_handler::handle_melden(anfrage, user_id, &self.state).await,
                ErrorCode::ReportError,
            ),
            ClientEvent::UserBlock(ziel) => (
                user_handler::handle_blockieren(ziel, user_id, &self.state),
                ErrorCode::ReportError,
            ),
            ClientEvent::UserUpdate(update) => (
                user_handler::handle_profil_aktualisieren(update, user_id, &self.state).await,
                ErrorCode::UserUpdateError,
            ),
        };

        match ergebnis {
            Ok(()) => None,
            Err(e) => {
                let code = fehler_code(&e, standard_code);
                tracing::warn!(
                    user_id = %user_id,
                    ereignis = name,
                    code = ?code,
                    fehler = %e,
                    "Ereignis fehlgeschlagen"
                );
                Some(ServerEvent::fehler(code, fehler_text(&e)))
            }
        }
    }

    /// Raeumt nach dem Verbindungsende auf
    pub fn client_cleanup(&self, user_id: &UserId) {
        self.state.lifecycle.trennen(user_id);
    }
}

/// Bildet einen Fehler auf den Wire-Code ab
///
/// `standard` ist der Code des Ereignisbereichs in dem der Fehler auftrat.
pub fn fehler_code(fehler: &SignalingError, standard: ErrorCode) -> ErrorCode {
    if fehler.ist_benutzer_unbekannt() {
        return ErrorCode::UserNotFound;
    }
    match fehler {
        SignalingError::InhaltBlockiert => ErrorCode::MessageBlocked,
        SignalingError::Io(_) | SignalingError::Intern(_) => ErrorCode::InternalError,
        _ => standard,
    }
}

/// Fehlertext fuer den Client (interne Details bleiben im Log)
fn fehler_text(fehler: &SignalingError) -> String {
    match fehler {
        SignalingError::InhaltBlockiert => "Nachricht enthaelt unzulaessige Inhalte".into(),
        SignalingError::Io(_) | SignalingError::Intern(_) => "Interner Serverfehler".into(),
        andere => andere.to_string(),
    }
}

pub(crate) fn jetzt_ms() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use roulette_core::RouletteError;
    use roulette_matching::MatchingError;
    use roulette_moderation::ModerationError;

    #[test]
    fn unbekannter_benutzer_gewinnt_ueberall() {
        let uid = UserId::new();
        for fehler in [
            SignalingError::BenutzerNichtGefunden(uid),
            SignalingError::Matching(MatchingError::BenutzerNichtGefunden(uid)),
            SignalingError::Kern(RouletteError::BenutzerNichtGefunden(uid)),
        ] {
            assert_eq!(fehler_code(&fehler, ErrorCode::SkipError), ErrorCode::UserNotFound);
        }
    }

    #[test]
    fn bereichs_code_fuer_zustandsfehler() {
        let uid = UserId::new();
        assert_eq!(
            fehler_code(
                &SignalingError::Matching(MatchingError::BereitsImMatch(uid)),
                ErrorCode::MatchStartError
            ),
            ErrorCode::MatchStartError
        );
        assert_eq!(
            fehler_code(&SignalingError::KeinAktivesMatch(uid), ErrorCode::SkipError),
            ErrorCode::SkipError
        );
        assert_eq!(
            fehler_code(
                &SignalingError::Moderation(ModerationError::SelbstMeldung(uid)),
                ErrorCode::ReportError
            ),
            ErrorCode::ReportError
        );
    }

    #[test]
    fn blockierter_inhalt_und_interne_fehler() {
        assert_eq!(
            fehler_code(&SignalingError::InhaltBlockiert, ErrorCode::MessageSendError),
            ErrorCode::MessageBlocked
        );
        assert_eq!(
            fehler_code(&SignalingError::intern("kaputt"), ErrorCode::ReportError),
            ErrorCode::InternalError
        );
        assert_eq!(fehler_text(&SignalingError::intern("geheim")), "Interner Serverfehler");
    }
}
