//! Integration-Tests fuer Meldungen, Sperren und Blockierungen

mod common;

use common::{code, umgebung};
use roulette_core::{EndReason, ProfileUpdate, ReportReason, UserId, UserStatus};
use roulette_protocol::events::{BlockTarget, ReportRequest};
use roulette_protocol::{ClientEvent, ErrorCode, ServerEvent};
use roulette_signaling::StartErgebnis;

fn meldung(ziel: roulette_core::UserId) -> ClientEvent {
    ClientEvent::UserReport(ReportRequest {
        reported_user_id: ziel,
        reason: ReportReason::Harassment,
        description: Some("beleidigend".into()),
    })
}

fn ist_erfolg(e: &ServerEvent) -> bool {
    matches!(
        e,
        ServerEvent::Notification(n)
            if n.kind == roulette_protocol::events::NotificationKind::Success
    )
}

#[tokio::test]
async fn drei_meldungen_loesen_genau_eine_sperre_aus() {
    let u = umgebung();
    let ziel = u.verbinden();

    for _ in 0..3 {
        let melder = u.verbinden();
        assert_eq!(u.senden(&melder, meldung(ziel.id)).await, None);
    }
    assert!(u.state.moderation.ist_gesperrt(&ziel.id));
    assert_eq!(u.sperren.sperren_fuer(&ziel.id), 1);

    let vierter = u.verbinden();
    assert_eq!(u.senden(&vierter, meldung(ziel.id)).await, None);
    assert_eq!(u.sperren.sperren_fuer(&ziel.id), 1);
    assert_eq!(u.state.moderation.meldungen_anzahl(&ziel.id), 4);

    // Reputation sinkt pro Meldung, nie unter 0
    assert_eq!(u.state.registry.sitzung(&ziel.id).unwrap().reputation, 60);

    assert_eq!(
        code(u.senden(&ziel, ClientEvent::MatchStart(None)).await),
        Some(ErrorCode::MatchStartError)
    );
}

#[tokio::test]
async fn gesperrter_wartender_verlaesst_den_pool() {
    let u = umgebung();
    let ziel = u.verbinden();
    u.senden(&ziel, ClientEvent::MatchStart(None)).await;
    assert!(u.state.engine.ist_wartend(&ziel.id));

    for _ in 0..3 {
        let melder = u.verbinden();
        u.senden(&melder, meldung(ziel.id)).await;
    }

    assert!(!u.state.engine.ist_wartend(&ziel.id));
    assert_eq!(u.state.registry.status(&ziel.id), Some(UserStatus::Online));
}

#[tokio::test]
async fn meldung_beendet_match_und_verhindert_wiederholung() {
    let u = umgebung();
    let mut a = u.verbinden();
    let mut b = u.verbinden();
    u.senden(&a, ClientEvent::MatchStart(None)).await;
    u.senden(&b, ClientEvent::MatchStart(None)).await;
    let m = u.state.engine.aktives_match_von(&a.id).unwrap();
    a.ereignisse();
    b.ereignisse();

    assert_eq!(u.senden(&a, meldung(b.id)).await, None);

    let ereignisse_a = a.ereignisse();
    assert_eq!(ereignisse_a[0], ServerEvent::match_beendet(EndReason::Reported));
    assert!(ist_erfolg(&ereignisse_a[1]));
    assert_eq!(b.ereignisse(), vec![ServerEvent::match_beendet(EndReason::Reported)]);

    let gespeichert = u.state.moderation.meldungen_fuer(&b.id);
    assert_eq!(gespeichert.len(), 1);
    assert_eq!(gespeichert[0].match_id, Some(m.id));
    assert_eq!(gespeichert[0].status, roulette_core::ReportStatus::Pending);
    assert_eq!(u.state.registry.sitzung(&b.id).unwrap().reputation, 90);

    assert_eq!(u.state.lifecycle.starten(a.id, None).unwrap(), StartErgebnis::Wartend);
    assert_eq!(u.state.lifecycle.starten(b.id, None).unwrap(), StartErgebnis::Wartend);
    assert_eq!(u.state.engine.wartend_anzahl(), 2);
}

#[tokio::test]
async fn meldung_gegen_unbekannte_id_wird_abgelehnt() {
    let u = umgebung();
    let mut melder = u.verbinden();

    let mut fremde = Vec::new();
    for _ in 0..100 {
        let id = UserId::new();
        assert_eq!(
            code(u.senden(&melder, meldung(id)).await),
            Some(ErrorCode::ReportError)
        );
        fremde.push(id);
    }

    assert!(fremde
        .iter()
        .all(|id| u.state.moderation.meldungen_anzahl(id) == 0
            && u.state.moderation.warnungen(id) == 0
            && !u.state.engine.ist_ausgeschlossen(&melder.id, id)));
    assert!(melder.ereignisse().iter().all(|e| !ist_erfolg(e)));
    assert_eq!(u.state.registry.sitzung(&melder.id).unwrap().reputation, 100);
}

#[tokio::test]
async fn blockieren_unbekannter_id_wird_abgelehnt() {
    let u = umgebung();
    let a = u.verbinden();
    let fremd = UserId::new();

    let blockieren = ClientEvent::UserBlock(BlockTarget { user_id: fremd });
    assert_eq!(code(u.senden(&a, blockieren).await), Some(ErrorCode::ReportError));
    assert!(!u.state.engine.ist_ausgeschlossen(&a.id, &fremd));
}

#[tokio::test]
async fn trennung_verwirft_meldungen() {
    let u = umgebung();
    let ziel = u.verbinden();
    for _ in 0..3 {
        let melder = u.verbinden();
        u.senden(&melder, meldung(ziel.id)).await;
    }
    assert_eq!(u.state.moderation.meldungen_anzahl(&ziel.id), 3);
    assert!(u.state.moderation.ist_gesperrt(&ziel.id));

    u.dispatcher.client_cleanup(&ziel.id);

    assert_eq!(u.state.moderation.meldungen_anzahl(&ziel.id), 0);
    assert_eq!(u.state.moderation.warnungen(&ziel.id), 0);
    assert!(!u.state.moderation.ist_gesperrt(&ziel.id));
    // Die Sperre selbst ist gespeichert
    assert_eq!(u.sperren.sperren_fuer(&ziel.id), 1);

    // Spaetere Meldungen gegen die alte ID werden abgelehnt
    let melder = u.verbinden();
    assert_eq!(
        code(u.senden(&melder, meldung(ziel.id)).await),
        Some(ErrorCode::ReportError)
    );
    assert_eq!(u.state.moderation.meldungen_anzahl(&ziel.id), 0);
}

#[tokio::test]
async fn selbstmeldung_ist_fehler() {
    let u = umgebung();
    let a = u.verbinden();
    assert_eq!(
        code(u.senden(&a, meldung(a.id)).await),
        Some(ErrorCode::ReportError)
    );
    assert_eq!(u.state.moderation.meldungen_anzahl(&a.id), 0);
}

#[tokio::test]
async fn blockieren_beendet_match_und_bestaetigt() {
    let u = umgebung();
    let mut a = u.verbinden();
    let mut b = u.verbinden();
    u.senden(&a, ClientEvent::MatchStart(None)).await;
    u.senden(&b, ClientEvent::MatchStart(None)).await;
    a.ereignisse();
    b.ereignisse();

    let blockieren = ClientEvent::UserBlock(BlockTarget { user_id: b.id });
    assert_eq!(u.senden(&a, blockieren).await, None);

    let ereignisse_a = a.ereignisse();
    assert_eq!(ereignisse_a.len(), 3);
    assert_eq!(ereignisse_a[0], ServerEvent::match_beendet(EndReason::Reported));
    assert_eq!(ereignisse_a[1], ServerEvent::UserBlocked(BlockTarget { user_id: b.id }));
    assert!(ist_erfolg(&ereignisse_a[2]));
    assert_eq!(b.ereignisse(), vec![ServerEvent::match_beendet(EndReason::Reported)]);

    assert!(u.state.engine.ist_ausgeschlossen(&a.id, &b.id));
    // Blockieren senkt keine Reputation
    assert_eq!(u.state.registry.sitzung(&b.id).unwrap().reputation, 100);
}

#[tokio::test]
async fn blockieren_ohne_match_laesst_anderes_match_bestehen() {
    let u = umgebung();
    let a = u.verbinden();
    let b = u.verbinden();
    let dritter = u.verbinden();
    u.senden(&a, ClientEvent::MatchStart(None)).await;
    u.senden(&b, ClientEvent::MatchStart(None)).await;

    let blockieren = ClientEvent::UserBlock(BlockTarget { user_id: dritter.id });
    assert_eq!(u.senden(&a, blockieren).await, None);
    assert!(u.state.engine.aktives_match_von(&a.id).is_some());
    assert!(u.state.engine.ist_ausgeschlossen(&a.id, &dritter.id));
}

#[tokio::test]
async fn profil_fehler_werden_gemeldet() {
    let u = umgebung();
    let mut a = u.verbinden();

    let zu_jung = ProfileUpdate {
        age: Some(12),
        ..Default::default()
    };
    assert_eq!(
        code(u.senden(&a, ClientEvent::UserUpdate(zu_jung)).await),
        Some(ErrorCode::UserUpdateError)
    );
    assert!(a.ereignisse().is_empty());

    let gueltig = ProfileUpdate {
        username: Some("nachteule".into()),
        interests: Some(vec!["musik".into()]),
        ..Default::default()
    };
    assert_eq!(u.senden(&a, ClientEvent::UserUpdate(gueltig)).await, None);
    let ereignisse = a.ereignisse();
    let [ServerEvent::UserConnected(sitzung)] = ereignisse.as_slice() else {
        panic!("user:connected erwartet");
    };
    assert_eq!(sitzung.username.as_deref(), Some("nachteule"));

    u.state.lifecycle.trennen(&a.id);
    assert_eq!(
        code(u.senden(&a, ClientEvent::UserUpdate(ProfileUpdate::default())).await),
        Some(ErrorCode::UserNotFound)
    );
}
