//! Integration-Tests fuer Nachrichten- und Signal-Relay

mod common;

use common::{code, umgebung, umgebung_mit, StichwortKlassifikator, Teilnehmer, Umgebung};
use roulette_protocol::events::{MessageReadRequest, MessageSendRequest, TypingIndicator};
use roulette_protocol::{ClientEvent, ErrorCode, ServerEvent};
use roulette_signaling::SignalingConfig;
use serde_json::json;
use std::sync::Arc;

async fn paar(u: &Umgebung) -> (Teilnehmer, Teilnehmer) {
    let mut a = u.verbinden();
    let mut b = u.verbinden();
    u.senden(&a, ClientEvent::MatchStart(None)).await;
    u.senden(&b, ClientEvent::MatchStart(None)).await;
    a.ereignisse();
    b.ereignisse();
    (a, b)
}

fn nachricht(inhalt: &str) -> ClientEvent {
    ClientEvent::MessageSend(MessageSendRequest {
        content: inhalt.into(),
    })
}

#[tokio::test]
async fn nachricht_ohne_match_wird_verworfen() {
    let u = umgebung();
    let a = u.verbinden();
    let mut b = u.verbinden();

    assert_eq!(u.senden(&a, nachricht("hallo?")).await, None);
    assert_eq!(u.state.chat.match_anzahl(), 0);
    assert!(b.ereignisse().is_empty());
}

#[tokio::test]
async fn blockiertes_wort_ende_zu_ende() {
    let u = umgebung();
    let (mut a, mut b) = paar(&u).await;
    let m = u.state.engine.aktives_match_von(&a.id).unwrap();

    assert_eq!(
        code(u.senden(&a, nachricht("Kauf jetzt, SPAM inklusive")).await),
        Some(ErrorCode::MessageBlocked)
    );
    assert!(b.ereignisse().is_empty());
    assert!(u.state.chat.nachrichten_fuer(&m.id).is_empty());

    assert_eq!(u.senden(&a, nachricht("Kauf jetzt, inklusive")).await, None);
    let ereignisse = b.ereignisse();
    assert_eq!(ereignisse.len(), 1);
    let ServerEvent::MessageReceived(n) = &ereignisse[0] else {
        panic!("message:received erwartet");
    };
    assert_eq!(n.content, "Kauf jetzt, inklusive");
    assert_eq!(n.sender_id, a.id);
    assert_eq!(n.match_id, m.id);

    // Nur der Partner bekommt die Nachricht
    assert!(a.ereignisse().is_empty());
    assert_eq!(u.state.chat.nachrichten_fuer(&m.id).len(), 1);
}

#[tokio::test]
async fn klassifikator_blockiert_nachricht() {
    let u = umgebung_mit(
        SignalingConfig::default(),
        Some(Arc::new(StichwortKlassifikator("boese"))),
    );
    let (a, mut b) = paar(&u).await;

    assert_eq!(
        code(u.senden(&a, nachricht("etwas boese")).await),
        Some(ErrorCode::MessageBlocked)
    );
    assert!(b.ereignisse().is_empty());

    assert_eq!(u.senden(&a, nachricht("etwas nett")).await, None);
    assert_eq!(b.ereignisse().len(), 1);
}

#[tokio::test]
async fn leere_nachricht_ist_sendefehler() {
    let u = umgebung();
    let (a, mut b) = paar(&u).await;
    assert_eq!(
        code(u.senden(&a, nachricht("   ")).await),
        Some(ErrorCode::MessageSendError)
    );
    assert!(b.ereignisse().is_empty());
}

#[tokio::test]
async fn nachrichten_enden_mit_dem_match() {
    let u = umgebung();
    let (a, _b) = paar(&u).await;
    let m = u.state.engine.aktives_match_von(&a.id).unwrap();

    u.senden(&a, nachricht("eins")).await;
    u.senden(&a, nachricht("zwei")).await;
    assert_eq!(u.state.chat.nachrichten_fuer(&m.id).len(), 2);

    u.senden(&a, ClientEvent::MatchEnd).await;
    assert!(u.state.chat.nachrichten_fuer(&m.id).is_empty());
}

#[tokio::test]
async fn lesebestaetigung_durch_empfaenger() {
    let u = umgebung();
    let (a, mut b) = paar(&u).await;
    let m = u.state.engine.aktives_match_von(&a.id).unwrap();

    u.senden(&a, nachricht("gelesen?")).await;
    let ServerEvent::MessageReceived(n) = b.ereignisse().remove(0) else {
        panic!("message:received erwartet");
    };

    let lesen = ClientEvent::MessageRead(MessageReadRequest { message_id: n.id });
    assert_eq!(u.senden(&a, lesen.clone()).await, None);
    assert!(!u.state.chat.nachrichten_fuer(&m.id)[0].is_read);

    assert_eq!(u.senden(&b, lesen).await, None);
    assert!(u.state.chat.nachrichten_fuer(&m.id)[0].is_read);
}

#[tokio::test]
async fn tipp_indikator_nur_an_partner() {
    let u = umgebung();
    let (mut a, mut b) = paar(&u).await;
    let solo = u.verbinden();

    let tippen = ClientEvent::MessageTyping(TypingIndicator { is_typing: true });
    assert_eq!(u.senden(&a, tippen.clone()).await, None);
    assert_eq!(
        b.ereignisse(),
        vec![ServerEvent::MessageTyping(TypingIndicator { is_typing: true })]
    );
    assert!(a.ereignisse().is_empty());

    assert_eq!(u.senden(&solo, tippen).await, None);
}

#[tokio::test]
async fn signale_werden_unveraendert_weitergeleitet() {
    let u = umgebung();
    let (a, mut b) = paar(&u).await;

    let offer = json!({"type": "offer", "sdp": "v=0\r\no=- 1 2 IN IP4 0.0.0.0", "extra": [1, 2]});
    let ice = json!({"candidate": "candidate:1 1 udp 2122260223 10.0.0.1 54321 typ host", "sdpMid": "0"});

    assert_eq!(u.senden(&a, ClientEvent::SignalOffer(offer.clone())).await, None);
    assert_eq!(u.senden(&b, ClientEvent::SignalAnswer(json!({"type": "answer"}))).await, None);
    assert_eq!(u.senden(&a, ClientEvent::SignalIce(ice.clone())).await, None);

    assert_eq!(
        b.ereignisse(),
        vec![ServerEvent::SignalOffer(offer), ServerEvent::SignalIce(ice)]
    );
}

#[tokio::test]
async fn signal_ohne_match_wird_verworfen() {
    let u = umgebung();
    let a = u.verbinden();
    let mut b = u.verbinden();
    assert_eq!(u.senden(&a, ClientEvent::SignalOffer(json!({"sdp": "x"}))).await, None);
    assert!(b.ereignisse().is_empty());
}

#[tokio::test]
async fn zu_lange_nachricht() {
    let mut config = SignalingConfig::default();
    config.chat.max_nachrichten_laenge = 10;
    let u = umgebung_mit(config, None);
    let (a, mut b) = paar(&u).await;

    assert_eq!(
        code(u.senden(&a, nachricht("deutlich mehr als zehn Zeichen")).await),
        Some(ErrorCode::MessageSendError)
    );
    assert!(b.ereignisse().is_empty());
}
