//! Integration-Test ueber einen echten TCP-Listener

use futures_util::{SinkExt, StreamExt};
use roulette_protocol::{ErrorCode, FrameCodec, ServerEvent};
use roulette_signaling::{Kollaborateure, RouletteState, SignalingConfig, SignalingServer};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;

/// Test-Client der beliebiges JSON senden kann
type RohClient = Framed<TcpStream, FrameCodec<ServerEvent, Value>>;

struct Server {
    addr: SocketAddr,
    state: Arc<RouletteState>,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<std::io::Result<()>>,
}

async fn server_starten(config: SignalingConfig) -> Server {
    let state = RouletteState::neu(config, Kollaborateure::default());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server = SignalingServer::neu(Arc::clone(&state), addr);
    let task = tokio::spawn(server.starten_mit_listener(listener, shutdown_rx));
    Server {
        addr,
        state,
        shutdown_tx,
        task,
    }
}

async fn verbinden(addr: SocketAddr) -> RohClient {
    let stream = TcpStream::connect(addr).await.unwrap();
    Framed::new(stream, FrameCodec::new())
}

/// Naechstes Ereignis ausser Keepalive-Pings und Statistik-Broadcasts
async fn naechstes(client: &mut RohClient) -> Option<ServerEvent> {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("Timeout beim Lesen");
        match frame {
            Some(Ok(ServerEvent::Ping(_) | ServerEvent::StatsUpdate(_))) => continue,
            Some(Ok(ereignis)) => return Some(ereignis),
            Some(Err(_)) | None => return None,
        }
    }
}

async fn angemeldet(addr: SocketAddr) -> (RohClient, roulette_core::UserId) {
    let mut client = verbinden(addr).await;
    let Some(ServerEvent::UserConnected(sitzung)) = naechstes(&mut client).await else {
        panic!("user:connected erwartet");
    };
    (client, sitzung.id)
}

#[tokio::test]
async fn match_und_nachricht_ueber_tcp() {
    let server = server_starten(SignalingConfig::default()).await;
    let (mut a, id_a) = angemeldet(server.addr).await;
    let (mut b, id_b) = angemeldet(server.addr).await;

    a.send(json!({"event": "match:start", "data": null})).await.unwrap();
    assert_eq!(naechstes(&mut a).await, Some(ServerEvent::MatchSearching));

    b.send(json!({"event": "match:start", "data": null})).await.unwrap();
    assert_eq!(naechstes(&mut b).await, Some(ServerEvent::MatchSearching));

    let Some(ServerEvent::MatchFound(m)) = naechstes(&mut b).await else {
        panic!("match:found erwartet");
    };
    assert_eq!(m.partner_von(&id_b), Some(id_a));
    assert!(matches!(naechstes(&mut a).await, Some(ServerEvent::MatchFound(_))));

    a.send(json!({"event": "message:send", "data": {"content": "hallo b"}}))
        .await
        .unwrap();
    let Some(ServerEvent::MessageReceived(n)) = naechstes(&mut b).await else {
        panic!("message:received erwartet");
    };
    assert_eq!(n.content, "hallo b");

    // Trennung von a beendet das Match fuer b
    drop(a);
    assert_eq!(
        naechstes(&mut b).await,
        Some(ServerEvent::match_beendet(roulette_core::EndReason::OtherLeft))
    );

    server.shutdown_tx.send(true).unwrap();
    server.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn unbekanntes_ereignis_beendet_verbindung_nicht() {
    let server = server_starten(SignalingConfig::default()).await;
    let (mut a, _) = angemeldet(server.addr).await;

    a.send(json!({"event": "admin:shutdown"})).await.unwrap();
    let Some(ServerEvent::Error(fehler)) = naechstes(&mut a).await else {
        panic!("error erwartet");
    };
    assert_eq!(fehler.code, ErrorCode::InvalidRequest);

    a.send(json!({"event": "ping", "data": {"timestamp_ms": 7}}))
        .await
        .unwrap();
    let Some(ServerEvent::Pong(pong)) = naechstes(&mut a).await else {
        panic!("pong erwartet");
    };
    assert_eq!(pong.echo_timestamp_ms, 7);

    server.shutdown_tx.send(true).unwrap();
    server.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn voller_server_lehnt_ab() {
    let config = SignalingConfig {
        max_clients: 1,
        ..Default::default()
    };
    let server = server_starten(config).await;
    let (_a, _) = angemeldet(server.addr).await;

    let mut zweiter = verbinden(server.addr).await;
    assert_eq!(naechstes(&mut zweiter).await, None);
    assert_eq!(server.state.registry.online_anzahl(), 1);

    server.shutdown_tx.send(true).unwrap();
    server.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn shutdown_trennt_alle_verbindungen() {
    let server = server_starten(SignalingConfig::default()).await;
    let (mut a, _) = angemeldet(server.addr).await;
    let (mut b, _) = angemeldet(server.addr).await;
    a.send(json!({"event": "match:start", "data": null})).await.unwrap();
    b.send(json!({"event": "match:start", "data": null})).await.unwrap();

    // Sicherstellen dass beide gepaart sind
    while !matches!(naechstes(&mut b).await, Some(ServerEvent::MatchFound(_))) {}

    server.shutdown_tx.send(true).unwrap();
    server.task.await.unwrap().unwrap();

    assert_eq!(server.state.registry.online_anzahl(), 0);
    assert_eq!(server.state.engine.aktive_anzahl(), 0);

    // Abschiedsnachricht, danach Verbindungsende
    let mut gesehen = Vec::new();
    while let Some(e) = naechstes(&mut a).await {
        gesehen.push(e);
    }
    assert!(gesehen
        .iter()
        .any(|e| matches!(e, ServerEvent::Notification(_))));
}
