//! Gemeinsame Hilfen fuer die Integration-Tests

#![allow(dead_code)]

use async_trait::async_trait;
use roulette_core::{InMemorySperrSpeicher, UserId};
use roulette_moderation::{
    EmpfohleneAktion, InhaltsKlassifikator, Kategorien, ModerationResult, SicherheitsUrteil,
};
use roulette_protocol::{ClientEvent, ErrorCode, ServerEvent};
use roulette_signaling::{Kollaborateure, MessageDispatcher, RouletteState, SignalingConfig};
use std::sync::Arc;
use tokio::sync::mpsc;

pub struct Umgebung {
    pub state: Arc<RouletteState>,
    pub dispatcher: MessageDispatcher,
    pub sperren: Arc<InMemorySperrSpeicher>,
}

pub fn umgebung() -> Umgebung {
    umgebung_mit(SignalingConfig::default(), None)
}

pub fn umgebung_mit(
    config: SignalingConfig,
    klassifikator: Option<Arc<dyn InhaltsKlassifikator>>,
) -> Umgebung {
    let sperren = Arc::new(InMemorySperrSpeicher::neu());
    let state = RouletteState::neu(
        config,
        Kollaborateure {
            sperr_speicher: sperren.clone(),
            klassifikator,
            ..Default::default()
        },
    );
    Umgebung {
        dispatcher: MessageDispatcher::neu(Arc::clone(&state)),
        state,
        sperren,
    }
}

pub struct Teilnehmer {
    pub id: UserId,
    pub rx: mpsc::Receiver<ServerEvent>,
}

impl Teilnehmer {
    /// Bisher eingereihte Ereignisse ohne `stats:update`
    ///
    /// Statistik-Broadcasts haengen davon ab, wer sonst noch verbindet,
    /// deshalb filtern die meisten Tests sie heraus.
    pub fn ereignisse(&mut self) -> Vec<ServerEvent> {
        self.alle_ereignisse()
            .into_iter()
            .filter(|e| !matches!(e, ServerEvent::StatsUpdate(_)))
            .collect()
    }

    /// Alle bisher eingereihten Ereignisse
    pub fn alle_ereignisse(&mut self) -> Vec<ServerEvent> {
        let mut alle = Vec::new();
        while let Ok(e) = self.rx.try_recv() {
            alle.push(e);
        }
        alle
    }
}

impl Umgebung {
    /// Verbindet einen Teilnehmer und verwirft `user:connected`
    pub fn verbinden(&self) -> Teilnehmer {
        let id = UserId::new();
        let (_, rx) = self.state.lifecycle.verbinden(id);
        let mut t = Teilnehmer { id, rx };
        t.ereignisse();
        t
    }

    pub async fn senden(&self, t: &Teilnehmer, ereignis: ClientEvent) -> Option<ServerEvent> {
        self.dispatcher.dispatch(ereignis, t.id).await
    }
}

/// Fehler-Code einer Antwort
pub fn code(antwort: Option<ServerEvent>) -> Option<ErrorCode> {
    match antwort {
        Some(ServerEvent::Error(e)) => Some(e.code),
        _ => None,
    }
}

/// Klassifikator der jeden Text ablehnt der das Stichwort enthaelt
pub struct StichwortKlassifikator(pub &'static str);

#[async_trait]
impl InhaltsKlassifikator for StichwortKlassifikator {
    async fn text_pruefen(&self, text: &str) -> ModerationResult<SicherheitsUrteil> {
        if text.contains(self.0) {
            Ok(SicherheitsUrteil {
                is_safe: false,
                confidence: 0.97,
                categories: Kategorien {
                    hate: 0.97,
                    ..Default::default()
                },
                action: EmpfohleneAktion::Block,
            })
        } else {
            Ok(SicherheitsUrteil::sicher())
        }
    }

    async fn bild_pruefen(&self, _bild: &[u8]) -> ModerationResult<SicherheitsUrteil> {
        Ok(SicherheitsUrteil::sicher())
    }
}
