//! Gemeinsamer Server-Zustand fuer den Signaling-Service
//!
//! Haelt alle geteilten Services und Zustands-Manager, die sicher zwischen
//! tokio-Tasks geteilt werden koennen.

use roulette_chat::{ChatConfig, ChatService};
use roulette_core::{
    InMemorySperrSpeicher, KeinProfilSpeicher, KeineStatistik, ProfilSpeicher, SperrSpeicher,
    StatistikSenke,
};
use roulette_matching::{MatchingConfig, MatchingEngine, SessionRegistry};
use roulette_moderation::{InhaltsKlassifikator, ModerationConfig, ModerationGate};
use roulette_protocol::wire::DEFAULT_MAX_FRAME_SIZE;
use std::sync::Arc;

use crate::broadcast::{EventBroadcaster, STANDARD_SEND_QUEUE};
use crate::lifecycle::LifecycleController;

/// Konfiguration fuer den Signaling-Service
#[derive(Debug, Clone)]
pub struct SignalingConfig {
    /// Anzeigename des Servers
    pub server_name: String,
    /// Maximale gleichzeitige Verbindungen
    pub max_clients: u32,
    /// Keepalive-Intervall in Sekunden
    pub keepalive_sek: u64,
    /// Timeout fuer stille Verbindungen in Sekunden
    pub verbindungs_timeout_sek: u64,
    /// Maximale Frame-Groesse in Bytes
    pub max_frame_bytes: usize,
    /// Groesse der Send-Queue pro Client
    pub send_queue: usize,
    /// Reputationsabzug pro Meldung
    pub reputation_abzug: u32,
    pub matching: MatchingConfig,
    pub moderation: ModerationConfig,
    pub chat: ChatConfig,
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            server_name: "Roulette Server".to_string(),
            max_clients: 512,
            keepalive_sek: 30,
            verbindungs_timeout_sek: 90,
            max_frame_bytes: DEFAULT_MAX_FRAME_SIZE,
            send_queue: STANDARD_SEND_QUEUE,
            reputation_abzug: 10,
            matching: MatchingConfig::default(),
            moderation: ModerationConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}

/// Externe Kollaborateure des Servers
#[derive(Clone)]
pub struct Kollaborateure {
    pub sperr_speicher: Arc<dyn SperrSpeicher>,
    pub profil_speicher: Arc<dyn ProfilSpeicher>,
    pub statistik: Arc<dyn StatistikSenke>,
    pub klassifikator: Option<Arc<dyn InhaltsKlassifikator>>,
}

impl Default for Kollaborateure {
    /// Betrieb ohne externe Systeme
    fn default() -> Self {
        Self {
            sperr_speicher: Arc::new(InMemorySperrSpeicher::neu()),
            profil_speicher: Arc::new(KeinProfilSpeicher),
            statistik: Arc::new(KeineStatistik),
            klassifikator: None,
        }
    }
}

/// Gemeinsamer Server-Zustand (thread-safe, Arc-geteilt)
pub struct RouletteState {
    pub config: Arc<SignalingConfig>,
    /// Wer ist verbunden, mit welchem Profil und Status
    pub registry: SessionRegistry,
    /// Warte-Pool und aktive Matches
    pub engine: MatchingEngine,
    pub moderation: Arc<ModerationGate>,
    /// Nachrichtenspeicher der Matches
    pub chat: Arc<ChatService>,
    /// Zustellung an verbundene Clients
    pub broadcaster: EventBroadcaster,
    /// Einziger Weg fuer Zustandsuebergaenge
    pub lifecycle: LifecycleController,
    pub profil_speicher: Arc<dyn ProfilSpeicher>,
    pub statistik: Arc<dyn StatistikSenke>,
}

impl RouletteState {
    pub fn neu(config: SignalingConfig, kollaborateure: Kollaborateure) -> Arc<Self> {
        let registry = SessionRegistry::neu();
        let engine = MatchingEngine::neu(config.matching.clone());

        let mut gate = ModerationGate::neu(
            config.moderation.clone(),
            kollaborateure.sperr_speicher.clone(),
        );
        if let Some(k) = kollaborateure.klassifikator.clone() {
            gate = gate.mit_klassifikator(k);
        }
        let moderation = Arc::new(gate);

        let chat = Arc::new(ChatService::neu(config.chat.clone()));
        let broadcaster = EventBroadcaster::mit_queue_groesse(config.send_queue);

        let lifecycle = LifecycleController::neu(
            registry.clone(),
            engine.clone(),
            moderation.clone(),
            chat.clone(),
            broadcaster.clone(),
            kollaborateure.statistik.clone(),
            config.reputation_abzug,
        );

        Arc::new(Self {
            config: Arc::new(config),
            registry,
            engine,
            moderation,
            chat,
            broadcaster,
            lifecycle,
            profil_speicher: kollaborateure.profil_speicher,
            statistik: kollaborateure.statistik,
        })
    }
}
