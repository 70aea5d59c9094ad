//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist.

use roulette_chat::ChatConfig;
use roulette_matching::{MatchingConfig, MIN_REPUTATION_VERIFIZIERT};
use roulette_moderation::ModerationConfig;
use roulette_signaling::SignalingConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Umgebungsvariable fuer den Pfad der Konfigurationsdatei
pub const ENV_CONFIG: &str = "ROULETTE_CONFIG";

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server: ServerEinstellungen,
    pub netzwerk: NetzwerkEinstellungen,
    pub matching: MatchingEinstellungen,
    pub chat: ChatEinstellungen,
    pub moderation: ModerationEinstellungen,
    /// Keepalive und Send-Queues der Client-Verbindungen
    pub verbindung: VerbindungsEinstellungen,
    pub logging: LoggingEinstellungen,
    /// Observability-Einstellungen (Metriken, Health)
    pub observability: ObservabilityEinstellungen,
}

/// Allgemeine Server-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Anzeigename des Servers
    pub name: String,
    /// Maximale Anzahl gleichzeitiger Clients
    pub max_clients: u32,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            name: "Roulette Server".into(),
            max_clients: 512,
        }
    }
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    pub bind_adresse: String,
    /// Port fuer die Client-Verbindungen
    pub tcp_port: u16,
    /// Maximale Frame-Groesse in Bytes
    pub max_frame_bytes: usize,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            tcp_port: 7300,
            max_frame_bytes: 64 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingEinstellungen {
    /// Wartezeit nach der ein Pool-Eintrag verfaellt
    pub warte_timeout_sek: u64,
    /// Mindest-Reputation fuer `only_verified`
    pub min_reputation_verifiziert: u32,
}

impl Default for MatchingEinstellungen {
    fn default() -> Self {
        Self {
            warte_timeout_sek: 30,
            min_reputation_verifiziert: MIN_REPUTATION_VERIFIZIERT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatEinstellungen {
    /// Aufbewahrung seit der neuesten Nachricht eines Matches
    pub aufbewahrung_sek: u64,
    /// Intervall der Hintergrund-Bereinigung
    pub bereinigung_intervall_sek: u64,
    pub max_nachrichten_laenge: usize,
}

impl Default for ChatEinstellungen {
    fn default() -> Self {
        Self {
            aufbewahrung_sek: 3600,
            bereinigung_intervall_sek: 300,
            max_nachrichten_laenge: 2000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModerationEinstellungen {
    /// Blockierte Woerter (Teilstring, ohne Gross-/Kleinschreibung)
    pub blockierte_woerter: Vec<String>,
    /// Meldungen bis zur automatischen Sperre
    pub warnungs_schwelle: u32,
    /// Reputationsabzug pro Meldung
    pub reputation_abzug: u32,
}

impl Default for ModerationEinstellungen {
    fn default() -> Self {
        let standard = ModerationConfig::default();
        Self {
            blockierte_woerter: standard.blockierte_woerter,
            warnungs_schwelle: standard.warnungs_schwelle,
            reputation_abzug: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerbindungsEinstellungen {
    pub keepalive_sek: u64,
    /// Stille Verbindungen werden nach dieser Zeit getrennt
    pub timeout_sek: u64,
    /// Groesse der Send-Queue pro Client
    pub send_queue: usize,
}

impl Default for VerbindungsEinstellungen {
    fn default() -> Self {
        Self {
            keepalive_sek: 30,
            timeout_sek: 90,
            send_queue: 64,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level oder Filter-Ausdruck
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

/// Observability-Einstellungen (Metriken + Health-Check)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityEinstellungen {
    /// Aktiviert den Observability-Server
    pub aktiviert: bool,
    /// Port fuer Metriken und Health (Standard: 9300)
    pub port: u16,
}

impl Default for ObservabilityEinstellungen {
    fn default() -> Self {
        Self {
            aktiviert: true,
            port: 9300,
        }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Gibt die vollstaendige Bind-Adresse fuer TCP zurueck
    pub fn tcp_bind_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.bind_adresse, self.netzwerk.tcp_port)
    }

    /// Gibt die Bind-Adresse fuer den Observability-Server zurueck
    pub fn observability_bind_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.bind_adresse, self.observability.port)
    }

    pub fn bereinigung_intervall(&self) -> Duration {
        Duration::from_secs(self.chat.bereinigung_intervall_sek.max(1))
    }

    /// Uebersetzt in die Konfiguration des Signaling-Service
    pub fn signaling_config(&self) -> SignalingConfig {
        SignalingConfig {
            server_name: self.server.name.clone(),
            max_clients: self.server.max_clients,
            keepalive_sek: self.verbindung.keepalive_sek,
            verbindungs_timeout_sek: self.verbindung.timeout_sek,
            max_frame_bytes: self.netzwerk.max_frame_bytes,
            send_queue: self.verbindung.send_queue,
            reputation_abzug: self.moderation.reputation_abzug,
            matching: MatchingConfig {
                warte_timeout: Duration::from_secs(self.matching.warte_timeout_sek),
                min_reputation_verifiziert: self.matching.min_reputation_verifiziert,
            },
            moderation: ModerationConfig {
                blockierte_woerter: self.moderation.blockierte_woerter.clone(),
                warnungs_schwelle: self.moderation.warnungs_schwelle,
            },
            chat: ChatConfig {
                aufbewahrung: Duration::from_secs(self.chat.aufbewahrung_sek),
                max_nachrichten_laenge: self.chat.max_nachrichten_laenge,
            },
        }
    }
}
