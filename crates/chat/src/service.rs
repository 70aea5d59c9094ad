//! ChatService – Nachrichten eines Matches speichern, lesen, bereinigen

use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use roulette_core::{MatchId, Message, MessageId, MessageType, UserId};

use crate::error::{ChatError, ChatResult};

/// Absolute Aufbewahrungsgrenze fuer Nachrichten (1 Stunde)
pub const STANDARD_AUFBEWAHRUNG: Duration = Duration::from_secs(60 * 60);

/// Maximale Nachrichtenlaenge in Zeichen
pub const STANDARD_MAX_LAENGE: usize = 2000;

/// Konfiguration des Nachrichtenspeichers
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub aufbewahrung: Duration,
    pub max_nachrichten_laenge: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            aufbewahrung: STANDARD_AUFBEWAHRUNG,
            max_nachrichten_laenge: STANDARD_MAX_LAENGE,
        }
    }
}

/// In-Memory-Speicher fuer Match-Nachrichten
///
/// Nachrichten eines Matches liegen in Sendereihenfolge hintereinander.
#[derive(Default)]
pub struct ChatService {
    config: ChatConfig,
    nachrichten: DashMap<MatchId, Vec<Message>>,
}

impl ChatService {
    pub fn neu(config: ChatConfig) -> Self {
        Self {
            config,
            nachrichten: DashMap::new(),
        }
    }

    /// Legt eine Nachricht an und speichert sie beim Match
    ///
    /// Der Aufrufer stellt sicher, dass das Match aktiv und der Inhalt
    /// moderiert ist.
    pub fn nachricht_erstellen(
        &self,
        match_id: MatchId,
        sender_id: UserId,
        content: &str,
        message_type: MessageType,
    ) -> ChatResult<Message> {
        if content.trim().is_empty() {
            return Err(ChatError::UngueltigeEingabe(
                "Nachrichteninhalt darf nicht leer sein".into(),
            ));
        }

        let laenge = content.chars().count();
        if laenge > self.config.max_nachrichten_laenge {
            return Err(ChatError::ZuLang {
                laenge,
                max: self.config.max_nachrichten_laenge,
            });
        }

        let nachricht = Message {
            id: MessageId::new(),
            match_id,
            sender_id,
            content: content.to_string(),
            timestamp: Utc::now(),
            message_type,
            is_read: false,
        };

        self.nachrichten
            .entry(match_id)
            .or_default()
            .push(nachricht.clone());

        tracing::debug!(
            message_id = %nachricht.id,
            match_id = %match_id,
            sender_id = %sender_id,
            "Nachricht gespeichert"
        );
        Ok(nachricht)
    }

    /// Alle Nachrichten eines Matches in Sendereihenfolge
    pub fn nachrichten_fuer(&self, match_id: &MatchId) -> Vec<Message> {
        self.nachrichten
            .get(match_id)
            .map(|n| n.clone())
            .unwrap_or_default()
    }

    /// Markiert eine Nachricht als gelesen
    ///
    /// Nur der Empfaenger kann eine Nachricht als gelesen markieren. Gibt
    /// `true` zurueck wenn sich der Status geaendert hat.
    pub fn als_gelesen_markieren(
        &self,
        match_id: &MatchId,
        message_id: &MessageId,
        leser: &UserId,
    ) -> bool {
        let Some(mut nachrichten) = self.nachrichten.get_mut(match_id) else {
            return false;
        };
        match nachrichten
            .iter_mut()
            .find(|n| n.id == *message_id && n.sender_id != *leser)
        {
            Some(n) if !n.is_read => {
                n.is_read = true;
                true
            }
            _ => false,
        }
    }

    /// Verwirft alle Nachrichten eines Matches
    pub fn match_nachrichten_loeschen(&self, match_id: &MatchId) -> usize {
        let anzahl = self
            .nachrichten
            .remove(match_id)
            .map(|(_, n)| n.len())
            .unwrap_or(0);
        if anzahl > 0 {
            tracing::debug!(match_id = %match_id, anzahl, "Match-Nachrichten verworfen");
        }
        anzahl
    }

    /// Entfernt Matches deren neueste Nachricht die Aufbewahrung ueberschritten hat
    pub fn bereinigen(&self) -> usize {
        self.bereinigen_bei(Utc::now())
    }

    /// Wie `bereinigen`, mit explizitem Zeitpunkt
    pub fn bereinigen_bei(&self, jetzt: DateTime<Utc>) -> usize {
        let grenze = chrono::Duration::from_std(self.config.aufbewahrung)
            .map(|d| jetzt - d)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let vorher = self.nachrichten.len();
        self.nachrichten.retain(|match_id, nachrichten| {
            let behalten = nachrichten
                .last()
                .is_some_and(|neueste| neueste.timestamp >= grenze);
            if !behalten {
                tracing::info!(match_id = %match_id, "Alte Nachrichten bereinigt");
            }
            behalten
        });
        vorher.saturating_sub(self.nachrichten.len())
    }

    /// Anzahl der Matches mit gespeicherten Nachrichten
    pub fn match_anzahl(&self) -> usize {
        self.nachrichten.len()
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }
}
