//! Ereignis-Protokoll (bidirektionaler Event-Kanal)
//!
//! ## Design
//! - JSON-Umschlag `{"event": "<name>", "data": <payload>}` (adjacently tagged)
//! - Ereignisnamen im Format `bereich:aktion`, z.B. `match:start`
//! - Signaling-Payloads (`signal:*`) bleiben unstrukturiertes JSON und
//!   werden vom Server nicht interpretiert

use roulette_core::{
    EndReason, Match, MatchFilter, Message, MessageId, ProfileUpdate, ReportReason, Statistik,
    UserId, UserSession,
};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Fehler-Codes
// ---------------------------------------------------------------------------

/// Fehler-Codes die an den ausloesenden Client gemeldet werden
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    UserNotFound,
    MatchStartError,
    SkipError,
    MessageBlocked,
    MessageSendError,
    ReportError,
    UserUpdateError,
    InvalidRequest,
    InternalError,
}

/// Standardisierte Fehler-Antwort
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Nachricht senden
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageSendRequest {
    pub content: String,
}

/// Tipp-Indikator (in beide Richtungen)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingIndicator {
    pub is_typing: bool,
}

/// Lesebestaetigung
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReadRequest {
    pub message_id: MessageId,
}

/// Gegenueber melden
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub reported_user_id: UserId,
    pub reason: ReportReason,
    #[serde(default)]
    pub description: Option<String>,
}

/// Gegenueber blockieren (Anfrage und Bestaetigung)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockTarget {
    pub user_id: UserId,
}

/// Match-Ende mit Grund
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchEnded {
    pub reason: EndReason,
}

/// Art einer Benachrichtigung
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Warning,
    Error,
    Success,
}

/// Kurzlebige Benachrichtigung fuer die Oberflaeche
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// Anzeigedauer in Millisekunden
    pub duration_ms: Option<u64>,
}

/// Keepalive-Ping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingMessage {
    /// Unix-Timestamp in Millisekunden fuer RTT-Messung
    pub timestamp_ms: u64,
}

/// Pong-Antwort (spiegelt Timestamp zurueck)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PongMessage {
    pub echo_timestamp_ms: u64,
    pub server_timestamp_ms: u64,
}

// ---------------------------------------------------------------------------
// Client -> Server
// ---------------------------------------------------------------------------

/// Alle Ereignisse die ein Client senden darf
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "match:start")]
    MatchStart(Option<MatchFilter>),
    #[serde(rename = "match:skip")]
    MatchSkip,
    #[serde(rename = "match:end")]
    MatchEnd,

    #[serde(rename = "message:send")]
    MessageSend(MessageSendRequest),
    #[serde(rename = "message:typing")]
    MessageTyping(TypingIndicator),
    #[serde(rename = "message:read")]
    MessageRead(MessageReadRequest),

    #[serde(rename = "signal:offer")]
    SignalOffer(serde_json::Value),
    #[serde(rename = "signal:answer")]
    SignalAnswer(serde_json::Value),
    #[serde(rename = "signal:ice")]
    SignalIce(serde_json::Value),

    #[serde(rename = "user:report")]
    UserReport(ReportRequest),
    #[serde(rename = "user:block")]
    UserBlock(BlockTarget),
    #[serde(rename = "user:update")]
    UserUpdate(ProfileUpdate),

    #[serde(rename = "stats:request")]
    StatsRequest,

    #[serde(rename = "ping")]
    Ping(PingMessage),
    #[serde(rename = "pong")]
    Pong(PongMessage),
}

impl ClientEvent {
    /// Ereignisname fuer Logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::MatchStart(_) => "match:start",
            Self::MatchSkip => "match:skip",
            Self::MatchEnd => "match:end",
            Self::MessageSend(_) => "message:send",
            Self::MessageTyping(_) => "message:typing",
            Self::MessageRead(_) => "message:read",
            Self::SignalOffer(_) => "signal:offer",
            Self::SignalAnswer(_) => "signal:answer",
            Self::SignalIce(_) => "signal:ice",
            Self::UserReport(_) => "user:report",
            Self::UserBlock(_) => "user:block",
            Self::UserUpdate(_) => "user:update",
            Self::StatsRequest => "stats:request",
            Self::Ping(_) => "ping",
            Self::Pong(_) => "pong",
        }
    }
}

// ---------------------------------------------------------------------------
// Server -> Client
// ---------------------------------------------------------------------------

/// Alle Ereignisse die der Server an einen Client sendet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "user:connected")]
    UserConnected(UserSession),
    #[serde(rename = "user:blocked")]
    UserBlocked(BlockTarget),

    #[serde(rename = "match:searching")]
    MatchSearching,
    #[serde(rename = "match:found")]
    MatchFound(Box<Match>),
    #[serde(rename = "match:ended")]
    MatchEnded(MatchEnded),

    #[serde(rename = "message:received")]
    MessageReceived(Message),
    #[serde(rename = "message:typing")]
    MessageTyping(TypingIndicator),

    #[serde(rename = "signal:offer")]
    SignalOffer(serde_json::Value),
    #[serde(rename = "signal:answer")]
    SignalAnswer(serde_json::Value),
    #[serde(rename = "signal:ice")]
    SignalIce(serde_json::Value),

    #[serde(rename = "stats:update")]
    StatsUpdate(Statistik),
    #[serde(rename = "notification")]
    Notification(Notification),
    #[serde(rename = "error")]
    Error(ErrorResponse),

    #[serde(rename = "ping")]
    Ping(PingMessage),
    #[serde(rename = "pong")]
    Pong(PongMessage),
}

impl ServerEvent {
    /// Erstellt eine Fehler-Antwort
    pub fn fehler(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error(ErrorResponse {
            code,
            message: message.into(),
        })
    }

    /// Erstellt ein `match:ended`-Ereignis
    pub fn match_beendet(reason: EndReason) -> Self {
        Self::MatchEnded(MatchEnded { reason })
    }

    /// Erstellt ein `match:found`-Ereignis
    pub fn match_gefunden(m: Match) -> Self {
        Self::MatchFound(Box::new(m))
    }

    /// Erfolgs-Benachrichtigung mit Standard-Anzeigedauer (3 s)
    pub fn erfolg(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Notification(Notification {
            kind: NotificationKind::Success,
            title: title.into(),
            message: message.into(),
            duration_ms: Some(3000),
        })
    }

    /// Darf bei voller Send-Queue verworfen werden
    ///
    /// Fluechtige Ereignisse (Tippen, Signale, Statistik, Keepalive) haben
    /// keine Folgen fuer den Zustand. Alle anderen muessen den Client
    /// erreichen oder die Verbindung wird getrennt.
    pub fn ist_verwerfbar(&self) -> bool {
        matches!(
            self,
            Self::MessageTyping(_)
                | Self::SignalOffer(_)
                | Self::SignalAnswer(_)
                | Self::SignalIce(_)
                | Self::StatsUpdate(_)
                | Self::Ping(_)
                | Self::Pong(_)
        )
    }

    /// Ereignisname fuer Logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::UserConnected(_) => "user:connected",
            Self::UserBlocked(_) => "user:blocked",
            Self::MatchSearching => "match:searching",
            Self::MatchFound(_) => "match:found",
            Self::MatchEnded(_) => "match:ended",
            Self::MessageReceived(_) => "message:received",
            Self::MessageTyping(_) => "message:typing",
            Self::SignalOffer(_) => "signal:offer",
            Self::SignalAnswer(_) => "signal:answer",
            Self::SignalIce(_) => "signal:ice",
            Self::StatsUpdate(_) => "stats:update",
            Self::Notification(_) => "notification",
            Self::Error(_) => "error",
            Self::Ping(_) => "ping",
            Self::Pong(_) => "pong",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
