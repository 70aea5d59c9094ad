//! Chat-Handler – Nachrichten, Tipp-Indikator, Lesebestaetigung
//!
//! Pipeline fuer `message:send`:
//!
//! ```text
//! aktives Match? --nein--> still verwerfen
//!      |
//!   Moderation --blockiert--> MESSAGE_BLOCKED an den Sender
//!      |
//!   speichern + an Partner zustellen (unter dem Uebergangs-Guard)
//! ```

use roulette_core::{inhalt_vorschau, MessageType, UserId};
use roulette_protocol::events::{MessageReadRequest, MessageSendRequest, TypingIndicator};
use roulette_protocol::ServerEvent;
use std::sync::Arc;

use crate::error::{SignalingError, SignalingResult};
use crate::server_state::RouletteState;

/// `message:send`
pub async fn handle_nachricht_senden(
    anfrage: MessageSendRequest,
    user_id: UserId,
    state: &Arc<RouletteState>,
) -> SignalingResult<()> {
    state.registry.aktivitaet_markieren(&user_id);

    if state.engine.aktives_match_von(&user_id).is_none() {
        tracing::debug!(user_id = %user_id, "Nachricht ohne aktives Match verworfen");
        return Ok(());
    }

    if !state.moderation.check_text(&anfrage.content).await {
        state.statistik.nachricht_blockiert();
        return Err(SignalingError::InhaltBlockiert);
    }

    // Das Match kann waehrend der Moderation geendet haben
    let ergebnis = state.lifecycle.im_aktiven_match(&user_id, |m| {
        let nachricht =
            state
                .chat
                .nachricht_erstellen(m.id, user_id, &anfrage.content, MessageType::Text)?;
        let zugestellt = m
            .partner_von(&user_id)
            .map(|partner| {
                state
                    .broadcaster
                    .an_user_senden(&partner, ServerEvent::MessageReceived(nachricht.clone()))
            })
            .unwrap_or(false);
        SignalingResult::Ok((nachricht, zugestellt))
    });

    match ergebnis {
        None => {
            tracing::debug!(user_id = %user_id, "Match vor dem Speichern beendet, Nachricht verworfen");
            Ok(())
        }
        Some(Ok((nachricht, zugestellt))) => {
            state.statistik.nachricht_weitergeleitet();
            tracing::debug!(
                user_id = %user_id,
                match_id = %nachricht.match_id,
                message_id = %nachricht.id,
                vorschau = %inhalt_vorschau(&nachricht.content),
                zugestellt,
                "Nachricht weitergeleitet"
            );
            Ok(())
        }
        Some(Err(e)) => Err(e),
    }
}

/// `message:typing` – nur an den Partner, sonst still verworfen
pub fn handle_tippen(
    indikator: TypingIndicator,
    user_id: UserId,
    state: &Arc<RouletteState>,
) -> SignalingResult<()> {
    state
        .lifecycle
        .an_partner_senden(&user_id, ServerEvent::MessageTyping(indikator));
    Ok(())
}

/// `message:read`
pub fn handle_gelesen(
    anfrage: MessageReadRequest,
    user_id: UserId,
    state: &Arc<RouletteState>,
) -> SignalingResult<()> {
    let markiert = state
        .lifecycle
        .im_aktiven_match(&user_id, |m| {
            state
                .chat
                .als_gelesen_markieren(&m.id, &anfrage.message_id, &user_id)
        })
        .unwrap_or(false);
    tracing::trace!(user_id = %user_id, message_id = %anfrage.message_id, markiert, "Lesebestaetigung");
    Ok(())
}
