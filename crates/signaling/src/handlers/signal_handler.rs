//! Signal-Relay – Offer, Answer und ICE-Kandidaten
//!
//! Payloads werden unveraendert an den Partner weitergereicht. Ohne
//! aktives Match wird still verworfen.

use roulette_core::UserId;
use roulette_protocol::ServerEvent;
use std::sync::Arc;

use crate::server_state::RouletteState;

/// Leitet ein bereits in ein Server-Ereignis verpacktes Signal weiter
pub fn handle_signal(ereignis: ServerEvent, user_id: UserId, state: &Arc<RouletteState>) {
    let name = ereignis.name();
    if state.lifecycle.an_partner_senden(&user_id, ereignis) {
        tracing::trace!(user_id = %user_id, ereignis = name, "Signal weitergeleitet");
    } else {
        tracing::debug!(user_id = %user_id, ereignis = name, "Signal ohne Partner verworfen");
    }
}
