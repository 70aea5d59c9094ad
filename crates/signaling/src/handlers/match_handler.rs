//! Match-Handler – Start, Skip und Ende einer Paarung
//!
//! Die eigentlichen Uebergaenge laufen ueber den `LifecycleController`,
//! dieser Handler protokolliert nur das Ergebnis.

use roulette_core::{MatchFilter, UserId};
use std::sync::Arc;

use crate::error::SignalingResult;
use crate::lifecycle::StartErgebnis;
use crate::server_state::RouletteState;

/// `match:start`
pub fn handle_match_start(
    filter: Option<MatchFilter>,
    user_id: UserId,
    state: &Arc<RouletteState>,
) -> SignalingResult<()> {
    state.registry.aktivitaet_markieren(&user_id);
    let ergebnis = state.lifecycle.starten(user_id, filter)?;
    ergebnis_loggen(user_id, &ergebnis, "Suche gestartet");
    Ok(())
}

/// `match:skip`
pub fn handle_match_skip(user_id: UserId, state: &Arc<RouletteState>) -> SignalingResult<()> {
    state.registry.aktivitaet_markieren(&user_id);
    let (beendet, ergebnis) = state.lifecycle.ueberspringen(user_id)?;
    tracing::info!(user_id = %user_id, match_id = %beendet.id, "Match uebersprungen");
    ergebnis_loggen(user_id, &ergebnis, "Neue Suche");
    Ok(())
}

/// `match:end`
pub fn handle_match_end(user_id: UserId, state: &Arc<RouletteState>) -> SignalingResult<()> {
    state.registry.aktivitaet_markieren(&user_id);
    if let Some(m) = state.lifecycle.beenden(user_id)? {
        tracing::info!(
            user_id = %user_id,
            match_id = %m.id,
            dauer_ms = m.duration_ms.unwrap_or_default(),
            "Match beendet"
        );
    }
    Ok(())
}

fn ergebnis_loggen(user_id: UserId, ergebnis: &StartErgebnis, kontext: &str) {
    match ergebnis {
        StartErgebnis::Gefunden(m) => tracing::info!(
            user_id = %user_id,
            match_id = %m.id,
            partner = ?m.partner_von(&user_id),
            "{kontext}: Match gebildet"
        ),
        StartErgebnis::Wartend => {
            tracing::debug!(user_id = %user_id, "{kontext}: wartet im Pool")
        }
    }
}
