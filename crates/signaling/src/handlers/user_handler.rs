//! User-Handler – Profil, Meldung, Blockierung, Statistik

use roulette_core::{ProfileUpdate, UserId};
use roulette_protocol::events::{BlockTarget, ReportRequest};
use roulette_protocol::ServerEvent;
use std::sync::Arc;

use crate::error::SignalingResult;
use crate::server_state::RouletteState;

/// `user:update` – Profil uebernehmen und extern sichern
///
/// Fehler des Profil-Speichers werden geloggt, nicht gemeldet.
pub async fn handle_profil_aktualisieren(
    update: ProfileUpdate,
    user_id: UserId,
    state: &Arc<RouletteState>,
) -> SignalingResult<()> {
    let sitzung = state.lifecycle.profil_aktualisieren(user_id, update)?;
    if let Err(e) = state.profil_speicher.profil_speichern(&sitzung).await {
        tracing::error!(user_id = %user_id, fehler = %e, "Profil konnte nicht gespeichert werden");
    }
    Ok(())
}

/// `user:report`
pub async fn handle_melden(
    anfrage: ReportRequest,
    user_id: UserId,
    state: &Arc<RouletteState>,
) -> SignalingResult<()> {
    state.registry.aktivitaet_markieren(&user_id);
    state.lifecycle.melden(user_id, anfrage).await?;
    Ok(())
}

/// `user:block`
pub fn handle_blockieren(
    ziel: BlockTarget,
    user_id: UserId,
    state: &Arc<RouletteState>,
) -> SignalingResult<()> {
    state.registry.aktivitaet_markieren(&user_id);
    state.lifecycle.blockieren(user_id, ziel.user_id)
}

/// `stats:request`
pub fn handle_statistik(state: &Arc<RouletteState>) -> ServerEvent {
    ServerEvent::StatsUpdate(state.lifecycle.statistik())
}
