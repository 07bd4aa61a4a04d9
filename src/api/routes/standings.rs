use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::{GameStage, TiebreakerRule, TournamentId};
use crate::standings::{compute_pool_standings, PoolStandings};

#[derive(Debug, Deserialize)]
pub struct StandingsParams {
    /// Pool name or label ("A" or "Pool A")
    pub pool: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StandingsResponse {
    pub tournament_id: TournamentId,
    pub pools: Vec<PoolStandings>,
}

pub async fn standings(
    State(state): State<AppState>,
    Path(tid): Path<String>,
    Query(params): Query<StandingsParams>,
) -> Result<Json<StandingsResponse>, ApiError> {
    let tournament_id = TournamentId::from(tid);

    let mut pools = state.store.pools(&tournament_id).await?;
    if let Some(label) = params.pool.as_deref() {
        pools.retain(|p| p.matches_label(label));
        if pools.is_empty() {
            return Err(ApiError::NotFound(format!("pool {}", label)));
        }
    }

    let pool_teams = state.store.pool_teams(&tournament_id).await?;
    let games = state
        .store
        .games(&tournament_id, Some(GameStage::PoolPlay))
        .await?;
    let rules = state.store.tiebreaker_rules(&tournament_id).await?;
    let scoring = state.store.scoring(&tournament_id).await?;

    let pools = compute_pool_standings(&pools, &pool_teams, &games, &rules, &scoring);

    Ok(Json(StandingsResponse {
        tournament_id,
        pools,
    }))
}

#[derive(Debug, Serialize)]
pub struct TiebreakerView {
    #[serde(flatten)]
    pub rule: TiebreakerRule,
    /// Text reported as `tiebreaker_used` when this rule separates teams
    pub label: String,
}

#[derive(Debug, Serialize)]
pub struct TiebreakersResponse {
    pub tournament_id: TournamentId,
    pub rules: Vec<TiebreakerView>,
}

pub async fn tiebreakers(
    State(state): State<AppState>,
    Path(tid): Path<String>,
) -> Result<Json<TiebreakersResponse>, ApiError> {
    let tournament_id = TournamentId::from(tid);
    let rules = state
        .store
        .tiebreaker_rules(&tournament_id)
        .await?
        .into_iter()
        .map(|rule| TiebreakerView {
            label: rule.label(),
            rule,
        })
        .collect();

    Ok(Json(TiebreakersResponse {
        tournament_id,
        rules,
    }))
}
