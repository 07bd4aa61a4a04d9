use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::{Game, GameStage, TeamId, TournamentId};

#[derive(Debug, Serialize)]
pub struct BracketGame {
    #[serde(flatten)]
    pub game: Game,
    pub winner: Option<TeamId>,
}

impl From<Game> for BracketGame {
    fn from(game: Game) -> Self {
        Self {
            winner: game.winner().cloned(),
            game,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BracketResponse {
    pub tournament_id: TournamentId,
    pub semifinals: Vec<BracketGame>,
    pub finals: Vec<BracketGame>,
}

pub async fn bracket(
    State(state): State<AppState>,
    Path(tid): Path<String>,
) -> Result<Json<BracketResponse>, ApiError> {
    let tournament_id = TournamentId::from(tid);

    let mut semifinals = state
        .store
        .games(&tournament_id, Some(GameStage::Semifinal))
        .await?;
    let mut finals = state
        .store
        .games(&tournament_id, Some(GameStage::Final))
        .await?;
    semifinals.sort_by(|a, b| a.game_number.cmp(&b.game_number));
    finals.sort_by(|a, b| a.game_number.cmp(&b.game_number));

    Ok(Json(BracketResponse {
        tournament_id,
        semifinals: semifinals.into_iter().map(BracketGame::from).collect(),
        finals: finals.into_iter().map(BracketGame::from).collect(),
    }))
}
