use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::bracket::AdvancementReport;
use crate::models::{Game, GameId, GameStage, ScoreEntry, TeamId, TournamentId};

#[derive(Debug, Deserialize)]
pub struct GamesParams {
    pub stage: Option<GameStage>,
    /// Only games this team plays in
    pub team: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GamesResponse {
    pub games: Vec<Game>,
    pub total: usize,
}

pub async fn list_games(
    State(state): State<AppState>,
    Path(tid): Path<String>,
    Query(params): Query<GamesParams>,
) -> Result<Json<GamesResponse>, ApiError> {
    let tournament_id = TournamentId::from(tid);
    let mut games = state.store.games(&tournament_id, params.stage).await?;

    if let Some(team) = params.team {
        let team_id = TeamId::from(team);
        games.retain(|g| g.involves(&team_id));
    }
    games.sort_by(|a, b| {
        a.start_time
            .cmp(&b.start_time)
            .then_with(|| a.game_number.cmp(&b.game_number))
    });

    let total = games.len();
    Ok(Json(GamesResponse { games, total }))
}

async fn load_game(
    state: &AppState,
    tournament_id: &TournamentId,
    game_id: &GameId,
) -> Result<Game, ApiError> {
    state
        .store
        .game(tournament_id, game_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("game {}", game_id)))
}

pub async fn start_game(
    State(state): State<AppState>,
    Path((tid, gid)): Path<(String, String)>,
) -> Result<Json<Game>, ApiError> {
    let tournament_id = TournamentId::from(tid);
    let mut game = load_game(&state, &tournament_id, &GameId::from(gid)).await?;

    if game.is_completed() {
        return Err(ApiError::BadRequest(format!(
            "game {} is already completed",
            game.id
        )));
    }
    game.mark_in_progress();
    state.store.save_game(&game).await?;

    Ok(Json(game))
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub game: Game,
    /// Absent when advancement failed; the score is saved regardless
    pub advancement: Option<AdvancementReport>,
}

pub async fn submit_score(
    State(state): State<AppState>,
    Path((tid, gid)): Path<(String, String)>,
    Json(entry): Json<ScoreEntry>,
) -> Result<Json<ScoreResponse>, ApiError> {
    let tournament_id = TournamentId::from(tid);
    let mut game = load_game(&state, &tournament_id, &GameId::from(gid)).await?;

    entry
        .check(&game)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    game.apply_score(&entry);
    state.store.save_game(&game).await?;
    info!(
        "Score recorded for game {}: {}-{}",
        game.id, entry.home_score, entry.away_score
    );

    let advancement = match state.advancer.on_game_scored(&tournament_id, &game.id).await {
        Ok(report) => Some(report),
        Err(e) => {
            warn!("Bracket advancement after game {} failed: {}", game.id, e);
            None
        }
    };

    Ok(Json(ScoreResponse { game, advancement }))
}

pub async fn advance(
    State(state): State<AppState>,
    Path((tid, gid)): Path<(String, String)>,
) -> Result<Json<AdvancementReport>, ApiError> {
    let report = state
        .advancer
        .on_game_scored(&TournamentId::from(tid), &GameId::from(gid))
        .await?;
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::build_router;
    use crate::api::routes::testing::{get_json, post_json, seeded, CUP};
    use crate::storage::TournamentStore;
    use axum::http::StatusCode;

    fn uri(game: &GameId, action: &str) -> String {
        format!("/api/tournaments/{}/games/{}/{}", CUP, game, action)
    }

    #[tokio::test]
    async fn test_list_games_filters() {
        let seeded = seeded().await;

        let app = build_router(seeded.state.clone());
        let (status, json) = get_json(app, "/api/tournaments/cup/games").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total"], 5);

        let app = build_router(seeded.state.clone());
        let (_, json) = get_json(app, "/api/tournaments/cup/games?stage=pool_play").await;
        assert_eq!(json["total"], 3);

        let app = build_router(seeded.state);
        let (_, json) = get_json(app, "/api/tournaments/cup/games?stage=pool_play&team=a3").await;
        assert_eq!(json["total"], 2);
    }

    #[tokio::test]
    async fn test_start_game() {
        let seeded = seeded().await;
        let app = build_router(seeded.state.clone());

        let (status, json) = post_json(app, &uri(&seeded.open_game, "start"), "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "in_progress");

        let app = build_router(seeded.state);
        let (status, _) = post_json(app, &uri(&GameId::from("ghost"), "start"), "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_final_pool_score_advances_bracket() {
        let seeded = seeded().await;
        let app = build_router(seeded.state);

        let (status, json) = post_json(
            app,
            &uri(&seeded.open_game, "score"),
            r#"{"home_score": 2, "away_score": 0, "penalty_minutes_home": 4}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["game"]["status"], "completed");
        assert_eq!(json["game"]["penalty_minutes_home"], 4);
        assert_eq!(json["advancement"]["status"], "evaluated");

        let sf1 = seeded.store.game(&CUP.into(), &seeded.sf1).await.unwrap().unwrap();
        assert_eq!(sf1.home_team_id, Some("a1".into()));
        assert_eq!(sf1.away_team_id, Some("a2".into()));
    }

    #[tokio::test]
    async fn test_semifinal_shootout_feeds_final() {
        let seeded = seeded().await;
        let app = build_router(seeded.state.clone());
        post_json(
            app,
            &uri(&seeded.open_game, "score"),
            r#"{"home_score": 2, "away_score": 0}"#,
        )
        .await;

        let app = build_router(seeded.state);
        let (status, json) = post_json(
            app,
            &uri(&seeded.sf1, "score"),
            r#"{"home_score": 1, "away_score": 1, "result_type": "shootout", "extra_time_winner": "away"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["game"]["shootout_winner_team_id"], "a2");

        let final_game = seeded
            .store
            .game(&CUP.into(), &seeded.final_game)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(final_game.home_team_id, Some("a2".into()));
    }

    #[tokio::test]
    async fn test_score_rejections() {
        let seeded = seeded().await;

        let app = build_router(seeded.state.clone());
        let (status, json) = post_json(
            app,
            &uri(&seeded.open_game, "score"),
            r#"{"home_score": 1, "away_score": 1, "result_type": "overtime"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");

        let app = build_router(seeded.state.clone());
        let (status, _) = post_json(
            app,
            &uri(&seeded.sf1, "score"),
            r#"{"home_score": 3, "away_score": 2}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let open = seeded
            .store
            .game(&CUP.into(), &seeded.open_game)
            .await
            .unwrap()
            .unwrap();
        assert!(!open.is_completed());
    }

    #[tokio::test]
    async fn test_manual_advance_waits_for_pool_play() {
        let seeded = seeded().await;
        let app = build_router(seeded.state);

        let (status, json) = post_json(app, &uri(&seeded.open_game, "advance"), "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "pool_play_incomplete");
        assert_eq!(json["pending_games"], 1);
    }
}
