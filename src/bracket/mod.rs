//! Bracket advancement.
//!
//! Runs after every score submission:
//! - when the last pool-play game completes, semifinal placeholders such as
//!   "1st Pool A" are replaced by the teams the standings engine ranks there
//! - when a semifinal completes, its winner moves into the final slot that
//!   names it as a source
//!
//! Slots that already hold a team are never overwritten, so advancement can
//! be re-run at any time.

mod placeholder;

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

pub use placeholder::{Ordinal, Placeholder, PlaceholderError};

use crate::models::{Game, GameId, GameStage, Pool, PoolId, Side, TeamId, TeamRef, TournamentId};
use crate::standings::{compute_pool_standings, PoolStandings};
use crate::storage::{SlotUpdate, StorageError, TournamentStore};

/// Errors that can occur during advancement.
#[derive(Debug, Error)]
pub enum AdvanceError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Game not found: {0}")]
    GameNotFound(GameId),
}

/// What an advancement run concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvancementStatus {
    /// The scored game's stage feeds nothing
    NotBracketFeeder,
    PoolPlayIncomplete,
    SlotsAlreadyFilled,
    /// Semifinal has no decided winner yet
    NoWinner,
    Evaluated,
}

/// One team written into a bracket slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotAssignment {
    pub game_id: GameId,
    pub side: Side,
    pub team_id: TeamId,
    /// Placeholder text or source game the team came from
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdvancementReport {
    pub status: AdvancementStatus,
    /// Pool-play games still not completed
    pub pending_games: usize,
    pub assignments: Vec<SlotAssignment>,
}

impl AdvancementReport {
    fn with_status(status: AdvancementStatus) -> Self {
        Self {
            status,
            pending_games: 0,
            assignments: Vec::new(),
        }
    }
}

/// Final pool rankings, keyed by pool id.
#[derive(Debug, Clone, Default)]
pub struct PoolRankings {
    pools: Vec<Pool>,
    rankings: HashMap<PoolId, Vec<TeamRef>>,
}

impl PoolRankings {
    pub fn from_tables(tables: &[PoolStandings]) -> Self {
        let mut rankings = HashMap::with_capacity(tables.len());
        let mut pools = Vec::with_capacity(tables.len());
        for table in tables {
            rankings.insert(table.pool.id.clone(), table.ranking());
            pools.push(table.pool.clone());
        }
        Self { pools, rankings }
    }

    pub fn ranking(&self, pool_id: &PoolId) -> Option<&[TeamRef]> {
        self.rankings.get(pool_id).map(Vec::as_slice)
    }

    pub fn pool_for_label(&self, label: &str) -> Option<&Pool> {
        self.pools.iter().find(|p| p.matches_label(label))
    }

    /// Team currently holding the placeholder's position, if the pool exists
    /// and has that many teams.
    pub fn resolve(&self, placeholder: &Placeholder) -> Option<&TeamRef> {
        let pool = self.pool_for_label(&placeholder.pool_label)?;
        self.ranking(&pool.id)?.get(placeholder.ordinal.index())
    }
}

/// Moves teams into bracket slots as results come in.
pub struct BracketAdvancer {
    store: Arc<dyn TournamentStore>,
}

impl BracketAdvancer {
    pub fn new(store: Arc<dyn TournamentStore>) -> Self {
        Self { store }
    }

    /// Advance whatever the scored game unlocks.
    pub async fn on_game_scored(
        &self,
        tournament_id: &TournamentId,
        game_id: &GameId,
    ) -> Result<AdvancementReport, AdvanceError> {
        let game = self
            .store
            .game(tournament_id, game_id)
            .await?
            .ok_or_else(|| AdvanceError::GameNotFound(game_id.clone()))?;

        match game.stage {
            GameStage::PoolPlay => self.advance_pools(tournament_id).await,
            GameStage::Semifinal => self.advance_semifinal(tournament_id, &game).await,
            stage => {
                debug!("Game {} is {}, nothing to advance", game_id, stage);
                Ok(AdvancementReport::with_status(
                    AdvancementStatus::NotBracketFeeder,
                ))
            }
        }
    }

    async fn advance_pools(
        &self,
        tournament_id: &TournamentId,
    ) -> Result<AdvancementReport, AdvanceError> {
        let pool_games = self
            .store
            .games(tournament_id, Some(GameStage::PoolPlay))
            .await?;
        let pending = pool_games.iter().filter(|g| !g.is_completed()).count();
        if pending > 0 {
            debug!(
                "{} pool-play games still open in {}, not advancing",
                pending, tournament_id
            );
            let mut report = AdvancementReport::with_status(AdvancementStatus::PoolPlayIncomplete);
            report.pending_games = pending;
            return Ok(report);
        }

        let semis = self
            .store
            .games(tournament_id, Some(GameStage::Semifinal))
            .await?;
        if semis
            .iter()
            .all(|g| g.home_team_id.is_some() && g.away_team_id.is_some())
        {
            return Ok(AdvancementReport::with_status(
                AdvancementStatus::SlotsAlreadyFilled,
            ));
        }

        let pools = self.store.pools(tournament_id).await?;
        let pool_teams = self.store.pool_teams(tournament_id).await?;
        let rules = self.store.tiebreaker_rules(tournament_id).await?;
        let scoring = self.store.scoring(tournament_id).await?;

        let tables = compute_pool_standings(&pools, &pool_teams, &pool_games, &rules, &scoring);
        let rankings = PoolRankings::from_tables(&tables);

        let mut report = AdvancementReport::with_status(AdvancementStatus::Evaluated);
        for semi in &semis {
            let mut update = SlotUpdate::default();

            if semi.home_team_id.is_none() {
                if let Some(assignment) =
                    assign_from_placeholder(semi, Side::Home, semi.home_placeholder.as_deref(), &rankings)
                {
                    update.home_team_id = Some(assignment.team_id.clone());
                    report.assignments.push(assignment);
                }
            }
            if semi.away_team_id.is_none() {
                if let Some(assignment) =
                    assign_from_placeholder(semi, Side::Away, semi.away_placeholder.as_deref(), &rankings)
                {
                    update.away_team_id = Some(assignment.team_id.clone());
                    report.assignments.push(assignment);
                }
            }

            if !update.is_empty() {
                self.store
                    .update_game_slots(tournament_id, &semi.id, &update)
                    .await?;
                info!("Advanced pool winners into semifinal {}", semi.id);
            }
        }

        Ok(report)
    }

    async fn advance_semifinal(
        &self,
        tournament_id: &TournamentId,
        semi: &Game,
    ) -> Result<AdvancementReport, AdvanceError> {
        let Some(winner) = semi.winner().cloned() else {
            debug!("Semifinal {} has no winner yet", semi.id);
            return Ok(AdvancementReport::with_status(AdvancementStatus::NoWinner));
        };

        let finals = self
            .store
            .games(tournament_id, Some(GameStage::Final))
            .await?;

        let mut report = AdvancementReport::with_status(AdvancementStatus::Evaluated);
        for final_game in &finals {
            let mut update = SlotUpdate::default();
            let source = format!("Winner of {}", semi.id);

            if final_game.bracket_source_game_1_id.as_ref() == Some(&semi.id)
                && final_game.home_team_id.is_none()
            {
                update.home_team_id = Some(winner.clone());
                report.assignments.push(SlotAssignment {
                    game_id: final_game.id.clone(),
                    side: Side::Home,
                    team_id: winner.clone(),
                    source: source.clone(),
                });
            }
            if final_game.bracket_source_game_2_id.as_ref() == Some(&semi.id)
                && final_game.away_team_id.is_none()
            {
                update.away_team_id = Some(winner.clone());
                report.assignments.push(SlotAssignment {
                    game_id: final_game.id.clone(),
                    side: Side::Away,
                    team_id: winner.clone(),
                    source,
                });
            }

            if !update.is_empty() {
                self.store
                    .update_game_slots(tournament_id, &final_game.id, &update)
                    .await?;
                info!(
                    "Advanced {} from semifinal {} into final {}",
                    winner, semi.id, final_game.id
                );
            }
        }

        Ok(report)
    }
}

fn assign_from_placeholder(
    game: &Game,
    side: Side,
    text: Option<&str>,
    rankings: &PoolRankings,
) -> Option<SlotAssignment> {
    let text = text?;
    let placeholder: Placeholder = match text.parse() {
        Ok(p) => p,
        Err(e) => {
            debug!("Skipping slot of game {}: {}", game.id, e);
            return None;
        }
    };
    let Some(team) = rankings.resolve(&placeholder) else {
        debug!(
            "No team at {} for game {}",
            placeholder, game.id
        );
        return None;
    };

    Some(SlotAssignment {
        game_id: game.id.clone(),
        side,
        team_id: team.team_id.clone(),
        source: placeholder.to_string(),
    })
}
