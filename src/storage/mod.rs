//! Tournament record storage.
//!
//! The standings engine never touches storage; bracket advancement and the
//! API reach records through the [`TournamentStore`] trait:
//! - JSONL files per tournament ([`JsonlStore`]), the source of truth on disk
//! - an in-memory store ([`MemoryStore`]) for tests and embedding

mod jsonl;
mod memory;

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use jsonl::{EntityType, JsonlReader, JsonlStore, JsonlWriter, PoolMembership};
pub use memory::MemoryStore;

use crate::models::{
    Game, GameId, GameStage, Pool, PoolTeam, ScoringSettings, TeamId, TiebreakerRule,
    Tournament, TournamentId,
};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed record at {}:{line}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },

    #[error("Game not found: {0}")]
    GameNotFound(GameId),

    #[error("Invalid id: {0}")]
    InvalidId(String),
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn tournaments_dir(&self) -> PathBuf {
        self.data_dir.join("tournaments")
    }

    /// Directory holding one tournament's files.
    pub fn tournament_dir(&self, id: &TournamentId) -> Result<PathBuf, StorageError> {
        let raw = id.as_str();
        if raw.is_empty() || raw == "." || raw == ".." || raw.contains(['/', '\\']) {
            return Err(StorageError::InvalidId(raw.to_string()));
        }
        Ok(self.tournaments_dir().join(raw))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

/// Partial update of a game's team slots. `None` leaves a slot untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_team_id: Option<TeamId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub away_team_id: Option<TeamId>,
}

impl SlotUpdate {
    pub fn is_empty(&self) -> bool {
        self.home_team_id.is_none() && self.away_team_id.is_none()
    }

    pub fn apply_to(&self, game: &mut Game) {
        if let Some(id) = &self.home_team_id {
            game.home_team_id = Some(id.clone());
        }
        if let Some(id) = &self.away_team_id {
            game.away_team_id = Some(id.clone());
        }
    }
}

/// Record access needed by bracket advancement and the API.
#[async_trait]
pub trait TournamentStore: Send + Sync {
    async fn tournament(&self, id: &TournamentId) -> Result<Option<Tournament>, StorageError>;

    async fn game(
        &self,
        tournament_id: &TournamentId,
        game_id: &GameId,
    ) -> Result<Option<Game>, StorageError>;

    /// All games of a tournament, optionally restricted to one stage.
    async fn games(
        &self,
        tournament_id: &TournamentId,
        stage: Option<GameStage>,
    ) -> Result<Vec<Game>, StorageError>;

    async fn pools(&self, tournament_id: &TournamentId) -> Result<Vec<Pool>, StorageError>;

    /// Pool memberships joined with team names.
    async fn pool_teams(&self, tournament_id: &TournamentId)
        -> Result<Vec<PoolTeam>, StorageError>;

    /// Tiebreaker rules in ascending `priority_order`.
    async fn tiebreaker_rules(
        &self,
        tournament_id: &TournamentId,
    ) -> Result<Vec<TiebreakerRule>, StorageError>;

    async fn update_game_slots(
        &self,
        tournament_id: &TournamentId,
        game_id: &GameId,
        update: &SlotUpdate,
    ) -> Result<(), StorageError>;

    /// Replace a stored game with `game`.
    async fn save_game(&self, game: &Game) -> Result<(), StorageError>;

    /// Fallbacks for tournaments without their own scoring settings.
    fn scoring_defaults(&self) -> ScoringSettings;

    async fn scoring(&self, tournament_id: &TournamentId) -> Result<ScoringSettings, StorageError> {
        let tournament = self.tournament(tournament_id).await?;
        Ok(ScoringSettings::for_tournament(
            tournament.as_ref(),
            self.scoring_defaults(),
        ))
    }
}
