//! In-memory store.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{SlotUpdate, StorageError, TournamentStore};
use crate::models::{
    Game, GameId, GameStage, Pool, PoolTeam, ScoringSettings, TiebreakerRule, Tournament,
    TournamentId,
};

#[derive(Debug, Default)]
struct Records {
    tournaments: Vec<Tournament>,
    games: Vec<Game>,
    pools: Vec<Pool>,
    pool_teams: Vec<PoolTeam>,
    rules: Vec<TiebreakerRule>,
}

/// [`TournamentStore`] kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Records>,
    defaults: ScoringSettings,
}

impl MemoryStore {
    pub fn new(defaults: ScoringSettings) -> Self {
        Self {
            records: RwLock::new(Records::default()),
            defaults,
        }
    }

    pub async fn insert_tournament(&self, tournament: Tournament) {
        let mut records = self.records.write().await;
        records.tournaments.retain(|t| t.id != tournament.id);
        records.tournaments.push(tournament);
    }

    pub async fn insert_pool(&self, pool: Pool, members: Vec<PoolTeam>) {
        let mut records = self.records.write().await;
        records.pools.push(pool);
        records.pool_teams.extend(members);
    }

    pub async fn insert_games(&self, games: impl IntoIterator<Item = Game>) {
        self.records.write().await.games.extend(games);
    }

    pub async fn insert_rules(&self, rules: impl IntoIterator<Item = TiebreakerRule>) {
        self.records.write().await.rules.extend(rules);
    }
}

#[async_trait]
impl TournamentStore for MemoryStore {
    async fn tournament(&self, id: &TournamentId) -> Result<Option<Tournament>, StorageError> {
        let records = self.records.read().await;
        Ok(records.tournaments.iter().find(|t| &t.id == id).cloned())
    }

    async fn game(
        &self,
        tournament_id: &TournamentId,
        game_id: &GameId,
    ) -> Result<Option<Game>, StorageError> {
        let records = self.records.read().await;
        Ok(records
            .games
            .iter()
            .find(|g| &g.tournament_id == tournament_id && &g.id == game_id)
            .cloned())
    }

    async fn games(
        &self,
        tournament_id: &TournamentId,
        stage: Option<GameStage>,
    ) -> Result<Vec<Game>, StorageError> {
        let records = self.records.read().await;
        Ok(records
            .games
            .iter()
            .filter(|g| &g.tournament_id == tournament_id)
            .filter(|g| stage.map_or(true, |s| g.stage == s))
            .cloned()
            .collect())
    }

    async fn pools(&self, tournament_id: &TournamentId) -> Result<Vec<Pool>, StorageError> {
        let records = self.records.read().await;
        Ok(records
            .pools
            .iter()
            .filter(|p| &p.tournament_id == tournament_id)
            .cloned()
            .collect())
    }

    async fn pool_teams(
        &self,
        tournament_id: &TournamentId,
    ) -> Result<Vec<PoolTeam>, StorageError> {
        let records = self.records.read().await;
        Ok(records
            .pool_teams
            .iter()
            .filter(|pt| {
                records
                    .pools
                    .iter()
                    .any(|p| p.id == pt.pool_id && &p.tournament_id == tournament_id)
            })
            .cloned()
            .collect())
    }

    async fn tiebreaker_rules(
        &self,
        tournament_id: &TournamentId,
    ) -> Result<Vec<TiebreakerRule>, StorageError> {
        let records = self.records.read().await;
        let mut rules: Vec<TiebreakerRule> = records
            .rules
            .iter()
            .filter(|r| &r.tournament_id == tournament_id)
            .cloned()
            .collect();
        rules.sort_by_key(|r| r.priority_order);
        Ok(rules)
    }

    async fn update_game_slots(
        &self,
        tournament_id: &TournamentId,
        game_id: &GameId,
        update: &SlotUpdate,
    ) -> Result<(), StorageError> {
        let mut records = self.records.write().await;
        let game = records
            .games
            .iter_mut()
            .find(|g| &g.tournament_id == tournament_id && &g.id == game_id)
            .ok_or_else(|| StorageError::GameNotFound(game_id.clone()))?;
        update.apply_to(game);
        Ok(())
    }

    async fn save_game(&self, game: &Game) -> Result<(), StorageError> {
        let mut records = self.records.write().await;
        let stored = records
            .games
            .iter_mut()
            .find(|g| g.tournament_id == game.tournament_id && g.id == game.id)
            .ok_or_else(|| StorageError::GameNotFound(game.id.clone()))?;
        *stored = game.clone();
        Ok(())
    }

    fn scoring_defaults(&self) -> ScoringSettings {
        self.defaults
    }
}
