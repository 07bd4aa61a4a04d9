//! JSONL (JSON Lines) storage.
//!
//! Each tournament lives in its own directory:
//! `tournament.json` plus one JSONL file per entity type, one JSON object
//! per line.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{SlotUpdate, StorageConfig, StorageError, TournamentStore};
use crate::models::{
    Game, GameId, GameStage, Pool, PoolId, PoolTeam, ScoringSettings, Team, TeamId,
    TiebreakerRule, Tournament, TournamentId,
};

const TOURNAMENT_FILE: &str = "tournament.json";

/// Entity types for JSONL storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    Team,
    Pool,
    PoolMembership,
    Game,
    TiebreakerRule,
}

impl EntityType {
    /// Get the filename for this entity type.
    pub fn filename(&self) -> &'static str {
        match self {
            EntityType::Team => "teams.jsonl",
            EntityType::Pool => "pools.jsonl",
            EntityType::PoolMembership => "pool_teams.jsonl",
            EntityType::Game => "games.jsonl",
            EntityType::TiebreakerRule => "tiebreaker_rules.jsonl",
        }
    }
}

/// Stored link between a pool and a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolMembership {
    pub pool_id: PoolId,
    pub team_id: TeamId,
}

/// JSONL file writer.
pub struct JsonlWriter<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize> JsonlWriter<T> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Create a writer for an entity type of one tournament.
    pub fn for_entity(
        config: &StorageConfig,
        entity: EntityType,
        tournament_id: &TournamentId,
    ) -> Result<Self, StorageError> {
        Ok(Self::new(
            config.tournament_dir(tournament_id)?.join(entity.filename()),
        ))
    }

    fn ensure_dir(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Write entities, replacing the entire file.
    pub fn write_all(&self, entities: &[T]) -> Result<usize, StorageError> {
        self.ensure_dir()?;

        // Write to a sibling file first so readers never see a half-written file.
        let tmp_path = self.path.with_extension("jsonl.tmp");
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        let mut count = 0;

        for entity in entities {
            let json = serde_json::to_string(entity)?;
            writeln!(writer, "{}", json)?;
            count += 1;
        }

        writer.flush()?;
        drop(writer);
        fs::rename(&tmp_path, &self.path)?;
        debug!("Wrote {} entities to {:?}", count, self.path);

        Ok(count)
    }
}

/// JSONL file reader.
pub struct JsonlReader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonlReader<T> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Create a reader for an entity type of one tournament.
    pub fn for_entity(
        config: &StorageConfig,
        entity: EntityType,
        tournament_id: &TournamentId,
    ) -> Result<Self, StorageError> {
        Ok(Self::new(
            config.tournament_dir(tournament_id)?.join(entity.filename()),
        ))
    }

    /// Read all entities from the file. A missing file reads as empty.
    ///
    /// Lines that fail to parse are logged and skipped.
    pub fn read_all(&self) -> Result<Vec<T>, StorageError> {
        self.read_lines(false)
    }

    /// Like [`read_all`](Self::read_all), but a line that fails to parse is
    /// an error. Use before rewriting the file.
    pub fn read_all_strict(&self) -> Result<Vec<T>, StorageError> {
        self.read_lines(true)
    }

    fn read_lines(&self, strict: bool) -> Result<Vec<T>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut entities = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str(&line) {
                Ok(entity) => entities.push(entity),
                Err(e) if strict => {
                    return Err(StorageError::Malformed {
                        path: self.path.clone(),
                        line: line_num + 1,
                        source: e,
                    });
                }
                Err(e) => {
                    warn!(
                        "Failed to parse line {} in {:?}: {}",
                        line_num + 1,
                        self.path,
                        e
                    );
                }
            }
        }

        debug!("Read {} entities from {:?}", entities.len(), self.path);
        Ok(entities)
    }

    /// Read entities matching a predicate.
    pub fn read_where<F>(&self, predicate: F) -> Result<Vec<T>, StorageError>
    where
        F: Fn(&T) -> bool,
    {
        let all = self.read_all()?;
        Ok(all.into_iter().filter(predicate).collect())
    }
}

/// File-backed [`TournamentStore`].
pub struct JsonlStore {
    config: StorageConfig,
    defaults: ScoringSettings,
    write_lock: Mutex<()>,
}

impl JsonlStore {
    pub fn new(config: StorageConfig, defaults: ScoringSettings) -> Self {
        Self {
            config,
            defaults,
            write_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    fn reader<T: DeserializeOwned>(
        &self,
        entity: EntityType,
        tournament_id: &TournamentId,
    ) -> Result<JsonlReader<T>, StorageError> {
        JsonlReader::for_entity(&self.config, entity, tournament_id)
    }

    /// Write (or overwrite) the tournament record.
    pub fn write_tournament(&self, tournament: &Tournament) -> Result<(), StorageError> {
        let dir = self.config.tournament_dir(&tournament.id)?;
        fs::create_dir_all(&dir)?;
        let json = serde_json::to_string_pretty(tournament)?;
        fs::write(dir.join(TOURNAMENT_FILE), json)?;
        info!("Wrote tournament {}", tournament.id);
        Ok(())
    }

    /// Replace every record of one entity type for a tournament.
    pub fn write_records<T: Serialize>(
        &self,
        tournament_id: &TournamentId,
        entity: EntityType,
        records: &[T],
    ) -> Result<usize, StorageError> {
        JsonlWriter::for_entity(&self.config, entity, tournament_id)?.write_all(records)
    }

    /// Read, modify and rewrite one game.
    ///
    /// Refuses to rewrite a file containing records it cannot parse.
    async fn modify_game<F>(
        &self,
        tournament_id: &TournamentId,
        game_id: &GameId,
        modify: F,
    ) -> Result<(), StorageError>
    where
        F: FnOnce(&mut Game) + Send,
    {
        let _guard = self.write_lock.lock().await;

        let mut games: Vec<Game> = self
            .reader(EntityType::Game, tournament_id)?
            .read_all_strict()?;
        let game = games
            .iter_mut()
            .find(|g| &g.id == game_id)
            .ok_or_else(|| StorageError::GameNotFound(game_id.clone()))?;
        modify(game);

        self.write_records(tournament_id, EntityType::Game, &games)?;
        Ok(())
    }
}

#[async_trait]
impl TournamentStore for JsonlStore {
    async fn tournament(&self, id: &TournamentId) -> Result<Option<Tournament>, StorageError> {
        let path = self.config.tournament_dir(id)?.join(TOURNAMENT_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    async fn game(
        &self,
        tournament_id: &TournamentId,
        game_id: &GameId,
    ) -> Result<Option<Game>, StorageError> {
        let games: Vec<Game> = self
            .reader(EntityType::Game, tournament_id)?
            .read_where(|g: &Game| &g.id == game_id)?;
        Ok(games.into_iter().next())
    }

    async fn games(
        &self,
        tournament_id: &TournamentId,
        stage: Option<GameStage>,
    ) -> Result<Vec<Game>, StorageError> {
        self.reader(EntityType::Game, tournament_id)?
            .read_where(|g: &Game| stage.map_or(true, |s| g.stage == s))
    }

    async fn pools(&self, tournament_id: &TournamentId) -> Result<Vec<Pool>, StorageError> {
        self.reader(EntityType::Pool, tournament_id)?.read_all()
    }

    async fn pool_teams(
        &self,
        tournament_id: &TournamentId,
    ) -> Result<Vec<PoolTeam>, StorageError> {
        let teams: Vec<Team> = self.reader(EntityType::Team, tournament_id)?.read_all()?;
        let names: HashMap<&TeamId, &str> =
            teams.iter().map(|t| (&t.id, t.name.as_str())).collect();

        let memberships: Vec<PoolMembership> = self
            .reader(EntityType::PoolMembership, tournament_id)?
            .read_all()?;

        let mut joined = Vec::with_capacity(memberships.len());
        for m in memberships {
            match names.get(&m.team_id) {
                Some(name) => joined.push(PoolTeam {
                    pool_id: m.pool_id,
                    team_id: m.team_id,
                    team_name: name.to_string(),
                }),
                None => warn!(
                    "Pool {} references unknown team {}, skipping",
                    m.pool_id, m.team_id
                ),
            }
        }
        Ok(joined)
    }

    async fn tiebreaker_rules(
        &self,
        tournament_id: &TournamentId,
    ) -> Result<Vec<TiebreakerRule>, StorageError> {
        let mut rules: Vec<TiebreakerRule> = self
            .reader(EntityType::TiebreakerRule, tournament_id)?
            .read_all()?;
        rules.sort_by_key(|r| r.priority_order);
        Ok(rules)
    }

    async fn update_game_slots(
        &self,
        tournament_id: &TournamentId,
        game_id: &GameId,
        update: &SlotUpdate,
    ) -> Result<(), StorageError> {
        if update.is_empty() {
            return Ok(());
        }
        self.modify_game(tournament_id, game_id, |g| update.apply_to(g))
            .await?;
        info!("Updated team slots of game {}: {:?}", game_id, update);
        Ok(())
    }

    async fn save_game(&self, game: &Game) -> Result<(), StorageError> {
        let replacement = game.clone();
        self.modify_game(&game.tournament_id, &game.id, move |g| *g = replacement)
            .await
    }

    fn scoring_defaults(&self) -> ScoringSettings {
        self.defaults
    }
}
