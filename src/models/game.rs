//! Game model: scheduled and completed matches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{EntityId, GameId, PoolId, TeamId, TournamentId};

/// Lifecycle of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    #[default]
    Scheduled,
    InProgress,
    Completed,
}

/// Tournament stage a game belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStage {
    PoolPlay,
    Quarterfinal,
    Semifinal,
    Final,
    Consolation,
    RegularSeason,
    Playoff,
}

impl std::fmt::Display for GameStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GameStage::PoolPlay => "pool_play",
            GameStage::Quarterfinal => "quarterfinal",
            GameStage::Semifinal => "semifinal",
            GameStage::Final => "final",
            GameStage::Consolation => "consolation",
            GameStage::RegularSeason => "regular_season",
            GameStage::Playoff => "playoff",
        };
        f.write_str(s)
    }
}

/// How a game was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultType {
    #[default]
    Regulation,
    Overtime,
    Shootout,
}

/// Home or away side of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Home,
    Away,
}

/// A single game, scheduled or completed.
///
/// Bracket games start with placeholders ("1st Pool A") and no team ids;
/// advancement fills the ids in once they are known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub tournament_id: TournamentId,
    #[serde(default)]
    pub pool_id: Option<PoolId>,
    #[serde(default)]
    pub game_number: Option<String>,
    pub stage: GameStage,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub venue: Option<String>,

    #[serde(default)]
    pub home_team_id: Option<TeamId>,
    #[serde(default)]
    pub away_team_id: Option<TeamId>,
    #[serde(default)]
    pub home_placeholder: Option<String>,
    #[serde(default)]
    pub away_placeholder: Option<String>,

    #[serde(default)]
    pub status: GameStatus,
    #[serde(default)]
    pub final_score_home: Option<u32>,
    #[serde(default)]
    pub final_score_away: Option<u32>,
    #[serde(default)]
    pub penalty_minutes_home: Option<u32>,
    #[serde(default)]
    pub penalty_minutes_away: Option<u32>,
    /// Elapsed seconds before the home side's first goal
    #[serde(default)]
    pub fastest_goal_seconds_home: Option<u32>,
    /// Elapsed seconds before the away side's first goal
    #[serde(default)]
    pub fastest_goal_seconds_away: Option<u32>,
    #[serde(default)]
    pub result_type: Option<ResultType>,
    #[serde(default)]
    pub overtime_winner_team_id: Option<TeamId>,
    #[serde(default)]
    pub shootout_winner_team_id: Option<TeamId>,

    /// Game whose winner becomes this game's home team
    #[serde(default)]
    pub bracket_source_game_1_id: Option<GameId>,
    /// Game whose winner becomes this game's away team
    #[serde(default)]
    pub bracket_source_game_2_id: Option<GameId>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A completed game with both teams and both scores present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalScore<'a> {
    pub home_team_id: &'a TeamId,
    pub away_team_id: &'a TeamId,
    pub home_goals: u32,
    pub away_goals: u32,
}

impl Game {
    /// Create a scheduled game with an ID derived from tournament, stage and number.
    pub fn new(tournament_id: TournamentId, stage: GameStage, game_number: &str) -> Self {
        let id = EntityId::generate(&[tournament_id.as_str(), &stage.to_string(), game_number]);
        Self {
            id,
            tournament_id,
            pool_id: None,
            game_number: Some(game_number.to_string()),
            stage,
            start_time: None,
            venue: None,
            home_team_id: None,
            away_team_id: None,
            home_placeholder: None,
            away_placeholder: None,
            status: GameStatus::Scheduled,
            final_score_home: None,
            final_score_away: None,
            penalty_minutes_home: None,
            penalty_minutes_away: None,
            fastest_goal_seconds_home: None,
            fastest_goal_seconds_away: None,
            result_type: None,
            overtime_winner_team_id: None,
            shootout_winner_team_id: None,
            bracket_source_game_1_id: None,
            bracket_source_game_2_id: None,
            updated_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == GameStatus::Completed
    }

    pub fn involves(&self, team_id: &TeamId) -> bool {
        self.home_team_id.as_ref() == Some(team_id) || self.away_team_id.as_ref() == Some(team_id)
    }

    /// The final score, if this game counts toward standings.
    ///
    /// Requires `completed` status, both scores and both team ids.
    pub fn final_score(&self) -> Option<FinalScore<'_>> {
        if !self.is_completed() {
            return None;
        }
        Some(FinalScore {
            home_team_id: self.home_team_id.as_ref()?,
            away_team_id: self.away_team_id.as_ref()?,
            home_goals: self.final_score_home?,
            away_goals: self.final_score_away?,
        })
    }

    /// Winner of the game: overtime winner, then shootout winner, then the
    /// strictly higher score. `None` for an undecided tie.
    pub fn winner(&self) -> Option<&TeamId> {
        if let Some(id) = &self.overtime_winner_team_id {
            return Some(id);
        }
        if let Some(id) = &self.shootout_winner_team_id {
            return Some(id);
        }
        let home = self.home_team_id.as_ref()?;
        let away = self.away_team_id.as_ref()?;
        let (h, a) = (self.final_score_home?, self.final_score_away?);
        if h > a {
            Some(home)
        } else if a > h {
            Some(away)
        } else {
            None
        }
    }

    pub fn team_on(&self, side: Side) -> Option<&TeamId> {
        match side {
            Side::Home => self.home_team_id.as_ref(),
            Side::Away => self.away_team_id.as_ref(),
        }
    }

    /// Mark a scheduled game as started.
    pub fn mark_in_progress(&mut self) {
        if self.status == GameStatus::Scheduled {
            self.status = GameStatus::InProgress;
            self.updated_at = Some(Utc::now());
        }
    }

    /// Record a final score. Re-entering a score replaces the previous one.
    pub fn apply_score(&mut self, entry: &ScoreEntry) {
        self.final_score_home = Some(entry.home_score);
        self.final_score_away = Some(entry.away_score);
        self.status = GameStatus::Completed;
        self.result_type = Some(entry.result_type);

        if entry.penalty_minutes_home.is_some() {
            self.penalty_minutes_home = entry.penalty_minutes_home;
        }
        if entry.penalty_minutes_away.is_some() {
            self.penalty_minutes_away = entry.penalty_minutes_away;
        }
        if entry.first_goal_seconds_home.is_some() {
            self.fastest_goal_seconds_home = entry.first_goal_seconds_home;
        }
        if entry.first_goal_seconds_away.is_some() {
            self.fastest_goal_seconds_away = entry.first_goal_seconds_away;
        }

        self.overtime_winner_team_id = None;
        self.shootout_winner_team_id = None;
        if let Some(side) = entry.extra_time_winner {
            let winner = self.team_on(side).cloned();
            match entry.result_type {
                ResultType::Overtime => self.overtime_winner_team_id = winner,
                ResultType::Shootout => self.shootout_winner_team_id = winner,
                ResultType::Regulation => {}
            }
        }

        self.updated_at = Some(Utc::now());
    }
}

/// A submitted final score.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub home_score: u32,
    pub away_score: u32,
    #[serde(default)]
    pub result_type: ResultType,
    /// Side that won in overtime or the shootout
    #[serde(default)]
    pub extra_time_winner: Option<Side>,
    #[serde(default)]
    pub penalty_minutes_home: Option<u32>,
    #[serde(default)]
    pub penalty_minutes_away: Option<u32>,
    #[serde(default)]
    pub first_goal_seconds_home: Option<u32>,
    #[serde(default)]
    pub first_goal_seconds_away: Option<u32>,
}

/// Why a score cannot be recorded against a game.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreError {
    #[error("game {0} does not have both teams assigned")]
    TeamsUnassigned(GameId),

    #[error("extra_time_winner is only valid for overtime or shootout results")]
    UnexpectedExtraTimeWinner,

    #[error("overtime and shootout results need an extra_time_winner")]
    MissingExtraTimeWinner,
}

impl ScoreEntry {
    /// Check that this entry can be applied to `game`.
    pub fn check(&self, game: &Game) -> Result<(), ScoreError> {
        if game.home_team_id.is_none() || game.away_team_id.is_none() {
            return Err(ScoreError::TeamsUnassigned(game.id.clone()));
        }
        match (self.result_type, self.extra_time_winner) {
            (ResultType::Regulation, Some(_)) => Err(ScoreError::UnexpectedExtraTimeWinner),
            (ResultType::Overtime | ResultType::Shootout, None) => {
                Err(ScoreError::MissingExtraTimeWinner)
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matchup() -> Game {
        let mut game = Game::new("cup".into(), GameStage::Semifinal, "SF1");
        game.home_team_id = Some("hawks".into());
        game.away_team_id = Some("owls".into());
        game
    }

    #[test]
    fn test_final_score_requires_completion() {
        let mut game = matchup();
        game.final_score_home = Some(3);
        game.final_score_away = Some(1);
        assert!(game.final_score().is_none());

        game.status = GameStatus::Completed;
        let fs = game.final_score().unwrap();
        assert_eq!(fs.home_goals, 3);
        assert_eq!(fs.away_goals, 1);
    }

    #[test]
    fn test_final_score_requires_both_teams() {
        let mut game = matchup();
        game.away_team_id = None;
        game.apply_score(&ScoreEntry {
            home_score: 2,
            away_score: 0,
            ..Default::default()
        });
        assert!(game.final_score().is_none());
    }

    #[test]
    fn test_winner_by_score() {
        let mut game = matchup();
        game.apply_score(&ScoreEntry {
            home_score: 1,
            away_score: 4,
            ..Default::default()
        });
        assert_eq!(game.winner(), Some(&EntityId::from("owls")));
    }

    #[test]
    fn test_winner_tie_without_extra_time_is_none() {
        let mut game = matchup();
        game.apply_score(&ScoreEntry {
            home_score: 2,
            away_score: 2,
            ..Default::default()
        });
        assert_eq!(game.winner(), None);
    }

    #[test]
    fn test_overtime_winner_takes_priority() {
        let mut game = matchup();
        game.apply_score(&ScoreEntry {
            home_score: 2,
            away_score: 2,
            result_type: ResultType::Overtime,
            extra_time_winner: Some(Side::Away),
            ..Default::default()
        });
        assert_eq!(game.overtime_winner_team_id, Some("owls".into()));
        assert_eq!(game.winner(), Some(&EntityId::from("owls")));
    }

    #[test]
    fn test_overtime_outranks_shootout() {
        let mut game = matchup();
        game.final_score_home = Some(5);
        game.final_score_away = Some(1);
        game.shootout_winner_team_id = Some("owls".into());
        game.overtime_winner_team_id = Some("hawks".into());
        assert_eq!(game.winner(), Some(&EntityId::from("hawks")));
    }

    #[test]
    fn test_rescoring_clears_extra_time_winner() {
        let mut game = matchup();
        game.apply_score(&ScoreEntry {
            home_score: 3,
            away_score: 3,
            result_type: ResultType::Shootout,
            extra_time_winner: Some(Side::Home),
            ..Default::default()
        });
        assert_eq!(game.shootout_winner_team_id, Some("hawks".into()));

        game.apply_score(&ScoreEntry {
            home_score: 1,
            away_score: 2,
            ..Default::default()
        });
        assert!(game.shootout_winner_team_id.is_none());
        assert_eq!(game.winner(), Some(&EntityId::from("owls")));
    }

    #[test]
    fn test_apply_score_keeps_unreported_stats() {
        let mut game = matchup();
        game.penalty_minutes_home = Some(6);
        game.apply_score(&ScoreEntry {
            home_score: 1,
            away_score: 0,
            first_goal_seconds_home: Some(42),
            ..Default::default()
        });
        assert_eq!(game.penalty_minutes_home, Some(6));
        assert_eq!(game.fastest_goal_seconds_home, Some(42));
        assert_eq!(game.fastest_goal_seconds_away, None);
        assert_eq!(game.status, GameStatus::Completed);
    }

    #[test]
    fn test_score_check() {
        let game = matchup();
        let regulation = ScoreEntry {
            home_score: 2,
            away_score: 1,
            ..Default::default()
        };
        assert_eq!(regulation.check(&game), Ok(()));

        let overtime = ScoreEntry {
            result_type: ResultType::Overtime,
            ..regulation.clone()
        };
        assert_eq!(
            overtime.check(&game),
            Err(ScoreError::MissingExtraTimeWinner)
        );

        let stray = ScoreEntry {
            extra_time_winner: Some(Side::Home),
            ..regulation.clone()
        };
        assert_eq!(stray.check(&game), Err(ScoreError::UnexpectedExtraTimeWinner));

        let empty = Game::new("cup".into(), GameStage::Final, "F");
        assert!(matches!(
            regulation.check(&empty),
            Err(ScoreError::TeamsUnassigned(_))
        ));
    }

    #[test]
    fn test_mark_in_progress_only_from_scheduled() {
        let mut game = matchup();
        game.mark_in_progress();
        assert_eq!(game.status, GameStatus::InProgress);

        game.status = GameStatus::Completed;
        game.mark_in_progress();
        assert_eq!(game.status, GameStatus::Completed);
    }

    #[test]
    fn test_game_deserializes_with_missing_optionals() {
        let json = r#"{"id":"g1","tournament_id":"cup","stage":"pool_play"}"#;
        let game: Game = serde_json::from_str(json).unwrap();
        assert_eq!(game.status, GameStatus::Scheduled);
        assert_eq!(game.stage, GameStage::PoolPlay);
        assert!(game.home_team_id.is_none());
    }
}
