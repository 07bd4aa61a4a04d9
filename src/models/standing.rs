//! Derived statistics and standings rows.

use serde::{Deserialize, Serialize};

use super::{GameId, TeamId, TeamRef};

/// One game from a team's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub game_id: GameId,
    pub opponent_id: TeamId,
    pub goals_for: u32,
    pub goals_against: u32,
    /// Goal differential after the per-game cap
    pub capped_goal_diff: i32,
}

impl GameResult {
    pub fn is_win(&self) -> bool {
        self.goals_for > self.goals_against
    }

    pub fn is_loss(&self) -> bool {
        self.goals_for < self.goals_against
    }
}

/// Per-team aggregates for one standings computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamStats {
    pub team_id: TeamId,
    pub team_name: String,
    pub gp: u32,
    pub w: u32,
    pub l: u32,
    pub t: u32,
    pub pts: i32,
    pub gf: u32,
    pub ga: u32,
    /// Sum of capped per-game differentials, not `gf - ga`
    pub gd: i32,
    pub penalty_minutes: u32,
    /// Lowest first-goal time over games that reported one
    pub fastest_first_goal: Option<u32>,
    pub game_results: Vec<GameResult>,
}

impl TeamStats {
    pub fn new(team: &TeamRef) -> Self {
        Self {
            team_id: team.team_id.clone(),
            team_name: team.team_name.clone(),
            gp: 0,
            w: 0,
            l: 0,
            t: 0,
            pts: 0,
            gf: 0,
            ga: 0,
            gd: 0,
            penalty_minutes: 0,
            fastest_first_goal: None,
            game_results: Vec::new(),
        }
    }

    /// Goals-for ratio `GF/(GF+GA)`; 0/0 is defined as 0.5.
    pub fn goals_for_ratio(&self) -> f64 {
        let total = self.gf + self.ga;
        if total == 0 {
            0.5
        } else {
            self.gf as f64 / total as f64
        }
    }

    /// (wins, losses) against one opponent.
    pub fn record_against(&self, opponent: &TeamId) -> (u32, u32) {
        self.game_results
            .iter()
            .filter(|r| &r.opponent_id == opponent)
            .fold((0, 0), |(w, l), r| {
                if r.is_win() {
                    (w + 1, l)
                } else if r.is_loss() {
                    (w, l + 1)
                } else {
                    (w, l)
                }
            })
    }
}

/// A ranked row of the standings table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub team_id: TeamId,
    pub team_name: String,
    pub gp: u32,
    pub w: u32,
    pub l: u32,
    pub t: u32,
    pub pts: i32,
    pub gf: u32,
    pub ga: u32,
    pub gd: i32,
    pub penalty_minutes: u32,
    pub fastest_first_goal: Option<u32>,
    /// 1-based, dense
    pub rank: u32,
    /// Rule that placed this team within its points group
    pub tiebreaker_used: Option<String>,
    pub coin_toss_needed: bool,
}

impl Standing {
    pub fn from_stats(
        stats: &TeamStats,
        rank: u32,
        tiebreaker_used: Option<String>,
        coin_toss_needed: bool,
    ) -> Self {
        Self {
            team_id: stats.team_id.clone(),
            team_name: stats.team_name.clone(),
            gp: stats.gp,
            w: stats.w,
            l: stats.l,
            t: stats.t,
            pts: stats.pts,
            gf: stats.gf,
            ga: stats.ga,
            gd: stats.gd,
            penalty_minutes: stats.penalty_minutes,
            fastest_first_goal: stats.fastest_first_goal,
            rank,
            tiebreaker_used,
            coin_toss_needed,
        }
    }

    pub fn team_ref(&self) -> TeamRef {
        TeamRef::new(self.team_id.clone(), self.team_name.clone())
    }
}
