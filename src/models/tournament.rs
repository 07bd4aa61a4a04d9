//! Tournament record and scoring settings.

use serde::{Deserialize, Serialize};

use super::TournamentId;

/// Points awarded per game outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointStructure {
    pub win_points: i32,
    pub tie_points: i32,
    pub loss_points: i32,
}

impl Default for PointStructure {
    fn default() -> Self {
        Self {
            win_points: 2,
            tie_points: 1,
            loss_points: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    /// Largest positive goal differential a single game contributes
    #[serde(default)]
    pub goal_differential_cap: Option<i32>,
    #[serde(default)]
    pub point_structure: Option<PointStructure>,
}

impl Tournament {
    pub fn new(id: TournamentId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            goal_differential_cap: None,
            point_structure: None,
        }
    }
}

/// Everything the standings engine needs besides teams, games and rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringSettings {
    pub points: PointStructure,
    pub goal_differential_cap: i32,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            points: PointStructure::default(),
            goal_differential_cap: 5,
        }
    }
}

impl ScoringSettings {
    /// Settings for `tournament`, falling back to `defaults` where it has none.
    pub fn for_tournament(tournament: Option<&Tournament>, defaults: ScoringSettings) -> Self {
        Self {
            points: tournament
                .and_then(|t| t.point_structure)
                .unwrap_or(defaults.points),
            goal_differential_cap: tournament
                .and_then(|t| t.goal_differential_cap)
                .unwrap_or(defaults.goal_differential_cap),
        }
    }
}
