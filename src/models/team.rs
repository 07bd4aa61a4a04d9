//! Teams, pools and pool membership.

use serde::{Deserialize, Serialize};

use super::{EntityId, PoolId, TeamId, TournamentId};

/// A registered team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    #[serde(default)]
    pub division: Option<String>,
}

impl Team {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: EntityId::generate(&["team", &name]),
            name,
            division: None,
        }
    }

    pub fn to_ref(&self) -> TeamRef {
        TeamRef::new(self.id.clone(), self.name.clone())
    }
}

/// The identity and display name of a team, as the standings engine sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRef {
    pub team_id: TeamId,
    pub team_name: String,
}

impl TeamRef {
    pub fn new(team_id: TeamId, team_name: impl Into<String>) -> Self {
        Self {
            team_id,
            team_name: team_name.into(),
        }
    }
}

/// A round-robin group of teams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub id: PoolId,
    pub tournament_id: TournamentId,
    /// Short name, e.g. "A"
    pub name: String,
    /// How many teams leave pool play for the bracket
    #[serde(default = "default_advancement_count")]
    pub advancement_count: u32,
}

fn default_advancement_count() -> u32 {
    2
}

impl Pool {
    pub fn new(tournament_id: TournamentId, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: EntityId::generate(&[tournament_id.as_str(), "pool", &name]),
            tournament_id,
            name,
            advancement_count: default_advancement_count(),
        }
    }

    /// Label used by bracket placeholders, e.g. "Pool A".
    pub fn label(&self) -> String {
        format!("Pool {}", self.name)
    }

    /// Whether a placeholder's pool label refers to this pool.
    ///
    /// Accepts both "Pool A" and a bare "A", case-insensitively.
    pub fn matches_label(&self, label: &str) -> bool {
        let label = label.trim();
        label.eq_ignore_ascii_case(&self.label()) || label.eq_ignore_ascii_case(&self.name)
    }
}

/// Membership of a team in a pool, joined with the team's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolTeam {
    pub pool_id: PoolId,
    pub team_id: TeamId,
    pub team_name: String,
}

impl PoolTeam {
    pub fn to_ref(&self) -> TeamRef {
        TeamRef::new(self.team_id.clone(), self.team_name.clone())
    }
}
