//! Tiebreaker rule definitions.

use serde::{Deserialize, Serialize};

use super::{EntityId, RuleId, TournamentId};

/// Label attached to teams no rule could separate.
pub const COIN_TOSS_LABEL: &str = "Coin Toss";

/// Label for the goals-for ratio formula when a rule carries no expression.
pub const GOALS_FOR_RATIO_LABEL: &str = "GF/(GF+GA)";

const DEFAULT_FORMULA_PRECISION: u32 = 5;

/// Which end of a comparison wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    HigherBetter,
    LowerBetter,
}

/// Statistic compared by a simple rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimpleStat {
    Wins,
    HeadToHead,
    GoalsAgainst,
    PenaltyMinutes,
    FastestFirstGoal,
    CoinToss,
    /// Any stat name this build does not know; never separates teams.
    #[serde(other)]
    Unrecognized,
}

impl SimpleStat {
    pub fn label(&self) -> &'static str {
        match self {
            SimpleStat::Wins => "Wins",
            SimpleStat::HeadToHead => "Head-to-Head",
            SimpleStat::GoalsAgainst => "Goals Against",
            SimpleStat::PenaltyMinutes => "Penalty Minutes",
            SimpleStat::FastestFirstGoal => "Fastest First Goal",
            SimpleStat::CoinToss => COIN_TOSS_LABEL,
            SimpleStat::Unrecognized => "Unrecognized Rule",
        }
    }
}

/// The two shapes a rule can take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule_type", rename_all = "snake_case")]
pub enum RuleKind {
    Simple {
        simple_stat: SimpleStat,
        #[serde(default)]
        simple_direction: Option<Direction>,
        /// Largest tied group head-to-head is evaluated for
        #[serde(default)]
        head_to_head_max_teams: Option<usize>,
    },
    /// Goals-for ratio `GF/(GF+GA)`; the expression is for display only.
    Formula {
        #[serde(default)]
        formula_expression: Option<String>,
        #[serde(default)]
        formula_precision: Option<u32>,
        #[serde(default)]
        formula_direction: Option<Direction>,
    },
}

/// One entry in a tournament's tiebreaker chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TiebreakerRule {
    pub id: RuleId,
    pub tournament_id: TournamentId,
    /// Lower values are applied first
    pub priority_order: i32,
    #[serde(flatten)]
    pub kind: RuleKind,
    #[serde(default)]
    pub description: Option<String>,
}

impl TiebreakerRule {
    pub fn simple(
        tournament_id: TournamentId,
        priority_order: i32,
        stat: SimpleStat,
        direction: Option<Direction>,
    ) -> Self {
        Self::with_kind(
            tournament_id,
            priority_order,
            RuleKind::Simple {
                simple_stat: stat,
                simple_direction: direction,
                head_to_head_max_teams: None,
            },
        )
    }

    pub fn formula(tournament_id: TournamentId, priority_order: i32, precision: u32) -> Self {
        Self::with_kind(
            tournament_id,
            priority_order,
            RuleKind::Formula {
                formula_expression: Some(GOALS_FOR_RATIO_LABEL.to_string()),
                formula_precision: Some(precision),
                formula_direction: Some(Direction::HigherBetter),
            },
        )
    }

    fn with_kind(tournament_id: TournamentId, priority_order: i32, kind: RuleKind) -> Self {
        let id = EntityId::generate(&[
            tournament_id.as_str(),
            "tiebreaker",
            &priority_order.to_string(),
        ]);
        Self {
            id,
            tournament_id,
            priority_order,
            kind,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_head_to_head_max(mut self, max_teams: usize) -> Self {
        if let RuleKind::Simple {
            head_to_head_max_teams,
            ..
        } = &mut self.kind
        {
            *head_to_head_max_teams = Some(max_teams);
        }
        self
    }

    /// Text shown next to teams this rule separated.
    pub fn label(&self) -> String {
        if let Some(desc) = self.description.as_deref().filter(|d| !d.trim().is_empty()) {
            return desc.to_string();
        }
        match &self.kind {
            RuleKind::Simple { simple_stat, .. } => simple_stat.label().to_string(),
            RuleKind::Formula {
                formula_expression, ..
            } => formula_expression
                .clone()
                .unwrap_or_else(|| GOALS_FOR_RATIO_LABEL.to_string()),
        }
    }

    /// Decimal digits a formula value is rounded to before comparison.
    pub fn formula_precision(&self) -> u32 {
        match &self.kind {
            RuleKind::Formula {
                formula_precision, ..
            } => formula_precision.unwrap_or(DEFAULT_FORMULA_PRECISION),
            RuleKind::Simple { .. } => DEFAULT_FORMULA_PRECISION,
        }
    }

    /// Whether this is a head-to-head rule that does not apply to `group_size` tied teams.
    pub fn head_to_head_too_large(&self, group_size: usize) -> bool {
        matches!(
            self.kind,
            RuleKind::Simple {
                simple_stat: SimpleStat::HeadToHead,
                head_to_head_max_teams: Some(max),
                ..
            } if group_size > max
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_rule_deserialize() {
        let json = r#"{
            "id": "r1",
            "tournament_id": "cup",
            "priority_order": 2,
            "rule_type": "simple",
            "simple_stat": "head_to_head",
            "simple_direction": "higher_better",
            "head_to_head_max_teams": 2,
            "description": "Head-to-head record"
        }"#;
        let rule: TiebreakerRule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.priority_order, 2);
        assert_eq!(
            rule.kind,
            RuleKind::Simple {
                simple_stat: SimpleStat::HeadToHead,
                simple_direction: Some(Direction::HigherBetter),
                head_to_head_max_teams: Some(2),
            }
        );
        assert_eq!(rule.label(), "Head-to-head record");
    }

    #[test]
    fn test_formula_rule_deserialize() {
        let json = r#"{
            "id": "r2",
            "tournament_id": "cup",
            "priority_order": 3,
            "rule_type": "formula",
            "formula_expression": "GF/(GF+GA)",
            "formula_precision": 3,
            "formula_direction": "higher_better"
        }"#;
        let rule: TiebreakerRule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.formula_precision(), 3);
        assert_eq!(rule.label(), "GF/(GF+GA)");
    }

    #[test]
    fn test_unknown_stat_is_unrecognized() {
        let json = r#"{
            "id": "r3",
            "tournament_id": "cup",
            "priority_order": 1,
            "rule_type": "simple",
            "simple_stat": "shots_on_goal"
        }"#;
        let rule: TiebreakerRule = serde_json::from_str(json).unwrap();
        assert!(matches!(
            rule.kind,
            RuleKind::Simple {
                simple_stat: SimpleStat::Unrecognized,
                ..
            }
        ));
    }

    #[test]
    fn test_label_falls_back_to_stat() {
        let rule = TiebreakerRule::simple("cup".into(), 1, SimpleStat::GoalsAgainst, None);
        assert_eq!(rule.label(), "Goals Against");

        let rule = rule.with_description("  ");
        assert_eq!(rule.label(), "Goals Against");
    }

    #[test]
    fn test_head_to_head_size_limit() {
        let rule = TiebreakerRule::simple("cup".into(), 1, SimpleStat::HeadToHead, None)
            .with_head_to_head_max(2);
        assert!(!rule.head_to_head_too_large(2));
        assert!(rule.head_to_head_too_large(3));

        let unbounded = TiebreakerRule::simple("cup".into(), 1, SimpleStat::HeadToHead, None);
        assert!(!unbounded.head_to_head_too_large(5));
    }

    #[test]
    fn test_rule_serialization_roundtrip_keeps_shape() {
        let rule = TiebreakerRule::formula("cup".into(), 4, 3).with_description("Goal ratio");
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["rule_type"], "formula");
        assert_eq!(json["formula_precision"], 3);
        let back: TiebreakerRule = serde_json::from_value(json).unwrap();
        assert_eq!(back, rule);
    }
}
