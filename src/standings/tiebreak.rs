//! Tie resolution within a points group.
//!
//! A tied group is split by the rule at `rule_index`. Every subgroup that is
//! still tied continues with the *next* rule; a rule is never applied twice
//! along one resolution path.

use crate::models::{
    Direction, RuleKind, SimpleStat, TeamStats, TiebreakerRule, COIN_TOSS_LABEL,
};

/// Formula values are compared as integers scaled by 10^precision.
const MAX_FORMULA_PRECISION: u32 = 12;

/// A team placed by tie resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<'a> {
    pub stats: &'a TeamStats,
    pub tiebreaker_used: Option<String>,
    pub coin_toss_needed: bool,
}

impl<'a> Resolved<'a> {
    fn untied(stats: &'a TeamStats) -> Self {
        Self {
            stats,
            tiebreaker_used: None,
            coin_toss_needed: false,
        }
    }

    fn by_rule(stats: &'a TeamStats, rule: &TiebreakerRule) -> Self {
        Self {
            stats,
            tiebreaker_used: Some(rule.label()),
            coin_toss_needed: false,
        }
    }

    fn coin_toss(stats: &'a TeamStats) -> Self {
        Self {
            stats,
            tiebreaker_used: Some(COIN_TOSS_LABEL.to_string()),
            coin_toss_needed: true,
        }
    }
}

/// Order `tied` best-first using `rules[rule_index..]`.
///
/// `rules` must already be sorted by priority.
pub fn resolve_group<'a>(
    tied: Vec<&'a TeamStats>,
    rules: &[&TiebreakerRule],
    rule_index: usize,
) -> Vec<Resolved<'a>> {
    if tied.len() <= 1 {
        return tied.into_iter().map(Resolved::untied).collect();
    }

    let mut index = rule_index;
    loop {
        let Some(rule) = rules.get(index) else {
            return tied.into_iter().map(Resolved::coin_toss).collect();
        };

        // Head-to-head is judged at the current group size only.
        if rule.head_to_head_too_large(tied.len()) {
            index += 1;
            continue;
        }

        let subgroups = apply_rule(&tied, rule);
        if subgroups.len() <= 1 {
            index += 1;
            continue;
        }

        let mut resolved = Vec::with_capacity(tied.len());
        for subgroup in subgroups {
            if subgroup.len() == 1 {
                resolved.push(Resolved::by_rule(subgroup[0], rule));
            } else {
                resolved.extend(resolve_group(subgroup, rules, index + 1));
            }
        }
        return resolved;
    }
}

/// Split `teams` into best-first subgroups of teams the rule cannot separate.
pub fn apply_rule<'a>(teams: &[&'a TeamStats], rule: &TiebreakerRule) -> Vec<Vec<&'a TeamStats>> {
    match &rule.kind {
        RuleKind::Formula {
            formula_direction, ..
        } => {
            let precision = rule.formula_precision().min(MAX_FORMULA_PRECISION);
            let scale = 10f64.powi(precision as i32);
            sort_and_group(
                teams,
                |t| (t.goals_for_ratio() * scale).round() as i64,
                prefers_higher(*formula_direction, true),
            )
        }
        RuleKind::Simple {
            simple_stat,
            simple_direction,
            ..
        } => match simple_stat {
            SimpleStat::Wins => {
                sort_and_group(teams, |t| t.w, prefers_higher(*simple_direction, true))
            }
            SimpleStat::HeadToHead => head_to_head(teams),
            SimpleStat::GoalsAgainst => {
                sort_and_group(teams, |t| t.ga, prefers_higher(*simple_direction, false))
            }
            SimpleStat::PenaltyMinutes => sort_and_group(
                teams,
                |t| t.penalty_minutes,
                prefers_higher(*simple_direction, false),
            ),
            // No recorded goal sorts after every real time.
            SimpleStat::FastestFirstGoal => sort_and_group(
                teams,
                |t| t.fastest_first_goal.map_or(u64::MAX, u64::from),
                false,
            ),
            SimpleStat::CoinToss | SimpleStat::Unrecognized => vec![teams.to_vec()],
        },
    }
}

/// Explicit directions are taken literally; `default` applies when the rule
/// names none. Wins and the goals-for ratio default to higher-better when the
/// direction is omitted. Keep it that way: a lower-better default would rank
/// the weaker team first.
fn prefers_higher(direction: Option<Direction>, default: bool) -> bool {
    match direction {
        Some(Direction::HigherBetter) => true,
        Some(Direction::LowerBetter) => false,
        None => default,
    }
}

/// Wins between exactly two teams; anything else is left unsplit.
fn head_to_head<'a>(teams: &[&'a TeamStats]) -> Vec<Vec<&'a TeamStats>> {
    let [a, b] = teams else {
        return vec![teams.to_vec()];
    };

    let (a_wins, b_wins) = a.record_against(&b.team_id);
    if a_wins > b_wins {
        vec![vec![*a], vec![*b]]
    } else if b_wins > a_wins {
        vec![vec![*b], vec![*a]]
    } else {
        vec![teams.to_vec()]
    }
}

/// Stable sort by `key`, then group runs of equal keys. Groups come out best-first.
fn sort_and_group<'a, K, F>(
    teams: &[&'a TeamStats],
    key: F,
    higher_better: bool,
) -> Vec<Vec<&'a TeamStats>>
where
    K: Ord,
    F: Fn(&TeamStats) -> K,
{
    let mut keyed: Vec<(K, &'a TeamStats)> = teams.iter().map(|t| (key(t), *t)).collect();
    keyed.sort_by(|(a, _), (b, _)| if higher_better { b.cmp(a) } else { a.cmp(b) });

    let mut groups: Vec<Vec<&'a TeamStats>> = Vec::new();
    let mut last: Option<K> = None;
    for (k, team) in keyed {
        match groups.last_mut() {
            Some(group) if last.as_ref() == Some(&k) => group.push(team),
            _ => groups.push(vec![team]),
        }
        last = Some(k);
    }
    groups
}
