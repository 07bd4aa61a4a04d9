//! Standings engine.
//!
//! Pure computation from in-memory teams, games and tiebreaker rules to a
//! fully ordered table:
//! 1. Aggregate per-team stats from completed games
//! 2. Partition teams by points, best first
//! 3. Resolve each tied points group with the tiebreaker chain
//!
//! Nothing here touches storage, so the same functions serve the standings
//! view, the bracket view and bracket advancement.

mod aggregate;
mod tiebreak;

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

pub use aggregate::{aggregate_stats, capped_goal_diff};
pub use tiebreak::{apply_rule, resolve_group, Resolved};

use crate::models::{
    Game, Pool, PointStructure, PoolTeam, ScoringSettings, Standing, TeamRef, TeamStats,
    TiebreakerRule,
};

/// Rank `teams` by points, breaking ties with `rules` in `priority_order`.
///
/// Never fails: unusable games are skipped and unknown rules separate nobody.
pub fn compute_standings(
    teams: &[TeamRef],
    games: &[Game],
    rules: &[TiebreakerRule],
    points: &PointStructure,
    goal_diff_cap: i32,
) -> Vec<Standing> {
    let stats = aggregate_stats(teams, games, points, goal_diff_cap);

    let mut ordered_rules: Vec<&TiebreakerRule> = rules.iter().collect();
    ordered_rules.sort_by_key(|r| r.priority_order);

    let standings = rank_teams(&stats, &ordered_rules);
    debug!(
        "Computed standings for {} teams with {} tiebreaker rules",
        standings.len(),
        ordered_rules.len()
    );
    standings
}

/// Same as [`compute_standings`] with settings resolved for a tournament.
pub fn compute_with_settings(
    teams: &[TeamRef],
    games: &[Game],
    rules: &[TiebreakerRule],
    scoring: &ScoringSettings,
) -> Vec<Standing> {
    compute_standings(
        teams,
        games,
        rules,
        &scoring.points,
        scoring.goal_differential_cap,
    )
}

fn rank_teams(stats: &[TeamStats], rules: &[&TiebreakerRule]) -> Vec<Standing> {
    let mut by_points: BTreeMap<i32, Vec<&TeamStats>> = BTreeMap::new();
    for team in stats {
        by_points.entry(team.pts).or_default().push(team);
    }

    let mut ranked = Vec::with_capacity(stats.len());
    let mut rank = 1;
    for (_, group) in by_points.into_iter().rev() {
        for entry in resolve_group(group, rules, 0) {
            ranked.push(Standing::from_stats(
                entry.stats,
                rank,
                entry.tiebreaker_used,
                entry.coin_toss_needed,
            ));
            rank += 1;
        }
    }
    ranked
}

/// One pool's table.
#[derive(Debug, Clone, Serialize)]
pub struct PoolStandings {
    pub pool: Pool,
    pub standings: Vec<PoolStandingRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PoolStandingRow {
    #[serde(flatten)]
    pub standing: Standing,
    /// Within the pool's advancement count
    pub advancing: bool,
}

impl PoolStandings {
    /// Teams in final order.
    pub fn ranking(&self) -> Vec<TeamRef> {
        self.standings.iter().map(|r| r.standing.team_ref()).collect()
    }
}

/// Standings for every pool, in pool-name order.
///
/// Each pool only sees its own members and the games tagged with its id.
pub fn compute_pool_standings(
    pools: &[Pool],
    pool_teams: &[PoolTeam],
    games: &[Game],
    rules: &[TiebreakerRule],
    scoring: &ScoringSettings,
) -> Vec<PoolStandings> {
    let mut pools: Vec<&Pool> = pools.iter().collect();
    pools.sort_by(|a, b| a.name.cmp(&b.name));

    pools
        .into_iter()
        .map(|pool| {
            let teams: Vec<TeamRef> = pool_teams
                .iter()
                .filter(|pt| pt.pool_id == pool.id)
                .map(PoolTeam::to_ref)
                .collect();
            let pool_games: Vec<Game> = games
                .iter()
                .filter(|g| g.pool_id.as_ref() == Some(&pool.id))
                .cloned()
                .collect();

            let standings = compute_with_settings(&teams, &pool_games, rules, scoring)
                .into_iter()
                .map(|standing| PoolStandingRow {
                    advancing: standing.rank <= pool.advancement_count,
                    standing,
                })
                .collect();

            PoolStandings {
                pool: pool.clone(),
                standings,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GameStage, GameStatus, SimpleStat, COIN_TOSS_LABEL};
    use pretty_assertions::assert_eq;

    fn team(id: &str) -> TeamRef {
        TeamRef::new(id.into(), id.to_uppercase())
    }

    fn completed(number: &str, home: &str, away: &str, hs: u32, aws: u32) -> Game {
        let mut game = Game::new("cup".into(), GameStage::PoolPlay, number);
        game.home_team_id = Some(home.into());
        game.away_team_id = Some(away.into());
        game.final_score_home = Some(hs);
        game.final_score_away = Some(aws);
        game.status = GameStatus::Completed;
        game
    }

    fn simple(priority: i32, stat: SimpleStat) -> TiebreakerRule {
        TiebreakerRule::simple("cup".into(), priority, stat, None)
    }

    fn order(standings: &[Standing]) -> Vec<&str> {
        standings.iter().map(|s| s.team_id.as_str()).collect()
    }

    /// X and Y both 2-0; Z and W both 0-2.
    fn four_team_pool() -> (Vec<TeamRef>, Vec<Game>) {
        let teams = vec![team("x"), team("y"), team("z"), team("w")];
        let games = vec![
            completed("1", "x", "z", 5, 0),
            completed("2", "w", "x", 2, 3),
            completed("3", "y", "z", 2, 1),
            completed("4", "w", "y", 0, 4),
        ];
        (teams, games)
    }

    #[test]
    fn test_goal_ratio_breaks_tie_after_wins() {
        let (teams, games) = four_team_pool();
        let rules = vec![
            simple(1, SimpleStat::Wins),
            TiebreakerRule::formula("cup".into(), 2, 3),
        ];

        let standings =
            compute_standings(&teams, &games, &rules, &PointStructure::default(), 5);

        assert_eq!(order(&standings), vec!["y", "x", "w", "z"]);

        let y = &standings[0];
        assert_eq!((y.w, y.gf, y.ga, y.pts), (2, 6, 1, 4));
        assert_eq!(y.tiebreaker_used.as_deref(), Some("GF/(GF+GA)"));

        let x = &standings[1];
        assert_eq!((x.w, x.gf, x.ga, x.pts, x.gd), (2, 8, 2, 4, 6));
        assert_eq!(x.tiebreaker_used.as_deref(), Some("GF/(GF+GA)"));
        assert!(!x.coin_toss_needed);
    }

    #[test]
    fn test_rules_apply_in_priority_order() {
        let (teams, games) = four_team_pool();
        // Listed out of order: the ratio rule has the lower priority value.
        let rules = vec![
            simple(5, SimpleStat::GoalsAgainst),
            TiebreakerRule::formula("cup".into(), 1, 3).with_description("Goal ratio"),
        ];

        let standings =
            compute_standings(&teams, &games, &rules, &PointStructure::default(), 5);

        assert_eq!(standings[0].team_id.as_str(), "y");
        assert_eq!(standings[0].tiebreaker_used.as_deref(), Some("Goal ratio"));
    }

    #[test]
    fn test_singleton_points_group_has_no_tiebreaker() {
        let teams = vec![team("a"), team("b")];
        let games = vec![completed("1", "a", "b", 1, 0)];
        let standings = compute_standings(&teams, &games, &[], &PointStructure::default(), 5);

        assert_eq!(order(&standings), vec!["a", "b"]);
        assert!(standings.iter().all(|s| s.tiebreaker_used.is_none()));
        assert!(standings.iter().all(|s| !s.coin_toss_needed));
    }

    #[test]
    fn test_exhaustion_gives_dense_coin_toss_ranks() {
        let teams = vec![team("a"), team("b"), team("c")];
        let rules = vec![simple(1, SimpleStat::Wins), simple(2, SimpleStat::CoinToss)];
        let standings = compute_standings(&teams, &[], &rules, &PointStructure::default(), 5);

        let ranks: Vec<u32> = standings.iter().map(|s| s.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        assert_eq!(order(&standings), vec!["a", "b", "c"]);
        assert!(standings.iter().all(|s| s.coin_toss_needed));
        assert!(standings
            .iter()
            .all(|s| s.tiebreaker_used.as_deref() == Some(COIN_TOSS_LABEL)));
    }

    #[test]
    fn test_ranks_are_dense_and_follow_points() {
        let teams = vec![team("a"), team("b"), team("c"), team("d"), team("e")];
        let games = vec![
            completed("1", "a", "b", 3, 0),
            completed("2", "c", "d", 1, 1),
            completed("3", "e", "a", 2, 2),
            completed("4", "b", "c", 0, 4),
            completed("5", "d", "e", 2, 5),
        ];
        let rules = vec![simple(1, SimpleStat::GoalsAgainst)];
        let standings =
            compute_standings(&teams, &games, &rules, &PointStructure::default(), 5);

        let ranks: Vec<u32> = standings.iter().map(|s| s.rank).collect();
        assert_eq!(ranks, (1..=5).collect::<Vec<u32>>());
        for pair in standings.windows(2) {
            assert!(pair[0].pts >= pair[1].pts);
        }
    }

    #[test]
    fn test_input_order_does_not_change_result() {
        let (teams, games) = four_team_pool();
        let rules = vec![
            simple(1, SimpleStat::Wins),
            TiebreakerRule::formula("cup".into(), 2, 3),
        ];
        let points = PointStructure::default();

        let forward = compute_standings(&teams, &games, &rules, &points, 5);

        let mut reversed_teams = teams.clone();
        reversed_teams.reverse();
        let mut reversed_games = games.clone();
        reversed_games.reverse();
        let backward = compute_standings(&reversed_teams, &reversed_games, &rules, &points, 5);

        assert_eq!(order(&forward), order(&backward));
    }

    #[test]
    fn test_repeat_computation_is_identical() {
        let (teams, games) = four_team_pool();
        let rules = vec![simple(1, SimpleStat::HeadToHead).with_head_to_head_max(2)];
        let points = PointStructure::default();

        let first = compute_standings(&teams, &games, &rules, &points, 5);
        let second = compute_standings(&teams, &games, &rules, &points, 5);
        assert_eq!(first, second);
    }

    #[test]
    fn test_formula_zero_zero_defers_to_next_rule() {
        let teams = vec![team("a"), team("b")];
        let mut g = completed("1", "a", "b", 0, 0);
        g.penalty_minutes_home = Some(10);
        g.penalty_minutes_away = Some(2);
        let rules = vec![
            TiebreakerRule::formula("cup".into(), 1, 3),
            simple(2, SimpleStat::PenaltyMinutes),
        ];

        let standings = compute_standings(&teams, &[g], &rules, &PointStructure::default(), 5);

        assert_eq!(order(&standings), vec!["b", "a"]);
        assert_eq!(standings[0].tiebreaker_used.as_deref(), Some("Penalty Minutes"));
    }

    #[test]
    fn test_goal_diff_cap_in_table() {
        let teams = vec![team("a"), team("b")];
        let games = vec![completed("1", "a", "b", 10, 0)];
        let standings = compute_standings(&teams, &games, &[], &PointStructure::default(), 5);

        assert_eq!(standings[0].gd, 5);
        assert_eq!(standings[1].gd, -10);
    }

    #[test]
    fn test_pool_standings_are_isolated() {
        let pool_a = Pool::new("cup".into(), "A");
        let mut pool_b = Pool::new("cup".into(), "B");
        pool_b.advancement_count = 1;
        let members = vec![
            PoolTeam {
                pool_id: pool_b.id.clone(),
                team_id: "c".into(),
                team_name: "C".to_string(),
            },
            PoolTeam {
                pool_id: pool_b.id.clone(),
                team_id: "d".into(),
                team_name: "D".to_string(),
            },
            PoolTeam {
                pool_id: pool_a.id.clone(),
                team_id: "a".into(),
                team_name: "A".to_string(),
            },
            PoolTeam {
                pool_id: pool_a.id.clone(),
                team_id: "b".into(),
                team_name: "B".to_string(),
            },
        ];
        let mut g1 = completed("1", "b", "a", 2, 0);
        g1.pool_id = Some(pool_a.id.clone());
        let mut g2 = completed("2", "c", "d", 0, 3);
        g2.pool_id = Some(pool_b.id.clone());

        let tables = compute_pool_standings(
            &[pool_b.clone(), pool_a.clone()],
            &members,
            &[g1, g2],
            &[],
            &ScoringSettings::default(),
        );

        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].pool.name, "A");
        let a_order: Vec<String> = tables[0].ranking().iter().map(|t| t.team_id.to_string()).collect();
        assert_eq!(a_order, vec!["b", "a"]);
        assert!(tables[0].standings.iter().all(|r| r.advancing));

        let b_rows = &tables[1].standings;
        assert_eq!(b_rows[0].standing.team_id.as_str(), "d");
        assert!(b_rows[0].advancing);
        assert!(!b_rows[1].advancing);
        assert_eq!(b_rows[0].standing.gp, 1);
    }
}
