//! Per-team aggregation over completed games.

use std::collections::HashMap;

use crate::models::{Game, GameResult, PointStructure, TeamId, TeamRef, TeamStats};

/// Positive differentials are capped at `cap`; zero and negative ones are not.
///
/// Differentials beyond the `i32` range saturate.
pub fn capped_goal_diff(goals_for: u32, goals_against: u32, cap: i32) -> i32 {
    let diff = i64::from(goals_for) - i64::from(goals_against);
    let diff = if diff > 0 {
        diff.min(i64::from(cap))
    } else {
        diff
    };
    i32::try_from(diff).unwrap_or(if diff < 0 { i32::MIN } else { i32::MAX })
}

/// Build one `TeamStats` per team (in input order) from the counted games.
///
/// Games that are not completed, lack a score or lack a team id are skipped.
/// Teams not listed in `teams` are ignored, but their opponents still count
/// the game.
pub fn aggregate_stats(
    teams: &[TeamRef],
    games: &[Game],
    points: &PointStructure,
    goal_diff_cap: i32,
) -> Vec<TeamStats> {
    let mut stats: Vec<TeamStats> = Vec::with_capacity(teams.len());
    let mut index: HashMap<TeamId, usize> = HashMap::with_capacity(teams.len());
    for team in teams {
        if index.contains_key(&team.team_id) {
            continue;
        }
        index.insert(team.team_id.clone(), stats.len());
        stats.push(TeamStats::new(team));
    }

    for game in games {
        let Some(score) = game.final_score() else {
            continue;
        };

        if let Some(&i) = index.get(score.home_team_id) {
            record_game(
                &mut stats[i],
                game,
                score.away_team_id,
                score.home_goals,
                score.away_goals,
                game.penalty_minutes_home,
                game.fastest_goal_seconds_home,
                points,
                goal_diff_cap,
            );
        }
        if let Some(&i) = index.get(score.away_team_id) {
            record_game(
                &mut stats[i],
                game,
                score.home_team_id,
                score.away_goals,
                score.home_goals,
                game.penalty_minutes_away,
                game.fastest_goal_seconds_away,
                points,
                goal_diff_cap,
            );
        }
    }

    stats
}

#[allow(clippy::too_many_arguments)]
fn record_game(
    stats: &mut TeamStats,
    game: &Game,
    opponent_id: &TeamId,
    goals_for: u32,
    goals_against: u32,
    penalty_minutes: Option<u32>,
    first_goal_seconds: Option<u32>,
    points: &PointStructure,
    goal_diff_cap: i32,
) {
    let capped = capped_goal_diff(goals_for, goals_against, goal_diff_cap);

    stats.gp += 1;
    stats.gf = stats.gf.saturating_add(goals_for);
    stats.ga = stats.ga.saturating_add(goals_against);
    stats.gd = stats.gd.saturating_add(capped);

    if let Some(pim) = penalty_minutes {
        stats.penalty_minutes = stats.penalty_minutes.saturating_add(pim);
    }
    if let Some(secs) = first_goal_seconds {
        stats.fastest_first_goal = Some(stats.fastest_first_goal.map_or(secs, |f| f.min(secs)));
    }

    if goals_for > goals_against {
        stats.w += 1;
        stats.pts += points.win_points;
    } else if goals_for < goals_against {
        stats.l += 1;
        stats.pts += points.loss_points;
    } else {
        stats.t += 1;
        stats.pts += points.tie_points;
    }

    stats.game_results.push(GameResult {
        game_id: game.id.clone(),
        opponent_id: opponent_id.clone(),
        goals_for,
        goals_against,
        capped_goal_diff: capped,
    });
}
