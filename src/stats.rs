use madness_api::GameRecord;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatisticsSummary {
    pub total_games: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub upcoming: usize,
    /// Both teams' points per completed game, one decimal. 0 with no completed games.
    pub avg_points_per_game: f64,
    /// Highest average first; ties keep first-encountered order.
    pub top_scoring_teams: Vec<TeamAverage>,
    /// Smallest margin first; ties keep batch order.
    pub closest_games: Vec<ClosestGame>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamAverage {
    pub team: String,
    pub seed: u8,
    pub games: u32,
    pub total_points: u32,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosestGame {
    pub game_id: String,
    pub winner: String,
    pub loser: String,
    pub margin: u32,
    pub away_score: u32,
    pub home_score: u32,
}

/// Compute the summary over the lifecycle buckets of one batch.
///
/// Completed games with level scores count towards `completed` but are left
/// out of every score-derived figure.
pub fn compute(
    completed: &[GameRecord],
    current: &[GameRecord],
    upcoming: &[GameRecord],
    top_n: usize,
) -> StatisticsSummary {
    let decided: Vec<&GameRecord> = completed.iter().filter(|g| g.leader().is_some()).collect();

    StatisticsSummary {
        total_games: completed.len() + current.len() + upcoming.len(),
        in_progress: current.len(),
        completed: completed.len(),
        upcoming: upcoming.len(),
        avg_points_per_game: average_points(&decided),
        top_scoring_teams: top_scoring_teams(&decided, top_n),
        closest_games: closest_games(&decided, top_n),
    }
}

fn average_points(games: &[&GameRecord]) -> f64 {
    if games.is_empty() {
        return 0.0;
    }
    let total: u64 = games
        .iter()
        .map(|g| u64::from(g.away.score) + u64::from(g.home.score))
        .sum();
    round1(total as f64 / games.len() as f64)
}

fn top_scoring_teams(games: &[&GameRecord], top_n: usize) -> Vec<TeamAverage> {
    let mut teams: Vec<TeamAverage> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for game in games {
        for side in [&game.away, &game.home] {
            let slot = *index.entry(side.team.as_str()).or_insert_with(|| {
                teams.push(TeamAverage {
                    team: side.team.clone(),
                    seed: side.seed,
                    games: 0,
                    total_points: 0,
                    average: 0.0,
                });
                teams.len() - 1
            });
            let entry = &mut teams[slot];
            entry.games += 1;
            entry.total_points += side.score;
        }
    }

    for team in &mut teams {
        team.average = round1(f64::from(team.total_points) / f64::from(team.games));
    }

    // sort_by is stable, so equal averages keep encounter order.
    teams.sort_by(|a, b| b.average.total_cmp(&a.average));
    teams.truncate(top_n);
    teams
}

fn closest_games(games: &[&GameRecord], top_n: usize) -> Vec<ClosestGame> {
    let mut closest: Vec<ClosestGame> = games
        .iter()
        .filter_map(|g| {
            let winner = g.leader()?;
            let loser = g.trailer()?;
            Some(ClosestGame {
                game_id: g.id.clone(),
                winner: winner.team.clone(),
                loser: loser.team.clone(),
                margin: g.margin(),
                away_score: g.away.score,
                home_score: g.home.score,
            })
        })
        .collect();
    closest.sort_by_key(|c| c.margin);
    closest.truncate(top_n);
    closest
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use madness_api::{GameStatus, Participant};

    fn final_game(id: &str, away: (&str, u8, u32), home: (&str, u8, u32)) -> GameRecord {
        GameRecord {
            id: id.into(),
            round: 2,
            away: Participant { team: away.0.into(), seed: away.1, score: away.2 },
            home: Participant { team: home.0.into(), seed: home.1, score: home.2 },
            status: GameStatus::Final,
            start_time: Utc::now(),
        }
    }

    #[test]
    fn empty_completed_set_averages_zero() {
        let s = compute(&[], &[], &[], 5);
        assert_eq!(s.avg_points_per_game, 0.0);
        assert!(s.top_scoring_teams.is_empty());
        assert!(s.closest_games.is_empty());
    }

    #[test]
    fn average_is_rounded_to_one_decimal() {
        let games = vec![
            final_game("a", ("A", 1, 70), ("B", 16, 61)),
            final_game("b", ("C", 2, 80), ("D", 15, 60)),
            final_game("c", ("E", 3, 75), ("F", 14, 74)),
        ];
        // (131 + 140 + 149) / 3 = 140.0
        assert_eq!(compute(&games, &[], &[], 5).avg_points_per_game, 140.0);

        let games = vec![
            final_game("a", ("A", 1, 70), ("B", 16, 61)),
            final_game("b", ("C", 2, 80), ("D", 15, 61)),
            final_game("c", ("E", 3, 75), ("F", 14, 74)),
        ];
        // 421 / 3 = 140.333…
        assert_eq!(compute(&games, &[], &[], 5).avg_points_per_game, 140.3);
    }

    #[test]
    fn teams_are_credited_for_home_and_away_games() {
        let games = vec![
            final_game("a", ("Duke", 4, 64), ("James Madison", 12, 55)),
            final_game("b", ("NC State", 11, 79), ("Duke", 4, 80)),
        ];
        let s = compute(&games, &[], &[], 10);
        let duke = s.top_scoring_teams.iter().find(|t| t.team == "Duke").unwrap();
        assert_eq!(duke.games, 2);
        assert_eq!(duke.total_points, 144);
        assert_eq!(duke.average, 72.0);
    }

    #[test]
    fn top_scoring_is_descending_stable_and_truncated() {
        let games = vec![
            final_game("a", ("A", 1, 70), ("B", 16, 80)),
            final_game("b", ("C", 2, 80), ("D", 15, 60)),
            final_game("c", ("E", 3, 70), ("F", 14, 90)),
        ];
        let s = compute(&games, &[], &[], 3);
        let names: Vec<&str> = s.top_scoring_teams.iter().map(|t| t.team.as_str()).collect();
        // B and C tie at 80: B was seen first.
        assert_eq!(names, ["F", "B", "C"]);

        let s = compute(&games, &[], &[], 5);
        let names: Vec<&str> = s.top_scoring_teams.iter().map(|t| t.team.as_str()).collect();
        // A and E tie at 70.
        assert_eq!(names, ["F", "B", "C", "A", "E"]);
    }

    #[test]
    fn closest_games_are_ascending_stable_and_truncated() {
        let games = vec![
            final_game("g1", ("A", 1, 70), ("B", 16, 60)),
            final_game("g2", ("C", 2, 61), ("D", 15, 60)),
            final_game("g3", ("E", 3, 64), ("F", 14, 70)),
            final_game("g4", ("G", 4, 71), ("H", 13, 70)),
            final_game("g5", ("I", 5, 50), ("J", 12, 53)),
            final_game("g6", ("K", 6, 90), ("L", 11, 60)),
        ];
        let s = compute(&games, &[], &[], 5);
        let ids: Vec<&str> = s.closest_games.iter().map(|c| c.game_id.as_str()).collect();
        assert_eq!(ids, ["g2", "g4", "g5", "g3", "g1"]);
        assert_eq!(s.closest_games[2].winner, "J");
        assert_eq!(s.closest_games[2].loser, "I");
        assert_eq!(s.closest_games[2].margin, 3);
    }

    #[test]
    fn tied_finals_count_but_do_not_score() {
        let games = vec![
            final_game("a", ("A", 1, 70), ("B", 16, 60)),
            final_game("tie", ("C", 2, 65), ("D", 15, 65)),
        ];
        let s = compute(&games, &[], &[], 5);
        assert_eq!(s.completed, 2);
        assert_eq!(s.avg_points_per_game, 130.0);
        assert!(s.closest_games.iter().all(|c| c.game_id != "tie"));
        assert!(s.top_scoring_teams.iter().all(|t| t.team != "C" && t.team != "D"));
    }
}
