use crate::config::PipelineConfig;
use crate::snapshot::TournamentSnapshot;
use madness_api::{GameRecord, GameStatus, Participant};
use std::fmt::Write;

const LIVE: &str = "🔴";
const FINAL: &str = "✅";
const SCHEDULED: &str = "🕐";
const UPSET_MARKER: &str = "🚨 UPSET";

/// Canvas sections, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Header,
    CloseGameAlert,
    InProgress,
    RecentlyCompleted,
    Upcoming,
    Statistics,
    Footer,
}

impl SectionKind {
    pub fn name(&self) -> &'static str {
        match self {
            SectionKind::Header => "header",
            SectionKind::CloseGameAlert => "close-games",
            SectionKind::InProgress => "in-progress",
            SectionKind::RecentlyCompleted => "recently-completed",
            SectionKind::Upcoming => "upcoming",
            SectionKind::Statistics => "statistics",
            SectionKind::Footer => "footer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub kind: SectionKind,
    /// Markdown, heading included.
    pub body: String,
}

impl Section {
    fn new(kind: SectionKind, body: String) -> Self {
        Self { kind, body }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub title: String,
    pub recent_limit: usize,
    pub upcoming_limit: usize,
    pub refresh_interval_minutes: u64,
}

impl RenderOptions {
    pub fn new(config: &PipelineConfig, refresh_interval_minutes: u64) -> Self {
        Self {
            title: config.title.clone(),
            recent_limit: config.recent_limit,
            upcoming_limit: config.upcoming_limit,
            refresh_interval_minutes,
        }
    }
}

/// Render a snapshot into canvas sections. Pure: the same snapshot and
/// options always give the same sections.
pub fn render(snapshot: &TournamentSnapshot, options: &RenderOptions) -> Vec<Section> {
    let mut sections = vec![header(snapshot, options)];
    if !snapshot.close.is_empty() {
        sections.push(close_game_alert(snapshot));
    }
    sections.push(in_progress(snapshot));
    sections.push(recently_completed(snapshot, options.recent_limit));
    sections.push(upcoming(snapshot, options.upcoming_limit));
    sections.push(statistics(snapshot));
    sections.push(footer(snapshot, options));
    sections
}

/// Placeholder content for a freshly created canvas.
pub fn skeleton(options: &RenderOptions) -> Vec<Section> {
    vec![
        Section::new(
            SectionKind::Header,
            format!("# 🏀 {}\n_Loading tournament data…_", options.title),
        ),
        Section::new(
            SectionKind::Footer,
            format!("_Refreshes every {} minutes_", options.refresh_interval_minutes),
        ),
    ]
}

/// Join sections into the single markdown document the canvas holds.
pub fn to_markdown(sections: &[Section]) -> String {
    sections
        .iter()
        .map(|s| s.body.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// One game on one line: status, seeded teams, score or "vs", upset marker, annotation.
pub fn game_line(game: &GameRecord, is_upset: bool) -> String {
    let round = game.round_kind().label();
    match &game.status {
        GameStatus::Scheduled => format!(
            "{SCHEDULED} {} vs {} · {} · {round}",
            seeded(&game.away),
            seeded(&game.home),
            game.start_time.format("%a %b %-d, %H:%M UTC"),
        ),
        GameStatus::InProgress { period, clock } => format!(
            "{LIVE} {} @ {} · {period} {clock} · {round}",
            scored(&game.away, false),
            scored(&game.home, false),
        ),
        GameStatus::Final => {
            let winner = game.leader().map(|p| p.team.as_str());
            let mut line = format!(
                "{FINAL} {} @ {}",
                scored(&game.away, winner == Some(game.away.team.as_str())),
                scored(&game.home, winner == Some(game.home.team.as_str())),
            );
            if is_upset {
                let _ = write!(line, " {UPSET_MARKER}");
            }
            let _ = write!(line, " · Final · {round}");
            line
        }
    }
}

fn seeded(p: &Participant) -> String {
    format!("({}) {}", p.seed, p.team)
}

fn scored(p: &Participant, bold: bool) -> String {
    if bold {
        format!("**({}) {} {}**", p.seed, p.team, p.score)
    } else {
        format!("({}) {} {}", p.seed, p.team, p.score)
    }
}

fn bullet_list<'a>(games: impl IntoIterator<Item = &'a GameRecord>, snapshot: &TournamentSnapshot) -> String {
    games
        .into_iter()
        .map(|g| format!("- {}", game_line(g, snapshot.is_upset(&g.id))))
        .collect::<Vec<_>>()
        .join("\n")
}

fn header(snapshot: &TournamentSnapshot, options: &RenderOptions) -> Section {
    Section::new(
        SectionKind::Header,
        format!(
            "# 🏀 {}\n_{} games tracked · source: {}_",
            options.title,
            snapshot.stats.total_games,
            snapshot.source.label()
        ),
    )
}

fn close_game_alert(snapshot: &TournamentSnapshot) -> Section {
    let lines = snapshot
        .close
        .iter()
        .map(|g| format!("- {} · {}-pt game", game_line(g, false), g.margin()))
        .collect::<Vec<_>>()
        .join("\n");
    Section::new(SectionKind::CloseGameAlert, format!("## 🚨 Close Games Alert\n{lines}"))
}

fn in_progress(snapshot: &TournamentSnapshot) -> Section {
    let body = if snapshot.current.is_empty() {
        "_No games in progress._".to_owned()
    } else {
        bullet_list(&snapshot.current, snapshot)
    };
    Section::new(SectionKind::InProgress, format!("## {LIVE} Games in Progress\n{body}"))
}

fn recently_completed(snapshot: &TournamentSnapshot, limit: usize) -> Section {
    let mut games: Vec<&GameRecord> = snapshot.completed.iter().collect();
    games.sort_by(|a, b| b.start_time.cmp(&a.start_time));
    games.truncate(limit);

    let body = if games.is_empty() {
        "_No completed games yet._".to_owned()
    } else {
        bullet_list(games, snapshot)
    };
    Section::new(SectionKind::RecentlyCompleted, format!("## {FINAL} Recently Completed\n{body}"))
}

fn upcoming(snapshot: &TournamentSnapshot, limit: usize) -> Section {
    let mut games: Vec<&GameRecord> = snapshot.upcoming.iter().collect();
    games.sort_by_key(|g| g.start_time);
    games.truncate(limit);

    let body = if games.is_empty() {
        "_No upcoming games scheduled._".to_owned()
    } else {
        bullet_list(games, snapshot)
    };
    Section::new(SectionKind::Upcoming, format!("## {SCHEDULED} Upcoming Games\n{body}"))
}

fn statistics(snapshot: &TournamentSnapshot) -> Section {
    let stats = &snapshot.stats;
    let mut body = String::from("## 📊 Tournament Stats\n");
    let _ = writeln!(
        body,
        "- Games: {} total · {} in progress · {} completed · {} upcoming",
        stats.total_games, stats.in_progress, stats.completed, stats.upcoming
    );
    let _ = writeln!(body, "- Upsets: {}", snapshot.upset_count());
    let _ = write!(body, "- Average points per game: {:.1}", stats.avg_points_per_game);

    if !stats.top_scoring_teams.is_empty() {
        body.push_str("\n\n### Top Scoring Teams");
        for (i, team) in stats.top_scoring_teams.iter().enumerate() {
            let games = if team.games == 1 { "game" } else { "games" };
            let _ = write!(
                body,
                "\n{}. ({}) {}: {:.1} ppg ({} {games})",
                i + 1,
                team.seed,
                team.team,
                team.average,
                team.games
            );
        }
    }

    if !stats.closest_games.is_empty() {
        body.push_str("\n\n### Closest Games");
        for (i, game) in stats.closest_games.iter().enumerate() {
            let high = game.away_score.max(game.home_score);
            let low = game.away_score.min(game.home_score);
            let _ = write!(
                body,
                "\n{}. {} def. {} {high}-{low} ({} pts)",
                i + 1,
                game.winner,
                game.loser,
                game.margin
            );
        }
    }

    Section::new(SectionKind::Statistics, body)
}

fn footer(snapshot: &TournamentSnapshot, options: &RenderOptions) -> Section {
    let mut body = format!(
        "_Last updated: {} · refreshes every {} minutes",
        snapshot.created_at.format("%Y-%m-%d %H:%M UTC"),
        options.refresh_interval_minutes
    );
    if snapshot.dropped_records > 0 {
        let _ = write!(body, " · {} malformed records skipped", snapshot.dropped_records);
    }
    if !snapshot.anomalies.is_empty() {
        let _ = write!(body, " · {} data anomalies excluded", snapshot.anomalies.len());
    }
    body.push('_');
    Section::new(SectionKind::Footer, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::DataAnomaly;
    use crate::snapshot::tests::seed_snapshot;
    use crate::snapshot::{BatchSource, TournamentSnapshot};
    use chrono::{Duration, TimeZone, Utc};

    fn options() -> RenderOptions {
        RenderOptions::new(&PipelineConfig::default(), 5)
    }

    fn kinds(sections: &[Section]) -> Vec<SectionKind> {
        sections.iter().map(|s| s.kind).collect()
    }

    #[test]
    fn sections_are_ordered_with_close_alert_after_header() {
        let sections = render(&seed_snapshot(), &options());
        assert_eq!(
            kinds(&sections),
            [
                SectionKind::Header,
                SectionKind::CloseGameAlert,
                SectionKind::InProgress,
                SectionKind::RecentlyCompleted,
                SectionKind::Upcoming,
                SectionKind::Statistics,
                SectionKind::Footer,
            ]
        );
    }

    #[test]
    fn close_alert_is_omitted_without_close_games() {
        let snapshot = seed_snapshot();
        let games: Vec<_> = snapshot.games.iter().filter(|g| !g.is_live()).cloned().collect();
        let quiet = TournamentSnapshot::build(
            games,
            &PipelineConfig::default(),
            BatchSource::Seed,
            0,
            snapshot.created_at,
        );
        let sections = render(&quiet, &options());
        assert!(!kinds(&sections).contains(&SectionKind::CloseGameAlert));
        assert!(sections[1].body.contains("_No games in progress._"));
    }

    #[test]
    fn rendering_is_idempotent() {
        let snapshot = seed_snapshot();
        assert_eq!(render(&snapshot, &options()), render(&snapshot, &options()));
        assert_eq!(
            to_markdown(&render(&snapshot, &options())),
            to_markdown(&render(&snapshot, &options()))
        );
    }

    #[test]
    fn game_lines_carry_status_seeds_score_and_annotation() {
        let snapshot = seed_snapshot();
        let find = |id: &str| snapshot.games.iter().find(|g| g.id == id).unwrap();

        assert_eq!(
            game_line(find("seed-401638580"), true),
            "✅ **(11) Duquesne 71** @ (6) BYU 69 🚨 UPSET · Final · 1st Round"
        );
        assert_eq!(
            game_line(find("seed-401638581"), false),
            "🔴 (10) NC State 45 @ (7) Texas Tech 42 · 2nd 12:38 · 1st Round"
        );
        assert_eq!(
            game_line(find("seed-401638582"), false),
            "🕐 (2) Marquette vs (15) Western Kentucky · Fri Mar 22, 19:10 UTC · 1st Round"
        );
    }

    #[test]
    fn completed_games_are_most_recent_first_and_truncated() {
        let base = Utc.with_ymd_and_hms(2024, 3, 21, 12, 0, 0).unwrap();
        let template = seed_snapshot().completed[0].clone();
        let games: Vec<_> = (0..7)
            .map(|i| {
                let mut g = template.clone();
                g.id = format!("final-{i}");
                g.away.team = format!("Team {i}");
                g.start_time = base + Duration::hours(i);
                g
            })
            .collect();
        let snapshot =
            TournamentSnapshot::build(games, &PipelineConfig::default(), BatchSource::Live, 0, base);

        let section = recently_completed(&snapshot, 5);
        let lines: Vec<&str> = section.body.lines().skip(1).collect();
        assert_eq!(lines.len(), 5);
        for (line, team) in lines.iter().zip(["Team 6", "Team 5", "Team 4", "Team 3", "Team 2"]) {
            assert!(line.contains(team), "{line} should mention {team}");
        }
    }

    #[test]
    fn upcoming_games_are_soonest_first() {
        let section = upcoming(&seed_snapshot(), 5);
        let lines: Vec<&str> = section.body.lines().skip(1).collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Kentucky"));
        assert!(lines[1].contains("Marquette"));
    }

    #[test]
    fn statistics_section_lists_scenario_numbers() {
        let section = statistics(&seed_snapshot());
        assert!(section.body.contains("- Games: 5 total · 1 in progress · 2 completed · 2 upcoming"));
        assert!(section.body.contains("- Upsets: 1"));
        assert!(section.body.contains("- Average points per game: 130.0"));
        assert!(section.body.contains("1. Duquesne def. BYU 71-69 (2 pts)"));
        assert!(section.body.contains("2. Colorado def. Virginia 63-57 (6 pts)"));
        assert!(section.body.contains("1. (11) Duquesne: 71.0 ppg (1 game)"));
    }

    #[test]
    fn footer_shows_timestamp_and_skipped_records() {
        let mut snapshot = seed_snapshot();
        snapshot.dropped_records = 2;
        let section = footer(&snapshot, &options());
        assert_eq!(
            section.body,
            "_Last updated: 2024-03-21 22:00 UTC · refreshes every 5 minutes · 2 malformed records skipped_"
        );
    }

    #[test]
    fn footer_counts_data_anomalies() {
        let mut snapshot = seed_snapshot();
        snapshot.anomalies.push(DataAnomaly::EqualSeeds { game_id: "x".into(), seed: 4 });
        let section = footer(&snapshot, &options());
        assert_eq!(
            section.body,
            "_Last updated: 2024-03-21 22:00 UTC · refreshes every 5 minutes · 1 data anomalies excluded_"
        );
    }

    #[test]
    fn skeleton_has_header_and_footer() {
        let sections = skeleton(&options());
        assert_eq!(kinds(&sections), [SectionKind::Header, SectionKind::Footer]);
        assert!(to_markdown(&sections).starts_with("# 🏀 March Madness Live"));
    }
}
