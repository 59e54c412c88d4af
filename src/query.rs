use crate::snapshot::TournamentSnapshot;

pub const TRY_AGAIN: &str = "Tournament data isn't available right now, try again in a moment.";

/// What a chat message is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    InProgress,
    CloseGames,
    Upsets,
    Summary,
    RefreshNow,
    Help,
}

impl Query {
    /// Keyword match on free text. Messages that ask nothing give `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim().to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| text.contains(w));

        let query = if has(&["refresh", "update now", "sync"]) {
            Query::RefreshNow
        } else if has(&["upset"]) {
            Query::Upsets
        } else if has(&["close game", "close one", "nail-biter", "nailbiter", "close"]) {
            Query::CloseGames
        } else if has(&["in progress", "live", "playing", "on now", "current"]) {
            Query::InProgress
        } else if has(&["summary", "stats", "status", "score"]) {
            Query::Summary
        } else if has(&["help", "commands"]) {
            Query::Help
        } else {
            return None;
        };
        Some(query)
    }
}

/// Answer a read-only query from the last committed snapshot.
/// `RefreshNow` is handled by the caller, which owns the sync trigger.
pub fn answer(query: Query, snapshot: Option<&TournamentSnapshot>) -> String {
    if query == Query::Help {
        return help_text().to_owned();
    }
    let Some(snapshot) = snapshot else {
        return TRY_AGAIN.to_owned();
    };

    match query {
        Query::InProgress => match snapshot.in_progress_count() {
            0 => "No games in progress right now.".to_owned(),
            1 => "1 game in progress.".to_owned(),
            n => format!("{n} games in progress."),
        },
        Query::CloseGames => match snapshot.close_count() {
            0 => "No close games right now.".to_owned(),
            n => {
                let games = snapshot
                    .close
                    .iter()
                    .map(|g| format!("{} {}-{} {}", g.away.team, g.away.score, g.home.score, g.home.team))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{n} close {}: {games}", if n == 1 { "game" } else { "games" })
            }
        },
        Query::Upsets => match snapshot.upset_count() {
            0 => "No upsets so far.".to_owned(),
            1 => "1 upset so far.".to_owned(),
            n => format!("{n} upsets so far."),
        },
        Query::Summary => {
            let s = &snapshot.stats;
            format!(
                "{} live, {} final, {} upcoming · {} {} · {:.1} points per game",
                s.in_progress,
                s.completed,
                s.upcoming,
                snapshot.upset_count(),
                if snapshot.upset_count() == 1 { "upset" } else { "upsets" },
                s.avg_points_per_game
            )
        }
        Query::RefreshNow | Query::Help => help_text().to_owned(),
    }
}

fn help_text() -> &'static str {
    "Ask me about: games in progress, close games, upsets, summary. Say \"refresh\" to update the canvas now."
}
