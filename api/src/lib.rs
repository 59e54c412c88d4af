pub mod canvas;
pub mod client;
pub mod espn;
pub mod normalize;
pub mod raw;

use chrono::{DateTime, Utc};

pub use normalize::{MalformedRecord, NormalizedBatch, normalize, normalize_batch};
pub use raw::{RawGameRecord, RawParticipant};

// ---------------------------------------------------------------------------
// Domain types: validated model, independent of any provider wire format
// ---------------------------------------------------------------------------

/// One tournament game after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    pub id: String,
    /// Tournament round number, 1 = First Four through 7 = Championship.
    pub round: u8,
    pub away: Participant,
    pub home: Participant,
    pub status: GameStatus,
    pub start_time: DateTime<Utc>,
}

impl GameRecord {
    pub fn is_live(&self) -> bool {
        matches!(self.status, GameStatus::InProgress { .. })
    }

    pub fn is_final(&self) -> bool {
        self.status == GameStatus::Final
    }

    pub fn is_scheduled(&self) -> bool {
        self.status == GameStatus::Scheduled
    }

    /// Absolute score gap. Meaningless for scheduled games.
    pub fn margin(&self) -> u32 {
        self.away.score.abs_diff(self.home.score)
    }

    /// The leading participant, or `None` while the scores are level.
    pub fn leader(&self) -> Option<&Participant> {
        match self.away.score.cmp(&self.home.score) {
            std::cmp::Ordering::Greater => Some(&self.away),
            std::cmp::Ordering::Less => Some(&self.home),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// The trailing participant, or `None` while the scores are level.
    pub fn trailer(&self) -> Option<&Participant> {
        match self.away.score.cmp(&self.home.score) {
            std::cmp::Ordering::Greater => Some(&self.home),
            std::cmp::Ordering::Less => Some(&self.away),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn round_kind(&self) -> RoundKind {
        RoundKind::from_number(self.round)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Participant {
    pub team: String,  // "Duquesne"
    pub seed: u8,      // 1..=16, lower is stronger
    pub score: u32,    // 0 before tip-off
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GameStatus {
    #[default]
    Scheduled,
    InProgress {
        period: String, // "1st", "2nd", "Half", "OT"
        clock: Clock,
    },
    Final,
}

/// Time remaining in the current period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Clock {
    pub minutes: u32,
    pub seconds: u32,
}

impl std::fmt::Display for Clock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{:02}", self.minutes, self.seconds)
    }
}

/// Ordered from earliest to latest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum RoundKind {
    #[default]
    FirstFour,    // Play-in games (Tuesday/Wednesday before the tournament)
    First,        // Round of 64
    Second,       // Round of 32
    Sweet16,
    Elite8,
    FinalFour,    // National semifinals
    Championship,
}

impl RoundKind {
    pub fn from_number(number: u8) -> Self {
        match number {
            1 => RoundKind::FirstFour,
            2 => RoundKind::First,
            3 => RoundKind::Second,
            4 => RoundKind::Sweet16,
            5 => RoundKind::Elite8,
            6 => RoundKind::FinalFour,
            7 => RoundKind::Championship,
            _ => RoundKind::First,
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            RoundKind::FirstFour => 1,
            RoundKind::First => 2,
            RoundKind::Second => 3,
            RoundKind::Sweet16 => 4,
            RoundKind::Elite8 => 5,
            RoundKind::FinalFour => 6,
            RoundKind::Championship => 7,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RoundKind::FirstFour => "First Four",
            RoundKind::First => "1st Round",
            RoundKind::Second => "2nd Round",
            RoundKind::Sweet16 => "Sweet 16",
            RoundKind::Elite8 => "Elite Eight",
            RoundKind::FinalFour => "Final Four",
            RoundKind::Championship => "Championship",
        }
    }
}
