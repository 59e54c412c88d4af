use crate::raw::{RawGameRecord, RawParticipant, STATUS_FINAL, STATUS_IN_PROGRESS, STATUS_SCHEDULED};
use crate::{Clock, GameRecord, GameStatus, Participant, RoundKind};
use chrono::{DateTime, Utc};
use std::fmt;

/// Why a raw record could not be turned into a `GameRecord`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedRecord {
    MissingField(&'static str),
    InvalidRound(i64),
    SeedOutOfRange { team: String, seed: i64 },
    InvalidScore { team: String, score: i64 },
    UnknownStatus(String),
    InvalidClock { minutes: i64, seconds: i64 },
    InvalidTimestamp(String),
}

impl fmt::Display for MalformedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedRecord::MissingField(field) => write!(f, "missing field `{field}`"),
            MalformedRecord::InvalidRound(round) => write!(f, "invalid round {round}"),
            MalformedRecord::SeedOutOfRange { team, seed } => {
                write!(f, "seed {seed} for {team} is outside 1-16")
            }
            MalformedRecord::InvalidScore { team, score } => {
                write!(f, "invalid score {score} for {team}")
            }
            MalformedRecord::UnknownStatus(status) => write!(f, "unknown status `{status}`"),
            MalformedRecord::InvalidClock { minutes, seconds } => {
                write!(f, "invalid clock {minutes}:{seconds}")
            }
            MalformedRecord::InvalidTimestamp(ts) => write!(f, "invalid start time `{ts}`"),
        }
    }
}

/// Result of normalizing a whole provider batch. Malformed records are
/// dropped, never fatal.
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub records: Vec<GameRecord>,
    /// (record id or "?", reason)
    pub rejected: Vec<(String, MalformedRecord)>,
}

impl NormalizedBatch {
    pub fn dropped(&self) -> usize {
        self.rejected.len()
    }
}

pub fn normalize_batch(raw: &[RawGameRecord]) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();
    for record in raw {
        match normalize(record) {
            Ok(game) => batch.records.push(game),
            Err(reason) => {
                let id = record.id.clone().unwrap_or_else(|| "?".to_owned());
                batch.rejected.push((id, reason));
            }
        }
    }
    batch
}

pub fn normalize(raw: &RawGameRecord) -> Result<GameRecord, MalformedRecord> {
    let id = raw
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(MalformedRecord::MissingField("id"))?
        .to_owned();

    let round = raw.round.ok_or(MalformedRecord::MissingField("round"))?;
    let round = u8::try_from(round)
        .ok()
        .filter(|r| (RoundKind::FirstFour.number()..=RoundKind::Championship.number()).contains(r))
        .ok_or(MalformedRecord::InvalidRound(round))?;

    let status_name = raw.status.as_deref().ok_or(MalformedRecord::MissingField("status"))?;
    if ![STATUS_SCHEDULED, STATUS_IN_PROGRESS, STATUS_FINAL].contains(&status_name) {
        return Err(MalformedRecord::UnknownStatus(status_name.to_owned()));
    }
    let scored = status_name != STATUS_SCHEDULED;

    let away = raw.away.as_ref().ok_or(MalformedRecord::MissingField("away"))?;
    let home = raw.home.as_ref().ok_or(MalformedRecord::MissingField("home"))?;
    let away = normalize_participant(away, scored)?;
    let home = normalize_participant(home, scored)?;

    let status = match status_name {
        STATUS_SCHEDULED => GameStatus::Scheduled,
        STATUS_IN_PROGRESS => {
            let period = raw
                .period
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .ok_or(MalformedRecord::MissingField("period"))?
                .to_owned();
            GameStatus::InProgress { period, clock: normalize_clock(raw)? }
        }
        _ => GameStatus::Final, // STATUS_FINAL, checked above
    };

    let start_time = raw
        .start_time
        .as_deref()
        .ok_or(MalformedRecord::MissingField("startTime"))?;
    let start_time = DateTime::parse_from_rfc3339(start_time)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| MalformedRecord::InvalidTimestamp(start_time.to_owned()))?;

    Ok(GameRecord { id, round, away, home, status, start_time })
}

fn normalize_participant(raw: &RawParticipant, scored: bool) -> Result<Participant, MalformedRecord> {
    let team = raw
        .team
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(MalformedRecord::MissingField("team"))?
        .to_owned();

    let seed = raw.seed.ok_or(MalformedRecord::MissingField("seed"))?;
    if !(1..=16).contains(&seed) {
        return Err(MalformedRecord::SeedOutOfRange { team, seed });
    }

    // Scheduled games carry placeholder scores; only live and final ones must have a real one.
    let score = if scored {
        let score = raw.score.ok_or(MalformedRecord::MissingField("score"))?;
        u32::try_from(score).map_err(|_| MalformedRecord::InvalidScore { team: team.clone(), score })?
    } else {
        0
    };

    Ok(Participant { team, seed: seed as u8, score })
}

fn normalize_clock(raw: &RawGameRecord) -> Result<Clock, MalformedRecord> {
    let minutes = raw.clock_minutes.ok_or(MalformedRecord::MissingField("clockMinutes"))?;
    let seconds = raw.clock_seconds.ok_or(MalformedRecord::MissingField("clockSeconds"))?;
    if minutes < 0 || !(0..60).contains(&seconds) {
        return Err(MalformedRecord::InvalidClock { minutes, seconds });
    }
    let minutes = u32::try_from(minutes).map_err(|_| MalformedRecord::InvalidClock { minutes, seconds })?;
    Ok(Clock { minutes, seconds: seconds as u32 })
}
