use log::warn;
use madness_api::GameRecord;
use std::fmt;

/// Records that break a tournament invariant. Never fatal: the record is
/// left out of whichever derived subset it would corrupt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataAnomaly {
    /// A completed game between two teams with the same seed.
    EqualSeeds { game_id: String, seed: u8 },
    /// A completed game reported with level scores.
    TiedFinal { game_id: String, score: u32 },
}

impl fmt::Display for DataAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataAnomaly::EqualSeeds { game_id, seed } => {
                write!(f, "game {game_id}: both teams seeded {seed}")
            }
            DataAnomaly::TiedFinal { game_id, score } => {
                write!(f, "game {game_id}: final score tied at {score}")
            }
        }
    }
}

/// Lifecycle buckets and alert subsets of one batch, in batch order.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub current: Vec<GameRecord>,
    pub completed: Vec<GameRecord>,
    pub upcoming: Vec<GameRecord>,
    pub close: Vec<GameRecord>,
    pub upsets: Vec<GameRecord>,
    pub anomalies: Vec<DataAnomaly>,
}

pub fn classify(games: &[GameRecord], close_game_threshold: u32) -> Classification {
    let mut out = Classification::default();

    for game in games {
        if game.is_live() {
            out.current.push(game.clone());
        } else if game.is_final() {
            out.completed.push(game.clone());
        } else {
            out.upcoming.push(game.clone());
        }
    }

    out.close = out
        .current
        .iter()
        .filter(|g| g.margin() <= close_game_threshold)
        .cloned()
        .collect();

    for game in &out.completed {
        match upset_status(game) {
            Ok(true) => out.upsets.push(game.clone()),
            Ok(false) => {}
            Err(anomaly) => {
                warn!("data anomaly, excluded from upsets: {anomaly}");
                out.anomalies.push(anomaly);
            }
        }
    }

    out
}

/// Whether the weaker (numerically larger) seed won a completed game.
pub fn upset_status(game: &GameRecord) -> Result<bool, DataAnomaly> {
    if game.away.seed == game.home.seed {
        return Err(DataAnomaly::EqualSeeds { game_id: game.id.clone(), seed: game.away.seed });
    }
    let winner = game.leader().ok_or_else(|| DataAnomaly::TiedFinal {
        game_id: game.id.clone(),
        score: game.away.score,
    })?;
    let weaker_seed = game.away.seed.max(game.home.seed);
    Ok(winner.seed == weaker_seed)
}
