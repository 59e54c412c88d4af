use crate::classify::{self, DataAnomaly};
use crate::config::PipelineConfig;
use crate::stats::{self, StatisticsSummary};
use chrono::{DateTime, Utc};
use madness_api::GameRecord;

/// Where the batch behind a snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchSource {
    /// Fresh from the data provider this cycle.
    Live,
    /// Provider failed; reused the last batch that was fetched successfully.
    LastKnownGood,
    /// Provider failed (or is disabled) and nothing was cached: embedded seed games.
    Seed,
}

impl BatchSource {
    pub fn label(&self) -> &'static str {
        match self {
            BatchSource::Live => "live feed",
            BatchSource::LastKnownGood => "cached feed (provider unavailable)",
            BatchSource::Seed => "demo data",
        }
    }
}

/// Everything one refresh cycle knows about the tournament. Built once,
/// never mutated; a newer cycle replaces it wholesale.
#[derive(Debug, Clone)]
pub struct TournamentSnapshot {
    pub games: Vec<GameRecord>,
    pub current: Vec<GameRecord>,
    pub completed: Vec<GameRecord>,
    pub upcoming: Vec<GameRecord>,
    pub close: Vec<GameRecord>,
    pub upsets: Vec<GameRecord>,
    pub stats: StatisticsSummary,
    pub created_at: DateTime<Utc>,
    pub source: BatchSource,
    pub dropped_records: usize,
    pub anomalies: Vec<DataAnomaly>,
}

impl TournamentSnapshot {
    pub fn build(
        games: Vec<GameRecord>,
        config: &PipelineConfig,
        source: BatchSource,
        dropped_records: usize,
        created_at: DateTime<Utc>,
    ) -> Self {
        let classified = classify::classify(&games, config.close_game_threshold);
        let stats = stats::compute(
            &classified.completed,
            &classified.current,
            &classified.upcoming,
            config.top_n,
        );

        Self {
            games,
            current: classified.current,
            completed: classified.completed,
            upcoming: classified.upcoming,
            close: classified.close,
            upsets: classified.upsets,
            stats,
            created_at,
            source,
            dropped_records,
            anomalies: classified.anomalies,
        }
    }

    pub fn in_progress_count(&self) -> usize {
        self.current.len()
    }

    pub fn close_count(&self) -> usize {
        self.close.len()
    }

    pub fn upset_count(&self) -> usize {
        self.upsets.len()
    }

    pub fn is_upset(&self, game_id: &str) -> bool {
        self.upsets.iter().any(|g| g.id == game_id)
    }
}
