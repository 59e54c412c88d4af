//! Loose game record as handed over by a data provider.
//! Every field is optional; `normalize` decides what is acceptable.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGameRecord {
    pub id: Option<String>,
    pub round: Option<i64>,
    pub away: Option<RawParticipant>,
    pub home: Option<RawParticipant>,
    /// "scheduled" | "in_progress" | "final"
    pub status: Option<String>,
    pub period: Option<String>,
    pub clock_minutes: Option<i64>,
    pub clock_seconds: Option<i64>,
    /// RFC 3339
    pub start_time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawParticipant {
    pub team: Option<String>,
    pub seed: Option<i64>,
    pub score: Option<i64>,
}

pub const STATUS_SCHEDULED: &str = "scheduled";
pub const STATUS_IN_PROGRESS: &str = "in_progress";
pub const STATUS_FINAL: &str = "final";
