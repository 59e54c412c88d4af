//! Tuning values consumed by the classify / stats / render pipeline.

/// Live games within this many points are flagged as close.
pub const DEFAULT_CLOSE_GAME_THRESHOLD: u32 = 5;

/// Default length of the recent, upcoming and top-N lists.
pub const DEFAULT_LIST_LIMIT: usize = 5;

pub const DEFAULT_TITLE: &str = "March Madness Live";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Max point gap for a live game to count as close (inclusive).
    pub close_game_threshold: u32,
    /// How many completed games the canvas lists, most recent first.
    pub recent_limit: usize,
    /// How many scheduled games the canvas lists, soonest first.
    pub upcoming_limit: usize,
    /// Length of the top scoring teams and closest games lists.
    pub top_n: usize,
    /// Canvas heading.
    pub title: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            close_game_threshold: DEFAULT_CLOSE_GAME_THRESHOLD,
            recent_limit: DEFAULT_LIST_LIMIT,
            upcoming_limit: DEFAULT_LIST_LIMIT,
            top_n: DEFAULT_LIST_LIMIT,
            title: DEFAULT_TITLE.to_owned(),
        }
    }
}
