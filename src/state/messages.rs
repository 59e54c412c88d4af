/// Why a sync cycle was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTrigger {
    /// Periodic timer tick.
    Scheduled,
    /// "refresh" asked for in chat.
    RefreshNow,
}

/// What became of a refresh request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Accepted; the sync task will run a cycle for it.
    Queued,
    /// A cycle is already pending, which will pick up the same data.
    Coalesced,
    /// The sync task has shut down.
    Stopped,
}
