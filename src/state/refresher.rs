use crate::state::messages::{RefreshOutcome, SyncTrigger};
use crate::state::sync::SyncHandle;
use log::{debug, info};
use std::time::Duration;
use tokio::time::interval;

/// Periodic canvas refresh, every `minutes` during the tournament.
pub struct PeriodicRefresher {
    sync: SyncHandle,
    period: Duration,
}

impl PeriodicRefresher {
    pub fn new(sync: SyncHandle, minutes: u64) -> Self {
        Self { sync, period: Duration::from_secs(minutes.max(1) * 60) }
    }

    pub async fn run(self) {
        let mut refresh_interval = interval(self.period);
        // Skip the immediate first tick: bootstrap already ran a cycle.
        refresh_interval.tick().await;

        loop {
            refresh_interval.tick().await;
            match self.sync.request_refresh(SyncTrigger::Scheduled) {
                RefreshOutcome::Queued => debug!("scheduled refresh queued"),
                RefreshOutcome::Coalesced => debug!("scheduled refresh coalesced with a pending one"),
                RefreshOutcome::Stopped => {
                    info!("sync task stopped, periodic refresher exiting");
                    break;
                }
            }
        }
    }
}
