use crate::config::PipelineConfig;
use crate::render::{self, RenderOptions, Section};
use crate::snapshot::{BatchSource, TournamentSnapshot};
use crate::state::messages::{RefreshOutcome, SyncTrigger};
use crate::state::settings::Settings;
use chrono::Utc;
use log::{debug, error, info, warn};
use madness_api::canvas::CanvasApi;
use madness_api::client::{ApiResult, ScoreboardApi, seed_games};
use madness_api::{RawGameRecord, normalize_batch};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};

// ---------------------------------------------------------------------------
// Collaborator seams
// ---------------------------------------------------------------------------

/// Where raw game records come from.
pub trait GameSource: Send + Sync {
    fn fetch_games(
        &self,
        tournament_id: &str,
    ) -> impl Future<Output = ApiResult<Vec<RawGameRecord>>> + Send;
}

/// Persistent shared document. Only whole-document writes exist.
pub trait DocumentStore: Send + Sync {
    fn exists(&self, document_id: &str) -> impl Future<Output = ApiResult<bool>> + Send;

    fn create(
        &self,
        channel_id: &str,
        title: &str,
        sections: &[Section],
    ) -> impl Future<Output = ApiResult<String>> + Send;

    fn replace(
        &self,
        document_id: &str,
        sections: &[Section],
    ) -> impl Future<Output = ApiResult<()>> + Send;
}

impl GameSource for ScoreboardApi {
    async fn fetch_games(&self, tournament_id: &str) -> ApiResult<Vec<RawGameRecord>> {
        ScoreboardApi::fetch_games(self, tournament_id).await
    }
}

impl DocumentStore for CanvasApi {
    async fn exists(&self, document_id: &str) -> ApiResult<bool> {
        CanvasApi::exists(self, document_id).await
    }

    async fn create(&self, channel_id: &str, title: &str, sections: &[Section]) -> ApiResult<String> {
        let markdown = render::to_markdown(sections);
        CanvasApi::create(self, channel_id, title, &markdown).await
    }

    async fn replace(&self, document_id: &str, sections: &[Section]) -> ApiResult<()> {
        let markdown = render::to_markdown(sections);
        CanvasApi::replace(self, document_id, &markdown).await
    }
}

// ---------------------------------------------------------------------------
// Handle used by other tasks to reach the controller
// ---------------------------------------------------------------------------

pub type CommittedSnapshot = Option<Arc<TournamentSnapshot>>;

#[derive(Debug, Clone)]
pub struct SyncHandle {
    requests: mpsc::Sender<SyncTrigger>,
    committed: watch::Receiver<CommittedSnapshot>,
}

impl SyncHandle {
    pub fn new(
        requests: mpsc::Sender<SyncTrigger>,
        committed: watch::Receiver<CommittedSnapshot>,
    ) -> Self {
        Self { requests, committed }
    }

    /// Ask for a cycle. Never waits: the queue holds one pending trigger and
    /// anything beyond that is folded into it.
    pub fn request_refresh(&self, trigger: SyncTrigger) -> RefreshOutcome {
        match self.requests.try_send(trigger) {
            Ok(()) => RefreshOutcome::Queued,
            Err(TrySendError::Full(_)) => RefreshOutcome::Coalesced,
            Err(TrySendError::Closed(_)) => RefreshOutcome::Stopped,
        }
    }

    /// The last snapshot that was successfully published, if any.
    pub fn latest(&self) -> CommittedSnapshot {
        self.committed.borrow().clone()
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Fetching,
    Processing,
    Publishing,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncPhase::Idle => "idle",
            SyncPhase::Fetching => "fetching",
            SyncPhase::Processing => "processing",
            SyncPhase::Publishing => "publishing",
        };
        f.write_str(name)
    }
}

/// Outcome of one cycle, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub source: BatchSource,
    pub records: usize,
    pub dropped: usize,
    pub published: bool,
}

/// Owns the committed snapshot and runs refresh cycles one at a time.
pub struct SyncController<S, D> {
    source: S,
    store: D,
    pipeline: PipelineConfig,
    render_options: RenderOptions,
    tournament_id: String,
    seed_only: bool,
    channel_id: String,
    configured_document_id: Option<String>,
    /// Set once the document is known to exist.
    document_id: Option<String>,
    last_good: Option<Vec<RawGameRecord>>,
    phase: SyncPhase,
    requests: mpsc::Receiver<SyncTrigger>,
    committed: watch::Sender<CommittedSnapshot>,
}

impl<S: GameSource, D: DocumentStore> SyncController<S, D> {
    pub fn new(source: S, store: D, settings: &Settings) -> (Self, SyncHandle) {
        // Capacity 1: at most one cycle waits behind the running one.
        let (request_tx, request_rx) = mpsc::channel::<SyncTrigger>(1);
        let (committed_tx, committed_rx) = watch::channel::<CommittedSnapshot>(None);

        let controller = Self {
            source,
            store,
            pipeline: settings.pipeline.clone(),
            render_options: RenderOptions::new(&settings.pipeline, settings.refresh_interval_minutes),
            tournament_id: settings.tournament_id.clone(),
            seed_only: settings.seed_only,
            channel_id: settings.canvas.channel_id.clone(),
            configured_document_id: settings.canvas.canvas_id.clone(),
            document_id: None,
            last_good: None,
            phase: SyncPhase::Idle,
            requests: request_rx,
            committed: committed_tx,
        };
        (controller, SyncHandle::new(request_tx, committed_rx))
    }

    /// Bootstrap, then serve triggers until every handle is dropped.
    pub async fn run(mut self) {
        self.bootstrap().await;
        while let Some(trigger) = self.requests.recv().await {
            debug!("sync cycle triggered: {trigger:?}");
            self.run_cycle().await;
        }
        info!("all sync handles dropped, controller exiting");
    }

    /// Make sure the canvas exists, then run the first cycle right away.
    pub async fn bootstrap(&mut self) -> CycleReport {
        if let Err(e) = self.ensure_document().await {
            error!("could not prepare canvas, will retry on publish: {e}");
        }
        self.run_cycle().await
    }

    pub async fn run_cycle(&mut self) -> CycleReport {
        self.enter(SyncPhase::Fetching);
        let (raw, source) = self.fetch_batch().await;

        self.enter(SyncPhase::Processing);
        let batch = normalize_batch(&raw);
        if batch.dropped() > 0 {
            warn!("dropped {} of {} records as malformed", batch.dropped(), raw.len());
            for (id, reason) in &batch.rejected {
                debug!("dropped record {id}: {reason}");
            }
        }
        let dropped = batch.dropped();
        let snapshot =
            TournamentSnapshot::build(batch.records, &self.pipeline, source, dropped, Utc::now());
        let report = CycleReport { source, records: snapshot.games.len(), dropped, published: false };

        self.enter(SyncPhase::Publishing);
        let sections = render::render(&snapshot, &self.render_options);
        debug!(
            "rendered sections: {}",
            sections.iter().map(|s| s.kind.name()).collect::<Vec<_>>().join(", ")
        );

        let report = match self.publish(&sections).await {
            Ok(()) => {
                info!(
                    "canvas updated: {} live, {} final, {} upcoming, {} close, {} upsets ({})",
                    snapshot.current.len(),
                    snapshot.completed.len(),
                    snapshot.upcoming.len(),
                    snapshot.close.len(),
                    snapshot.upsets.len(),
                    source.label()
                );
                self.committed.send_replace(Some(Arc::new(snapshot)));
                CycleReport { published: true, ..report }
            }
            Err(e) => {
                error!("canvas publish failed, keeping previous snapshot: {e}");
                report
            }
        };

        self.enter(SyncPhase::Idle);
        report
    }

    async fn fetch_batch(&mut self) -> (Vec<RawGameRecord>, BatchSource) {
        if self.seed_only {
            return (load_seed_games(), BatchSource::Seed);
        }

        match self.source.fetch_games(&self.tournament_id).await {
            Ok(raw) => {
                debug!("fetched {} records", raw.len());
                self.last_good = Some(raw.clone());
                (raw, BatchSource::Live)
            }
            Err(e) => match &self.last_good {
                Some(raw) => {
                    warn!("fetch failed, reusing last good batch of {} records: {e}", raw.len());
                    (raw.clone(), BatchSource::LastKnownGood)
                }
                None => {
                    warn!("fetch failed and nothing cached, using seed games: {e}");
                    (load_seed_games(), BatchSource::Seed)
                }
            },
        }
    }

    async fn publish(&mut self, sections: &[Section]) -> ApiResult<()> {
        let document_id = self.ensure_document().await?;
        let result = self.store.replace(&document_id, sections).await;
        if let Err(e) = &result
            && e.is_missing_canvas()
        {
            warn!("canvas {document_id} is gone, a new one will be created next cycle");
            self.document_id = None;
            self.configured_document_id = None;
        }
        result
    }

    async fn ensure_document(&mut self) -> ApiResult<String> {
        if let Some(id) = &self.document_id {
            return Ok(id.clone());
        }

        if let Some(id) = &self.configured_document_id {
            if self.store.exists(id).await? {
                debug!("using existing canvas {id}");
                self.document_id = Some(id.clone());
                return Ok(id.clone());
            }
            warn!("configured canvas {id} not found, creating a new one");
        }

        let skeleton = render::skeleton(&self.render_options);
        let id = self
            .store
            .create(&self.channel_id, &self.pipeline.title, &skeleton)
            .await?;
        info!("created canvas {id} in {}; set MMCANVAS_CANVAS_ID={id} to reuse it", self.channel_id);
        self.document_id = Some(id.clone());
        Ok(id)
    }

    fn enter(&mut self, phase: SyncPhase) {
        debug!("sync {} -> {phase}", self.phase);
        self.phase = phase;
    }
}

fn load_seed_games() -> Vec<RawGameRecord> {
    seed_games().unwrap_or_else(|e| {
        error!("seed games unavailable: {e}");
        Vec::new()
    })
}
