mod classify;
mod config;
mod query;
mod render;
mod snapshot;
mod state;
mod stats;

use crate::state::chat::ChatWorker;
use crate::state::refresher::PeriodicRefresher;
use crate::state::settings::Settings;
use crate::state::sync::SyncController;
use log::{LevelFilter, info, warn};
use madness_api::canvas::CanvasApi;
use madness_api::client::ScoreboardApi;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunMode {
    Service,
    Once,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Some(mode) = handle_cli_args() else {
        return Ok(());
    };

    better_panic::install();

    // Logging is installed before the rest of the settings are parsed.
    let (level, invalid_level) = Settings::load_log_level();
    init_logging(level);
    if let Some(raw) = invalid_level {
        warn!("ignoring invalid MMCANVAS_LOG={raw}, using default");
    }
    let settings = Settings::load();

    if settings.canvas.token.is_empty() || settings.canvas.channel_id.is_empty() {
        anyhow::bail!("SLACK_BOT_TOKEN and MMCANVAS_CHANNEL_ID must be set\n\n{}", usage_text());
    }
    if settings.seed_only {
        warn!("seed-only mode: publishing embedded demo games, provider disabled");
    }

    let source = ScoreboardApi::new();
    let store = CanvasApi::new(settings.canvas.token.clone());
    let (mut controller, sync) = SyncController::new(source, store, &settings);

    if mode == RunMode::Once {
        let report = controller.bootstrap().await;
        info!(
            "single cycle done: {} records from {}, {} dropped",
            report.records,
            report.source.label(),
            report.dropped
        );
        if !report.published {
            anyhow::bail!("canvas publish failed");
        }
        return Ok(());
    }

    // Sync thread: owns the snapshot and the only write path to the canvas
    let sync_task = tokio::spawn(controller.run());

    // Periodic refresh thread
    let refresher = PeriodicRefresher::new(sync.clone(), settings.refresh_interval_minutes);
    let refresh_task = tokio::spawn(refresher.run());

    // Chat thread
    let chat_worker = ChatWorker::new(settings.chat.clone(), sync);
    let chat_task = tokio::spawn(chat_worker.run());

    info!(
        "mmcanvas running: refresh every {} min, chat room {}",
        settings.refresh_interval_minutes, settings.chat.room
    );
    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    chat_task.abort();
    refresh_task.abort();
    sync_task.abort();

    Ok(())
}

/// `RUST_LOG` wins over `MMCANVAS_LOG` when both are set.
fn init_logging(level: LevelFilter) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn handle_cli_args() -> Option<RunMode> {
    let mut args = std::env::args().skip(1);
    let Some(arg) = args.next() else {
        return Some(RunMode::Service);
    };

    match arg.as_str() {
        "-h" | "--help" => {
            println!("{}", usage_text());
            None
        }
        "-V" | "--version" => {
            println!("mmcanvas {}", env!("CARGO_PKG_VERSION"));
            None
        }
        "--once" => Some(RunMode::Once),
        _ => {
            eprintln!("Unknown argument: {arg}\n\n{}", usage_text());
            std::process::exit(2);
        }
    }
}

fn usage_text() -> &'static str {
    "mmcanvas - NCAA March Madness live Slack canvas

Usage:
  mmcanvas            run the refresh service until Ctrl-C
  mmcanvas --once     create or refresh the canvas once and exit
  mmcanvas --help
  mmcanvas --version

Environment (also read from .env):
  SLACK_BOT_TOKEN           Slack bot token (required)
  MMCANVAS_CHANNEL_ID       Channel the canvas lives in (required)
  MMCANVAS_CANVAS_ID        Existing canvas to keep updated
  MMCANVAS_CANVAS_TITLE     Title for a newly created canvas
  MMCANVAS_REFRESH_MINUTES  Refresh interval (default 5)
  MMCANVAS_CLOSE_MARGIN     Close-game point margin (default 5)
  MMCANVAS_RECENT_LIMIT     Recently completed games shown (default 5)
  MMCANVAS_UPCOMING_LIMIT   Upcoming games shown (default 5)
  MMCANVAS_TOP_N            Rows in statistics tables (default 5)
  MMCANVAS_TOURNAMENT_ID    ESPN scoreboard group (default 100)
  MMCANVAS_SEED_ONLY        Publish the embedded demo games instead of live data
  MMCANVAS_CHAT_WS          WebSocket chat relay URL (default ws://127.0.0.1:8787)
  MMCANVAS_CHAT_ROOM        Chat room name (default march-madness)
  MMCANVAS_CHAT_USERNAME    Bot name in chat (default madness-bot)
  MMCANVAS_LOG              Log level (default info); RUST_LOG overrides"
}
