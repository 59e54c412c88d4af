use crate::config::PipelineConfig;
use log::{LevelFilter, warn};
use std::str::FromStr;

pub const DEFAULT_REFRESH_MINUTES: u64 = 5;
/// ESPN scoreboard group for the NCAA men's tournament.
pub const DEFAULT_TOURNAMENT_ID: &str = "100";
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;

#[derive(Debug, Clone, Default)]
pub struct CanvasSettings {
    pub token: String,
    pub channel_id: String,
    /// Existing canvas to keep updated; a new one is created when unset or gone.
    pub canvas_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub endpoint: String,
    pub room: String,
    pub username: String,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            endpoint: "ws://127.0.0.1:8787".to_owned(),
            room: "march-madness".to_owned(),
            username: "madness-bot".to_owned(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub pipeline: PipelineConfig,
    pub refresh_interval_minutes: u64,
    pub tournament_id: String,
    /// Skip the provider and publish the embedded seed games.
    pub seed_only: bool,
    pub canvas: CanvasSettings,
    pub chat: ChatSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            refresh_interval_minutes: DEFAULT_REFRESH_MINUTES,
            tournament_id: DEFAULT_TOURNAMENT_ID.to_owned(),
            seed_only: false,
            canvas: CanvasSettings::default(),
            chat: ChatSettings::default(),
        }
    }
}

impl Settings {
    /// `MMCANVAS_LOG`, read on its own so logging is up before the rest of the
    /// settings are parsed. An invalid value is handed back for the caller to report.
    pub fn load_log_level() -> (LevelFilter, Option<String>) {
        let _ = dotenv::dotenv();
        Self::log_level_from(|key| std::env::var(key).ok())
    }

    pub fn log_level_from(lookup: impl Fn(&str) -> Option<String>) -> (LevelFilter, Option<String>) {
        match lookup("MMCANVAS_LOG").map(|v| v.trim().to_owned()).filter(|v| !v.is_empty()) {
            None => (DEFAULT_LOG_LEVEL, None),
            Some(raw) => match raw.parse() {
                Ok(level) => (level, None),
                Err(_) => (DEFAULT_LOG_LEVEL, Some(raw)),
            },
        }
    }

    /// Read settings from the process environment (and `.env`, if present).
    pub fn load() -> Self {
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let pipeline = PipelineConfig {
            close_game_threshold: parse_or(&var, "MMCANVAS_CLOSE_MARGIN", defaults.pipeline.close_game_threshold),
            recent_limit: parse_or(&var, "MMCANVAS_RECENT_LIMIT", defaults.pipeline.recent_limit).max(1),
            upcoming_limit: parse_or(&var, "MMCANVAS_UPCOMING_LIMIT", defaults.pipeline.upcoming_limit).max(1),
            top_n: parse_or(&var, "MMCANVAS_TOP_N", defaults.pipeline.top_n).max(1),
            title: var("MMCANVAS_CANVAS_TITLE").unwrap_or(defaults.pipeline.title),
        };

        Self {
            pipeline,
            refresh_interval_minutes: parse_or(&var, "MMCANVAS_REFRESH_MINUTES", defaults.refresh_interval_minutes)
                .max(1),
            tournament_id: var("MMCANVAS_TOURNAMENT_ID").unwrap_or(defaults.tournament_id),
            seed_only: var("MMCANVAS_SEED_ONLY")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            canvas: CanvasSettings {
                token: var("SLACK_BOT_TOKEN").unwrap_or_default(),
                channel_id: var("MMCANVAS_CHANNEL_ID").unwrap_or_default(),
                canvas_id: var("MMCANVAS_CANVAS_ID"),
            },
            chat: ChatSettings {
                endpoint: var("MMCANVAS_CHAT_WS").unwrap_or(defaults.chat.endpoint),
                room: var("MMCANVAS_CHAT_ROOM").unwrap_or(defaults.chat.room),
                username: var("MMCANVAS_CHAT_USERNAME").unwrap_or(defaults.chat.username),
            },
        }
    }
}

fn parse_or<T: FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match var(key) {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("ignoring invalid {key}={raw}, using default");
            default
        }),
    }
}
