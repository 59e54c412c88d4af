use crate::espn::{EspnCompetitor, EspnEvent, ScoreboardResponse};
use crate::raw::{RawGameRecord, RawParticipant, STATUS_FINAL, STATUS_IN_PROGRESS, STATUS_SCHEDULED};
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use std::fmt;
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

const ESPN_SITE_V2: &str =
    "https://site.api.espn.com/apis/site/v2/sports/basketball/mens-college-basketball";
const SEED_GAMES_JSON: &str = include_str!("../seed_games.json");

/// Scoreboard client backed by ESPN's public endpoints.
#[derive(Debug, Clone)]
pub struct ScoreboardApi {
    client: Client,
    timeout: Duration,
    base_url: String,
}

impl Default for ScoreboardApi {
    fn default() -> Self {
        Self {
            client: Client::builder()
                .user_agent("mmcanvas/0.1 (tournament canvas sync)")
                .build()
                .unwrap_or_default(),
            timeout: Duration::from_secs(10),
            base_url: ESPN_SITE_V2.to_owned(),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    Network(reqwest::Error, String),
    Api(reqwest::Error, String),
    Parsing(reqwest::Error, String),
    NotFound(String),
    /// The service answered but refused the call (`ok: false`).
    Rejected { method: String, error: String },
    Other(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Api(e, url) => write!(f, "API error for {url}: {e}"),
            ApiError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
            ApiError::NotFound(msg) => write!(f, "Not found: {msg}"),
            ApiError::Rejected { method, error } => write!(f, "{method} rejected: {error}"),
            ApiError::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl ScoreboardApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the client at another host, e.g. a mock server.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), ..Self::default() }
    }

    /// Fetch every game on the scoreboard for a tournament group.
    /// ESPN group 100 is the NCAA men's tournament.
    pub async fn fetch_games(&self, tournament_id: &str) -> ApiResult<Vec<RawGameRecord>> {
        let url = format!("{}/scoreboard?groups={tournament_id}&limit=100", self.base_url);
        let raw: ScoreboardResponse = self.get(&url).await?;
        let games = raw
            .events
            .unwrap_or_default()
            .iter()
            .map(map_event_to_record)
            .collect();
        Ok(games)
    }

    /// Every non-success status is an error: an empty board must never stand
    /// in for a rate-limited or missing one.
    async fn get<T: serde::de::DeserializeOwned>(&self, url: &str) -> ApiResult<T> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.to_owned()))?;

        response
            .error_for_status()
            .map_err(|e| ApiError::Api(e, url.to_owned()))?
            .json::<T>()
            .await
            .map_err(|e| ApiError::Parsing(e, url.to_owned()))
    }
}

/// The fixed demo dataset compiled into the binary. Used when the provider
/// is switched off and as the last-resort fallback.
pub fn seed_games() -> ApiResult<Vec<RawGameRecord>> {
    serde_json::from_str(SEED_GAMES_JSON)
        .map_err(|e| ApiError::Other(format!("invalid embedded seed games json: {e}")))
}

// ---------------------------------------------------------------------------
// Mapping: ESPN wire types → RawGameRecord
// ---------------------------------------------------------------------------

fn map_event_to_record(event: &EspnEvent) -> RawGameRecord {
    let status_name = event
        .status
        .as_ref()
        .and_then(|s| s.status_type.as_ref())
        .and_then(|t| t.name.as_deref())
        .unwrap_or("STATUS_SCHEDULED");
    let status = parse_status(status_name);

    let competition = event.competitions.as_deref().unwrap_or_default().first();
    let competitors = competition
        .and_then(|c| c.competitors.as_deref())
        .unwrap_or_default();

    let round = competition
        .and_then(|c| c.notes.as_deref())
        .unwrap_or_default()
        .iter()
        .filter_map(|n| n.headline.as_deref())
        .find_map(round_from_headline);

    let home = competitors
        .iter()
        .find(|c| c.home_away.as_deref() == Some("home"))
        .or_else(|| competitors.first());
    let away = competitors
        .iter()
        .find(|c| c.home_away.as_deref() == Some("away"))
        .or_else(|| competitors.get(1));

    let (period, clock) = if status == STATUS_IN_PROGRESS {
        let period = event
            .status
            .as_ref()
            .map(|s| period_label(status_name, s.period.unwrap_or(1)));
        let clock = event
            .status
            .as_ref()
            .and_then(|s| s.display_clock.as_deref())
            .and_then(parse_display_clock);
        (period, clock)
    } else {
        (None, None)
    };

    RawGameRecord {
        id: event.id.clone(),
        round,
        away: away.map(map_competitor),
        home: home.map(map_competitor),
        status: Some(status.to_owned()),
        period,
        clock_minutes: clock.map(|(m, _)| m),
        clock_seconds: clock.map(|(_, s)| s),
        start_time: event.date.as_deref().and_then(parse_espn_date),
    }
}

fn map_competitor(c: &EspnCompetitor) -> RawParticipant {
    let team = c.team.as_ref().and_then(|t| {
        t.short_display_name
            .clone()
            .or_else(|| t.display_name.clone())
    });
    RawParticipant {
        team,
        seed: c.curated_rank.as_ref().and_then(|r| r.current).map(i64::from),
        score: c.score.as_deref().and_then(|s| s.trim().parse::<i64>().ok()),
    }
}

fn parse_status(s: &str) -> &'static str {
    match s {
        "STATUS_IN_PROGRESS" | "STATUS_HALFTIME" | "STATUS_END_PERIOD" => STATUS_IN_PROGRESS,
        "STATUS_FINAL" | "STATUS_FINAL_OT" => STATUS_FINAL,
        "STATUS_POSTPONED" | "STATUS_CANCELED" | "STATUS_CANCELLED" | "STATUS_SUSPENDED" => {
            "postponed"
        }
        _ => STATUS_SCHEDULED,
    }
}

fn period_label(status_name: &str, period: u8) -> String {
    if status_name == "STATUS_HALFTIME" {
        return "Half".to_owned();
    }
    match period {
        0 | 1 => "1st".to_owned(),
        2 => "2nd".to_owned(),
        3 => "OT".to_owned(),
        n => format!("{}OT", n - 2),
    }
}

/// "12:34" → (12, 34). Under a minute ESPN switches to tenths: "38.5" → (0, 38).
fn parse_display_clock(clock: &str) -> Option<(i64, i64)> {
    let clock = clock.trim();
    if let Some((minutes, seconds)) = clock.split_once(':') {
        let minutes = minutes.parse::<i64>().ok()?;
        let seconds = seconds.split('.').next()?.parse::<i64>().ok()?;
        return Some((minutes, seconds));
    }
    let seconds = clock.parse::<f64>().ok()?;
    Some((0, seconds.trunc() as i64))
}

/// Round number from a competition note such as
/// "Men's Basketball Championship - East Region - Sweet 16".
fn round_from_headline(headline: &str) -> Option<i64> {
    let h = headline.to_lowercase();
    let round = if h.contains("first four") {
        1
    } else if h.contains("1st round") || h.contains("first round") {
        2
    } else if h.contains("2nd round") || h.contains("second round") {
        3
    } else if h.contains("sweet 16") || h.contains("sweet sixteen") {
        4
    } else if h.contains("elite 8") || h.contains("elite eight") {
        5
    } else if h.contains("final four") {
        6
    } else if h.contains("national championship") {
        7
    } else {
        return None;
    };
    Some(round)
}

/// ESPN dates usually omit seconds ("2024-03-21T16:15Z"); normalize to RFC 3339.
fn parse_espn_date(date: &str) -> Option<String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        return Some(dt.with_timezone(&Utc).to_rfc3339());
    }
    NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%MZ")
        .ok()
        .map(|naive| naive.and_utc().to_rfc3339())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize_batch;

    #[test]
    fn seed_games_parse_and_normalize() {
        let raw = seed_games().expect("seed games should parse");
        assert_eq!(raw.len(), 5);
        let batch = normalize_batch(&raw);
        assert_eq!(batch.dropped(), 0);
        assert_eq!(batch.records.iter().filter(|g| g.is_final()).count(), 2);
        assert_eq!(batch.records.iter().filter(|g| g.is_live()).count(), 1);
        assert_eq!(batch.records.iter().filter(|g| g.is_scheduled()).count(), 2);
    }

    #[test]
    fn status_names_map_to_lifecycle() {
        assert_eq!(parse_status("STATUS_HALFTIME"), STATUS_IN_PROGRESS);
        assert_eq!(parse_status("STATUS_FINAL_OT"), STATUS_FINAL);
        assert_eq!(parse_status("STATUS_SCHEDULED"), STATUS_SCHEDULED);
        assert_eq!(parse_status("STATUS_POSTPONED"), "postponed");
    }

    #[test]
    fn period_labels() {
        assert_eq!(period_label("STATUS_IN_PROGRESS", 1), "1st");
        assert_eq!(period_label("STATUS_IN_PROGRESS", 2), "2nd");
        assert_eq!(period_label("STATUS_IN_PROGRESS", 3), "OT");
        assert_eq!(period_label("STATUS_IN_PROGRESS", 5), "3OT");
        assert_eq!(period_label("STATUS_HALFTIME", 1), "Half");
    }

    #[test]
    fn display_clock_variants() {
        assert_eq!(parse_display_clock("12:34"), Some((12, 34)));
        assert_eq!(parse_display_clock("0:00"), Some((0, 0)));
        assert_eq!(parse_display_clock("38.5"), Some((0, 38)));
        assert_eq!(parse_display_clock("--"), None);
    }

    #[test]
    fn headline_round_detection() {
        let h = "Men's Basketball Championship - South Region - 1st Round";
        assert_eq!(round_from_headline(h), Some(2));
        assert_eq!(round_from_headline("Men's Basketball Championship - Final Four"), Some(6));
        assert_eq!(
            round_from_headline("Men's Basketball Championship - National Championship"),
            Some(7)
        );
        assert_eq!(round_from_headline("Regular season"), None);
    }

    #[test]
    fn espn_dates_without_seconds_parse() {
        assert_eq!(
            parse_espn_date("2024-03-21T16:15Z").as_deref(),
            Some("2024-03-21T16:15:00+00:00")
        );
        assert!(parse_espn_date("not a date").is_none());
    }

    const SCOREBOARD_BODY: &str = r#"{
        "events": [{
            "id": "401638581",
            "name": "NC State Wolfpack at Texas Tech Red Raiders",
            "date": "2024-03-21T21:20Z",
            "status": {
                "period": 2,
                "displayClock": "12:38",
                "type": { "name": "STATUS_IN_PROGRESS", "completed": false }
            },
            "competitions": [{
                "notes": [{ "headline": "Men's Basketball Championship - South Region - 1st Round" }],
                "competitors": [
                    {
                        "id": "2641", "homeAway": "home", "score": "42",
                        "curatedRank": { "current": 7 },
                        "team": { "id": "2641", "displayName": "Texas Tech Red Raiders", "shortDisplayName": "Texas Tech" }
                    },
                    {
                        "id": "152", "homeAway": "away", "score": "45",
                        "curatedRank": { "current": 10 },
                        "team": { "id": "152", "displayName": "NC State Wolfpack", "shortDisplayName": "NC State" }
                    }
                ]
            }]
        }]
    }"#;

    #[tokio::test]
    async fn fetch_games_maps_scoreboard_events() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/scoreboard?groups=100&limit=100")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(SCOREBOARD_BODY)
            .create_async()
            .await;

        let api = ScoreboardApi::with_base_url(server.url());
        let games = api.fetch_games("100").await.expect("fetch should succeed");
        mock.assert_async().await;

        assert_eq!(games.len(), 1);
        let g = &games[0];
        assert_eq!(g.id.as_deref(), Some("401638581"));
        assert_eq!(g.round, Some(2));
        assert_eq!(g.status.as_deref(), Some(STATUS_IN_PROGRESS));
        assert_eq!(g.period.as_deref(), Some("2nd"));
        assert_eq!((g.clock_minutes, g.clock_seconds), (Some(12), Some(38)));
        let away = g.away.as_ref().unwrap();
        assert_eq!(away.team.as_deref(), Some("NC State"));
        assert_eq!((away.seed, away.score), (Some(10), Some(45)));
        assert_eq!(g.home.as_ref().unwrap().team.as_deref(), Some("Texas Tech"));

        let batch = normalize_batch(&games);
        assert_eq!(batch.records.len(), 1);
        assert!(batch.records[0].is_live());
    }

    #[tokio::test]
    async fn server_errors_surface_as_api_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/scoreboard?groups=100&limit=100")
            .with_status(503)
            .create_async()
            .await;

        let api = ScoreboardApi::with_base_url(server.url());
        let err = api.fetch_games("100").await.unwrap_err();
        assert!(matches!(err, ApiError::Api(_, _)), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn client_errors_surface_as_api_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/scoreboard?groups=100&limit=100")
            .with_status(429)
            .create_async()
            .await;
        server
            .mock("GET", "/scoreboard?groups=999&limit=100")
            .with_status(404)
            .create_async()
            .await;

        let api = ScoreboardApi::with_base_url(server.url());
        let err = api.fetch_games("100").await.unwrap_err();
        assert!(matches!(err, ApiError::Api(_, _)), "unexpected error: {err}");
        let err = api.fetch_games("999").await.unwrap_err();
        assert!(matches!(err, ApiError::Api(_, _)), "unexpected error: {err}");
    }
}
