//! Slack canvas client. A canvas is only ever written as a whole: the
//! Web API offers create, existence lookup and a full-content `replace` edit.
use crate::client::{ApiError, ApiResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

const SLACK_API: &str = "https://slack.com/api";

#[derive(Debug, Clone)]
pub struct CanvasApi {
    client: Client,
    token: String,
    timeout: Duration,
    base_url: String,
}

/// Common envelope of every Slack Web API response.
#[derive(Debug, Deserialize, Default)]
struct SlackResponse {
    #[serde(default)]
    ok: bool,
    error: Option<String>,
    canvas_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct DocumentContent<'a> {
    #[serde(rename = "type")]
    content_type: &'static str,
    markdown: &'a str,
}

impl<'a> DocumentContent<'a> {
    fn markdown(markdown: &'a str) -> Self {
        Self { content_type: "markdown", markdown }
    }
}

/// Errors from `files.info` that simply mean "no such canvas".
const MISSING_CANVAS_ERRORS: [&str; 3] = ["file_not_found", "file_deleted", "canvas_not_found"];

impl ApiError {
    /// Slack refused the call because the canvas no longer exists.
    pub fn is_missing_canvas(&self) -> bool {
        matches!(self, ApiError::Rejected { error, .. } if MISSING_CANVAS_ERRORS.contains(&error.as_str()))
    }
}

impl CanvasApi {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .user_agent("mmcanvas/0.1 (tournament canvas sync)")
                .build()
                .unwrap_or_default(),
            token: token.into(),
            timeout: Duration::from_secs(10),
            base_url: SLACK_API.to_owned(),
        }
    }

    /// Point the client at another host, e.g. a mock server.
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), ..Self::new(token) }
    }

    pub async fn exists(&self, canvas_id: &str) -> ApiResult<bool> {
        let url = format!("{}/files.info?file={canvas_id}", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.clone()))?;
        let body = parse_envelope(response, &url).await?;

        match (body.ok, body.error) {
            (true, _) => Ok(true),
            (false, Some(error)) if MISSING_CANVAS_ERRORS.contains(&error.as_str()) => Ok(false),
            (false, error) => Err(ApiError::Rejected {
                method: "files.info".into(),
                error: error.unwrap_or_else(|| "unknown_error".into()),
            }),
        }
    }

    /// Create a channel canvas and return its id.
    pub async fn create(&self, channel_id: &str, title: &str, markdown: &str) -> ApiResult<String> {
        let payload = json!({
            "title": title,
            "channel_id": channel_id,
            "document_content": DocumentContent::markdown(markdown),
        });
        let body = self.post("canvases.create", &payload).await?;
        body.canvas_id
            .ok_or_else(|| ApiError::NotFound("canvases.create returned no canvas_id".into()))
    }

    /// Replace the whole canvas body.
    pub async fn replace(&self, canvas_id: &str, markdown: &str) -> ApiResult<()> {
        let payload = json!({
            "canvas_id": canvas_id,
            "changes": [{
                "operation": "replace",
                "document_content": DocumentContent::markdown(markdown),
            }],
        });
        self.post("canvases.edit", &payload).await.map(|_| ())
    }

    async fn post(&self, method: &str, payload: &serde_json::Value) -> ApiResult<SlackResponse> {
        let url = format!("{}/{method}", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(payload)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.clone()))?;
        let body = parse_envelope(response, &url).await?;

        if body.ok {
            Ok(body)
        } else {
            Err(ApiError::Rejected {
                method: method.to_owned(),
                error: body.error.unwrap_or_else(|| "unknown_error".into()),
            })
        }
    }
}

async fn parse_envelope(response: reqwest::Response, url: &str) -> ApiResult<SlackResponse> {
    let response = response
        .error_for_status()
        .map_err(|e| ApiError::Api(e, url.to_owned()))?;
    response
        .json::<SlackResponse>()
        .await
        .map_err(|e| ApiError::Parsing(e, url.to_owned()))
}
