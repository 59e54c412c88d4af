use crate::query::{self, Query, TRY_AGAIN};
use crate::state::messages::{RefreshOutcome, SyncTrigger};
use crate::state::settings::ChatSettings;
use crate::state::sync::SyncHandle;
use chrono::{Local, Utc};
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::time::{Duration, sleep};
use tokio_tungstenite::{connect_async, tungstenite::Message};

const RECONNECT_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatWireMessage {
    pub id: String,
    pub room: String,
    pub author: String,
    pub body: String,
    pub timestamp: String,
}

/// Answers tournament questions asked in the chat room.
#[derive(Debug)]
pub struct ChatWorker {
    settings: ChatSettings,
    sync: SyncHandle,
}

impl ChatWorker {
    pub fn new(settings: ChatSettings, sync: SyncHandle) -> Self {
        Self { settings, sync }
    }

    pub async fn run(self) {
        loop {
            match connect_async(self.settings.endpoint.as_str()).await {
                Ok((stream, _)) => {
                    info!("chat connected to {} as {}", self.settings.endpoint, self.settings.username);
                    let (mut write, mut read) = stream.split();

                    while let Some(inbound) = read.next().await {
                        match inbound {
                            Ok(Message::Text(text)) => {
                                let Some(reply) = self.handle_text(&text) else {
                                    continue;
                                };
                                if let Err(e) = send_reply(&mut write, &self.settings, reply).await {
                                    warn!("chat send failed: {e}");
                                    break;
                                }
                            }
                            Ok(Message::Close(_)) => break,
                            Ok(_) => {}
                            Err(e) => {
                                warn!("chat read failed: {e}");
                                break;
                            }
                        }
                    }
                    info!("chat disconnected, reconnecting");
                }
                Err(e) => warn!("chat connect failed: {e}"),
            }
            sleep(RECONNECT_DELAY).await;
        }
    }

    /// Reply text for one inbound frame, if it deserves one.
    fn handle_text(&self, text: &str) -> Option<String> {
        let msg = match serde_json::from_str::<ChatWireMessage>(text) {
            Ok(msg) => msg,
            Err(e) => {
                debug!("ignoring unparseable chat frame: {e}");
                return None;
            }
        };
        if msg.room != self.settings.room || msg.author == self.settings.username {
            return None;
        }

        let query = Query::parse(&msg.body)?;
        debug!("{} asked {query:?}", msg.author);
        Some(self.respond(query))
    }

    fn respond(&self, query: Query) -> String {
        match query {
            Query::RefreshNow => match self.sync.request_refresh(SyncTrigger::RefreshNow) {
                RefreshOutcome::Queued => "Refreshing the canvas now.".to_owned(),
                RefreshOutcome::Coalesced => "A refresh is already on its way.".to_owned(),
                RefreshOutcome::Stopped => TRY_AGAIN.to_owned(),
            },
            other => query::answer(other, self.sync.latest().as_deref()),
        }
    }
}

async fn send_reply<S>(write: &mut S, settings: &ChatSettings, body: String) -> Result<(), String>
where
    S: futures_util::sink::Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    let payload = ChatWireMessage {
        id: format!("{}-{}", settings.username, Utc::now().timestamp_millis()),
        room: settings.room.clone(),
        author: settings.username.clone(),
        body,
        timestamp: Local::now().format("%H:%M").to_string(),
    };
    let text = serde_json::to_string(&payload).map_err(|e| e.to_string())?;
    write
        .send(Message::Text(text.into()))
        .await
        .map_err(|e| e.to_string())
}
