//! Replay command implementation.
//!
//! A session file records one feed's traffic:
//!
//! ```json
//! {
//!   "identity": {"network": "n1", "siteId": "s1", "articleId": "a1"},
//!   "bootstrap": {"collectionSettings": {"event": "E0", "collectionId": "C1"}},
//!   "stream": [
//!     {"timeout": true},
//!     {"states": {"9": {"vis": 1, "content": {"id": "9"}}}, "maxEventId": "E5"},
//!     {"error": "connection reset"}
//!   ]
//! }
//! ```

use crate::output::{print_entity_text, EntityLine};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use streamhub_engine::{
    open_live_feed, ClientError, FeedConfig, MockBootstrapClient, MockStreamClient,
    TranslatorOptions, VisibleList,
};
use streamhub_protocol::{BootstrapResponse, CollectionIdentity, StreamResponse};
use tracing::info;

/// A recorded feed session.
#[derive(Debug, Deserialize)]
pub struct Session {
    /// Collection the session was recorded for.
    pub identity: CollectionIdentity,
    /// Bootstrap outcome.
    pub bootstrap: Recorded<BootstrapResponse>,
    /// Stream outcomes, in request order.
    #[serde(default)]
    pub stream: Vec<Recorded<StreamResponse>>,
}

/// One recorded request outcome.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Recorded<T> {
    /// The request failed with this message.
    Failure {
        /// Error message.
        error: String,
    },
    /// The request succeeded.
    Response(T),
}

/// Replay options.
#[derive(Debug, Clone)]
pub struct ReplayOptions {
    /// Stop after this many entities.
    pub limit: Option<usize>,
    /// Feed high-water mark.
    pub high_water_mark: usize,
    /// Deliver replies.
    pub include_replies: bool,
    /// Apply delivered entities to a visible list with this many slots.
    pub visible: Option<usize>,
    /// Insertions between two stash releases of the visible list.
    pub stash_release_interval: usize,
}

impl ReplayOptions {
    fn config(&self) -> FeedConfig {
        FeedConfig::default()
            .with_high_water_mark(self.high_water_mark)
            .with_stash_release_interval(self.stash_release_interval)
            .with_translator(TranslatorOptions::default().with_replies(self.include_replies))
    }
}

impl Default for ReplayOptions {
    fn default() -> Self {
        let config = FeedConfig::default();
        Self {
            limit: None,
            high_water_mark: config.high_water_mark,
            include_replies: true,
            visible: None,
            stash_release_interval: config.stash_release_interval,
        }
    }
}

/// Replay result.
#[derive(Debug, Serialize)]
pub struct ReplayReport {
    /// Delivered entities, in delivery order.
    pub entities: Vec<EntityLine>,
    /// Terminal error, if the feed stopped on a recorded failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// True if the feed asked for more than the session recorded.
    pub end_of_session: bool,
    /// IDs left in the visible list, newest first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<Vec<String>>,
    /// Stream requests issued.
    pub stream_requests: u64,
    /// Long-poll timeouts seen.
    pub timeouts: u64,
    /// Cursor the next stream request would use.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// Runs the replay command.
pub fn run(
    path: &Path,
    options: &ReplayOptions,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = load_session(path)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let report = runtime.block_on(replay(session, options))?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => print_text_output(&report),
    }

    Ok(())
}

/// Reads a session file.
pub fn load_session(path: &Path) -> Result<Session, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)
        .map_err(|e| format!("Cannot read session file {:?}: {}", path, e))?;
    Ok(streamhub_protocol::decode_json(&bytes)?)
}

/// Serves `session` through the scripted clients and collects what the
/// feed delivers.
pub async fn replay(
    session: Session,
    options: &ReplayOptions,
) -> Result<ReplayReport, Box<dyn std::error::Error>> {
    let bootstrap = MockBootstrapClient::new();
    match session.bootstrap {
        Recorded::Response(response) => bootstrap.push_response(response),
        Recorded::Failure { error } => bootstrap.push_error(ClientError::Server(error)),
    }

    let recorded_responses = session.stream.len();
    let stream = Arc::new(MockStreamClient::new());
    for recorded in session.stream {
        match recorded {
            Recorded::Response(response) => stream.push_response(response),
            Recorded::Failure { error } => stream.push_error(ClientError::Server(error)),
        }
    }
    info!(
        identity = %session.identity,
        responses = stream.remaining(),
        "replaying session"
    );

    let config = options.config();
    let mut feed = open_live_feed(session.identity, bootstrap, Arc::clone(&stream), &config)?;
    let mut list = options
        .visible
        .map(|capacity| VisibleList::from_config(capacity, &config));

    let mut entities = Vec::new();
    let mut error = None;
    let mut end_of_session = false;
    while options.limit.map_or(true, |limit| entities.len() < limit) {
        match feed.read().await {
            Some(Ok(entity)) => {
                entities.push(EntityLine::from(&entity));
                if let Some(list) = list.as_mut() {
                    list.apply(entity);
                }
            }
            // The scripted client fails any request past the recording.
            Some(Err(_)) if stream.request_count() > recorded_responses => {
                end_of_session = true;
                break;
            }
            Some(Err(err)) => {
                error = Some(err.to_string());
                break;
            }
            None => break,
        }
    }
    feed.close();

    let stats = feed.producer().stats();
    Ok(ReplayReport {
        entities,
        error,
        end_of_session,
        visible: list.map(|list| list.iter().map(|e| e.id.clone()).collect()),
        stream_requests: stats.stream_requests,
        timeouts: stats.timeouts,
        cursor: feed.producer().cursor().map(|c| c.as_str().to_string()),
    })
}

fn print_text_output(report: &ReplayReport) {
    for line in &report.entities {
        print_entity_text(line);
    }
    println!();
    println!(
        "{} entities, {} stream requests, {} timeouts",
        report.entities.len(),
        report.stream_requests,
        report.timeouts
    );
    if let Some(cursor) = &report.cursor {
        println!("cursor: {}", cursor);
    }
    if let Some(visible) = &report.visible {
        println!("visible: {}", visible.join(", "));
    }
    if let Some(error) = &report.error {
        println!("feed stopped: {}", error);
    } else if report.end_of_session {
        println!("end of recorded session");
    }
}
