//! Bootstrap and stream messages.

use crate::content::Author;
use crate::cursor::Cursor;
use crate::error::ProtocolError;
use crate::identity::{CollectionId, CollectionIdentity};
use crate::state::RawState;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Request for the one-time initial synchronization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BootstrapRequest {
    /// Collection to bootstrap.
    pub identity: CollectionIdentity,
}

impl BootstrapRequest {
    /// Creates a bootstrap request.
    pub fn new(identity: CollectionIdentity) -> Self {
        Self { identity }
    }
}

/// Settings block of a bootstrap response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSettings {
    /// Cursor to start streaming from.
    pub event: Cursor,
    /// Resolved collection ID.
    pub collection_id: CollectionId,
    /// Settings this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response to a bootstrap request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapResponse {
    /// Collection settings, including the initial cursor.
    pub collection_settings: CollectionSettings,
    /// Initial page of content, carried through uninterpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_document: Option<Value>,
}

impl BootstrapResponse {
    /// Creates a response with the given initial cursor and collection.
    pub fn new(event: impl Into<Cursor>, collection_id: CollectionId) -> Self {
        Self {
            collection_settings: CollectionSettings {
                event: event.into(),
                collection_id,
                extra: Map::new(),
            },
            head_document: None,
        }
    }
}

/// Long-poll request for events after a cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamRequest {
    /// Collection coordinates.
    #[serde(flatten)]
    pub identity: CollectionIdentity,
    /// Collection ID resolved by bootstrap.
    pub collection_id: CollectionId,
    /// Cursor to read after.
    pub comment_id: Cursor,
}

impl StreamRequest {
    /// Creates a stream request.
    pub fn new(identity: CollectionIdentity, collection_id: CollectionId, cursor: Cursor) -> Self {
        Self {
            identity,
            collection_id,
            comment_id: cursor,
        }
    }

    /// Returns the request options as ordered key/value pairs.
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = vec![
            ("network", self.identity.network.as_str()),
            ("siteId", self.identity.site_id.as_str()),
            ("articleId", self.identity.article_id.as_str()),
        ];
        if let Some(env) = &self.identity.environment {
            pairs.push(("environment", env.as_str()));
        }
        pairs.push(("collectionId", self.collection_id.as_str()));
        pairs.push(("commentId", self.comment_id.as_str()));
        pairs
    }
}

/// Events delivered by a stream response.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamPayload {
    /// Raw states keyed by content ID. Keyed, not sequenced.
    pub states: BTreeMap<String, RawState>,
    /// Author table referenced by the states.
    pub authors: BTreeMap<String, Author>,
    /// Cursor to use for the next request.
    pub max_event_id: Cursor,
}

impl StreamPayload {
    /// Creates a payload with no states.
    pub fn empty(max_event_id: impl Into<Cursor>) -> Self {
        Self {
            states: BTreeMap::new(),
            authors: BTreeMap::new(),
            max_event_id: max_event_id.into(),
        }
    }
}

/// Response to a stream request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireStreamResponse", into = "WireStreamResponse")]
pub enum StreamResponse {
    /// No new events within the server's wait window.
    Timeout,
    /// New events.
    Data(StreamPayload),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireStreamResponse {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    timeout: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    states: Option<BTreeMap<String, RawState>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    authors: BTreeMap<String, Author>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_event_id: Option<Cursor>,
}

impl TryFrom<WireStreamResponse> for StreamResponse {
    type Error = ProtocolError;

    fn try_from(wire: WireStreamResponse) -> Result<Self, Self::Error> {
        if wire.timeout {
            return Ok(StreamResponse::Timeout);
        }
        let max_event_id = wire
            .max_event_id
            .ok_or(ProtocolError::MissingField("maxEventId"))?;
        Ok(StreamResponse::Data(StreamPayload {
            states: wire.states.unwrap_or_default(),
            authors: wire.authors,
            max_event_id,
        }))
    }
}

impl From<StreamResponse> for WireStreamResponse {
    fn from(response: StreamResponse) -> Self {
        match response {
            StreamResponse::Timeout => WireStreamResponse {
                timeout: true,
                ..Default::default()
            },
            StreamResponse::Data(payload) => WireStreamResponse {
                timeout: false,
                states: Some(payload.states),
                authors: payload.authors,
                max_event_id: Some(payload.max_event_id),
            },
        }
    }
}
