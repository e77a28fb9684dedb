//! Translation of raw state records into content entities.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use streamhub_protocol::{
    Attachment, Author, ContentEntity, ContentKind, Cursor, RawState, StateType, StreamPayload,
    Visibility,
};
use tracing::trace;

/// Converts raw state records into content entities, one record at a time.
///
/// A translator is built for a single response payload and holds no state
/// beyond it. Malformed records produce `None` and never fail the batch.
pub trait StateTranslator {
    /// Translates the record stored under `content_id`.
    fn write(&mut self, content_id: &str, state: &RawState) -> Option<ContentEntity>;
}

/// Builds a fresh translator for each response payload.
pub trait TranslatorFactory: Send + Sync + 'static {
    /// Translator type produced by this factory.
    type Translator: StateTranslator;

    /// Creates a translator for `payload`.
    fn translator(&self, payload: &StreamPayload) -> Self::Translator;
}

/// Options for [`StateToContent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatorOptions {
    /// Produce entities for records that have a parent.
    pub include_replies: bool,
}

impl TranslatorOptions {
    /// Sets whether replies are produced.
    pub fn with_replies(mut self, include_replies: bool) -> Self {
        self.include_replies = include_replies;
        self
    }
}

impl Default for TranslatorOptions {
    fn default() -> Self {
        Self {
            include_replies: true,
        }
    }
}

/// Default translator factory for the JSON state format.
#[derive(Debug, Clone, Default)]
pub struct StateToContent {
    options: TranslatorOptions,
}

impl StateToContent {
    /// Creates a factory with the given options.
    pub fn new(options: TranslatorOptions) -> Self {
        Self { options }
    }
}

impl TranslatorFactory for StateToContent {
    type Translator = StateToContentTranslator;

    fn translator(&self, payload: &StreamPayload) -> StateToContentTranslator {
        StateToContentTranslator {
            authors: payload.authors.clone(),
            options: self.options.clone(),
        }
    }
}

/// Translator for one payload of JSON states.
///
/// Records look like:
///
/// ```json
/// {"vis": 1, "type": 0, "event": 1385,
///  "content": {"id": "9", "bodyHtml": "<p>hi</p>", "authorId": "u1",
///              "createdAt": 1385, "parentId": "", "annotations": {}},
///  "childContent": [{"type": 3, "content": {"oembed": {"type": "photo", "url": "..."}}}]}
/// ```
#[derive(Debug, Clone)]
pub struct StateToContentTranslator {
    authors: BTreeMap<String, Author>,
    options: TranslatorOptions,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireState {
    #[serde(rename = "type", default)]
    kind: u64,
    vis: Option<u64>,
    event: Option<Cursor>,
    content: Option<WireContent>,
    #[serde(default)]
    child_content: Vec<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireContent {
    id: Option<String>,
    body_html: Option<String>,
    author_id: Option<String>,
    created_at: Option<u64>,
    updated_at: Option<u64>,
    parent_id: Option<String>,
    #[serde(default)]
    annotations: Map<String, Value>,
    oembed: Option<WireOembed>,
}

#[derive(Deserialize)]
struct WireOembed {
    #[serde(rename = "type")]
    kind: String,
    url: Option<String>,
    link: Option<String>,
    title: Option<String>,
    provider_name: Option<String>,
    thumbnail_url: Option<String>,
}

impl StateToContentTranslator {
    fn author(&self, author_id: String) -> Author {
        self.authors.get(&author_id).cloned().unwrap_or(Author {
            id: author_id,
            ..Author::default()
        })
    }

    fn absorb_child(entity: &mut ContentEntity, child: &Value) {
        let Ok(child) = WireState::deserialize(child) else {
            trace!(parent = %entity.id, "ignoring malformed child state");
            return;
        };
        let Some(content) = child.content else {
            return;
        };
        match StateType::from_code(child.kind) {
            StateType::Oembed => {
                if let Some(attachment) = content.oembed.and_then(attachment_from) {
                    entity.add_attachment(attachment);
                }
            }
            StateType::Content => {
                if let Some(id) = content.id {
                    entity.add_reply(id);
                }
            }
            _ => {}
        }
    }
}

fn attachment_from(oembed: WireOembed) -> Option<Attachment> {
    let url = oembed.url.or(oembed.link)?;
    Some(Attachment {
        url,
        kind: oembed.kind,
        title: oembed.title,
        provider_name: oembed.provider_name,
        thumbnail_url: oembed.thumbnail_url,
    })
}

impl StateTranslator for StateToContentTranslator {
    fn write(&mut self, content_id: &str, state: &RawState) -> Option<ContentEntity> {
        let wire = match WireState::deserialize(state.as_value()) {
            Ok(wire) => wire,
            Err(err) => {
                trace!(content_id, %err, "dropping malformed state");
                return None;
            }
        };
        if StateType::from_code(wire.kind) != StateType::Content {
            trace!(content_id, kind = wire.kind, "skipping non-content state");
            return None;
        }
        let Some(content) = wire.content else {
            trace!(content_id, "dropping state without content");
            return None;
        };

        let parent_id = content.parent_id.filter(|id| !id.is_empty());
        if parent_id.is_some() && !self.options.include_replies {
            return None;
        }

        let mut entity = ContentEntity::new(content.id.unwrap_or_else(|| content_id.to_string()));
        entity.kind = if parent_id.is_some() {
            ContentKind::Reply
        } else {
            ContentKind::Comment
        };
        entity.body = content.body_html;
        entity.author = content.author_id.map(|id| self.author(id));
        entity.created_at = content.created_at;
        entity.updated_at = content.updated_at;
        entity.visibility = wire.vis.map_or(Visibility::Everyone, Visibility::from_code);
        entity.parent_id = parent_id;
        entity.event = wire.event;

        let mut annotations = content.annotations;
        entity.featured = annotations.remove("featuredmessage");
        entity.annotations = annotations;

        if let Some(attachment) = content.oembed.and_then(attachment_from) {
            entity.add_attachment(attachment);
        }
        for child in &wire.child_content {
            Self::absorb_child(&mut entity, child);
        }

        Some(entity)
    }
}
