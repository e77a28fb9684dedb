//! Content entities produced by translation.

use crate::cursor::Cursor;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Who may see a piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    /// Hidden from everyone (deleted or rejected).
    None,
    /// Visible to everyone.
    Everyone,
    /// Visible only to its author.
    Owner,
    /// Visible to a moderator group.
    Group,
}

impl Visibility {
    /// Maps a wire `vis` code. Unknown codes are treated as hidden.
    pub fn from_code(code: u64) -> Self {
        match code {
            1 => Visibility::Everyone,
            2 => Visibility::Owner,
            3 => Visibility::Group,
            _ => Visibility::None,
        }
    }

    /// Returns true if the content belongs in a public feed.
    pub fn is_public(&self) -> bool {
        matches!(self, Visibility::Everyone)
    }
}

/// Shape of a content entity, fixed when the entity is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentKind {
    /// Top-level content.
    Comment,
    /// Content with a parent.
    Reply,
}

/// Author of a piece of content.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    /// Author ID.
    #[serde(default)]
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Avatar URL.
    #[serde(default)]
    pub avatar: Option<String>,
    /// Profile URL.
    #[serde(default)]
    pub profile_url: Option<String>,
}

/// An oEmbed attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Resource URL; attachments are unique by URL per entity.
    pub url: String,
    /// oEmbed type (`photo`, `video`, `link`, `rich`).
    pub kind: String,
    /// Title, if given.
    pub title: Option<String>,
    /// Provider name, if given.
    pub provider_name: Option<String>,
    /// Thumbnail URL, if given.
    pub thumbnail_url: Option<String>,
}

/// A piece of content in the live feed.
///
/// Entities are identified by `id`. A later record for the same id
/// updates the existing entity through [`ContentEntity::merge_from`]
/// rather than producing a second one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentEntity {
    /// Content ID.
    pub id: String,
    /// Shape of the entity.
    pub kind: ContentKind,
    /// HTML body, absent when the record carried none.
    pub body: Option<String>,
    /// Author, when the payload's author table resolves it.
    pub author: Option<Author>,
    /// Creation time (seconds since the Unix epoch).
    pub created_at: Option<u64>,
    /// Last update time (seconds since the Unix epoch).
    pub updated_at: Option<u64>,
    /// Visibility.
    pub visibility: Visibility,
    /// Parent content ID for replies.
    pub parent_id: Option<String>,
    /// Attachments.
    pub attachments: Vec<Attachment>,
    /// IDs of replies.
    pub replies: Vec<String>,
    /// Featured annotation value, when featured.
    pub featured: Option<Value>,
    /// Remaining annotations.
    pub annotations: Map<String, Value>,
    /// Event id of the record this entity was last built from.
    pub event: Option<Cursor>,
}

impl ContentEntity {
    /// Creates a public top-level entity without a body.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ContentKind::Comment,
            body: None,
            author: None,
            created_at: None,
            updated_at: None,
            visibility: Visibility::Everyone,
            parent_id: None,
            attachments: Vec::new(),
            replies: Vec::new(),
            featured: None,
            annotations: Map::new(),
            event: None,
        }
    }

    /// Returns true if the entity is featured.
    pub fn is_featured(&self) -> bool {
        self.featured.is_some()
    }

    /// Returns true if the entity belongs in a public feed.
    pub fn is_public(&self) -> bool {
        self.visibility.is_public()
    }

    /// Adds an attachment unless one with the same URL exists.
    ///
    /// Returns true if the attachment was added.
    pub fn add_attachment(&mut self, attachment: Attachment) -> bool {
        if self.attachments.iter().any(|a| a.url == attachment.url) {
            return false;
        }
        self.attachments.push(attachment);
        true
    }

    /// Adds a reply ID unless already present.
    ///
    /// Returns true if the reply was added.
    pub fn add_reply(&mut self, reply_id: impl Into<String>) -> bool {
        let reply_id = reply_id.into();
        if self.replies.contains(&reply_id) {
            return false;
        }
        self.replies.push(reply_id);
        true
    }

    /// Removes a reply ID.
    ///
    /// Returns true if the reply was linked.
    pub fn remove_reply(&mut self, reply_id: &str) -> bool {
        let before = self.replies.len();
        self.replies.retain(|id| id != reply_id);
        self.replies.len() != before
    }

    /// Applies a newer version of the same entity in place.
    ///
    /// Identity, kind and parent linkage stay fixed. Replies and
    /// attachments accumulate. Optional fields the newer version leaves
    /// unset keep their current value; everything else takes the newer
    /// value.
    pub fn merge_from(&mut self, newer: &ContentEntity) {
        debug_assert_eq!(self.id, newer.id);

        if newer.body.is_some() {
            self.body.clone_from(&newer.body);
        }
        if newer.author.is_some() {
            self.author.clone_from(&newer.author);
        }
        if newer.created_at.is_some() {
            self.created_at = newer.created_at;
        }
        self.updated_at = newer.updated_at.or(self.updated_at);
        self.visibility = newer.visibility;
        self.featured.clone_from(&newer.featured);
        self.annotations.clone_from(&newer.annotations);
        if newer.event.is_some() {
            self.event.clone_from(&newer.event);
        }
        for attachment in &newer.attachments {
            self.add_attachment(attachment.clone());
        }
        for reply in &newer.replies {
            self.add_reply(reply.clone());
        }
    }
}
