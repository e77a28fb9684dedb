//! Entity printing shared by the commands.

use serde::Serialize;
use streamhub_protocol::{ContentEntity, ContentKind};

/// Printable summary of a content entity.
#[derive(Debug, Serialize)]
pub struct EntityLine {
    /// Content ID.
    pub id: String,
    /// Comment or reply.
    pub kind: &'static str,
    /// Parent content ID for replies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Author ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Whether the entity is publicly visible.
    pub public: bool,
    /// Number of attachments.
    pub attachments: usize,
    /// Body HTML.
    pub body: String,
}

impl From<&ContentEntity> for EntityLine {
    fn from(entity: &ContentEntity) -> Self {
        Self {
            id: entity.id.clone(),
            kind: match entity.kind {
                ContentKind::Comment => "comment",
                ContentKind::Reply => "reply",
            },
            parent_id: entity.parent_id.clone(),
            author: entity.author.as_ref().map(|a| a.id.clone()),
            public: entity.is_public(),
            attachments: entity.attachments.len(),
            body: entity.body.clone().unwrap_or_default(),
        }
    }
}

/// Prints one entity as a text line.
pub fn print_entity_text(line: &EntityLine) {
    let parent = line
        .parent_id
        .as_deref()
        .map(|p| format!(" (reply to {})", p))
        .unwrap_or_default();
    println!(
        "{:>8}  {}{}  [{}]  {}",
        line.id,
        line.kind,
        parent,
        line.author.as_deref().unwrap_or("-"),
        line.body
    );
}
