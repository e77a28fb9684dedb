//! Capacity-bounded visible list backed by an overflow stash.

use crate::config::FeedConfig;
use crate::stash::OverflowStash;
use std::collections::VecDeque;
use streamhub_protocol::{ContentEntity, ContentKind};

/// What [`VisibleList::apply`] did with an entity.
#[derive(Debug, Clone, PartialEq)]
pub enum ListChange {
    /// Inserted at the top.
    Inserted {
        /// ID of the entity pushed into the stash, if any.
        displaced: Option<String>,
        /// ID of the stashed entity that re-entered at the bottom, if any.
        released: Option<String>,
    },
    /// An existing entity was updated in place.
    Updated,
    /// The entity became non-public and left the list.
    Removed(ContentEntity),
    /// A reply was linked to its parent.
    Attached {
        /// Parent content ID.
        parent_id: String,
    },
    /// A reply became non-public and was unlinked from its parent.
    Detached {
        /// Parent content ID.
        parent_id: String,
    },
    /// Nothing to do (non-public, or a reply whose parent is not known).
    Ignored,
}

/// Newest-first list of public content with a fixed number of slots.
///
/// This is the consumer-side map from content ID to the entity already
/// handed out, so updates mutate that entity instead of duplicating it.
/// Entities pushed past capacity move to an [`OverflowStash`] and come
/// back one at a time after [`VisibleList::show_more`].
#[derive(Debug, Clone)]
pub struct VisibleList {
    capacity: usize,
    items: VecDeque<ContentEntity>,
    stash: OverflowStash<ContentEntity>,
}

impl VisibleList {
    /// Creates a list with `capacity` slots and the given stash interval.
    pub fn new(capacity: usize, stash_release_interval: usize) -> Self {
        Self {
            capacity,
            items: VecDeque::new(),
            stash: OverflowStash::new(stash_release_interval),
        }
    }

    /// Creates a list with `capacity` slots, releasing stashed entities at
    /// the configured interval.
    pub fn from_config(capacity: usize, config: &FeedConfig) -> Self {
        Self::new(capacity, config.stash_release_interval)
    }

    /// Applies an entity delivered by the feed.
    pub fn apply(&mut self, entity: ContentEntity) -> ListChange {
        if let Some(index) = self.items.iter().position(|e| e.id == entity.id) {
            self.items[index].merge_from(&entity);
            if self.items[index].is_public() {
                return ListChange::Updated;
            }
            return match self.items.remove(index) {
                Some(removed) => ListChange::Removed(removed),
                None => ListChange::Ignored,
            };
        }

        if let Some(stashed) = self.stash.find_mut(|e| e.id == entity.id) {
            stashed.merge_from(&entity);
            if stashed.is_public() {
                return ListChange::Updated;
            }
            return match self.stash.remove_where(|e| e.id == entity.id) {
                Some(removed) => ListChange::Removed(removed),
                None => ListChange::Ignored,
            };
        }

        if !entity.is_public() {
            if entity.kind == ContentKind::Reply {
                return self.detach_reply(&entity);
            }
            return ListChange::Ignored;
        }

        if entity.kind == ContentKind::Reply {
            return self.attach_reply(&entity);
        }

        self.insert(entity)
    }

    fn parent_mut(&mut self, parent_id: &str) -> Option<&mut ContentEntity> {
        self.items
            .iter_mut()
            .find(|e| e.id == parent_id)
            .or_else(|| self.stash.find_mut(|e| e.id == parent_id))
    }

    fn attach_reply(&mut self, reply: &ContentEntity) -> ListChange {
        let Some(parent_id) = reply.parent_id.clone() else {
            return ListChange::Ignored;
        };
        match self.parent_mut(&parent_id) {
            Some(parent) => {
                parent.add_reply(reply.id.clone());
                ListChange::Attached { parent_id }
            }
            None => ListChange::Ignored,
        }
    }

    fn detach_reply(&mut self, reply: &ContentEntity) -> ListChange {
        let Some(parent_id) = reply.parent_id.clone() else {
            return ListChange::Ignored;
        };
        let unlinked = self
            .parent_mut(&parent_id)
            .is_some_and(|parent| parent.remove_reply(&reply.id));
        if unlinked {
            ListChange::Detached { parent_id }
        } else {
            ListChange::Ignored
        }
    }

    fn insert(&mut self, entity: ContentEntity) -> ListChange {
        self.items.push_front(entity);

        let mut displaced = None;
        if self.items.len() > self.capacity {
            if let Some(oldest) = self.items.pop_back() {
                displaced = Some(oldest.id.clone());
                self.stash.stack(oldest);
            }
        }

        let released = self.stash.record_insert().map(|entity| {
            let id = entity.id.clone();
            self.items.push_back(entity);
            self.capacity += 1;
            id
        });

        ListChange::Inserted {
            displaced,
            released,
        }
    }

    /// Allows up to `count` stashed entities to come back.
    pub fn show_more(&mut self, count: usize) {
        self.stash.set_goal(count);
    }

    /// Returns the entity with `id`, if visible.
    pub fn get(&self, id: &str) -> Option<&ContentEntity> {
        self.items.iter().find(|e| e.id == id)
    }

    /// Iterates visible entities, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &ContentEntity> {
        self.items.iter()
    }

    /// Returns the number of visible entities.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if nothing is visible.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the current number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of stashed entities.
    pub fn stashed(&self) -> usize {
        self.stash.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamhub_protocol::Visibility;

    fn entity(id: &str) -> ContentEntity {
        ContentEntity::new(id)
    }

    fn ids(list: &VisibleList) -> Vec<&str> {
        list.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn displaces_oldest_into_stash() {
        let mut list = VisibleList::new(2, 100);
        list.apply(entity("1"));
        list.apply(entity("2"));
        let change = list.apply(entity("3"));

        assert_eq!(
            change,
            ListChange::Inserted {
                displaced: Some("1".into()),
                released: None
            }
        );
        assert_eq!(ids(&list), vec!["3", "2"]);
        assert_eq!(list.stashed(), 1);
    }

    #[test]
    fn show_more_releases_on_cadence() {
        let mut list = VisibleList::new(1, 2);
        list.apply(entity("1"));
        list.apply(entity("2"));
        list.apply(entity("3"));
        assert_eq!(list.stashed(), 2);

        // The interval completes on the next insertion; the most recently
        // displaced entity comes back first and gets its own slot.
        list.show_more(1);
        let change = list.apply(entity("4"));
        assert_eq!(
            change,
            ListChange::Inserted {
                displaced: Some("3".into()),
                released: Some("3".into())
            }
        );
        assert_eq!(ids(&list), vec!["4", "3"]);
        assert_eq!(list.capacity(), 2);

        // Goal spent: nothing else comes back.
        list.apply(entity("5"));
        list.apply(entity("6"));
        assert_eq!(ids(&list), vec!["6", "5"]);
        assert_eq!(list.stashed(), 4);
    }

    #[test]
    fn updates_in_place_and_removes_hidden() {
        let mut list = VisibleList::new(5, 5);
        list.apply(entity("1"));

        let mut edited = entity("1");
        edited.body = Some("edited".into());
        assert_eq!(list.apply(edited), ListChange::Updated);
        assert_eq!(list.len(), 1);
        assert_eq!(list.get("1").and_then(|e| e.body.as_deref()), Some("edited"));

        let mut hidden = entity("1");
        hidden.visibility = Visibility::None;
        match list.apply(hidden) {
            ListChange::Removed(removed) => {
                assert_eq!(removed.body.as_deref(), Some("edited"))
            }
            other => panic!("unexpected change {other:?}"),
        }
        assert!(list.is_empty());
    }

    #[test]
    fn ignores_unknown_hidden_content() {
        let mut list = VisibleList::new(5, 5);
        let mut hidden = entity("1");
        hidden.visibility = Visibility::Owner;
        assert_eq!(list.apply(hidden), ListChange::Ignored);
    }

    #[test]
    fn links_replies_to_parents() {
        let mut list = VisibleList::new(5, 5);
        list.apply(entity("1"));

        let mut reply = entity("2");
        reply.kind = ContentKind::Reply;
        reply.parent_id = Some("1".into());
        assert_eq!(
            list.apply(reply.clone()),
            ListChange::Attached {
                parent_id: "1".into()
            }
        );
        assert_eq!(
            list.get("1").map(|e| e.replies.clone()),
            Some(vec!["2".to_string()])
        );

        reply.id = "3".into();
        reply.parent_id = Some("missing".into());
        assert_eq!(list.apply(reply), ListChange::Ignored);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn hidden_reply_is_unlinked_from_parent() {
        let mut list = VisibleList::new(5, 5);
        list.apply(entity("p"));

        let mut reply = entity("r");
        reply.kind = ContentKind::Reply;
        reply.parent_id = Some("p".into());
        list.apply(reply.clone());

        reply.visibility = Visibility::None;
        assert_eq!(
            list.apply(reply.clone()),
            ListChange::Detached {
                parent_id: "p".into()
            }
        );
        assert_eq!(list.get("p").map(|e| e.replies.len()), Some(0));

        // Already unlinked.
        assert_eq!(list.apply(reply), ListChange::Ignored);
    }

    #[test]
    fn hidden_reply_is_unlinked_from_stashed_parent() {
        let mut list = VisibleList::new(1, 100);
        list.apply(entity("p"));

        let mut reply = entity("r");
        reply.kind = ContentKind::Reply;
        reply.parent_id = Some("p".into());
        list.apply(reply.clone());
        list.apply(entity("q"));
        assert_eq!(list.stashed(), 1);

        reply.visibility = Visibility::Owner;
        assert_eq!(
            list.apply(reply),
            ListChange::Detached {
                parent_id: "p".into()
            }
        );
    }

    #[test]
    fn release_interval_comes_from_config() {
        let config = FeedConfig::default().with_stash_release_interval(1);
        let mut list = VisibleList::from_config(1, &config);
        list.apply(entity("1"));
        list.apply(entity("2"));
        list.show_more(1);

        // Interval 1: the very next insertion releases.
        let change = list.apply(entity("3"));
        assert_eq!(
            change,
            ListChange::Inserted {
                displaced: Some("2".into()),
                released: Some("2".into())
            }
        );
    }
}
