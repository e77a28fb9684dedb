//! Property-based test generators using proptest.

use crate::fixtures::{content_state, malformed_state, opine_state, reply_state};
use proptest::prelude::*;
use std::collections::BTreeMap;
use streamhub_protocol::{Cursor, RawState, StreamPayload, StreamResponse};

/// Strategy for generating cursors, numeric or opaque.
pub fn cursor_strategy() -> impl Strategy<Value = Cursor> {
    prop_oneof![
        any::<u64>().prop_map(Cursor::from),
        "[A-Za-z0-9:_-]{1,16}".prop_map(Cursor::new),
    ]
}

/// Strategy for generating content IDs.
pub fn content_id_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,8}"
}

/// Strategy for generating one raw state record stored under `id`.
///
/// The `bool` is true when the default translator produces an entity.
pub fn state_strategy(id: String) -> impl Strategy<Value = (RawState, bool)> {
    prop_oneof![
        3 => "[a-z ]{0,24}".prop_map({
            let id = id.clone();
            move |body| (content_state(&id, &body), true)
        }),
        1 => Just((reply_state(&id, "parent", "re"), true)),
        1 => Just((opine_state(&id), false)),
        1 => Just((malformed_state(), false)),
    ]
}

/// Strategy for generating a keyed state map.
///
/// Also returns how many records the default translator turns into
/// entities.
pub fn state_map_strategy(
    max_len: usize,
) -> impl Strategy<Value = (BTreeMap<String, RawState>, usize)> {
    prop::collection::btree_set(content_id_strategy(), 0..=max_len)
        .prop_flat_map(|ids| {
            ids.into_iter()
                .map(|id| state_strategy(id.clone()).prop_map(move |state| (id.clone(), state)))
                .collect::<Vec<_>>()
        })
        .prop_map(|records| {
            let produced = records.iter().filter(|(_, (_, produces))| *produces).count();
            let states = records
                .into_iter()
                .map(|(id, (state, _))| (id, state))
                .collect();
            (states, produced)
        })
}

/// Strategy for generating one stream response.
pub fn stream_response_strategy() -> impl Strategy<Value = StreamResponse> {
    prop_oneof![
        1 => Just(StreamResponse::Timeout),
        4 => (state_map_strategy(4), cursor_strategy()).prop_map(|((states, _), cursor)| {
            let mut payload = StreamPayload::empty(cursor);
            payload.states = states;
            StreamResponse::Data(payload)
        }),
    ]
}

/// Strategy for generating a scripted sequence of stream responses.
pub fn stream_script_strategy(max_len: usize) -> impl Strategy<Value = Vec<StreamResponse>> {
    prop::collection::vec(stream_response_strategy(), 1..=max_len)
}

/// An operation on an overflow stash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StashOp {
    /// Stack an item.
    Stack(u32),
    /// Set the release goal.
    SetGoal(usize),
    /// Record an insertion into the owning list.
    Insert,
}

/// Strategy for generating stash operation sequences.
pub fn stash_ops_strategy(max_len: usize) -> impl Strategy<Value = Vec<StashOp>> {
    prop::collection::vec(
        prop_oneof![
            3 => any::<u32>().prop_map(StashOp::Stack),
            1 => (0usize..4).prop_map(StashOp::SetGoal),
            4 => Just(StashOp::Insert),
        ],
        0..=max_len,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn state_maps_respect_max_len((states, produced) in state_map_strategy(6)) {
            prop_assert!(states.len() <= 6);
            prop_assert!(produced <= states.len());
        }

        #[test]
        fn cursors_are_never_empty(cursor in cursor_strategy()) {
            prop_assert!(!cursor.as_str().is_empty());
        }
    }
}
