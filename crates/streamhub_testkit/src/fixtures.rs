//! Protocol fixtures.
//!
//! Builders for the JSON records a StreamHub server sends, in the shape
//! the default translator understands.

use serde_json::{json, Value};
use streamhub_protocol::{
    BootstrapResponse, CollectionId, CollectionIdentity, Cursor, RawState, StreamPayload,
    StreamResponse,
};

/// The identity used throughout the tests: `n1/s1/a1`.
pub fn test_identity() -> CollectionIdentity {
    CollectionIdentity::new("n1", "s1", "a1")
}

/// A bootstrap response resolving `collection_id` at cursor `event`.
pub fn bootstrap_response(event: &str, collection_id: &str) -> BootstrapResponse {
    BootstrapResponse::new(event, CollectionId::new(collection_id))
}

/// A public top-level comment.
pub fn content_state(id: &str, body: &str) -> RawState {
    RawState::new(json!({
        "vis": 1,
        "type": 0,
        "content": {
            "id": id,
            "bodyHtml": body,
            "authorId": "author-1",
            "createdAt": 1_700_000_000u64,
            "parentId": "",
        }
    }))
}

/// A public reply to `parent_id`.
pub fn reply_state(id: &str, parent_id: &str, body: &str) -> RawState {
    RawState::new(json!({
        "vis": 1,
        "type": 0,
        "content": {
            "id": id,
            "bodyHtml": body,
            "authorId": "author-2",
            "parentId": parent_id,
        }
    }))
}

/// A content record with the given visibility code.
pub fn state_with_visibility(id: &str, vis: u64) -> RawState {
    RawState::new(json!({"vis": vis, "type": 0, "content": {"id": id}}))
}

/// An opinion record, which translates to nothing.
pub fn opine_state(target: &str) -> RawState {
    RawState::new(json!({"vis": 1, "type": 1, "content": {"targetId": target}}))
}

/// A record the translator cannot read.
pub fn malformed_state() -> RawState {
    RawState::new(Value::String("garbage".into()))
}

/// A data response carrying `states` and advancing to `max_event_id`.
pub fn stream_data<'a>(
    states: impl IntoIterator<Item = (&'a str, RawState)>,
    max_event_id: &str,
) -> StreamResponse {
    let mut payload = StreamPayload::empty(Cursor::new(max_event_id));
    payload.states = states
        .into_iter()
        .map(|(id, state)| (id.to_string(), state))
        .collect();
    StreamResponse::Data(payload)
}

/// A data response with no states.
pub fn stream_empty(max_event_id: &str) -> StreamResponse {
    StreamResponse::Data(StreamPayload::empty(Cursor::new(max_event_id)))
}

/// A long-poll timeout response.
pub fn stream_timeout() -> StreamResponse {
    StreamResponse::Timeout
}

/// A stream response in its wire form.
pub fn stream_json(states: Value, max_event_id: &str) -> Value {
    json!({"states": states, "maxEventId": max_event_id})
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_data_keys_states() {
        let response = stream_data(
            [("1", content_state("1", "a")), ("2", content_state("2", "b"))],
            "E1",
        );
        let StreamResponse::Data(payload) = response else {
            panic!("expected data");
        };
        assert_eq!(payload.states.len(), 2);
        assert_eq!(payload.max_event_id, Cursor::new("E1"));
    }

    #[test]
    fn wire_form_decodes() {
        let body = stream_json(json!({"9": content_state("9", "x").as_value()}), "E5");
        let response: StreamResponse = serde_json::from_value(body).unwrap();
        assert!(matches!(response, StreamResponse::Data(p) if p.states.contains_key("9")));
    }
}
