//! Raw per-identity state records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Record type codes carried in a raw state's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateType {
    /// A piece of content (comment or reply).
    Content,
    /// A like or other opinion on content.
    Opine,
    /// A share of content.
    Share,
    /// An oEmbed attachment targeting content.
    Oembed,
    /// A type this crate does not know.
    Other(u64),
}

impl StateType {
    /// Maps a wire code to a state type.
    pub fn from_code(code: u64) -> Self {
        match code {
            0 => StateType::Content,
            1 => StateType::Opine,
            2 => StateType::Share,
            3 => StateType::Oembed,
            other => StateType::Other(other),
        }
    }

    /// Returns the wire code.
    pub fn code(&self) -> u64 {
        match self {
            StateType::Content => 0,
            StateType::Opine => 1,
            StateType::Share => 2,
            StateType::Oembed => 3,
            StateType::Other(code) => *code,
        }
    }
}

/// An opaque state payload keyed by content id.
///
/// Only the translator interprets the contents; the engine moves records
/// around without looking inside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawState(Value);

impl RawState {
    /// Wraps a JSON value.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Returns the underlying JSON value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Returns the record type, if the record carries one.
    pub fn state_type(&self) -> Option<StateType> {
        self.0
            .get("type")
            .and_then(Value::as_u64)
            .map(StateType::from_code)
    }
}

impl From<Value> for RawState {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn state_type_codes() {
        for code in 0..6 {
            assert_eq!(StateType::from_code(code).code(), code);
        }
        assert_eq!(StateType::from_code(3), StateType::Oembed);
    }

    #[test]
    fn state_type_accessor() {
        assert_eq!(
            RawState::new(json!({"type": 0})).state_type(),
            Some(StateType::Content)
        );
        assert_eq!(RawState::new(json!({"vis": 1})).state_type(), None);
    }
}
