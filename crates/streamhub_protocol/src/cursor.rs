//! Event cursor.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Opaque marker of a position in the remote event log.
///
/// Servers report event ids either as JSON strings or as integers; both
/// decode to the same token. The engine never orders cursors: the value
/// reported by the latest response is always the one used next.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cursor(String);

impl Cursor {
    /// Creates a cursor from its token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Cursor {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<u64> for Cursor {
    fn from(event: u64) -> Self {
        Self(event.to_string())
    }
}

impl Serialize for Cursor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Cursor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CursorVisitor;

        impl Visitor<'_> for CursorVisitor {
            type Value = Cursor;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an event id string or integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Cursor, E> {
                Ok(Cursor::new(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Cursor, E> {
                Ok(Cursor::from(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Cursor, E> {
                Ok(Cursor(v.to_string()))
            }
        }

        deserializer.deserialize_any(CursorVisitor)
    }
}
