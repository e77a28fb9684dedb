//! JSON encoding and decoding.

use crate::error::{ProtocolError, ProtocolResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Decodes a message from JSON bytes.
pub fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> ProtocolResult<T> {
    serde_json::from_slice(bytes).map_err(|e| ProtocolError::decoding(e.to_string()))
}

/// Encodes a message as JSON bytes.
pub fn encode_json<T: Serialize>(value: &T) -> ProtocolResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| ProtocolError::encoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cursor;

    #[test]
    fn decode_rejects_garbage() {
        let result: ProtocolResult<Cursor> = decode_json(b"{not json");
        assert!(matches!(result, Err(ProtocolError::DecodingFailed { .. })));
    }

    #[test]
    fn encode_cursor() {
        let bytes = encode_json(&Cursor::new("E5")).unwrap();
        assert_eq!(bytes, b"\"E5\"");
    }
}
