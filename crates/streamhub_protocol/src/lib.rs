//! # StreamHub Protocol
//!
//! Data model and JSON codecs for the StreamHub live feed.
//!
//! This crate provides:
//! - `CollectionIdentity` and `CollectionId`
//! - `Cursor`, the opaque event marker
//! - Bootstrap and stream messages
//! - `RawState` records and the `ContentEntity` they translate into
//! - JSON encoding/decoding
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod codec;
mod content;
mod cursor;
mod error;
mod identity;
mod messages;
mod state;

pub use codec::{decode_json, encode_json};
pub use content::{Attachment, Author, ContentEntity, ContentKind, Visibility};
pub use cursor::Cursor;
pub use error::{ProtocolError, ProtocolResult};
pub use identity::{CollectionId, CollectionIdentity};
pub use messages::{
    BootstrapRequest, BootstrapResponse, CollectionSettings, StreamPayload, StreamRequest,
    StreamResponse,
};
pub use state::{RawState, StateType};
