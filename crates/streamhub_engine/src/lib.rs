//! # StreamHub Engine
//!
//! Streaming update engine for StreamHub live feeds.
//!
//! This crate provides:
//! - Collection updater state machine (idle → bootstrapping → streaming → errored)
//! - Cursor tracking across long-poll responses
//! - Raw state to content translation
//! - Backpressure buffer with a consumer-driven refill
//! - Overflow stash and bounded visible list for displaced content
//! - Bootstrap/stream client abstractions, HTTP adapters and scripted mocks
//!
//! ## Architecture
//!
//! A consumer pulls from a [`LiveFeed`]. Whenever fewer entities than the
//! high-water mark are pending, the feed asks the [`CollectionUpdater`]
//! to produce more:
//! 1. The first request bootstraps the collection (collection ID + cursor)
//! 2. Every request after that long-polls the stream from the cursor
//! 3. Each response is translated into content entities and pushed as
//!    one batch
//!
//! ## Key Invariants
//!
//! - The cursor of stream request N is the `maxEventId` of response N-1
//! - Stream steps never overlap
//! - Bootstrap and stream errors are terminal and surfaced exactly once
//! - Entities are delivered in push order, at most once, never dropped

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod buffer;
mod config;
mod error;
mod feed;
mod http;
mod stash;
mod transport;
mod translator;
mod updater;
mod visible;

pub use buffer::{BackpressureBuffer, BufferSink, Producer};
pub use config::FeedConfig;
pub use error::{ClientError, ClientResult, FeedError, FeedResult};
pub use feed::{open_live_feed, open_live_feed_with, LiveFeed};
pub use http::{HttpBootstrapClient, HttpClient, HttpEndpoints, HttpStreamClient};
pub use stash::OverflowStash;
pub use transport::{BootstrapClient, MockBootstrapClient, MockStreamClient, StreamClient};
pub use translator::{
    StateToContent, StateToContentTranslator, StateTranslator, TranslatorFactory,
    TranslatorOptions,
};
pub use updater::{CollectionUpdater, UpdaterState, UpdaterStats};
pub use visible::{ListChange, VisibleList};
