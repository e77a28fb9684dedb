//! Live feed: the pull-source boundary exposed to consumers.

use crate::buffer::BackpressureBuffer;
use crate::config::FeedConfig;
use crate::error::FeedResult;
use crate::transport::{BootstrapClient, StreamClient};
use crate::translator::{StateToContent, TranslatorFactory};
use crate::updater::CollectionUpdater;
use streamhub_protocol::CollectionIdentity;
use tracing::info;

/// A backpressure buffer fed by a collection updater.
///
/// `read().await` yields `Some(Ok(entity))` for each delivered entity,
/// `Some(Err(error))` once if bootstrap or streaming fails, then `None`.
pub type LiveFeed<B, S, F = StateToContent> = BackpressureBuffer<CollectionUpdater<B, S, F>>;

/// Validates the inputs and builds a live feed with the default translator.
///
/// Nothing is requested until the first `read`.
pub fn open_live_feed<B, S>(
    identity: CollectionIdentity,
    bootstrap_client: B,
    stream_client: S,
    config: &FeedConfig,
) -> FeedResult<LiveFeed<B, S>>
where
    B: BootstrapClient + 'static,
    S: StreamClient + 'static,
{
    let translators = StateToContent::new(config.translator.clone());
    open_live_feed_with(identity, bootstrap_client, stream_client, translators, config)
}

/// Validates the inputs and builds a live feed with a custom translator.
pub fn open_live_feed_with<B, S, F>(
    identity: CollectionIdentity,
    bootstrap_client: B,
    stream_client: S,
    translators: F,
    config: &FeedConfig,
) -> FeedResult<LiveFeed<B, S, F>>
where
    B: BootstrapClient + 'static,
    S: StreamClient + 'static,
    F: TranslatorFactory,
{
    config.validate()?;
    identity.validate()?;
    info!(
        identity = %identity,
        high_water_mark = config.high_water_mark,
        "opening live feed"
    );

    let updater =
        CollectionUpdater::with_translator(identity, bootstrap_client, stream_client, translators)
            .with_timeout_continuation(config.timeout_continuation);
    Ok(BackpressureBuffer::new(updater, config.high_water_mark))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeedError;
    use crate::transport::{MockBootstrapClient, MockStreamClient};

    #[test]
    fn rejects_invalid_inputs() {
        let result = open_live_feed(
            CollectionIdentity::new("", "s1", "a1"),
            MockBootstrapClient::new(),
            MockStreamClient::new(),
            &FeedConfig::default(),
        );
        assert!(matches!(result, Err(FeedError::Protocol(_))));

        let result = open_live_feed(
            CollectionIdentity::new("n1", "s1", "a1"),
            MockBootstrapClient::new(),
            MockStreamClient::new(),
            &FeedConfig::default().with_high_water_mark(0),
        );
        assert!(matches!(result, Err(FeedError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn opening_issues_no_requests() {
        let feed = open_live_feed(
            CollectionIdentity::new("n1", "s1", "a1"),
            MockBootstrapClient::new(),
            MockStreamClient::new(),
            &FeedConfig::default().with_high_water_mark(3),
        )
        .unwrap();
        assert_eq!(feed.high_water_mark(), 3);
        assert_eq!(feed.pending(), 0);
        assert_eq!(feed.producer().stats().bootstraps, 0);
    }
}
