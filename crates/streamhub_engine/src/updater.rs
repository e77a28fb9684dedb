//! Collection updater state machine.

use crate::buffer::{BufferSink, Producer};
use crate::error::{FeedError, FeedResult};
use crate::transport::{BootstrapClient, StreamClient};
use crate::translator::{StateToContent, StateTranslator, TranslatorFactory};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use streamhub_protocol::{
    BootstrapRequest, CollectionId, CollectionIdentity, ContentEntity, Cursor, StreamPayload,
    StreamRequest, StreamResponse,
};
use tracing::{debug, info, warn};

/// The current state of a collection updater.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdaterState {
    /// Nothing requested yet.
    Idle,
    /// Bootstrap request in flight.
    BootstrappingInit,
    /// Bootstrapped; long-polling the stream.
    Streaming,
    /// A request failed. Terminal.
    Errored,
}

impl UpdaterState {
    /// Returns true if the updater will never request again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, UpdaterState::Errored)
    }
}

/// Statistics about updater activity.
#[derive(Debug, Clone, Default)]
pub struct UpdaterStats {
    /// Bootstrap requests issued.
    pub bootstraps: u64,
    /// Stream requests issued.
    pub stream_requests: u64,
    /// Long-poll timeouts received.
    pub timeouts: u64,
    /// Successful responses that produced no entities.
    pub empty_batches: u64,
    /// Entities pushed to the buffer.
    pub entities_produced: u64,
    /// Time of the last response of any kind.
    pub last_response_time: Option<Instant>,
    /// Last error message.
    pub last_error: Option<String>,
}

/// Where the stream currently stands.
#[derive(Debug, Clone)]
struct StreamPosition {
    collection_id: CollectionId,
    cursor: Cursor,
}

/// Bootstraps a collection, then long-polls its stream.
///
/// The updater owns the cursor. Every stream request uses the cursor
/// returned by the previous response (the bootstrap cursor for the first
/// one), and stream steps never overlap, so the cursor only moves forward
/// along the server's event log.
pub struct CollectionUpdater<B, S, F = StateToContent>
where
    B: BootstrapClient,
    S: StreamClient,
    F: TranslatorFactory,
{
    identity: CollectionIdentity,
    bootstrap_client: B,
    stream_client: S,
    translators: F,
    timeout_continuation: Duration,
    state: RwLock<UpdaterState>,
    position: RwLock<Option<StreamPosition>>,
    stepping: AtomicBool,
    stats: RwLock<UpdaterStats>,
}

impl<B, S> CollectionUpdater<B, S, StateToContent>
where
    B: BootstrapClient,
    S: StreamClient,
{
    /// Creates an updater with the default translator.
    pub fn new(identity: CollectionIdentity, bootstrap_client: B, stream_client: S) -> Self {
        Self::with_translator(
            identity,
            bootstrap_client,
            stream_client,
            StateToContent::default(),
        )
    }
}

impl<B, S, F> CollectionUpdater<B, S, F>
where
    B: BootstrapClient,
    S: StreamClient,
    F: TranslatorFactory,
{
    /// Creates an updater with a custom translator factory.
    pub fn with_translator(
        identity: CollectionIdentity,
        bootstrap_client: B,
        stream_client: S,
        translators: F,
    ) -> Self {
        Self {
            identity,
            bootstrap_client,
            stream_client,
            translators,
            timeout_continuation: Duration::ZERO,
            state: RwLock::new(UpdaterState::Idle),
            position: RwLock::new(None),
            stepping: AtomicBool::new(false),
            stats: RwLock::new(UpdaterStats::default()),
        }
    }

    /// Sets the pause taken after a long-poll timeout.
    pub fn with_timeout_continuation(mut self, pause: Duration) -> Self {
        self.timeout_continuation = pause;
        self
    }

    /// Returns the collection identity.
    pub fn identity(&self) -> &CollectionIdentity {
        &self.identity
    }

    /// Gets the current state.
    pub fn state(&self) -> UpdaterState {
        *self.state.read()
    }

    /// Gets the current stats.
    pub fn stats(&self) -> UpdaterStats {
        self.stats.read().clone()
    }

    /// Returns the cursor the next stream request will use.
    pub fn cursor(&self) -> Option<Cursor> {
        self.position.read().as_ref().map(|p| p.cursor.clone())
    }

    /// Returns the collection ID resolved by bootstrap.
    pub fn collection_id(&self) -> Option<CollectionId> {
        self.position
            .read()
            .as_ref()
            .map(|p| p.collection_id.clone())
    }

    fn set_state(&self, state: UpdaterState) {
        *self.state.write() = state;
    }

    /// Pull entry point, invoked by the buffer's refill logic.
    ///
    /// The first call bootstraps and then performs one stream step; later
    /// calls perform one stream step each. A call made while a bootstrap
    /// or a stream step is already in flight does nothing. Once an error
    /// has been returned, every later call does nothing.
    pub async fn read(&self, sink: &BufferSink<ContentEntity>) -> FeedResult<()> {
        match self.state() {
            UpdaterState::Idle => {
                self.bootstrap().await?;
                self.stream(sink).await
            }
            UpdaterState::BootstrappingInit => {
                debug!(identity = %self.identity, "bootstrap already in flight");
                Ok(())
            }
            UpdaterState::Streaming => self.stream(sink).await,
            UpdaterState::Errored => {
                debug!(identity = %self.identity, "updater errored, ignoring read");
                Ok(())
            }
        }
    }

    async fn bootstrap(&self) -> FeedResult<()> {
        let attempt = BootstrapAttempt::begin(&self.state);
        self.stats.write().bootstraps += 1;

        let request = BootstrapRequest::new(self.identity.clone());
        let result = self.bootstrap_client.get_content(&request).await;
        self.stats.write().last_response_time = Some(Instant::now());

        match result {
            Ok(response) => {
                let settings = response.collection_settings;
                info!(
                    identity = %self.identity,
                    collection_id = %settings.collection_id,
                    cursor = %settings.event,
                    "bootstrapped collection"
                );
                *self.position.write() = Some(StreamPosition {
                    collection_id: settings.collection_id,
                    cursor: settings.event,
                });
                attempt.settle(UpdaterState::Streaming);
                Ok(())
            }
            Err(source) => {
                warn!(identity = %self.identity, error = %source, "bootstrap failed");
                self.stats.write().last_error = Some(source.to_string());
                attempt.settle(UpdaterState::Errored);
                Err(FeedError::Bootstrap { source })
            }
        }
    }

    /// Performs stream requests until one yields entities or fails.
    ///
    /// A timeout re-polls with the same cursor after a deferred
    /// continuation; an empty batch re-polls immediately with the new one.
    async fn stream(&self, sink: &BufferSink<ContentEntity>) -> FeedResult<()> {
        let Some(_step) = StepGuard::acquire(&self.stepping) else {
            debug!(identity = %self.identity, "stream step already in flight");
            return Ok(());
        };

        loop {
            let Some(position) = self.position.read().clone() else {
                return Ok(());
            };
            let request = StreamRequest::new(
                self.identity.clone(),
                position.collection_id,
                position.cursor,
            );
            debug!(
                collection_id = %request.collection_id,
                cursor = %request.comment_id,
                "stream request"
            );
            self.stats.write().stream_requests += 1;

            let result = self.stream_client.get_content(&request).await;
            self.stats.write().last_response_time = Some(Instant::now());

            match result {
                Err(source) => {
                    warn!(identity = %self.identity, error = %source, "stream request failed");
                    self.stats.write().last_error = Some(source.to_string());
                    self.set_state(UpdaterState::Errored);
                    return Err(FeedError::Stream { source });
                }
                Ok(StreamResponse::Timeout) => {
                    debug!(cursor = %request.comment_id, "long-poll timeout");
                    self.stats.write().timeouts += 1;
                    self.defer().await;
                }
                Ok(StreamResponse::Data(payload)) => {
                    let batch = self.translate(&payload);
                    self.advance(payload.max_event_id);

                    let produced = batch.len();
                    sink.push(batch);
                    let mut stats = self.stats.write();
                    if produced == 0 {
                        stats.empty_batches += 1;
                        continue;
                    }
                    stats.entities_produced += produced as u64;
                    return Ok(());
                }
            }
        }
    }

    fn translate(&self, payload: &StreamPayload) -> Vec<ContentEntity> {
        let mut translator = self.translators.translator(payload);
        payload
            .states
            .iter()
            .filter_map(|(id, state)| translator.write(id, state))
            .collect()
    }

    /// Moves the cursor to the response's reported maximum.
    ///
    /// The server's value is authoritative and is never compared against
    /// the previous cursor.
    fn advance(&self, cursor: Cursor) {
        if let Some(position) = self.position.write().as_mut() {
            position.cursor = cursor;
        }
    }

    async fn defer(&self) {
        if self.timeout_continuation.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.timeout_continuation).await;
        }
    }
}

#[async_trait]
impl<B, S, F> Producer for CollectionUpdater<B, S, F>
where
    B: BootstrapClient + 'static,
    S: StreamClient + 'static,
    F: TranslatorFactory,
{
    type Item = ContentEntity;
    type Error = FeedError;

    async fn produce(&self, sink: &BufferSink<ContentEntity>) -> FeedResult<()> {
        self.read(sink).await
    }

    fn is_exhausted(&self) -> bool {
        self.state().is_terminal()
    }
}

/// Marks a bootstrap in flight; an attempt dropped before it settles
/// (its future was cancelled) puts the updater back to `Idle`.
struct BootstrapAttempt<'a> {
    state: &'a RwLock<UpdaterState>,
    settled: bool,
}

impl<'a> BootstrapAttempt<'a> {
    fn begin(state: &'a RwLock<UpdaterState>) -> Self {
        *state.write() = UpdaterState::BootstrappingInit;
        Self {
            state,
            settled: false,
        }
    }

    fn settle(mut self, outcome: UpdaterState) {
        *self.state.write() = outcome;
        self.settled = true;
    }
}

impl Drop for BootstrapAttempt<'_> {
    fn drop(&mut self) {
        if !self.settled {
            let mut state = self.state.write();
            if *state == UpdaterState::BootstrappingInit {
                *state = UpdaterState::Idle;
            }
        }
    }
}

/// Serializes stream steps.
struct StepGuard<'a>(&'a AtomicBool);

impl<'a> StepGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for StepGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::transport::{MockBootstrapClient, MockStreamClient};
    use serde_json::json;
    use std::future::Future;
    use std::sync::Arc;
    use std::task::Poll;
    use streamhub_protocol::{BootstrapResponse, RawState};

    type TestUpdater = CollectionUpdater<Arc<MockBootstrapClient>, Arc<MockStreamClient>>;

    fn identity() -> CollectionIdentity {
        CollectionIdentity::new("n1", "s1", "a1")
    }

    fn data(ids: &[&str], max_event_id: &str) -> StreamResponse {
        let mut payload = StreamPayload::empty(max_event_id);
        for id in ids {
            payload.states.insert(
                id.to_string(),
                RawState::new(json!({"vis": 1, "type": 0, "content": {"id": id}})),
            );
        }
        StreamResponse::Data(payload)
    }

    fn updater() -> (TestUpdater, Arc<MockBootstrapClient>, Arc<MockStreamClient>) {
        let bootstrap = Arc::new(MockBootstrapClient::new());
        bootstrap.push_response(BootstrapResponse::new("E0", CollectionId::new("C1")));
        let stream = Arc::new(MockStreamClient::new());
        let updater =
            CollectionUpdater::new(identity(), Arc::clone(&bootstrap), Arc::clone(&stream));
        (updater, bootstrap, stream)
    }

    fn sink() -> BufferSink<ContentEntity> {
        BufferSink::new()
    }

    #[test]
    fn state_checks() {
        assert!(UpdaterState::Errored.is_terminal());
        assert!(!UpdaterState::Streaming.is_terminal());
        assert!(!UpdaterState::Idle.is_terminal());
    }

    #[tokio::test]
    async fn first_read_bootstraps_then_streams_once() {
        let (updater, bootstrap, stream) = updater();
        stream.push_response(data(&["1", "2"], "E1"));
        let sink = sink();

        updater.read(&sink).await.unwrap();

        assert_eq!(bootstrap.request_count(), 1);
        assert_eq!(bootstrap.requests()[0].identity, identity());
        let requests = stream.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].collection_id, CollectionId::new("C1"));
        assert_eq!(requests[0].comment_id, Cursor::new("E0"));
        assert_eq!(sink.len(), 2);
        assert_eq!(updater.state(), UpdaterState::Streaming);
        assert_eq!(updater.cursor(), Some(Cursor::new("E1")));
    }

    #[tokio::test]
    async fn timeout_repolls_once_with_same_cursor() {
        let (updater, _, stream) = updater();
        stream.push_timeout();
        stream.push_response(data(&["1"], "E1"));
        let sink = sink();

        updater.read(&sink).await.unwrap();

        let cursors: Vec<_> = stream.requests().into_iter().map(|r| r.comment_id).collect();
        assert_eq!(cursors, vec![Cursor::new("E0"), Cursor::new("E0")]);
        assert_eq!(updater.stats().timeouts, 1);
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test]
    async fn empty_batch_advances_cursor_and_repolls() {
        let (updater, _, stream) = updater();
        stream.push_response(data(&[], "E3"));
        stream.push_response(data(&["7"], "E4"));
        let sink = sink();

        updater.read(&sink).await.unwrap();

        let cursors: Vec<_> = stream.requests().into_iter().map(|r| r.comment_id).collect();
        assert_eq!(cursors, vec![Cursor::new("E0"), Cursor::new("E3")]);
        assert_eq!(updater.stats().empty_batches, 1);
        assert_eq!(updater.cursor(), Some(Cursor::new("E4")));
    }

    #[tokio::test]
    async fn reported_cursor_is_authoritative() {
        let (updater, _, stream) = updater();
        stream.push_response(data(&["1"], "900"));
        stream.push_response(data(&["2"], "5"));
        let sink = sink();

        updater.read(&sink).await.unwrap();
        updater.read(&sink).await.unwrap();

        assert_eq!(updater.cursor(), Some(Cursor::new("5")));
        assert_eq!(stream.requests()[1].comment_id, Cursor::new("900"));
    }

    #[tokio::test]
    async fn bootstrap_failure_is_terminal() {
        let bootstrap = Arc::new(MockBootstrapClient::new());
        bootstrap.push_error(ClientError::transport("refused"));
        let stream = Arc::new(MockStreamClient::new());
        let updater =
            CollectionUpdater::new(identity(), Arc::clone(&bootstrap), Arc::clone(&stream));
        let sink = sink();

        let err = updater.read(&sink).await.unwrap_err();
        assert!(matches!(err, FeedError::Bootstrap { .. }));
        assert_eq!(updater.state(), UpdaterState::Errored);
        assert!(updater.is_exhausted());

        updater.read(&sink).await.unwrap();
        assert_eq!(bootstrap.request_count(), 1);
        assert_eq!(stream.request_count(), 0);
        assert_eq!(
            updater.stats().last_error.as_deref(),
            Some("transport error: refused")
        );
    }

    #[tokio::test]
    async fn stream_failure_is_terminal() {
        let (updater, _, stream) = updater();
        stream.push_error(ClientError::Server("503".into()));
        stream.push_response(data(&["1"], "E1"));
        let sink = sink();

        let err = updater.read(&sink).await.unwrap_err();
        assert_eq!(
            err,
            FeedError::Stream {
                source: ClientError::Server("503".into())
            }
        );
        updater.read(&sink).await.unwrap();
        assert_eq!(stream.request_count(), 1);
        assert_eq!(updater.cursor(), Some(Cursor::new("E0")));
    }

    #[tokio::test]
    async fn concurrent_read_during_bootstrap_is_a_noop() {
        let (updater, bootstrap, stream) = updater();
        stream.push_response(data(&["1"], "E1"));
        let sink = sink();

        let (first, second) = tokio::join!(updater.read(&sink), updater.read(&sink));
        first.unwrap();
        second.unwrap();

        assert_eq!(bootstrap.request_count(), 1);
        assert_eq!(stream.request_count(), 1);
    }

    #[tokio::test]
    async fn concurrent_stream_steps_do_not_overlap() {
        let (updater, _, stream) = updater();
        stream.push_response(data(&["1"], "E1"));
        stream.push_response(data(&["2"], "E2"));
        let sink = sink();
        updater.read(&sink).await.unwrap();

        let (first, second) = tokio::join!(updater.read(&sink), updater.read(&sink));
        first.unwrap();
        second.unwrap();

        assert_eq!(stream.request_count(), 2);
        assert_eq!(updater.cursor(), Some(Cursor::new("E2")));
    }

    #[tokio::test]
    async fn cancelled_bootstrap_returns_to_idle() {
        let (updater, bootstrap, stream) = updater();
        stream.push_response(data(&["1"], "E1"));
        let sink = sink();

        // Poll the first read once (it suspends inside the bootstrap) and drop it.
        let mut read = Box::pin(updater.read(&sink));
        let polled = std::future::poll_fn(|cx| Poll::Ready(read.as_mut().poll(cx))).await;
        assert!(polled.is_pending());
        assert_eq!(updater.state(), UpdaterState::BootstrappingInit);
        drop(read);
        assert_eq!(updater.state(), UpdaterState::Idle);

        updater.read(&sink).await.unwrap();
        assert_eq!(bootstrap.request_count(), 2);
        assert_eq!(updater.state(), UpdaterState::Streaming);
    }
}
