//! Consumer-paced pull buffer.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::debug;

/// Producer side of a [`BackpressureBuffer`].
///
/// `produce` is only invoked when the buffer holds fewer items than its
/// high-water mark, and never while a previous call is still running.
#[async_trait]
pub trait Producer: Send + Sync + 'static {
    /// Item type delivered to the consumer.
    type Item: Send + 'static;
    /// Terminal error type.
    type Error: Send + 'static;

    /// Produces zero or more items into `sink`.
    ///
    /// An error ends production; it is delivered to the consumer once.
    async fn produce(&self, sink: &BufferSink<Self::Item>) -> Result<(), Self::Error>;

    /// Returns true once the producer will never produce again.
    fn is_exhausted(&self) -> bool;
}

struct Shared<T> {
    pending: Mutex<VecDeque<T>>,
    ready: Notify,
}

/// Handle through which a producer pushes items.
pub struct BufferSink<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for BufferSink<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Default for BufferSink<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> BufferSink<T> {
    /// Creates a sink not attached to any buffer.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                pending: Mutex::new(VecDeque::new()),
                ready: Notify::new(),
            }),
        }
    }

    /// Appends a batch in one step, preserving its order.
    ///
    /// An empty batch is a no-op and does not wake the consumer.
    pub fn push(&self, batch: impl IntoIterator<Item = T>) {
        let added = {
            let mut pending = self.shared.pending.lock();
            let before = pending.len();
            pending.extend(batch);
            pending.len() - before
        };
        if added > 0 {
            self.shared.ready.notify_one();
        }
    }

    /// Returns the number of pending items.
    pub fn len(&self) -> usize {
        self.shared.pending.lock().len()
    }

    /// Returns true if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn pop(&self) -> Option<T> {
        self.shared.pending.lock().pop_front()
    }

    fn wake(&self) {
        self.shared.ready.notify_one();
    }

    async fn ready(&self) {
        self.shared.ready.notified().await;
    }
}

/// Single-producer/single-consumer pull queue.
///
/// Reading below the high-water mark starts a refill on the producer in a
/// background task; reading never waits for that refill while items are
/// pending. Items come out in push order, each exactly once.
///
/// Must be used from within a tokio runtime. A current-thread runtime
/// keeps the whole feed on one logical thread.
pub struct BackpressureBuffer<P: Producer> {
    producer: Arc<P>,
    sink: BufferSink<P::Item>,
    failure: Arc<Mutex<Option<P::Error>>>,
    refill: Option<JoinHandle<()>>,
    high_water_mark: usize,
    failed: bool,
    closed: bool,
}

impl<P: Producer> BackpressureBuffer<P> {
    /// Creates a buffer over `producer`.
    ///
    /// A high-water mark of zero is raised to one.
    pub fn new(producer: P, high_water_mark: usize) -> Self {
        Self::with_shared_producer(Arc::new(producer), high_water_mark)
    }

    /// Creates a buffer over a producer the caller keeps a handle to.
    pub fn with_shared_producer(producer: Arc<P>, high_water_mark: usize) -> Self {
        Self {
            producer,
            sink: BufferSink::new(),
            failure: Arc::new(Mutex::new(None)),
            refill: None,
            high_water_mark: high_water_mark.max(1),
            failed: false,
            closed: false,
        }
    }

    /// Returns the producer.
    pub fn producer(&self) -> &Arc<P> {
        &self.producer
    }

    /// Returns a sink for pushing items directly.
    pub fn sink(&self) -> BufferSink<P::Item> {
        self.sink.clone()
    }

    /// Returns the high-water mark.
    pub fn high_water_mark(&self) -> usize {
        self.high_water_mark
    }

    /// Returns the number of pending items.
    pub fn pending(&self) -> usize {
        self.sink.len()
    }

    /// Returns true if a refill is running.
    pub fn is_refilling(&self) -> bool {
        self.refill.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Returns the next item.
    ///
    /// Yields `Some(Ok(item))` while items arrive, `Some(Err(_))` once if
    /// the producer fails, and `None` when the producer is exhausted or the
    /// buffer was closed and nothing is left.
    pub async fn read(&mut self) -> Option<Result<P::Item, P::Error>> {
        loop {
            // Sampled first: a refill that ends after this point has
            // already pushed its items and stored its error.
            let finished = self.is_finished();
            let item = self.sink.pop();
            if self.sink.len() < self.high_water_mark {
                self.start_refill();
            }
            if let Some(item) = item {
                return Some(Ok(item));
            }
            if let Some(err) = self.failure.lock().take() {
                self.failed = true;
                return Some(Err(err));
            }
            if finished {
                return None;
            }
            self.sink.ready().await;
        }
    }

    /// Stops producing.
    ///
    /// An in-flight refill is aborted. Items already pending can still be
    /// read; after that `read` returns `None`.
    pub fn close(&mut self) {
        if let Some(task) = self.refill.take() {
            task.abort();
        }
        if !self.closed {
            debug!(pending = self.sink.len(), "closing buffer");
        }
        self.closed = true;
    }

    fn is_finished(&self) -> bool {
        self.closed || self.failed || (self.producer.is_exhausted() && !self.is_refilling())
    }

    fn start_refill(&mut self) {
        if self.closed || self.failed || self.is_refilling() || self.producer.is_exhausted() {
            return;
        }
        let producer = Arc::clone(&self.producer);
        let sink = self.sink.clone();
        let failure = Arc::clone(&self.failure);
        self.refill = Some(tokio::spawn(async move {
            if let Err(err) = producer.produce(&sink).await {
                *failure.lock() = Some(err);
            }
            sink.wake();
        }));
    }
}

impl<P: Producer> Drop for BackpressureBuffer<P> {
    fn drop(&mut self) {
        if let Some(task) = self.refill.take() {
            task.abort();
        }
    }
}
