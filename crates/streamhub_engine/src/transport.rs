//! Client collaborators for bootstrap and stream requests.

use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use streamhub_protocol::{BootstrapRequest, BootstrapResponse, StreamRequest, StreamResponse};

/// Performs the one-time bootstrap request for a collection.
///
/// Implementations own the network mechanics; the engine only relies on
/// the request/response contract.
#[async_trait]
pub trait BootstrapClient: Send + Sync {
    /// Fetches collection settings for the identity in `request`.
    async fn get_content(&self, request: &BootstrapRequest) -> ClientResult<BootstrapResponse>;
}

/// Performs long-poll stream requests.
#[async_trait]
pub trait StreamClient: Send + Sync {
    /// Waits for events after `request.comment_id`.
    ///
    /// Returns [`StreamResponse::Timeout`] when the server's wait window
    /// elapses without new events.
    async fn get_content(&self, request: &StreamRequest) -> ClientResult<StreamResponse>;
}

#[async_trait]
impl<T: BootstrapClient + ?Sized> BootstrapClient for Arc<T> {
    async fn get_content(&self, request: &BootstrapRequest) -> ClientResult<BootstrapResponse> {
        (**self).get_content(request).await
    }
}

#[async_trait]
impl<T: StreamClient + ?Sized> StreamClient for Arc<T> {
    async fn get_content(&self, request: &StreamRequest) -> ClientResult<StreamResponse> {
        (**self).get_content(request).await
    }
}

/// A scripted bootstrap client for testing.
///
/// Responses are served in order and every request is recorded. Each
/// call yields to the scheduler once before answering, the way a real
/// network round trip would suspend.
#[derive(Debug, Default)]
pub struct MockBootstrapClient {
    script: Mutex<VecDeque<ClientResult<BootstrapResponse>>>,
    requests: Mutex<Vec<BootstrapRequest>>,
}

impl MockBootstrapClient {
    /// Creates a client with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful response.
    pub fn push_response(&self, response: BootstrapResponse) {
        self.script.lock().push_back(Ok(response));
    }

    /// Queues a failure.
    pub fn push_error(&self, error: ClientError) {
        self.script.lock().push_back(Err(error));
    }

    /// Returns every request received so far.
    pub fn requests(&self) -> Vec<BootstrapRequest> {
        self.requests.lock().clone()
    }

    /// Returns the number of requests received so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl BootstrapClient for MockBootstrapClient {
    async fn get_content(&self, request: &BootstrapRequest) -> ClientResult<BootstrapResponse> {
        self.requests.lock().push(request.clone());
        tokio::task::yield_now().await;
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::transport("mock bootstrap script exhausted")))
    }
}

/// A scripted stream client for testing.
#[derive(Debug, Default)]
pub struct MockStreamClient {
    script: Mutex<VecDeque<ClientResult<StreamResponse>>>,
    requests: Mutex<Vec<StreamRequest>>,
}

impl MockStreamClient {
    /// Creates a client with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response.
    pub fn push_response(&self, response: StreamResponse) {
        self.script.lock().push_back(Ok(response));
    }

    /// Queues a long-poll timeout.
    pub fn push_timeout(&self) {
        self.push_response(StreamResponse::Timeout);
    }

    /// Queues a failure.
    pub fn push_error(&self, error: ClientError) {
        self.script.lock().push_back(Err(error));
    }

    /// Returns every request received so far.
    pub fn requests(&self) -> Vec<StreamRequest> {
        self.requests.lock().clone()
    }

    /// Returns the number of requests received so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Returns the number of scripted responses not yet served.
    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }
}

#[async_trait]
impl StreamClient for MockStreamClient {
    async fn get_content(&self, request: &StreamRequest) -> ClientResult<StreamResponse> {
        self.requests.lock().push(request.clone());
        tokio::task::yield_now().await;
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::transport("mock stream script exhausted")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamhub_protocol::{CollectionId, CollectionIdentity, Cursor};

    fn identity() -> CollectionIdentity {
        CollectionIdentity::new("n1", "s1", "a1")
    }

    #[tokio::test]
    async fn mock_bootstrap_serves_script_in_order() {
        let client = MockBootstrapClient::new();
        client.push_response(BootstrapResponse::new("E0", CollectionId::new("C1")));
        client.push_error(ClientError::Server("gone".into()));

        let request = BootstrapRequest::new(identity());
        let first = client.get_content(&request).await.unwrap();
        assert_eq!(first.collection_settings.event, Cursor::new("E0"));

        let second = client.get_content(&request).await;
        assert_eq!(second, Err(ClientError::Server("gone".into())));
        assert_eq!(client.request_count(), 2);
    }

    #[tokio::test]
    async fn mock_stream_fails_when_exhausted() {
        let client = Arc::new(MockStreamClient::new());
        client.push_timeout();

        let request = StreamRequest::new(identity(), CollectionId::new("C1"), Cursor::new("E0"));
        let shared: Arc<MockStreamClient> = Arc::clone(&client);
        assert_eq!(
            shared.get_content(&request).await,
            Ok(StreamResponse::Timeout)
        );
        assert!(matches!(
            shared.get_content(&request).await,
            Err(ClientError::Transport(_))
        ));
        assert_eq!(client.requests()[0].comment_id, Cursor::new("E0"));
        assert_eq!(client.remaining(), 0);
    }
}
