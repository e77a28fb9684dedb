//! HTTP adapters for the bootstrap and stream clients.
//!
//! The actual HTTP client is abstracted via a trait so embedders can plug
//! in whichever library they already use (reqwest, hyper, ureq, ...).

use crate::error::{ClientError, ClientResult};
use crate::transport::{BootstrapClient, StreamClient};
use async_trait::async_trait;
use parking_lot::RwLock;
use streamhub_protocol::{
    decode_json, BootstrapRequest, BootstrapResponse, CollectionIdentity, StreamRequest,
    StreamResponse,
};
use tracing::debug;
use url::Url;

/// HTTP client abstraction.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends a GET request and returns the response body.
    ///
    /// Long-poll endpoints hold the request open, so implementations must
    /// not apply a timeout shorter than the server's wait window.
    async fn get(&self, url: &str) -> Result<Vec<u8>, String>;
}

/// Base URLs of the bootstrap and stream services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpEndpoints {
    bootstrap_base: Url,
    stream_base: Url,
}

impl HttpEndpoints {
    /// Parses the two base URLs.
    pub fn new(bootstrap_base: &str, stream_base: &str) -> ClientResult<Self> {
        Ok(Self {
            bootstrap_base: parse_base(bootstrap_base)?,
            stream_base: parse_base(stream_base)?,
        })
    }

    /// URL of the bootstrap `init` document for a collection.
    ///
    /// Layout: `{base}/bs3/{environment?}/{network}/{siteId}/{articleId}/init`.
    pub fn bootstrap_url(&self, identity: &CollectionIdentity) -> ClientResult<Url> {
        let mut segments = vec!["bs3"];
        if let Some(env) = &identity.environment {
            segments.push(env.as_str());
        }
        segments.extend([
            identity.network.as_str(),
            identity.site_id.as_str(),
            identity.article_id.as_str(),
            "init",
        ]);
        build_url(&self.bootstrap_base, &segments)
    }

    /// URL of the long-poll stream request.
    ///
    /// Layout: `{base}/v3.0/collection/{collectionId}/{commentId}/`.
    pub fn stream_url(&self, request: &StreamRequest) -> ClientResult<Url> {
        build_url(
            &self.stream_base,
            &[
                "v3.0",
                "collection",
                request.collection_id.as_str(),
                request.comment_id.as_str(),
                "",
            ],
        )
    }
}

fn parse_base(raw: &str) -> ClientResult<Url> {
    let url = Url::parse(raw)
        .map_err(|e| ClientError::transport(format!("invalid base URL {raw}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(ClientError::transport(format!("invalid base URL {raw}")));
    }
    Ok(url)
}

fn build_url(base: &Url, segments: &[&str]) -> ClientResult<Url> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| ClientError::transport(format!("invalid base URL {base}")))?;
        path.pop_if_empty();
        for segment in segments {
            path.push(segment);
        }
    }
    Ok(url)
}

/// Tracks the last failure of an HTTP adapter.
#[derive(Debug, Default)]
struct LastError(RwLock<Option<String>>);

impl LastError {
    fn get(&self) -> Option<String> {
        self.0.read().clone()
    }

    fn set(&self, err: &str) {
        *self.0.write() = Some(err.to_string());
    }

    fn clear(&self) {
        *self.0.write() = None;
    }
}

async fn get_json<C, R>(client: &C, url: &Url, last_error: &LastError) -> ClientResult<R>
where
    C: HttpClient,
    R: serde::de::DeserializeOwned,
{
    debug!(%url, "GET");
    let body = client.get(url.as_str()).await.map_err(|e| {
        last_error.set(&e);
        ClientError::Transport(e)
    })?;
    last_error.clear();
    Ok(decode_json(&body)?)
}

/// Bootstrap client speaking JSON over HTTP.
pub struct HttpBootstrapClient<C: HttpClient> {
    endpoints: HttpEndpoints,
    client: C,
    last_error: LastError,
}

impl<C: HttpClient> HttpBootstrapClient<C> {
    /// Creates a bootstrap client.
    pub fn new(endpoints: HttpEndpoints, client: C) -> Self {
        Self {
            endpoints,
            client,
            last_error: LastError::default(),
        }
    }

    /// Returns the last transport error message.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.get()
    }
}

#[async_trait]
impl<C: HttpClient> BootstrapClient for HttpBootstrapClient<C> {
    async fn get_content(&self, request: &BootstrapRequest) -> ClientResult<BootstrapResponse> {
        let url = self.endpoints.bootstrap_url(&request.identity)?;
        get_json(&self.client, &url, &self.last_error).await
    }
}

/// Stream client speaking JSON over HTTP.
pub struct HttpStreamClient<C: HttpClient> {
    endpoints: HttpEndpoints,
    client: C,
    last_error: LastError,
}

impl<C: HttpClient> HttpStreamClient<C> {
    /// Creates a stream client.
    pub fn new(endpoints: HttpEndpoints, client: C) -> Self {
        Self {
            endpoints,
            client,
            last_error: LastError::default(),
        }
    }

    /// Returns the last transport error message.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.get()
    }
}

#[async_trait]
impl<C: HttpClient> StreamClient for HttpStreamClient<C> {
    async fn get_content(&self, request: &StreamRequest) -> ClientResult<StreamResponse> {
        let url = self.endpoints.stream_url(request)?;
        get_json(&self.client, &url, &self.last_error).await
    }
}
