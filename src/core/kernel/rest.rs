use crate::core::config::{ConfigError, VimondConfig, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
use crate::core::errors::{TransportError, VimondError};
use crate::core::kernel::signer::{Signer, SumoSigner};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use percent_encoding::percent_decode_str;
use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Method, Request, Response, StatusCode};
use std::collections::{BTreeMap, VecDeque};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace};
use url::Url;

/// Bytes of an unused body read before the connection is given back.
pub const DISCARD_BUDGET: usize = 64;

/// Media type negotiated through `Accept` and `Content-Type`.
///
/// The upstream keys its response shape on this header, so it is chosen per
/// call rather than per client.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MediaType {
    /// No negotiation headers; the upstream answers with its default (XML).
    #[default]
    Unspecified,
    /// `application/json; v=<version>; charset=utf-8`
    Json { version: u8 },
    /// Any other literal header value
    Custom(String),
}

impl MediaType {
    pub const JSON_V3: Self = Self::Json { version: 3 };

    pub fn header_value(&self) -> Option<String> {
        match self {
            Self::Unspecified => None,
            Self::Json { version } => {
                Some(format!("application/json; v={}; charset=utf-8", version))
            }
            Self::Custom(value) => Some(value.clone()),
        }
    }
}

/// A single outbound call, built fresh for every operation.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    /// Unescaped path, resolved relative to the configured base URL
    pub path: String,
    pub query: BTreeMap<String, Vec<String>>,
    pub body: Option<Bytes>,
    pub media_type: MediaType,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: BTreeMap::new(),
            body: None,
            media_type: MediaType::Unspecified,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// Append a value for `key`; repeated keys keep insertion order
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.entry(key.into()).or_default().push(value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = media_type;
        self
    }
}

/// Per-call deadline and cancellation signal.
///
/// The future driven through [`CallContext::run`] is dropped as soon as the
/// token is cancelled or the deadline passes, which aborts the in-flight
/// request.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Drive `fut` to completion unless cancelled or past the deadline
    pub async fn run<T, F>(&self, fut: F) -> Result<T, VimondError>
    where
        F: Future<Output = Result<T, VimondError>>,
    {
        if self.cancel.is_cancelled() {
            return Err(VimondError::from(TransportError::Cancelled));
        }

        let bounded = async {
            match self.deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, fut).await {
                    Ok(result) => result,
                    Err(_) => Err(VimondError::from(TransportError::DeadlineExceeded)),
                },
                None => fut.await,
            }
        };

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(VimondError::from(TransportError::Cancelled)),
            result = bounded => result,
        }
    }
}

enum ResponseBody {
    Stream(Response),
    Buffered(VecDeque<Bytes>),
}

/// Status plus a readable body. Dropping it releases the connection.
pub struct RawResponse {
    status: StatusCode,
    body: ResponseBody,
}

impl std::fmt::Debug for RawResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawResponse")
            .field("status", &self.status)
            .field("streaming", &matches!(self.body, ResponseBody::Stream(_)))
            .finish_non_exhaustive()
    }
}

impl RawResponse {
    pub fn from_reqwest(response: Response) -> Self {
        Self {
            status: response.status(),
            body: ResponseBody::Stream(response),
        }
    }

    pub fn from_bytes(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self::from_chunks(status, vec![body.into()])
    }

    /// Body delivered in the given chunks, the way a network stream would
    pub fn from_chunks(status: StatusCode, chunks: Vec<Bytes>) -> Self {
        Self {
            status,
            body: ResponseBody::Buffered(chunks.into()),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Next chunk of the body, `None` once exhausted
    pub async fn chunk(&mut self) -> Result<Option<Bytes>, VimondError> {
        match &mut self.body {
            ResponseBody::Stream(response) => Ok(response.chunk().await?),
            ResponseBody::Buffered(chunks) => Ok(chunks.pop_front()),
        }
    }

    /// Read the remaining body into memory
    pub async fn bytes(mut self) -> Result<Bytes, VimondError> {
        if let ResponseBody::Stream(response) = self.body {
            return Ok(response.bytes().await?);
        }

        let mut buf = BytesMut::new();
        while let Some(chunk) = self.chunk().await? {
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }

    /// Discard up to [`DISCARD_BUDGET`] bytes of an unused body, then drop it.
    ///
    /// No chunk is pulled once the budget is spent. A chunk crossing the
    /// budget is dropped whole, and only its share of the budget is counted.
    /// Returns the number of bytes discarded, never more than the budget.
    pub async fn release(mut self) -> usize {
        let mut discarded = 0;
        while discarded < DISCARD_BUDGET {
            match self.chunk().await {
                Ok(Some(chunk)) => {
                    discarded += chunk.len().min(DISCARD_BUDGET - discarded);
                }
                Ok(None) | Err(_) => break,
            }
        }
        trace!(discarded, "released response body");
        discarded
    }
}

/// REST client trait for making HTTP requests
///
/// Implementations resolve, sign and send one request and hand back the raw
/// response without interpreting it.
#[async_trait]
pub trait RestClient: Send + Sync {
    /// Send `request`, honouring the deadline and cancellation in `ctx`
    async fn execute(
        &self,
        ctx: &CallContext,
        request: RequestDescriptor,
    ) -> Result<RawResponse, VimondError>;
}

/// Configuration for the REST client
#[derive(Clone, Debug)]
pub struct RestClientConfig {
    /// Base URL (scheme and host) requests are resolved against
    pub base_url: String,
    /// User agent string to include in requests
    pub user_agent: String,
    /// Overall time budget for a request
    pub timeout: Duration,
}

impl RestClientConfig {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }
}

impl From<&VimondConfig> for RestClientConfig {
    fn from(config: &VimondConfig) -> Self {
        Self::new(config.base_url.clone())
            .with_user_agent(config.user_agent.clone())
            .with_timeout(config.timeout)
    }
}

/// Builder for creating REST client instances
pub struct RestClientBuilder {
    config: RestClientConfig,
    signer: Option<Arc<dyn Signer>>,
}

impl RestClientBuilder {
    pub fn new(config: RestClientConfig) -> Self {
        Self {
            config,
            signer: None,
        }
    }

    /// Builder for `config`, signing with its credentials when both are set
    pub fn from_config(config: &VimondConfig) -> Self {
        let builder = Self::new(RestClientConfig::from(config));
        match SumoSigner::from_config(config) {
            Some(signer) => builder.with_signer(Arc::new(signer)),
            None => builder,
        }
    }

    /// Set the signer for authenticated requests
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn build(self) -> Result<ReqwestRest, VimondError> {
        let base_url = Url::parse(&self.config.base_url).map_err(|e| {
            ConfigError::InvalidConfiguration(format!(
                "Invalid base URL '{}': {}",
                self.config.base_url, e
            ))
        })?;

        let client = Client::builder()
            .timeout(self.config.timeout)
            .build()
            .map_err(|e| {
                ConfigError::InvalidConfiguration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(ReqwestRest {
            client,
            base_url,
            user_agent: self.config.user_agent,
            signer: self.signer,
        })
    }
}

/// Implementation of `RestClient` using reqwest
#[derive(Clone)]
pub struct ReqwestRest {
    client: Client,
    base_url: Url,
    user_agent: String,
    signer: Option<Arc<dyn Signer>>,
}

impl std::fmt::Debug for ReqwestRest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestRest")
            .field("base_url", &self.base_url.as_str())
            .field("user_agent", &self.user_agent)
            .field("has_signer", &self.signer.is_some())
            .finish_non_exhaustive()
    }
}

impl ReqwestRest {
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn is_signed(&self) -> bool {
        self.signer.is_some()
    }

    /// Resolve `path` and `query` against the base URL
    pub fn resolve_url(
        &self,
        path: &str,
        query: &BTreeMap<String, Vec<String>>,
    ) -> Result<Url, url::ParseError> {
        let mut url = self.base_url.join(path)?;

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, values) in query {
                for value in values {
                    pairs.append_pair(key, value);
                }
            }
        }

        Ok(url)
    }

    /// Build the outbound request, signed as of `now` when a signer is set
    pub fn build_request(
        &self,
        request: &RequestDescriptor,
        now: DateTime<Utc>,
    ) -> Result<Request, VimondError> {
        let url = self.resolve_url(&request.path, &request.query)?;
        let signed_path = percent_decode_str(url.path()).decode_utf8_lossy().into_owned();

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .header(USER_AGENT, &self.user_agent);

        if let Some(media_type) = request.media_type.header_value() {
            builder = builder
                .header(ACCEPT, &media_type)
                .header(CONTENT_TYPE, &media_type);
        } else if request.body.is_some() {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }

        if let Some(signer) = &self.signer {
            let headers = signer.sign_request(request.method.as_str(), &signed_path, now)?;
            for (name, value) in headers.iter() {
                builder = builder.header(name, value);
            }
        }

        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        Ok(builder.build()?)
    }
}

#[async_trait]
impl RestClient for ReqwestRest {
    #[instrument(skip(self, ctx, request), fields(method = %request.method, path = %request.path))]
    async fn execute(
        &self,
        ctx: &CallContext,
        request: RequestDescriptor,
    ) -> Result<RawResponse, VimondError> {
        let outbound = self.build_request(&request, Utc::now())?;
        debug!(url = %outbound.url(), signed = self.signer.is_some(), "dispatching request");

        let response = ctx
            .run(async {
                self.client
                    .execute(outbound)
                    .await
                    .map_err(VimondError::from)
            })
            .await?;

        debug!(status = %response.status(), "response received");
        Ok(RawResponse::from_reqwest(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kernel::signer::authorization_headers;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    const TEST_BASE_URL: &str = "http://example.com";

    fn test_rest(signer: Option<Arc<dyn Signer>>) -> ReqwestRest {
        let mut builder = RestClientBuilder::new(RestClientConfig::new(TEST_BASE_URL.to_string()));
        if let Some(signer) = signer {
            builder = builder.with_signer(signer);
        }
        builder.build().unwrap()
    }

    fn header<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
        request.headers().get(name).and_then(|v| v.to_str().ok())
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2009, 11, 10, 23, 0, 0).unwrap()
    }

    #[test]
    fn test_build_request_resolves_url() {
        let rest = test_rest(None);

        for (path, key, value, want) in [
            ("/Foo", "bar", "hey", "http://example.com/Foo?bar=hey"),
            ("/Bar", "baz", "123", "http://example.com/Bar?baz=123"),
            (
                "/api/tv4/asset/1",
                "expand",
                "metadata,category",
                "http://example.com/api/tv4/asset/1?expand=metadata%2Ccategory",
            ),
        ] {
            let descriptor = RequestDescriptor::get(path).with_query(key, value);
            let request = rest.build_request(&descriptor, now()).unwrap();

            assert_eq!(request.method(), &Method::GET);
            assert_eq!(request.url().path(), path);
            assert_eq!(request.url().as_str(), want);
            assert_eq!(header(&request, "user-agent"), Some(DEFAULT_USER_AGENT));
            assert!(request.body().is_none());
        }
    }

    #[test]
    fn test_query_keys_are_sorted_and_values_ordered() {
        let rest = test_rest(None);
        let descriptor = RequestDescriptor::get("/x")
            .with_query("b", "2")
            .with_query("a", "1")
            .with_query("b", "3");

        let request = rest.build_request(&descriptor, now()).unwrap();
        assert_eq!(request.url().query(), Some("a=1&b=2&b=3"));
    }

    #[test]
    fn test_malformed_path_is_parse_error() {
        let rest = test_rest(None);
        let descriptor = RequestDescriptor::get("http://[::1/foo").with_query("qux", "456");

        let err = rest.build_request(&descriptor, now()).unwrap_err();
        assert!(matches!(err, VimondError::InvalidUrl(_)));
    }

    #[test]
    fn test_body_is_attached() {
        let rest = test_rest(None);
        let descriptor = RequestDescriptor::post("/Foo")
            .with_query("bar", "hey")
            .with_body("foo-body");

        let request = rest.build_request(&descriptor, now()).unwrap();

        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.url().as_str(), "http://example.com/Foo?bar=hey");
        assert_eq!(
            request.body().and_then(|b| b.as_bytes()),
            Some(&b"foo-body"[..])
        );
        assert_eq!(header(&request, "content-type"), Some("application/json"));
    }

    #[test]
    fn test_json_media_type_headers() {
        let rest = test_rest(None);
        let descriptor = RequestDescriptor::get("/Foo").with_media_type(MediaType::JSON_V3);

        let request = rest.build_request(&descriptor, now()).unwrap();

        assert_eq!(
            header(&request, "accept"),
            Some("application/json; v=3; charset=utf-8")
        );
        assert_eq!(
            header(&request, "content-type"),
            Some("application/json; v=3; charset=utf-8")
        );
    }

    #[test]
    fn test_unspecified_media_type_sends_no_accept() {
        let rest = test_rest(None);
        let request = rest
            .build_request(&RequestDescriptor::get("/Foo"), now())
            .unwrap();

        assert!(request.headers().get("accept").is_none());
        assert!(request.headers().get("content-type").is_none());
    }

    #[test]
    fn test_unsigned_without_signer() {
        let rest = test_rest(None);
        let request = rest
            .build_request(&RequestDescriptor::get("/Foo"), now())
            .unwrap();

        assert!(!rest.is_signed());
        assert!(request.headers().get("authorization").is_none());
        assert!(request.headers().get("date").is_none());
    }

    #[test]
    fn test_signer_signs_resolved_path() {
        let signer = Arc::new(SumoSigner::new("xyz".to_string(), "123".to_string()));
        let rest = test_rest(Some(signer));
        let descriptor = RequestDescriptor::get("/api/tv4/asset/1")
            .with_query("expand", "metadata,category")
            .with_media_type(MediaType::JSON_V3);

        let request = rest.build_request(&descriptor, now()).unwrap();
        let want = authorization_headers("GET", "/api/tv4/asset/1", now(), "xyz", "123").unwrap();

        assert_eq!(header(&request, "date"), Some(want.date.as_str()));
        assert_eq!(
            header(&request, "authorization"),
            Some(want.authorization.as_str())
        );
        assert_eq!(
            header(&request, "accept"),
            Some("application/json; v=3; charset=utf-8")
        );
    }

    #[test]
    fn test_from_config_skips_signer_without_credentials() {
        let unsigned = RestClientBuilder::from_config(&VimondConfig::unsigned())
            .build()
            .unwrap();
        assert!(!unsigned.is_signed());

        let signed = RestClientBuilder::from_config(&VimondConfig::new(
            "key".to_string(),
            "secret".to_string(),
        ))
        .build()
        .unwrap();
        assert!(signed.is_signed());
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let err = RestClientBuilder::new(RestClientConfig::new("not a url".to_string()))
            .build()
            .unwrap_err();
        assert!(matches!(err, VimondError::Config(_)));
    }

    #[test]
    fn test_configured_user_agent_is_sent() {
        let config = VimondConfig::unsigned().with_user_agent("user-agent-test".to_string());
        let rest = RestClientBuilder::from_config(&config).build().unwrap();

        let request = rest
            .build_request(&RequestDescriptor::get("/Foo"), now())
            .unwrap();

        assert_eq!(header(&request, "user-agent"), Some("user-agent-test"));
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport_failure() {
        let rest = RestClientBuilder::new(RestClientConfig::new("http://127.0.0.1:1".to_string()))
            .build()
            .unwrap();

        let err = rest
            .execute(&CallContext::new(), RequestDescriptor::get("/api/admin/platforms"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            VimondError::Transport(TransportError::Http(_))
        ));
        assert_eq!(err.kind(), crate::core::errors::ErrorKind::TransportFailure);
    }

    #[tokio::test]
    async fn test_release_stops_after_budget() {
        let chunks = (0..20).map(|_| Bytes::from_static(&[0u8; 10])).collect();
        let response = RawResponse::from_chunks(StatusCode::INTERNAL_SERVER_ERROR, chunks);

        assert_eq!(response.release().await, DISCARD_BUDGET);
    }

    #[tokio::test]
    async fn test_release_counts_single_large_chunk_within_budget() {
        let response =
            RawResponse::from_bytes(StatusCode::NOT_FOUND, Bytes::from(vec![0u8; 1000]));
        assert_eq!(response.release().await, DISCARD_BUDGET);
    }

    #[tokio::test]
    async fn test_release_exact_budget() {
        let chunks = vec![Bytes::from(vec![0u8; 32]), Bytes::from(vec![0u8; 32])];
        let response = RawResponse::from_chunks(StatusCode::NOT_FOUND, chunks);
        assert_eq!(response.release().await, 64);
    }

    #[tokio::test]
    async fn test_release_short_body() {
        let response = RawResponse::from_bytes(StatusCode::NOT_FOUND, "gone");
        assert_eq!(response.release().await, 4);
    }

    #[tokio::test]
    async fn test_bytes_concatenates_chunks() {
        let response = RawResponse::from_chunks(
            StatusCode::OK,
            vec![Bytes::from_static(b"foo "), Bytes::from_static(b"content")],
        );
        assert_eq!(response.bytes().await.unwrap(), Bytes::from_static(b"foo content"));
    }

    #[tokio::test]
    async fn test_context_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let ctx = CallContext::new().with_cancellation(token);

        let err = ctx.run(async { Ok(()) }).await.unwrap_err();
        assert!(matches!(
            err,
            VimondError::Transport(TransportError::Cancelled)
        ));
    }

    #[tokio::test]
    async fn test_context_cancelled_in_flight() {
        let token = CancellationToken::new();
        let ctx = CallContext::new().with_cancellation(token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        });

        let err = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await
            .unwrap_err();

        canceller.await.unwrap();
        assert!(matches!(
            err,
            VimondError::Transport(TransportError::Cancelled)
        ));
    }

    #[tokio::test]
    async fn test_context_deadline() {
        let ctx = CallContext::with_timeout(Duration::from_millis(10));

        let err = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            VimondError::Transport(TransportError::DeadlineExceeded)
        ));
    }

    #[tokio::test]
    async fn test_context_passes_result_through() {
        let ctx = CallContext::with_timeout(Duration::from_secs(5));
        assert_eq!(ctx.run(async { Ok(42) }).await.unwrap(), 42);
    }
}
