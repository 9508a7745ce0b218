//! The entry point: a configured HTTP stack plus the shared throttle and cache.
//!
//! Endpoint calls live in [`crate::endpoints`] as methods on [`Client`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::cache::{CacheOptions, ResponseCache};
use crate::options::CallOptions;
use crate::request::{send_with_retry, HttpRequest, HttpTransport, RetryPolicy};
use crate::throttle::Throttle;
use crate::{Result, ACCEPT_LANGUAGE, BASE_URL, DEFAULT_RETRY_WAIT, DEFAULT_TIMEOUT, USER_AGENT};

#[derive(Debug, Clone, PartialEq)]
pub struct ClientOptions {
    pub base_url: String,
    pub timeout: Duration,
    pub retry_count: u32,
    pub retry_wait: Duration,
    pub proxy_url: Option<String>,
    /// Memoize call results. `None` disables the cache.
    pub cache: Option<CacheOptions>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry_count: 0,
            retry_wait: DEFAULT_RETRY_WAIT,
            proxy_url: None,
            cache: None,
        }
    }
}

/// Cloning is cheap; clones share the transport, throttle and cache.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    throttle: Arc<Throttle>,
    cache: Option<Arc<ResponseCache>>,
    retry: RetryPolicy,
    timeout: Duration,
}

impl Client {
    /// A client over `reqwest` with a cookie store.
    pub fn new(options: ClientOptions) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(effective_timeout(options.timeout));
        if let Some(proxy) = options.proxy_url.as_deref().filter(|p| !p.is_empty()) {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }
        Ok(Self::with_transport(builder.build()?, options))
    }

    pub fn with_transport(transport: impl HttpTransport + 'static, options: ClientOptions) -> Self {
        let base_url = match options.base_url.trim_end_matches('/') {
            "" => BASE_URL.to_string(),
            url => url.to_string(),
        };
        Self {
            transport: Arc::new(transport),
            base_url,
            throttle: Arc::new(Throttle::new()),
            cache: options.cache.map(|cache| Arc::new(ResponseCache::new(cache))),
            retry: RetryPolicy {
                retry_count: options.retry_count,
                retry_wait: options.retry_wait,
            },
            timeout: effective_timeout(options.timeout),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_deref()
    }

    /// Absolute URLs pass through, paths are joined onto the base URL.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http") {
            return path.to_string();
        }
        format!("{}{path}", self.base_url)
    }

    pub(crate) async fn get(&self, url: String, call: &CallOptions) -> Result<String> {
        let body = self.send(HttpRequest::get(url), call).await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    pub(crate) async fn post_form(&self, url: String, body: String, call: &CallOptions) -> Result<Vec<u8>> {
        self.send(HttpRequest::post_form(url, body), call).await
    }

    async fn send(&self, request: HttpRequest, call: &CallOptions) -> Result<Vec<u8>> {
        let mut request = request.with_timeout(self.timeout);
        for (name, value) in &call.headers {
            request.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
            request = request.header(name.as_str(), value.as_str());
        }
        if !request.has_header("User-Agent") {
            request = request.header("User-Agent", USER_AGENT);
        }
        if !request.has_header("Accept-Language") {
            request = request.header("Accept-Language", ACCEPT_LANGUAGE);
        }

        send_with_retry(
            self.transport.as_ref(),
            &self.throttle,
            &request,
            self.retry,
            call.throttle,
            &call.cancel,
        )
        .await
    }

    /// Serves `method` from the cache when an entry for `options` is live, otherwise runs
    /// `fetch` and stores its result. Failures are never cached.
    pub(crate) async fn memoized<T, O, F, Fut>(&self, method: &str, options: &O, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        O: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let Some(cache) = &self.cache else {
            return fetch().await;
        };

        let key = ResponseCache::key(method, options)?;
        if let Some(hit) = cache.get_json(&key) {
            debug!(method, "cache hit");
            return Ok(hit);
        }
        debug!(method, "cache miss");

        let value = fetch().await?;
        cache.insert_json(key, &value);
        Ok(value)
    }
}

fn effective_timeout(timeout: Duration) -> Duration {
    if timeout.is_zero() {
        DEFAULT_TIMEOUT
    } else {
        timeout
    }
}

/// Form-encodes query pairs with spaces as `%20`, the way the store's own links do.
pub(crate) fn encode_query(pairs: &[(&str, &str)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (name, value) in pairs {
        serializer.append_pair(name, value);
    }
    serializer.finish().replace('+', "%20")
}

pub(crate) fn escape(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
