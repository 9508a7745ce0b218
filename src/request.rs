//! Single HTTP exchanges with timeout, retry and backoff on top of a pluggable transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::throttle::{sleep_or_cancel, Throttle};
use crate::{Error, Result, DEFAULT_RETRY_WAIT, DEFAULT_TIMEOUT, MAX_BACKOFF_MULTIPLIER};

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<String>,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            body: None,
            headers: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn post_form(url: impl Into<String>, body: String) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            ..Self::get(url)
        }
        .header("Content-Type", FORM_CONTENT_TYPE)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(n, _)| n.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Performs one HTTP exchange. Status codes are not interpreted here.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

#[async_trait]
impl HttpTransport for reqwest::Client {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let mut builder = self
            .request(request.method.clone(), &request.url)
            .timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        Ok(HttpResponse { status, body })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub retry_count: u32,
    pub retry_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_count: 0,
            retry_wait: DEFAULT_RETRY_WAIT,
        }
    }
}

/// Wait before retry number `attempt + 1`: `base * 2^attempt`, the multiplier capped.
pub fn backoff(base: Duration, attempt: u32) -> Duration {
    let base = if base.is_zero() { DEFAULT_RETRY_WAIT } else { base };
    let multiplier = 1u32
        .checked_shl(attempt)
        .unwrap_or(u32::MAX)
        .min(MAX_BACKOFF_MULTIPLIER);
    base * multiplier
}

/// Sends `request`, waiting on `throttle` before every attempt.
///
/// Transport failures, timeouts and 429/503 answers are retried per `policy`.
/// A 404 is [`Error::NotFound`], any other status from 400 up is [`Error::Upstream`].
pub async fn send_with_retry(
    transport: &dyn HttpTransport,
    throttle: &Throttle,
    request: &HttpRequest,
    policy: RetryPolicy,
    throttle_limit: usize,
    cancel: &CancellationToken,
) -> Result<Vec<u8>> {
    let mut attempt = 0;
    loop {
        throttle.wait(throttle_limit, cancel).await?;
        debug!(method = %request.method, url = %request.url, attempt, "sending request");

        let outcome = exchange(transport, request, cancel)
            .await
            .and_then(|response| check_status(&request.url, response));
        match outcome {
            Ok(body) => return Ok(body),
            Err(e) if e.is_retryable() && attempt < policy.retry_count => {
                let wait = backoff(policy.retry_wait, attempt);
                warn!(url = %request.url, attempt, error = %e, wait_ms = wait.as_millis() as u64, "retrying request");
                sleep_or_cancel(wait, cancel).await?;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

async fn exchange(
    transport: &dyn HttpTransport,
    request: &HttpRequest,
    cancel: &CancellationToken,
) -> Result<HttpResponse> {
    tokio::select! {
        _ = cancel.cancelled() => Err(Error::Cancelled),
        res = timeout(request.timeout, transport.execute(request)) => match res {
            Ok(response) => response,
            Err(_) => Err(Error::Timeout(request.timeout)),
        },
    }
}

fn check_status(url: &str, response: HttpResponse) -> Result<Vec<u8>> {
    match response.status {
        404 => Err(Error::NotFound(url.to_string())),
        status if status >= 400 => Err(Error::Upstream {
            status,
            body: String::from_utf8_lossy(&response.body).into_owned(),
        }),
        _ => Ok(response.body),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use tokio::time::Instant;

    use super::*;

    /// Answers with the given statuses in order, then hangs.
    struct Scripted {
        statuses: Mutex<VecDeque<u16>>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(statuses: &[u16]) -> Self {
            Self {
                statuses: Mutex::new(statuses.iter().copied().collect()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HttpTransport for Scripted {
        async fn execute(&self, _request: &HttpRequest) -> Result<HttpResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.statuses.lock().unwrap().pop_front();
            match next {
                Some(status) => Ok(HttpResponse {
                    status,
                    body: format!("status {status}").into_bytes(),
                }),
                None => std::future::pending().await,
            }
        }
    }

    fn policy(retry_count: u32) -> RetryPolicy {
        RetryPolicy {
            retry_count,
            retry_wait: Duration::from_millis(100),
        }
    }

    async fn send(transport: &Scripted, policy: RetryPolicy) -> Result<Vec<u8>> {
        let request = HttpRequest::get("https://store.test/x").with_timeout(Duration::from_secs(1));
        send_with_retry(transport, &Throttle::new(), &request, policy, 0, &CancellationToken::new()).await
    }

    #[test]
    fn backoff_doubles_up_to_the_cap() {
        let base = Duration::from_millis(100);
        let waits: Vec<_> = (0..7).map(|attempt| backoff(base, attempt).as_millis()).collect();
        assert_eq!(waits, [100, 200, 400, 800, 1600, 1600, 1600]);
        assert_eq!(backoff(Duration::ZERO, 0), DEFAULT_RETRY_WAIT);
        assert_eq!(backoff(base, 40), base * MAX_BACKOFF_MULTIPLIER);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_unavailable_then_succeeds() {
        let transport = Scripted::new(&[503, 429, 200]);
        let start = Instant::now();

        let body = send(&transport, policy(2)).await.unwrap();
        assert_eq!(body, b"status 200");
        assert_eq!(transport.calls(), 3);
        assert_eq!(start.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_retry_count() {
        let transport = Scripted::new(&[503, 503, 503]);
        let err = send(&transport, policy(1)).await.unwrap_err();
        assert!(matches!(err, Error::Upstream { status: 503, .. }));
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_and_client_errors_are_final() {
        let transport = Scripted::new(&[404, 200]);
        assert!(matches!(send(&transport, policy(3)).await, Err(Error::NotFound(url)) if url == "https://store.test/x"));
        assert_eq!(transport.calls(), 1);

        let transport = Scripted::new(&[400, 200]);
        let err = send(&transport, policy(3)).await.unwrap_err();
        assert!(matches!(err, Error::Upstream { status: 400, ref body } if body == "status 400"));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_exchange_times_out_and_is_retried() {
        let transport = Scripted::new(&[]);
        let err = send(&transport, policy(1)).await.unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_backoff() {
        let transport = Scripted::new(&[503, 200]);
        let cancel = CancellationToken::new();
        let request = HttpRequest::get("https://store.test/x");
        let policy = RetryPolicy {
            retry_count: 1,
            retry_wait: Duration::from_secs(60),
        };

        let canceller = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(1)).await;
                cancel.cancel();
            })
        };
        let start = Instant::now();
        let res = send_with_retry(&transport, &Throttle::new(), &request, policy, 0, &cancel).await;
        canceller.await.unwrap();

        assert!(matches!(res, Err(Error::Cancelled)));
        assert_eq!(start.elapsed(), Duration::from_secs(1));
        assert_eq!(transport.calls(), 1);
    }

    #[test]
    fn form_posts_carry_the_content_type() {
        let request = HttpRequest::post_form("https://store.test/rpc", "f.req=x".into());
        assert_eq!(request.method, Method::POST);
        assert!(request.has_header("content-type"));
        assert_eq!(request.body.as_deref(), Some("f.req=x"));
    }
}
