use std::time::Duration;

use graphcal_domain::GraphCalError;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};

/// HTTP client with built-in retry and timeout support.
///
/// Reads go through [`HttpClient::send`], which retries transient failures.
/// Writes go through [`HttpClient::send_once`]: without idempotency keys a
/// replayed write is not safe, so write failures surface immediately.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    max_retries: usize,
    retry_unit: Duration,
}

/// Statuses worth another attempt: auth hiccups, request timeout,
/// throttling, and anything server-side.
fn should_retry_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::UNAUTHORIZED
            | StatusCode::FORBIDDEN
            | StatusCode::REQUEST_TIMEOUT
            | StatusCode::TOO_MANY_REQUESTS
    ) || status.is_server_error()
}

fn should_retry_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the request with retry semantics.
    ///
    /// Retries on the status predicate or a transient transport error, up to
    /// the configured retry count, sleeping `attempt × retry_unit` between
    /// attempts. Exhaustion returns the last error as
    /// [`GraphCalError::Connection`].
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, GraphCalError> {
        // max_retries counts retries after the initial attempt.
        let attempts = self.max_retries + 1;

        for attempt in 1..=attempts {
            let cloned_builder = builder.try_clone().ok_or_else(|| {
                GraphCalError::Connection(
                    "request body cannot be cloned; buffer the body to enable retries".into(),
                )
            })?;

            let request = cloned_builder
                .build()
                .map_err(|err| GraphCalError::Connection(err.to_string()))?;

            let method = request.method().clone();
            let url = request.url().clone();
            debug!(attempt, %method, %url, "sending HTTP request");

            match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status();

                    if should_retry_status(status) && attempt < attempts {
                        warn!(
                            attempt,
                            %method,
                            %url,
                            %status,
                            reason = status.canonical_reason().unwrap_or("unknown"),
                            "retrying after retryable status"
                        );
                        self.sleep_before_retry(attempt).await;
                        continue;
                    }

                    if should_retry_status(status) {
                        // Keep the body in the error so callers can surface
                        // the vendor-reported message.
                        let text = response.text().await.unwrap_or_default();
                        return Err(GraphCalError::Connection(format!(
                            "request to {url} failed with {status} after {attempts} attempts: {text}"
                        )));
                    }

                    debug!(attempt, %method, %url, %status, "received HTTP response");
                    return Ok(response);
                }
                Err(err) => {
                    if attempt < attempts && should_retry_error(&err) {
                        warn!(attempt, %method, %url, error = %err, "retrying after transport error");
                        self.sleep_before_retry(attempt).await;
                        continue;
                    }

                    return Err(GraphCalError::Connection(err.to_string()));
                }
            }
        }

        Err(GraphCalError::Connection(
            "http client exhausted retries without producing a result".into(),
        ))
    }

    /// Execute the request exactly once, with no retry.
    pub async fn send_once(&self, builder: RequestBuilder) -> Result<Response, GraphCalError> {
        let request = builder.build().map_err(|err| GraphCalError::Connection(err.to_string()))?;

        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "sending HTTP request (no retry)");

        self.client
            .execute(request)
            .await
            .map_err(|err| GraphCalError::Connection(err.to_string()))
    }

    // Linear backoff: the Nth retry waits N retry units.
    async fn sleep_before_retry(&self, attempt: usize) {
        let delay = self.retry_unit.saturating_mul(attempt as u32);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    max_retries: usize,
    retry_unit: Duration,
    user_agent: Option<String>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: graphcal_domain::constants::MAX_RETRIES,
            retry_unit: Duration::from_millis(graphcal_domain::constants::RETRY_UNIT_MS),
            user_agent: None,
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configure the number of retries made after the initial attempt.
    pub fn max_retries(mut self, retries: usize) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn retry_unit(mut self, unit: Duration) -> Self {
        self.retry_unit = unit;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<HttpClient, GraphCalError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client =
            builder.build().map_err(|err| GraphCalError::Connection(err.to_string()))?;

        Ok(HttpClient { client, max_retries: self.max_retries, retry_unit: self.retry_unit })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_with_defaults() -> HttpClient {
        HttpClient::builder()
            .retry_unit(Duration::from_millis(10))
            .max_retries(3)
            .build()
            .expect("http client")
    }

    #[tokio::test]
    async fn returns_successful_response_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_defaults();
        let response =
            client.send(client.request(Method::GET, server.uri())).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
    }

    #[tokio::test]
    async fn retries_throttling_until_success() {
        let server = MockServer::start().await;
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = attempts.clone();
        Mock::given(method("GET"))
            .respond_with(move |_req: &wiremock::Request| -> ResponseTemplate {
                let current = attempts_clone.fetch_add(1, Ordering::SeqCst);
                if current < 2 {
                    ResponseTemplate::new(429)
                } else {
                    ResponseTemplate::new(200)
                }
            })
            .expect(3)
            .mount(&server)
            .await;

        let client = client_with_defaults();
        let response =
            client.send(client.request(Method::GET, server.uri())).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 3);
    }

    // Initial attempt + 3 retries = 4 requests on the wire.
    #[tokio::test]
    async fn exhausted_retries_surface_connection_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .expect(4)
            .mount(&server)
            .await;

        let client = client_with_defaults();
        let result = client.send(client.request(Method::GET, server.uri())).await;

        assert!(matches!(result, Err(GraphCalError::Connection(_))));
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 4);
    }

    #[tokio::test]
    async fn does_not_retry_bad_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_defaults();
        let response =
            client.send(client.request(Method::GET, server.uri())).await.expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
    }

    #[tokio::test]
    async fn send_once_never_retries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_defaults();
        let response = client
            .send_once(client.request(Method::POST, server.uri()))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
    }
}
