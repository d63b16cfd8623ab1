//! Graph connection: reads, writes, and batch dispatch.
//!
//! Reads go through the retrying HTTP client; writes are dispatched exactly
//! once (no idempotency keys, so replays are unsafe). Both batch strategies
//! funnel their settled results through the same demux, so callers get one
//! outcome per submitted mutation regardless of mechanism.

use std::sync::Arc;

use futures::future::join_all;
use reqwest::{Method, RequestBuilder, Response};
use serde_json::{json, Value};
use tracing::{debug, warn};

use graphcal_domain::{
    BatchOutcome, GraphCalError, PendingMutation, RequestMethod, Result,
};

use crate::batch::{assemble_batch_body, demux_batch_response, format_part, BatchContext};
use crate::config::GraphClientConfig;
use crate::http::HttpClient;
use crate::request::RequestOptions;
use crate::token::TokenProvider;

use std::collections::HashMap;

fn to_http_method(method: RequestMethod) -> Method {
    match method {
        RequestMethod::Get => Method::GET,
        RequestMethod::Post => Method::POST,
        RequestMethod::Patch => Method::PATCH,
        RequestMethod::Delete => Method::DELETE,
    }
}

/// HTTP transport for the Graph calendar API.
#[derive(Clone)]
pub struct Connection {
    http: HttpClient,
    token_provider: Arc<dyn TokenProvider>,
    config: GraphClientConfig,
}

impl Connection {
    pub fn new(
        config: GraphClientConfig,
        token_provider: Arc<dyn TokenProvider>,
    ) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(config.timeout)
            .max_retries(config.max_retries)
            .retry_unit(config.retry_unit)
            .build()?;

        Ok(Self { http, token_provider, config })
    }

    pub fn config(&self) -> &GraphClientConfig {
        &self.config
    }

    /// Build request options for a call, with the current access token
    /// attached.
    pub async fn prepare(&self, method: Method, url: impl Into<String>) -> Result<RequestOptions> {
        let token = self.token_provider.access_token().await?;
        Ok(RequestOptions::new(method, url).with_token(token))
    }

    /// Absolute URL for a path relative to the API base.
    pub fn absolute_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.config.base_url, path)
        }
    }

    /// Issue a GET with retry semantics.
    pub async fn get(&self, options: RequestOptions) -> Result<Response> {
        self.http.send(self.build(&options)).await
    }

    /// Issue a create/update exactly once.
    pub async fn upsert(&self, options: RequestOptions) -> Result<Response> {
        self.http.send_once(self.build(&options)).await
    }

    /// Issue a deletion exactly once.
    pub async fn delete(&self, options: RequestOptions) -> Result<Response> {
        self.http.send_once(self.build(&options)).await
    }

    /// Submit mutations as one concurrent fan-out, one request per item.
    ///
    /// Dispatches are staggered by the configured delay so a large batch
    /// does not land on the remote all at once. Every item settles, success
    /// or failure, before outcomes are assembled; a failed sub-request
    /// becomes an error outcome, never an exception.
    pub async fn execute_batch(
        &self,
        mutations: &[PendingMutation],
        ctx: &mut BatchContext,
    ) -> Result<HashMap<String, BatchOutcome>> {
        self.validate_batch(mutations)?;
        for mutation in mutations {
            ctx.register(mutation);
        }

        debug!(count = mutations.len(), "dispatching batch fan-out");

        let dispatches = mutations.iter().enumerate().map(|(index, mutation)| {
            let stagger = self.config.dispatch_delay.saturating_mul(index as u32);
            async move {
                if !stagger.is_zero() {
                    tokio::time::sleep(stagger).await;
                }
                let settled = self.dispatch_single(mutation).await;
                (mutation.id().to_string(), settled)
            }
        });

        let settled = join_all(dispatches).await;

        let responses: Vec<Value> = settled
            .into_iter()
            .map(|(id, result)| match result {
                Ok((status, body)) => json!({ "id": id, "status": status, "body": body }),
                Err(err) => {
                    warn!(correlation_id = %id, error = %err, "batch sub-request failed");
                    json!({
                        "id": id,
                        "status": 0,
                        "body": { "error": { "message": err.to_string() } }
                    })
                }
            })
            .collect();

        demux_batch_response(&json!({ "responses": responses }), ctx)
    }

    /// Submit mutations as one multipart `$batch` POST.
    pub async fn execute_batch_multipart(
        &self,
        mutations: &[PendingMutation],
        ctx: &mut BatchContext,
    ) -> Result<HashMap<String, BatchOutcome>> {
        self.validate_batch(mutations)?;
        for mutation in mutations {
            ctx.register(mutation);
        }

        let url = self.absolute_url(graphcal_domain::constants::BATCH_PATH);
        let mut options = self.prepare(Method::POST, url).await?;
        options.apply_batch_headers()?;
        let boundary =
            options.boundary().ok_or(GraphCalError::BatchBoundaryMissing)?.to_string();

        let parts: Vec<_> = mutations.iter().map(format_part).collect();
        let body = assemble_batch_body(&parts, &boundary);

        debug!(count = mutations.len(), %boundary, "dispatching multipart batch");

        let builder = self.build(&options).body(body);
        let response = self.http.send_once(builder).await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_else(|_| "unknown error".to_string());
            return Err(GraphCalError::Connection(format!(
                "batch request failed ({status}): {text}"
            )));
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|err| GraphCalError::Read(format!("malformed batch response: {err}")))?;

        demux_batch_response(&raw, ctx)
    }

    fn validate_batch(&self, mutations: &[PendingMutation]) -> Result<()> {
        if mutations.is_empty() {
            return Err(GraphCalError::BatchRequestEmpty);
        }
        if mutations.len() > self.config.batch_limit {
            return Err(GraphCalError::BatchLimitExceeded {
                submitted: mutations.len(),
                limit: self.config.batch_limit,
            });
        }
        Ok(())
    }

    async fn dispatch_single(&self, mutation: &PendingMutation) -> Result<(u16, Value)> {
        let url = self.absolute_url(mutation.path());
        let mut options =
            self.prepare(to_http_method(mutation.method()), url).await?;

        if let PendingMutation::Write(writer) = mutation {
            options = options.with_body(writer.payload.to_value()?);
        }
        options.apply_default_headers()?;

        let response = self.http.send_once(self.build(&options)).await?;
        let status = response.status().as_u16();

        let bytes = response
            .bytes()
            .await
            .map_err(|err| GraphCalError::Connection(err.to_string()))?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        // A failure status without a vendor error body still has to demux
        // as an error outcome.
        let body = if status >= 400 && body.get("error").is_none() {
            json!({ "error": { "message": format!("HTTP {status}") } })
        } else {
            body
        };

        Ok((status, body))
    }

    fn build(&self, options: &RequestOptions) -> RequestBuilder {
        let mut builder = self.http.request(options.method().clone(), options.url());

        for (name, value) in options.headers() {
            builder = builder.header(name, value);
        }
        if !options.query_params().is_empty() {
            builder = builder.query(&options.query_params());
        }
        if let Some(body) = options.body() {
            builder = builder.json(body);
        }

        builder
    }
}
