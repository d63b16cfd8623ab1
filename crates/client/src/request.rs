//! Request option builders.
//!
//! [`RequestOptions`] is the value object handed to the connection: URL,
//! method, headers, query params, JSON body, and (for batch calls) the
//! multipart boundary. Mutating helpers only touch the internal maps; no
//! network I/O happens here.

use reqwest::Method;
use serde_json::Value;
use uuid::Uuid;

use graphcal_domain::constants::{
    DELTA_TOKEN_PARAM, HEADER_CLIENT_REQUEST_ID, PREFER_CONTINUE_ON_ERROR,
};
use graphcal_domain::{GraphCalError, Result};

/// Options for one outgoing request.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    method: Method,
    url: String,
    headers: Vec<(String, String)>,
    query: Vec<(String, String)>,
    body: Option<Value>,
    token: Option<String>,
    boundary: Option<String>,
}

impl RequestOptions {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
            token: None,
            boundary: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Append a header. Repeated names are sent as repeated headers.
    pub fn header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Append a query parameter.
    pub fn query(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Apply the headers every call carries: bearer auth, a fresh
    /// correlation id, and the JSON accept header.
    ///
    /// Fails with [`GraphCalError::MissingToken`] when no token is set.
    pub fn apply_default_headers(&mut self) -> Result<()> {
        let token = self.token.as_deref().ok_or(GraphCalError::MissingToken)?;

        self.headers.push(("Authorization".into(), format!("Bearer {token}")));
        self.headers.push((HEADER_CLIENT_REQUEST_ID.into(), Uuid::new_v4().to_string()));
        self.headers.push(("Accept".into(), "application/json".into()));
        Ok(())
    }

    /// Apply batch-call headers on top of the defaults: a fresh multipart
    /// boundary and the continue-on-error preference, so the server keeps
    /// processing remaining sub-requests after one fails.
    pub fn apply_batch_headers(&mut self) -> Result<()> {
        self.apply_default_headers()?;

        let boundary = format!("batch_{}", Uuid::new_v4());
        self.headers.push((
            "Content-Type".into(),
            format!("multipart/mixed; boundary={boundary}"),
        ));
        self.headers.push(("Prefer".into(), PREFER_CONTINUE_ON_ERROR.into()));
        self.boundary = Some(boundary);
        Ok(())
    }

    /// Promote a generic `delta` query param into the vendor delta-token
    /// key. A no-op when no `delta` param is present.
    pub fn promote_delta_param(&mut self) {
        if let Some(pos) = self.query.iter().position(|(key, _)| key == "delta") {
            let (_, value) = self.query.remove(pos);
            self.query.push((DELTA_TOKEN_PARAM.into(), value));
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn query_params(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Multipart boundary, present only after [`Self::apply_batch_headers`].
    pub fn boundary(&self) -> Option<&str> {
        self.boundary.as_deref()
    }
}
