//! Delta-feed pagination.
//!
//! [`EventPager`] walks a calendar view feed one page at a time. The first
//! page is requested with a page size of one, so auth or configuration
//! problems surface against a cheap request before any bulk fetch;
//! continuation pages use the full page size. A `@odata.deltaLink` ends the
//! feed and is kept as the resumption token for the next sync pass; it is
//! never followed or yielded within the current pass.

use std::collections::VecDeque;

use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use graphcal_domain::constants::PREFER_TRACK_CHANGES;
use graphcal_domain::{GraphCalError, Result};

use crate::connection::Connection;
use crate::request::RequestOptions;

#[derive(Debug, Deserialize)]
struct FeedPage {
    #[serde(default)]
    value: Vec<Value>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
    #[serde(rename = "@odata.deltaLink")]
    delta_link: Option<String>,
}

/// Single-pass, non-restartable iterator over a remote event feed.
pub struct EventPager {
    connection: Connection,
    items: VecDeque<Value>,
    next_link: Option<String>,
    delta_link: Option<String>,
    exhausted: bool,
    pages_fetched: usize,
}

impl EventPager {
    /// Open the feed and fetch the first page eagerly.
    ///
    /// `options` carries the feed URL and query params (window or delta
    /// token); the pager adds its own pagination preferences.
    pub async fn open(connection: &Connection, options: RequestOptions) -> Result<Self> {
        let mut pager = Self {
            connection: connection.clone(),
            items: VecDeque::new(),
            next_link: None,
            delta_link: None,
            exhausted: false,
            pages_fetched: 0,
        };

        pager.fetch_first(options).await?;
        Ok(pager)
    }

    /// Pull the next raw item record.
    ///
    /// Returns `Ok(Some(record))` per item in server order, `Ok(None)` once
    /// the feed is exhausted, and `Err` when a continuation fetch fails.
    /// Items already returned stay valid after an error, but the pass must
    /// be treated as incomplete.
    pub async fn next_record(&mut self) -> Result<Option<Value>> {
        loop {
            if let Some(item) = self.items.pop_front() {
                return Ok(Some(item));
            }
            if self.exhausted {
                return Ok(None);
            }

            match self.next_link.take() {
                Some(link) => self.fetch_continuation(&link).await?,
                None => {
                    self.exhausted = true;
                    return Ok(None);
                }
            }
        }
    }

    /// Resumption token captured from the feed's delta link, if the feed
    /// completed with one.
    pub fn delta_token(&self) -> Option<&str> {
        self.delta_link.as_deref()
    }

    async fn fetch_first(&mut self, mut options: RequestOptions) -> Result<()> {
        let page_size = self.connection.config().first_page_size;
        options.header("Prefer", self.prefer_value(page_size));
        options.promote_delta_param();
        options.apply_default_headers()?;

        self.fetch_page(options).await
    }

    async fn fetch_continuation(&mut self, link: &str) -> Result<()> {
        let page_size = self.connection.config().next_page_size;
        let mut options = self
            .connection
            .prepare(Method::GET, link)
            .await
            .map_err(|err| GraphCalError::Read(err.to_string()))?;
        options.header("Prefer", self.prefer_value(page_size));
        options.apply_default_headers()?;

        self.fetch_page(options).await
    }

    async fn fetch_page(&mut self, options: RequestOptions) -> Result<()> {
        let response = match self.connection.get(options).await {
            Ok(response) => response,
            Err(err) => return Err(GraphCalError::Read(err.to_string())),
        };

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = extract_odata_message(&text)
                .unwrap_or_else(|| format!("feed page fetch failed ({status})"));
            return Err(GraphCalError::Read(format!("{message} (status {})", status.as_u16())));
        }

        let page: FeedPage = response
            .json()
            .await
            .map_err(|err| GraphCalError::Read(format!("malformed feed page: {err}")))?;

        self.pages_fetched += 1;
        debug!(
            page = self.pages_fetched,
            items = page.value.len(),
            has_next = page.next_link.is_some(),
            has_delta = page.delta_link.is_some(),
            "fetched feed page"
        );

        self.items.extend(page.value);

        if let Some(delta) = page.delta_link {
            // Delta link terminates the feed for this pass.
            if page.next_link.is_some() {
                warn!("feed page carried both next and delta links; honoring the delta link");
            }
            self.delta_link = Some(delta);
            self.next_link = None;
            self.exhausted = self.items.is_empty();
        } else {
            self.next_link = page.next_link;
            if self.next_link.is_none() {
                self.exhausted = self.items.is_empty();
            }
        }

        Ok(())
    }

    fn prefer_value(&self, page_size: usize) -> String {
        format!(
            "odata.maxpagesize={page_size}, {PREFER_TRACK_CHANGES}, outlook.timezone=\"{}\"",
            self.connection.config().timezone
        )
    }
}

/// Pull the vendor error message out of an OData error body, when present.
fn extract_odata_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .and_then(|error| error.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
