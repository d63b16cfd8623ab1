//! Client configuration.

use std::time::Duration;

use graphcal_domain::constants::{
    DISPATCH_DELAY_MS, FIRST_PAGE_SIZE, GRAPH_API_BASE, MAX_BATCH_SIZE, MAX_RETRIES,
    NEXT_PAGE_SIZE, RETRY_UNIT_MS,
};

/// How a push pass submits its mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStrategy {
    /// One concurrent request per mutation, settled together.
    FanOut,
    /// One multipart `$batch` POST carrying every mutation.
    Multipart,
}

/// Date window for a full (non-delta) pull pass.
#[derive(Debug, Clone, Copy)]
pub struct SyncWindow {
    pub lookback_hours: u32,
    pub lookahead_hours: u32,
}

impl Default for SyncWindow {
    fn default() -> Self {
        Self { lookback_hours: 24 * 7, lookahead_hours: 24 * 30 }
    }
}

/// Configuration for the Graph client and sync engine.
#[derive(Debug, Clone)]
pub struct GraphClientConfig {
    /// Base URL for the Graph API.
    pub base_url: String,
    /// Timezone name sent in the `outlook.timezone` preference.
    pub timezone: String,
    /// Timeout for individual API requests.
    pub timeout: Duration,
    /// Max retry attempts for transient read failures.
    pub max_retries: usize,
    /// Unit of the linearly increasing retry delay.
    pub retry_unit: Duration,
    /// Pause between concurrently dispatched batch sub-requests.
    pub dispatch_delay: Duration,
    /// Hard cap on mutations per batch submission.
    pub batch_limit: usize,
    /// Page size requested for the first feed page.
    pub first_page_size: usize,
    /// Page size requested for continuation pages.
    pub next_page_size: usize,
    /// Whether the push phase batches mutations at all.
    pub batch_mode: bool,
    /// Submission mechanism used when `batch_mode` is on.
    pub batch_strategy: BatchStrategy,
    /// Fields requested via `$select` on pull; empty means no projection.
    pub select_fields: Vec<String>,
    /// Skip occurrence records of recurring series during pull.
    pub skip_occurrences: bool,
    /// Date window used when no delta token is stored.
    pub window: SyncWindow,
}

impl Default for GraphClientConfig {
    fn default() -> Self {
        Self {
            base_url: GRAPH_API_BASE.to_string(),
            timezone: "UTC".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: MAX_RETRIES,
            retry_unit: Duration::from_millis(RETRY_UNIT_MS),
            dispatch_delay: Duration::from_millis(DISPATCH_DELAY_MS),
            batch_limit: MAX_BATCH_SIZE,
            first_page_size: FIRST_PAGE_SIZE,
            next_page_size: NEXT_PAGE_SIZE,
            batch_mode: true,
            batch_strategy: BatchStrategy::FanOut,
            select_fields: Vec::new(),
            skip_occurrences: false,
            window: SyncWindow::default(),
        }
    }
}
