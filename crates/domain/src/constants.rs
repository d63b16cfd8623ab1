//! Domain constants
//!
//! Centralized location for the limits and wire-level constants shared by
//! the sync engine and its collaborators.

// Graph endpoint configuration
pub const GRAPH_API_BASE: &str = "https://graph.microsoft.com/v1.0";
pub const CALENDAR_VIEW_DELTA_PATH: &str = "/me/calendarView/delta";
pub const BATCH_PATH: &str = "/$batch";

// Batch limits
pub const MAX_BATCH_SIZE: usize = 20;

// Retry policy
pub const MAX_RETRIES: usize = 3;
pub const RETRY_UNIT_MS: u64 = 500;

// Pagination preferences. The first page is deliberately tiny so that auth
// or configuration problems fail before any bulk fetch.
pub const FIRST_PAGE_SIZE: usize = 1;
pub const NEXT_PAGE_SIZE: usize = 50;

// Batch fan-out pacing
pub const DISPATCH_DELAY_MS: u64 = 20;

// Header names and Prefer values
pub const HEADER_CLIENT_REQUEST_ID: &str = "client-request-id";
pub const PREFER_TRACK_CHANGES: &str = "odata.track-changes";
pub const PREFER_CONTINUE_ON_ERROR: &str = "odata.continue-on-error";

// Delta continuation query keys
pub const DELTA_TOKEN_PARAM: &str = "$deltatoken";
pub const SKIP_TOKEN_PARAM: &str = "$skiptoken";

// Fallback vendor error code for sub-responses that omit one
pub const UNKNOWN_ERROR_CODE: &str = "unknown";
