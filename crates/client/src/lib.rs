//! # GraphCal Client
//!
//! HTTP client layer for the GraphCal calendar sync SDK.
//!
//! This crate contains:
//! - A retrying HTTP client wrapper over reqwest
//! - Request option builders (default, batch, delta)
//! - The Graph connection: reads, writes, and batch dispatch
//! - Delta-feed pagination
//! - Multipart batch formatting and response demultiplexing
//! - The sync engine orchestrating pull and push passes
//!
//! ## Architecture
//! - Depends on `graphcal-domain` for types and errors
//! - Contains all "impure" code (network I/O)
//! - Collaborators (token source, persistence) are trait seams

pub mod batch;
pub mod config;
pub mod connection;
pub mod delta;
pub mod http;
pub mod pager;
pub mod request;
pub mod sync;
pub mod token;

// Re-export commonly used items
pub use batch::{assemble_batch_body, demux_batch_response, format_part, BatchContext, BatchPart};
pub use config::{BatchStrategy, GraphClientConfig, SyncWindow};
pub use connection::Connection;
pub use http::HttpClient;
pub use pager::EventPager;
pub use request::RequestOptions;
pub use sync::{BatchResultHandler, SyncEngine, SyncEngineBuilder, SyncHandler, SyncReport};
pub use token::{StaticTokenProvider, TokenProvider};
