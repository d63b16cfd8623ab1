//! # GraphCal Domain
//!
//! Domain types and models for the GraphCal calendar sync SDK.
//!
//! This crate contains:
//! - Event records, write payloads, and batch outcome types
//! - Domain error types and Result definitions
//! - Closed enums for the Graph wire vocabulary
//! - Domain constants and limits
//!
//! ## Architecture
//! - No dependencies on other GraphCal crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use errors::*;
pub use types::*;
