//! Domain types and models
//!
//! Typed representations of the Graph calendar wire vocabulary, hydrated
//! event records, pending mutations, and batch outcomes.

pub mod batch;
pub mod enums;
pub mod event;

pub use batch::{BatchOutcome, EventDelete, EventInfo, EventWriter, OutcomeKind, PendingMutation};
pub use enums::{ChangeType, EventType, FreeBusyStatus, RequestMethod, Sensitivity};
pub use event::{
    EventBody, EventDateTime, EventPayload, EventRecord, ExtendedProperties, PropertyValue,
};
