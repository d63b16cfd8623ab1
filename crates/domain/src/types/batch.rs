//! Pending mutations and batch outcome types.
//!
//! A push pass queues [`PendingMutation`]s, each identified by its own
//! correlation id. Every mutation registered before a batch round trip is
//! matched by exactly one [`BatchOutcome`] afterwards, or the whole call
//! fails; outcomes are never silently dropped.

use serde::{Deserialize, Serialize};

use crate::types::enums::{EventType, RequestMethod, Sensitivity};
use crate::types::event::{EventPayload, EventRecord};

/// Transient per-operation metadata recorded when a mutation is queued and
/// consumed when its batch sub-response arrives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventInfo {
    /// Caller-side id of the operation; doubles as the correlation id.
    pub internal_id: String,
    /// Remote id, absent for creates.
    pub remote_id: Option<String>,
    pub method: RequestMethod,
    pub event_type: EventType,
    pub sensitivity: Option<Sensitivity>,
    pub is_delete: bool,
}

impl Default for EventInfo {
    fn default() -> Self {
        Self {
            internal_id: String::new(),
            remote_id: None,
            method: RequestMethod::Get,
            event_type: EventType::SingleInstance,
            sensitivity: None,
            is_delete: false,
        }
    }
}

/// A queued create or update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventWriter {
    /// Stable caller-side id; unique within one batch submission.
    pub id: String,
    /// Remote id when updating an existing event.
    pub remote_id: Option<String>,
    /// POST for creates, PATCH for updates.
    pub method: RequestMethod,
    /// Target path relative to the API base, e.g. `/me/events/{id}`.
    pub path: String,
    pub event_type: EventType,
    pub sensitivity: Option<Sensitivity>,
    pub payload: EventPayload,
}

/// A queued remote deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDelete {
    /// Stable caller-side id; unique within one batch submission.
    pub id: String,
    /// Remote id of the event to delete.
    pub remote_id: String,
    /// Target path relative to the API base.
    pub path: String,
}

/// A pending local mutation awaiting push to the remote calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PendingMutation {
    Write(EventWriter),
    Delete(EventDelete),
}

impl PendingMutation {
    /// Correlation id of the mutation.
    pub fn id(&self) -> &str {
        match self {
            Self::Write(writer) => &writer.id,
            Self::Delete(delete) => &delete.id,
        }
    }

    pub fn method(&self) -> RequestMethod {
        match self {
            Self::Write(writer) => writer.method,
            Self::Delete(_) => RequestMethod::Delete,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Write(writer) => &writer.path,
            Self::Delete(delete) => &delete.path,
        }
    }

    /// Metadata recorded for the batch round trip.
    pub fn info(&self) -> EventInfo {
        match self {
            Self::Write(writer) => EventInfo {
                internal_id: writer.id.clone(),
                remote_id: writer.remote_id.clone(),
                method: writer.method,
                event_type: writer.event_type,
                sensitivity: writer.sensitivity,
                is_delete: false,
            },
            Self::Delete(delete) => EventInfo {
                internal_id: delete.id.clone(),
                remote_id: Some(delete.remote_id.clone()),
                method: RequestMethod::Delete,
                event_type: EventType::SingleInstance,
                sensitivity: None,
                is_delete: true,
            },
        }
    }
}

/// Classification of one batch sub-response.
#[derive(Debug, Clone, PartialEq)]
pub enum OutcomeKind {
    /// The mutation succeeded and the response body hydrated.
    Success { event: EventRecord },
    /// A deletion acknowledged with 204 No Content.
    DeleteConfirmed { remote_id: Option<String>, internal_id: String },
    /// The remote rejected this item; the rest of the batch is unaffected.
    Error { code: String, message: String },
}

/// Per-item result of a batch round trip, correlated back to the mutation
/// that produced it. Immutable after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub correlation_id: String,
    pub status: u16,
    pub kind: OutcomeKind,
    /// Metadata recorded when the mutation was queued; default when the
    /// remote answered for an id that was never registered.
    pub info: EventInfo,
}

impl BatchOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self.kind, OutcomeKind::Error { .. })
    }

    pub fn is_delete_confirmation(&self) -> bool {
        matches!(self.kind, OutcomeKind::DeleteConfirmed { .. })
    }

    /// Hydrated event for success outcomes.
    pub fn event(&self) -> Option<&EventRecord> {
        match &self.kind {
            OutcomeKind::Success { event } => Some(event),
            _ => None,
        }
    }
}
