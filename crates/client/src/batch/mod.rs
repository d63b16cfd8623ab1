//! Batch multiplexing: correlation context, multipart formatting, and
//! response demultiplexing.
//!
//! The [`BatchContext`] is the correlation-id → metadata map for exactly one
//! batch submission. It is constructed fresh per call and threaded through
//! formatting, dispatch, and demux, so concurrent sync passes can never
//! cross-contaminate each other's outcome metadata.

pub mod demux;
pub mod format;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use graphcal_domain::{EventInfo, EventRecord, PendingMutation};

pub use demux::demux_batch_response;
pub use format::{assemble_batch_body, format_part, BatchPart};

/// Caller-supplied hydration hook for batch success bodies.
pub type Hydrator = Arc<dyn Fn(&Value) -> Option<EventRecord> + Send + Sync>;

/// Per-submission correlation state.
#[derive(Clone, Default)]
pub struct BatchContext {
    infos: HashMap<String, EventInfo>,
    hydrator: Option<Hydrator>,
}

impl BatchContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom hydrator for success bodies instead of
    /// [`EventRecord::hydrate`].
    pub fn with_hydrator(mut self, hydrator: Hydrator) -> Self {
        self.hydrator = Some(hydrator);
        self
    }

    /// Record the metadata of a queued mutation, keyed by its correlation
    /// id.
    pub fn register(&mut self, mutation: &PendingMutation) {
        self.infos.insert(mutation.id().to_string(), mutation.info());
    }

    /// Metadata for a correlation id, if it was registered.
    pub fn info(&self, correlation_id: &str) -> Option<&EventInfo> {
        self.infos.get(correlation_id)
    }

    /// All registered correlation ids with their metadata.
    pub fn registrations(&self) -> impl Iterator<Item = (&String, &EventInfo)> {
        self.infos.iter()
    }

    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Hydrate a success body through the custom hook when present.
    pub(crate) fn hydrate(&self, body: &Value) -> Option<EventRecord> {
        match &self.hydrator {
            Some(hydrator) => hydrator(body),
            None => EventRecord::hydrate(body),
        }
    }
}

impl std::fmt::Debug for BatchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchContext")
            .field("infos", &self.infos)
            .field("custom_hydrator", &self.hydrator.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphcal_domain::{EventDelete, EventPayload, EventType, EventWriter, RequestMethod};

    #[test]
    fn register_keys_infos_by_mutation_id() {
        let mut ctx = BatchContext::new();
        ctx.register(&PendingMutation::Write(EventWriter {
            id: "w1".into(),
            remote_id: None,
            method: RequestMethod::Post,
            path: "/me/events".into(),
            event_type: EventType::SingleInstance,
            sensitivity: None,
            payload: EventPayload::default(),
        }));
        ctx.register(&PendingMutation::Delete(EventDelete {
            id: "d1".into(),
            remote_id: "r1".into(),
            path: "/me/events/r1".into(),
        }));

        assert_eq!(ctx.len(), 2);
        assert!(ctx.info("w1").is_some());
        assert!(ctx.info("d1").map(|info| info.is_delete).unwrap_or(false));
        assert!(ctx.info("missing").is_none());
    }
}
