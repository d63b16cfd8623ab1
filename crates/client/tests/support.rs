use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use graphcal_client::{BatchResultHandler, GraphClientConfig, SyncHandler};
use graphcal_domain::{BatchOutcome, EventRecord, GraphCalError, PendingMutation, Result};

/// Sync handler that records every callback for later assertions.
#[derive(Default)]
pub struct RecordingHandler {
    pub saved: Mutex<Vec<EventRecord>>,
    pub deleted: Mutex<Vec<String>>,
    pub persisted_tokens: Mutex<Vec<String>>,
    pub resets: Mutex<usize>,
    pub stored_token: Mutex<Option<String>>,
    pub pending: Mutex<Vec<PendingMutation>>,
    pub single_results: Mutex<Vec<Vec<(String, GraphCalError)>>>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stored_token(token: &str) -> Self {
        let handler = Self::default();
        *handler.stored_token.lock().unwrap() = Some(token.to_string());
        handler
    }

    pub fn with_pending(pending: Vec<PendingMutation>) -> Self {
        let handler = Self::default();
        *handler.pending.lock().unwrap() = pending;
        handler
    }

    pub fn saved_ids(&self) -> Vec<String> {
        self.saved.lock().unwrap().iter().map(|event| event.id().to_string()).collect()
    }
}

#[async_trait]
impl SyncHandler for RecordingHandler {
    async fn on_save(&self, event: EventRecord) -> Result<()> {
        self.saved.lock().unwrap().push(event);
        Ok(())
    }

    async fn on_delete(&self, remote_id: &str) -> Result<()> {
        self.deleted.lock().unwrap().push(remote_id.to_string());
        Ok(())
    }

    async fn stored_delta_token(&self) -> Result<Option<String>> {
        Ok(self.stored_token.lock().unwrap().clone())
    }

    async fn persist_delta_token(&self, token: &str) -> Result<()> {
        self.persisted_tokens.lock().unwrap().push(token.to_string());
        Ok(())
    }

    async fn reset_delta_token(&self) -> Result<()> {
        *self.resets.lock().unwrap() += 1;
        *self.stored_token.lock().unwrap() = None;
        Ok(())
    }

    async fn pending_mutations(&self) -> Result<Vec<PendingMutation>> {
        Ok(self.pending.lock().unwrap().clone())
    }

    async fn on_single_result(&self, failures: Vec<(String, GraphCalError)>) -> Result<()> {
        self.single_results.lock().unwrap().push(failures);
        Ok(())
    }
}

/// Batch result handler that records every call.
#[derive(Default)]
pub struct RecordingBatchHandler {
    pub calls: Mutex<Vec<HashMap<String, BatchOutcome>>>,
}

impl RecordingBatchHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BatchResultHandler for RecordingBatchHandler {
    async fn on_batch_result(&self, outcomes: HashMap<String, BatchOutcome>) -> Result<()> {
        self.calls.lock().unwrap().push(outcomes);
        Ok(())
    }
}

/// Client config pointed at a mock server, with fast timing knobs.
pub fn test_config(base_url: &str) -> GraphClientConfig {
    GraphClientConfig {
        base_url: base_url.to_string(),
        retry_unit: Duration::from_millis(1),
        dispatch_delay: Duration::from_millis(1),
        ..Default::default()
    }
}
