//! Calendar sync engine.
//!
//! Orchestrates one sync pass: a pull phase that pages the remote feed and
//! routes each record to the caller's callbacks, then a push phase that
//! submits pending local mutations either batched or one at a time.
//!
//! Callbacks fire synchronously as records are read, so a pass that fails
//! midway still delivers partial progress before the error propagates.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use reqwest::Method;
use tracing::{debug, info, instrument, warn};

use graphcal_domain::constants::CALENDAR_VIEW_DELTA_PATH;
use graphcal_domain::{
    BatchOutcome, ChangeType, EventRecord, GraphCalError, PendingMutation, Result,
};

use crate::batch::BatchContext;
use crate::config::{BatchStrategy, GraphClientConfig};
use crate::connection::Connection;
use crate::delta::delta_query_params;
use crate::pager::EventPager;
use crate::token::TokenProvider;

/// Persistence-side collaborator of the sync engine.
///
/// The engine never stores anything itself; every side effect of a pass
/// lands through these callbacks, delivered at least once.
#[async_trait]
pub trait SyncHandler: Send + Sync {
    /// A pulled record was hydrated; persist it.
    async fn on_save(&self, event: EventRecord) -> Result<()>;

    /// The feed reported a removal; delete the local copy.
    async fn on_delete(&self, remote_id: &str) -> Result<()>;

    /// Resumption token stored by a previous pass, if any.
    async fn stored_delta_token(&self) -> Result<Option<String>>;

    /// Persist the resumption token for the next pass.
    async fn persist_delta_token(&self, token: &str) -> Result<()>;

    /// Drop the stored resumption token so the next pass starts over.
    async fn reset_delta_token(&self) -> Result<()>;

    /// Local mutations awaiting push.
    async fn pending_mutations(&self) -> Result<Vec<PendingMutation>>;

    /// Per-item push results when batch mode is off; `failures` pairs each
    /// failed mutation id with its error.
    async fn on_single_result(&self, failures: Vec<(String, GraphCalError)>) -> Result<()>;
}

/// Batch-mode result collaborator. Kept separate from [`SyncHandler`]
/// because batch mode is optional; requesting it without wiring this
/// handler is a configuration error.
#[async_trait]
pub trait BatchResultHandler: Send + Sync {
    async fn on_batch_result(&self, outcomes: HashMap<String, BatchOutcome>) -> Result<()>;
}

/// Summary of one sync pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub events_saved: usize,
    pub events_deleted: usize,
    pub occurrences_skipped: usize,
    pub records_skipped: usize,
    pub mutations_pushed: usize,
    pub batches_submitted: usize,
    pub delta_token_persisted: bool,
}

/// Calendar sync engine.
pub struct SyncEngine {
    connection: Connection,
    handler: Arc<dyn SyncHandler>,
    batch_handler: Option<Arc<dyn BatchResultHandler>>,
}

/// Builder for [`SyncEngine`].
pub struct SyncEngineBuilder {
    config: GraphClientConfig,
    token_provider: Arc<dyn TokenProvider>,
    handler: Option<Arc<dyn SyncHandler>>,
    batch_handler: Option<Arc<dyn BatchResultHandler>>,
}

impl SyncEngineBuilder {
    pub fn new(config: GraphClientConfig, token_provider: Arc<dyn TokenProvider>) -> Self {
        Self { config, token_provider, handler: None, batch_handler: None }
    }

    pub fn handler(mut self, handler: Arc<dyn SyncHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn batch_results(mut self, handler: Arc<dyn BatchResultHandler>) -> Self {
        self.batch_handler = Some(handler);
        self
    }

    pub fn build(self) -> Result<SyncEngine> {
        let handler = self.handler.ok_or_else(|| {
            GraphCalError::InvalidConfiguration("sync engine requires a handler".into())
        })?;
        let connection = Connection::new(self.config, self.token_provider)?;

        Ok(SyncEngine { connection, handler, batch_handler: self.batch_handler })
    }
}

impl SyncEngine {
    pub fn builder(
        config: GraphClientConfig,
        token_provider: Arc<dyn TokenProvider>,
    ) -> SyncEngineBuilder {
        SyncEngineBuilder::new(config, token_provider)
    }

    /// Perform one full sync pass: pull, then push.
    ///
    /// A pull failure propagates after already-read records have fired
    /// their callbacks; it never silently truncates the pass.
    #[instrument(skip(self))]
    pub async fn sync(&self) -> Result<SyncReport> {
        info!("starting calendar sync");
        let mut report = SyncReport::default();

        self.pull(&mut report).await?;
        self.push(&mut report).await?;

        info!(
            saved = report.events_saved,
            deleted = report.events_deleted,
            pushed = report.mutations_pushed,
            "calendar sync completed"
        );
        Ok(report)
    }

    /// Pull phase only.
    pub async fn pull(&self, report: &mut SyncReport) -> Result<()> {
        let config = self.connection.config().clone();
        let url = self.connection.absolute_url(CALENDAR_VIEW_DELTA_PATH);
        let mut options = self.connection.prepare(Method::GET, url).await?;

        let stored_token = self.handler.stored_delta_token().await?;
        match stored_token.as_deref().filter(|token| !token.trim().is_empty()) {
            Some(token) => {
                debug!("resuming incremental sync from stored delta token");
                for (key, value) in delta_query_params(token)? {
                    options.query(key, value);
                }
            }
            None => {
                let now = Utc::now();
                let start = now - ChronoDuration::hours(i64::from(config.window.lookback_hours));
                let end = now + ChronoDuration::hours(i64::from(config.window.lookahead_hours));
                options.query("startDateTime", start.to_rfc3339());
                options.query("endDateTime", end.to_rfc3339());
                if !config.select_fields.is_empty() {
                    options.query("$select", config.select_fields.join(","));
                }
            }
        }

        let mut pager = match EventPager::open(&self.connection, options).await {
            Ok(pager) => pager,
            Err(err) => return Err(self.handle_pull_error(err).await),
        };

        loop {
            let record = match pager.next_record().await {
                Ok(Some(record)) => record,
                Ok(None) => break,
                Err(err) => return Err(self.handle_pull_error(err).await),
            };

            let Some(event) = EventRecord::hydrate(&record) else {
                warn!("skipping feed record without an id");
                report.records_skipped += 1;
                continue;
            };

            match event {
                EventRecord::Removed { id, reason } => {
                    debug!(
                        remote_id = %id,
                        reason = reason.map_or("unspecified", ChangeType::as_str),
                        "feed reported a removal"
                    );
                    self.handler.on_delete(&id).await?;
                    report.events_deleted += 1;
                }
                EventRecord::Occurrence(_) if config.skip_occurrences => {
                    report.occurrences_skipped += 1;
                }
                other => {
                    self.handler.on_save(other).await?;
                    report.events_saved += 1;
                }
            }
        }

        if let Some(token) = pager.delta_token() {
            self.handler.persist_delta_token(token).await?;
            report.delta_token_persisted = true;
            debug!("persisted delta token for next pass");
        } else {
            debug!("feed returned no delta token; leaving existing token unchanged");
        }

        Ok(())
    }

    /// Push phase only.
    pub async fn push(&self, report: &mut SyncReport) -> Result<()> {
        let config = self.connection.config().clone();
        let mutations = self.handler.pending_mutations().await?;
        if mutations.is_empty() {
            debug!("no pending mutations to push");
            return Ok(());
        }

        if config.batch_mode {
            // Validate the collaborator before touching the network.
            let batch_handler = self.batch_handler.clone().ok_or_else(|| {
                GraphCalError::InvalidConfiguration(
                    "batch mode requires a batch result handler".into(),
                )
            })?;

            for chunk in mutations.chunks(config.batch_limit) {
                let mut ctx = BatchContext::new();
                let outcomes = match config.batch_strategy {
                    BatchStrategy::FanOut => {
                        self.connection.execute_batch(chunk, &mut ctx).await?
                    }
                    BatchStrategy::Multipart => {
                        self.connection.execute_batch_multipart(chunk, &mut ctx).await?
                    }
                };
                batch_handler.on_batch_result(outcomes).await?;
                report.batches_submitted += 1;
                report.mutations_pushed += chunk.len();
            }
            return Ok(());
        }

        let mut failures = Vec::new();
        for mutation in &mutations {
            match self.dispatch_one(mutation).await {
                Ok(()) => report.mutations_pushed += 1,
                Err(err) => {
                    warn!(id = %mutation.id(), error = %err, "mutation push failed");
                    failures.push((mutation.id().to_string(), err));
                }
            }
        }
        self.handler.on_single_result(failures).await?;

        Ok(())
    }

    async fn dispatch_one(&self, mutation: &PendingMutation) -> Result<()> {
        let url = self.connection.absolute_url(mutation.path());
        let method = match mutation {
            PendingMutation::Write(writer) => match writer.method {
                graphcal_domain::RequestMethod::Patch => Method::PATCH,
                _ => Method::POST,
            },
            PendingMutation::Delete(_) => Method::DELETE,
        };

        let mut options = self.connection.prepare(method, url).await?;
        if let PendingMutation::Write(writer) = mutation {
            options = options.with_body(writer.payload.to_value()?);
        }
        options.apply_default_headers()?;

        let response = match mutation {
            PendingMutation::Write(_) => self.connection.upsert(options).await?,
            PendingMutation::Delete(_) => self.connection.delete(options).await?,
        };

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(GraphCalError::Connection(format!("mutation rejected with {status}")))
        }
    }

    /// An expired delta token (410 Gone) resets the stored token before the
    /// error propagates, so the next pass restarts a full sync.
    async fn handle_pull_error(&self, err: GraphCalError) -> GraphCalError {
        if matches!(&err, GraphCalError::Read(message) if message.contains("410")) {
            warn!("delta token rejected (410 Gone); resetting stored token");
            if let Err(reset_err) = self.handler.reset_delta_token().await {
                warn!(error = %reset_err, "failed to reset stored delta token");
            }
        }
        err
    }
}
