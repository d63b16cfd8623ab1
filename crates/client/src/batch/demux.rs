//! Batch response demultiplexing.
//!
//! The batch response body is `{ "responses": [ { id, status, body }, … ] }`
//! with no ordering guarantee: under continue-on-error the remote may answer
//! sub-requests in any order. Every sub-response produces exactly one
//! outcome, keyed by its correlation id, including ids this client never
//! registered. Registered ids the remote failed to answer are backfilled
//! with error outcomes, so callers always get one outcome per registration.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use graphcal_domain::constants::UNKNOWN_ERROR_CODE;
use graphcal_domain::{
    BatchOutcome, EventBody, EventInfo, EventRecord, GraphCalError, OutcomeKind, Result,
};

use super::BatchContext;

#[derive(Debug, Deserialize)]
struct BatchEnvelope {
    responses: Vec<SubResponse>,
}

#[derive(Debug, Deserialize)]
struct SubResponse {
    id: String,
    status: u16,
    #[serde(default)]
    body: Value,
}

/// Demultiplex a raw batch response into per-correlation-id outcomes.
pub fn demux_batch_response(
    raw: &Value,
    ctx: &BatchContext,
) -> Result<HashMap<String, BatchOutcome>> {
    let envelope: BatchEnvelope = serde_json::from_value(raw.clone())
        .map_err(|err| GraphCalError::Read(format!("malformed batch response: {err}")))?;

    let mut outcomes = HashMap::with_capacity(envelope.responses.len());

    for sub in envelope.responses {
        let info = match ctx.info(&sub.id) {
            Some(info) => info.clone(),
            None => {
                warn!(correlation_id = %sub.id, "batch response for unregistered id");
                EventInfo::default()
            }
        };

        let outcome = classify(sub, info, ctx);
        debug!(
            correlation_id = %outcome.correlation_id,
            status = outcome.status,
            error = outcome.is_error(),
            "demuxed batch sub-response"
        );
        outcomes.insert(outcome.correlation_id.clone(), outcome);
    }

    // A registration with no sub-response would otherwise vanish from the
    // result set.
    for (id, info) in ctx.registrations() {
        if outcomes.contains_key(id) {
            continue;
        }
        warn!(correlation_id = %id, "no batch sub-response for registered id");
        outcomes.insert(
            id.clone(),
            BatchOutcome {
                correlation_id: id.clone(),
                status: 0,
                kind: OutcomeKind::Error {
                    code: UNKNOWN_ERROR_CODE.to_string(),
                    message: "batch response omitted this operation".to_string(),
                },
                info: info.clone(),
            },
        );
    }

    Ok(outcomes)
}

fn classify(sub: SubResponse, info: EventInfo, ctx: &BatchContext) -> BatchOutcome {
    if let Some(error) = sub.body.get("error") {
        let code = error
            .get("code")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_ERROR_CODE)
            .to_string();
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        return BatchOutcome {
            correlation_id: sub.id,
            status: sub.status,
            kind: OutcomeKind::Error { code, message },
            info,
        };
    }

    if sub.status == 204 && info.is_delete {
        return BatchOutcome {
            correlation_id: sub.id,
            status: sub.status,
            kind: OutcomeKind::DeleteConfirmed {
                remote_id: info.remote_id.clone(),
                internal_id: info.internal_id.clone(),
            },
            info,
        };
    }

    let event = ctx.hydrate(&sub.body).unwrap_or_else(|| {
        // Bodyless success (e.g. 204 on a PATCH): fall back to a record
        // carrying the ids we already know.
        EventRecord::Single(EventBody {
            id: info.remote_id.clone().unwrap_or_else(|| info.internal_id.clone()),
            ..Default::default()
        })
    });

    BatchOutcome {
        correlation_id: sub.id,
        status: sub.status,
        kind: OutcomeKind::Success { event },
        info,
    }
}
