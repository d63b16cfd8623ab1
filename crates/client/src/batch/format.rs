//! Multipart batch sub-request formatting.
//!
//! Each mutation becomes an HTTP-in-HTTP part: a literal request line, a
//! Content-Type line, and the JSON payload, every segment CRLF-terminated.
//! Segments are appended to the part buffer one at a time; entities are
//! never re-buffered wholesale, which keeps large batches cheap to build.

use tracing::error;

use graphcal_domain::PendingMutation;

const CRLF: &str = "\r\n";

/// One formatted sub-request of a multipart batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPart {
    /// Correlation id, sent as the part's `Content-ID`.
    pub content_id: String,
    /// Part-level headers (the HTTP-in-HTTP framing).
    pub headers: Vec<(String, String)>,
    /// Raw sub-request text.
    pub contents: String,
}

impl BatchPart {
    /// A part with no contents is a formatting casualty; callers skip it.
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    fn empty(content_id: String) -> Self {
        Self { content_id, headers: Vec::new(), contents: String::new() }
    }
}

/// Format one mutation into a batch part.
///
/// Serialization failure is logged and yields an empty part rather than an
/// error: one unserializable item must not sink the batch.
pub fn format_part(mutation: &PendingMutation) -> BatchPart {
    let content_id = mutation.id().to_string();

    let mut contents = String::new();
    contents.push_str(mutation.method().as_str());
    contents.push(' ');
    contents.push_str(mutation.path());
    contents.push_str(" HTTP/1.1");
    contents.push_str(CRLF);

    if let PendingMutation::Write(writer) = mutation {
        let body = match serde_json::to_string(&writer.payload) {
            Ok(body) => body,
            Err(err) => {
                error!(
                    correlation_id = %content_id,
                    error = %err,
                    "failed to serialize batch payload; skipping item"
                );
                return BatchPart::empty(content_id);
            }
        };

        contents.push_str("Content-Type: application/json");
        contents.push_str(CRLF);
        contents.push_str(CRLF);
        contents.push_str(&body);
        contents.push_str(CRLF);
    } else {
        contents.push_str(CRLF);
    }

    let headers = vec![
        ("Content-Type".to_string(), "application/http".to_string()),
        ("Content-Transfer-Encoding".to_string(), "binary".to_string()),
        ("Content-ID".to_string(), content_id.clone()),
    ];

    BatchPart { content_id, headers, contents }
}

/// Assemble the full multipart body from formatted parts.
///
/// Empty parts are skipped. The body closes with the terminal
/// `--{boundary}--` delimiter.
pub fn assemble_batch_body(parts: &[BatchPart], boundary: &str) -> String {
    let mut body = String::new();

    for part in parts.iter().filter(|part| !part.is_empty()) {
        body.push_str("--");
        body.push_str(boundary);
        body.push_str(CRLF);

        for (name, value) in &part.headers {
            body.push_str(name);
            body.push_str(": ");
            body.push_str(value);
            body.push_str(CRLF);
        }

        body.push_str(CRLF);
        body.push_str(&part.contents);
        body.push_str(CRLF);
    }

    body.push_str("--");
    body.push_str(boundary);
    body.push_str("--");
    body.push_str(CRLF);

    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphcal_domain::{
        EventDelete, EventPayload, EventType, EventWriter, RequestMethod, Sensitivity,
    };

    fn writer(id: &str) -> PendingMutation {
        PendingMutation::Write(EventWriter {
            id: id.into(),
            remote_id: None,
            method: RequestMethod::Post,
            path: "/me/events".into(),
            event_type: EventType::SingleInstance,
            sensitivity: Some(Sensitivity::Normal),
            payload: EventPayload { subject: Some("standup".into()), ..Default::default() },
        })
    }

    #[test]
    fn write_part_has_request_line_content_type_and_body() {
        let part = format_part(&writer("w1"));

        assert_eq!(part.content_id, "w1");
        let mut lines = part.contents.split("\r\n");
        assert_eq!(lines.next(), Some("POST /me/events HTTP/1.1"));
        assert_eq!(lines.next(), Some("Content-Type: application/json"));
        assert_eq!(lines.next(), Some(""));
        let body = lines.next().expect("json body");
        assert!(body.contains("\"subject\":\"standup\""));
    }

    #[test]
    fn delete_part_has_no_body() {
        let part = format_part(&PendingMutation::Delete(EventDelete {
            id: "d1".into(),
            remote_id: "r1".into(),
            path: "/me/events/r1".into(),
        }));

        assert!(part.contents.starts_with("DELETE /me/events/r1 HTTP/1.1\r\n"));
        assert!(!part.contents.contains("Content-Type: application/json"));
    }

    #[test]
    fn part_headers_carry_http_framing_and_content_id() {
        let part = format_part(&writer("w2"));
        assert!(part
            .headers
            .contains(&("Content-Type".to_string(), "application/http".to_string())));
        assert!(part
            .headers
            .contains(&("Content-Transfer-Encoding".to_string(), "binary".to_string())));
        assert!(part.headers.contains(&("Content-ID".to_string(), "w2".to_string())));
    }

    #[test]
    fn assembled_body_is_boundary_delimited_and_terminated() {
        let parts = vec![format_part(&writer("w1")), format_part(&writer("w2"))];
        let body = assemble_batch_body(&parts, "batch_test");

        assert_eq!(body.matches("--batch_test\r\n").count(), 2);
        assert!(body.ends_with("--batch_test--\r\n"));
        assert!(body.contains("Content-ID: w1"));
        assert!(body.contains("Content-ID: w2"));
    }

    #[test]
    fn empty_parts_are_skipped_in_assembly() {
        let parts = vec![BatchPart::empty("broken".into()), format_part(&writer("w1"))];
        let body = assemble_batch_body(&parts, "batch_test");

        assert_eq!(body.matches("--batch_test\r\n").count(), 1);
        assert!(!body.contains("Content-ID: broken"));
    }
}
