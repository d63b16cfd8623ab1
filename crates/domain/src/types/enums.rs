//! Closed enums for the Graph calendar wire vocabulary.
//!
//! Each category the vendor models as loose string constants is a proper
//! tagged enum here, matched exhaustively at every point of use.

use serde::{Deserialize, Serialize};

/// Kind of calendar event as reported by the `type` tag on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventType {
    SingleInstance,
    Occurrence,
    SeriesMaster,
    Exception,
}

impl EventType {
    /// Wire name of the variant.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SingleInstance => "singleInstance",
            Self::Occurrence => "occurrence",
            Self::SeriesMaster => "seriesMaster",
            Self::Exception => "exception",
        }
    }

    /// Parse the wire tag. Unknown tags map to `None` so callers can fall
    /// back leniently instead of failing a whole page.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "singleInstance" => Some(Self::SingleInstance),
            "occurrence" => Some(Self::Occurrence),
            "seriesMaster" => Some(Self::SeriesMaster),
            "exception" => Some(Self::Exception),
            _ => None,
        }
    }
}

impl Default for EventType {
    fn default() -> Self {
        Self::SingleInstance
    }
}

/// Reason carried by a delta-feed `@removed` notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeType {
    /// The event left the synced view without being deleted, e.g. it was
    /// moved to another folder.
    Changed,
    /// The event was deleted outright.
    Deleted,
}

impl ChangeType {
    /// Wire name of the variant.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Changed => "changed",
            Self::Deleted => "deleted",
        }
    }

    /// Parse the wire reason. Unknown reasons map to `None`; a removal
    /// notice is still honored without one.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "changed" => Some(Self::Changed),
            "deleted" => Some(Self::Deleted),
            _ => None,
        }
    }
}

/// Free/busy status (`showAs` on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FreeBusyStatus {
    Free,
    Tentative,
    Busy,
    Oof,
    WorkingElsewhere,
    Unknown,
}

impl Default for FreeBusyStatus {
    fn default() -> Self {
        Self::Unknown
    }
}

/// Event sensitivity classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Sensitivity {
    Normal,
    Personal,
    Private,
    Confidential,
}

impl Default for Sensitivity {
    fn default() -> Self {
        Self::Normal
    }
}

/// HTTP method of a queued remote mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestMethod {
    Get,
    Post,
    Patch,
    Delete,
}

impl RequestMethod {
    /// Request-line spelling of the method.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
