//! Captured-entry and pages-buffer data model.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Availability of the monitored layers for the current page lifetime.
///
/// Terminal once resolved: a page that reported `Found` or `NotFound`
/// never transitions again until navigation resets the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Availability {
    Loading,
    Found,
    NotFound,
}

impl Availability {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Availability::Loading)
    }
}

/// One observed push into a monitored layer. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedEntry {
    pub id: Uuid,
    /// Name of the layer the value was pushed into (e.g. `dataLayer`).
    pub source_name: String,
    /// Sanitized form of the pushed value.
    pub payload: Value,
    /// Call-site trace supplied by the pusher, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_info: Option<String>,
    /// Offset from the page-load origin, never negative.
    pub after_load_ms: u64,
}

/// Entries captured over one page navigation/load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    pub id: Uuid,
    pub url: String,
    pub entries: Vec<CapturedEntry>,
    pub updated_at_ms: i64,
}

impl PageRecord {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
            entries: Vec::new(),
            updated_at_ms: Utc::now().timestamp_millis(),
        }
    }

    /// Append at the tail; entries only grow during the record's lifetime.
    pub fn append(&mut self, entry: CapturedEntry) {
        self.entries.push(entry);
        self.updated_at_ms = Utc::now().timestamp_millis();
    }
}

/// Bounded history of page records, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagesBuffer {
    pub pages: Vec<PageRecord>,
    pub max_pages: u32,
    pub updated_at_ms: i64,
}

impl PagesBuffer {
    pub fn empty(max_pages: u32) -> Self {
        Self {
            pages: Vec::new(),
            max_pages,
            updated_at_ms: Utc::now().timestamp_millis(),
        }
    }

    pub fn touch(&mut self) {
        self.updated_at_ms = Utc::now().timestamp_millis();
    }
}

/// Request payload for `GET_PAGES_ENTRIES`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagesQuery {
    pub max_pages: u32,
}

/// Response payload for `GET_STATUS`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReply {
    pub status: Availability,
}

/// Payload for `SYNC_STATUS` pushed at the badge sink.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSync {
    pub status: Availability,
    /// Entries captured on the current page so far.
    pub count: usize,
}
