//! Typed frame envelope for the broadcast bus.
//!
//! The original transport carried `{id, source, event, data, handled}`
//! objects with string-typed event names; the envelope here is the same
//! shape as a tagged union, so dispatch mistakes fail at compile time
//! instead of silently matching nothing.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// An isolated execution context participating on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Endpoint {
    /// The instrumented page: capture agent and batching relay.
    Page,
    /// The page-lifetime aggregator hub.
    Content,
    /// The privileged badge/status sink.
    Background,
    /// The viewer query layer.
    Viewer,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Endpoint::Page => "page",
            Endpoint::Content => "content",
            Endpoint::Background => "background",
            Endpoint::Viewer => "viewer",
        };
        f.write_str(name)
    }
}

/// Event vocabulary across all endpoint pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// Page -> Content: at least one monitored layer became observable.
    EntryFound,
    /// Page -> Content: no monitored layer appeared before the deadline.
    EntryNotFound,
    /// Page -> Content: a coalesced batch of captured entries.
    EntriesBatch,
    /// Viewer -> Content: current availability state.
    GetStatus,
    /// Viewer -> Content: the buffered pages view.
    GetPagesEntries,
    /// Viewer -> Content: drop all persisted history.
    RemovePagesEntries,
    /// Viewer -> Content: persist a configuration change.
    SyncConfig,
    /// Viewer -> Content: read the stored configuration.
    LoadConfig,
    /// Content -> Background: badge status and entry count.
    SyncStatus,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::EntryFound => "ENTRY_FOUND",
            EventKind::EntryNotFound => "ENTRY_NOT_FOUND",
            EventKind::EntriesBatch => "ENTRIES_BATCH",
            EventKind::GetStatus => "GET_STATUS",
            EventKind::GetPagesEntries => "GET_PAGES_ENTRIES",
            EventKind::RemovePagesEntries => "REMOVE_PAGES_ENTRIES",
            EventKind::SyncConfig => "SYNC_CONFIG",
            EventKind::LoadConfig => "LOAD_CONFIG",
            EventKind::SyncStatus => "SYNC_STATUS",
        };
        f.write_str(name)
    }
}

/// One correlated message on the bus.
///
/// `id` is unique among a sender's concurrently outstanding requests; a
/// response echoes the request's `id` and `event` and sets `handled`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub id: u64,
    pub from: Endpoint,
    pub to: Endpoint,
    pub event: EventKind,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub handled: bool,
}

impl Frame {
    /// Build the request half of a round-trip.
    pub fn request(id: u64, from: Endpoint, to: Endpoint, event: EventKind, data: Value) -> Self {
        Self {
            id,
            from,
            to,
            event,
            data,
            handled: false,
        }
    }

    /// Build the response half, echoing `id` and `event` back at the sender.
    pub fn response(&self, from: Endpoint, data: Value) -> Self {
        Self {
            id: self.id,
            from,
            to: self.from,
            event: self.event,
            data,
            handled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), serde_json::Error>;

    #[test]
    fn event_names_match_wire_form() -> TestResult {
        let encoded = serde_json::to_string(&EventKind::EntriesBatch)?;
        assert_eq!(encoded, "\"ENTRIES_BATCH\"");
        assert_eq!(EventKind::EntriesBatch.to_string(), "ENTRIES_BATCH");
        Ok(())
    }

    #[test]
    fn response_echoes_id_and_event() {
        let request = Frame::request(
            7,
            Endpoint::Viewer,
            Endpoint::Content,
            EventKind::GetStatus,
            Value::Null,
        );
        let response = request.response(Endpoint::Content, serde_json::json!({"status": "FOUND"}));

        assert_eq!(response.id, request.id);
        assert_eq!(response.event, request.event);
        assert_eq!(response.to, Endpoint::Viewer);
        assert_eq!(response.from, Endpoint::Content);
        assert!(response.handled);
    }

    #[test]
    fn frame_roundtrips_through_json() -> TestResult {
        let frame = Frame::request(
            1,
            Endpoint::Page,
            Endpoint::Content,
            EventKind::EntryFound,
            Value::Bool(true),
        );
        let text = serde_json::to_string(&frame)?;
        let decoded: Frame = serde_json::from_str(&text)?;
        assert_eq!(decoded.id, 1);
        assert_eq!(decoded.from, Endpoint::Page);
        assert_eq!(decoded.event, EventKind::EntryFound);
        assert!(!decoded.handled);
        Ok(())
    }
}
