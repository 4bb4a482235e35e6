//! Badge sink: the privileged endpoint the hub pushes status digests at.

use async_trait::async_trait;
use layerscope_bridge::{Handler, HandlerResult};
use layerscope_protocol::{Availability, EventKind, StatusSync};
use serde_json::Value;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

pub const COLOR_GREEN: &str = "#27ae60";
pub const COLOR_ORANGE: &str = "#e67e22";
pub const COLOR_RED: &str = "#c0392b";
pub const COLOR_WHITE: &str = "#ecf0f1";

/// Rendered badge: short text, colors, hover title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeState {
    pub text: &'static str,
    pub text_color: &'static str,
    pub color: &'static str,
    pub title: String,
}

impl BadgeState {
    fn render(sync: &StatusSync) -> Self {
        match sync.status {
            Availability::Loading => Self {
                text: "WAIT",
                text_color: COLOR_WHITE,
                color: COLOR_ORANGE,
                title: "Checking if a data layer is available on this page...".to_string(),
            },
            Availability::Found => Self {
                text: "OK",
                text_color: COLOR_WHITE,
                color: COLOR_GREEN,
                title: format!(
                    "Data layer is available on this page ({} entries captured).",
                    sync.count
                ),
            },
            Availability::NotFound => Self {
                text: "FAIL",
                text_color: COLOR_WHITE,
                color: COLOR_RED,
                title: "Data layer is not available on this page.".to_string(),
            },
        }
    }
}

/// Background-endpoint responder consuming `SYNC_STATUS`.
#[derive(Default)]
pub struct BadgeService {
    applied: Mutex<Vec<StatusSync>>,
}

impl BadgeService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest rendered badge, if any sync arrived yet.
    pub fn snapshot(&self) -> Option<BadgeState> {
        self.lock().last().map(BadgeState::render)
    }

    /// Every status applied, oldest first.
    pub fn statuses(&self) -> Vec<Availability> {
        self.lock().iter().map(|sync| sync.status).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<StatusSync>> {
        self.applied.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Handler for BadgeService {
    async fn handle(&self, event: EventKind, data: Value) -> HandlerResult {
        if event != EventKind::SyncStatus {
            return Ok(None);
        }
        let sync: StatusSync = serde_json::from_value(data)?;
        debug!(status = ?sync.status, count = sync.count, "badge updated");
        self.lock().push(sync);
        Ok(Some(Value::Bool(true)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_every_state() {
        let waiting = BadgeState::render(&StatusSync {
            status: Availability::Loading,
            count: 0,
        });
        assert_eq!(waiting.text, "WAIT");
        assert_eq!(waiting.color, COLOR_ORANGE);

        let found = BadgeState::render(&StatusSync {
            status: Availability::Found,
            count: 7,
        });
        assert_eq!(found.text, "OK");
        assert_eq!(found.color, COLOR_GREEN);
        assert!(found.title.contains("7 entries"));

        let missing = BadgeState::render(&StatusSync {
            status: Availability::NotFound,
            count: 0,
        });
        assert_eq!(missing.text, "FAIL");
        assert_eq!(missing.color, COLOR_RED);
    }

    #[tokio::test]
    async fn only_status_syncs_are_consumed() {
        let badge = BadgeService::new();

        let ignored = badge
            .handle(EventKind::GetStatus, Value::Null)
            .await
            .unwrap_or(None);
        assert!(ignored.is_none());
        assert!(badge.snapshot().is_none());

        let payload = serde_json::json!({"status": "FOUND", "count": 2});
        let acked = badge
            .handle(EventKind::SyncStatus, payload)
            .await
            .unwrap_or(None);
        assert_eq!(acked, Some(Value::Bool(true)));
        assert_eq!(badge.statuses(), vec![Availability::Found]);
    }
}
