//! Typed request wrappers over the bridge, viewer side.

use layerscope_bridge::{Bridge, Debouncer, Result};
use layerscope_protocol::{
    Availability, Config, Endpoint, EventKind, PagesBuffer, PagesQuery, StatusReply,
};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::warn;

pub struct ViewerClient {
    bridge: Arc<Bridge>,
}

impl ViewerClient {
    pub fn new(bridge: Arc<Bridge>) -> Self {
        Self { bridge }
    }

    pub async fn status(&self) -> Result<Availability> {
        let reply: StatusReply = self
            .bridge
            .request(Endpoint::Content, EventKind::GetStatus, &())
            .await?;
        Ok(reply.status)
    }

    pub async fn entries(&self, max_pages: u32) -> Result<PagesBuffer> {
        self.bridge
            .request(
                Endpoint::Content,
                EventKind::GetPagesEntries,
                &PagesQuery { max_pages },
            )
            .await
    }

    pub async fn clear_history(&self) -> Result<()> {
        let _acked: bool = self
            .bridge
            .request(Endpoint::Content, EventKind::RemovePagesEntries, &())
            .await?;
        Ok(())
    }

    pub async fn load_config(&self) -> Result<Config> {
        self.bridge
            .request(Endpoint::Content, EventKind::LoadConfig, &())
            .await
    }

    pub async fn sync_config(&self, config: &Config) -> Result<()> {
        let _acked: bool = self
            .bridge
            .request(Endpoint::Content, EventKind::SyncConfig, config)
            .await?;
        Ok(())
    }
}

/// Debounced config write-back.
///
/// Search-term keystrokes arrive faster than they are worth persisting;
/// the latest queued config wins and is written once per quiet period.
pub struct ConfigSync {
    pending: Arc<Mutex<Option<Config>>>,
    debouncer: Debouncer,
}

impl ConfigSync {
    pub fn new(client: Arc<ViewerClient>, window: Duration) -> Self {
        let pending: Arc<Mutex<Option<Config>>> = Arc::default();
        let queued = Arc::clone(&pending);
        let debouncer = Debouncer::new(window, move || {
            let config = queued
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            let client = Arc::clone(&client);
            async move {
                let Some(config) = config else { return };
                if let Err(error) = client.sync_config(&config).await {
                    warn!(%error, "config sync failed");
                }
            }
        });

        Self { pending, debouncer }
    }

    /// Queue the latest config; the write happens after the quiet period.
    pub fn queue(&self, config: Config) {
        *self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(config);
        self.debouncer.poke();
    }
}
