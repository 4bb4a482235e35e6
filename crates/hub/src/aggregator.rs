//! The aggregator service: single writer of captured history for one
//! page lifetime.
//!
//! Availability resolves `Loading -> Found` or `Loading -> NotFound`
//! exactly once per page. The initial `Loading` badge is withheld for a
//! short grace window, so a page whose layers resolve quickly never
//! flashes the waiting state at the user.

use crate::buffer::PageLog;
use crate::error::Result;
use crate::storage::{KvStore, PAGES_BUFFER_KEY, VIEWER_CONFIG_KEY};
use async_trait::async_trait;
use layerscope_bridge::{Bridge, Debouncer, Handler, HandlerResult, ServiceHandle};
use layerscope_protocol::timing::{FLUSH_DEBOUNCE, STATUS_GRACE};
use layerscope_protocol::{
    Availability, CapturedEntry, Config, Endpoint, EventKind, PagesBuffer, PagesQuery, StatusReply,
    StatusSync,
};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};
use url::Url;

struct HubState {
    availability: Availability,
    log: PageLog,
    config: Config,
}

pub struct Aggregator {
    state: Arc<Mutex<HubState>>,
    store: Arc<dyn KvStore>,
    badge_sync: Debouncer,
    persist: Debouncer,
}

impl Aggregator {
    /// Load persisted state, register the Content responder, and arm the
    /// status grace timer.
    pub async fn start(
        bridge: Arc<Bridge>,
        store: Arc<dyn KvStore>,
        url: &str,
    ) -> Result<(Arc<Self>, ServiceHandle)> {
        let config = load_config(store.as_ref()).await;
        let page_url = normalize_url(url);
        let log = match load_buffer(store.as_ref()).await {
            Some(buffer) if config.max_pages > 0 => {
                PageLog::resume(buffer, page_url, config.max_pages)
            }
            _ => PageLog::new(page_url, config.max_pages),
        };

        let state = Arc::new(Mutex::new(HubState {
            availability: Availability::Loading,
            log,
            config,
        }));

        let badge_sync = {
            let state = Arc::clone(&state);
            let bridge = Arc::clone(&bridge);
            Debouncer::new(FLUSH_DEBOUNCE, move || {
                let payload = {
                    let state = lock_state(&state);
                    StatusSync {
                        status: state.availability,
                        count: state.log.current_count(),
                    }
                };
                let bridge = Arc::clone(&bridge);
                async move {
                    if let Err(error) = bridge
                        .request::<_, bool>(Endpoint::Background, EventKind::SyncStatus, &payload)
                        .await
                    {
                        warn!(%error, "badge sync failed");
                    }
                }
            })
        };

        let persist = {
            let state = Arc::clone(&state);
            let store = Arc::clone(&store);
            Debouncer::new(FLUSH_DEBOUNCE, move || {
                let snapshot = {
                    let state = lock_state(&state);
                    state
                        .log
                        .history_enabled()
                        .then(|| state.log.buffer_snapshot())
                };
                let store = Arc::clone(&store);
                async move {
                    let Some(snapshot) = snapshot else { return };
                    match serde_json::to_string(&snapshot) {
                        Ok(serialized) => {
                            if let Err(error) = store.write(PAGES_BUFFER_KEY, &serialized).await {
                                warn!(%error, "history persist failed");
                            }
                        }
                        Err(error) => warn!(%error, "history serialize failed"),
                    }
                }
            })
        };

        let aggregator = Arc::new(Self {
            state,
            store,
            badge_sync,
            persist,
        });
        let service = bridge.serve(Arc::clone(&aggregator) as Arc<dyn Handler>);
        aggregator.arm_grace_timer();
        Ok((aggregator, service))
    }

    pub fn availability(&self) -> Availability {
        lock_state(&self.state).availability
    }

    pub fn config(&self) -> Config {
        lock_state(&self.state).config.clone()
    }

    /// Navigation: finalize the outgoing page in the buffer, start a new
    /// record, and reset availability for the incoming page. The badge is
    /// not poked here; the fresh grace timer gates the `Loading` state.
    pub fn navigate(self: &Arc<Self>, url: &str) {
        {
            let mut state = lock_state(&self.state);
            state.log.start_new_page(normalize_url(url));
            state.availability = Availability::Loading;
        }
        self.persist.poke();
        self.arm_grace_timer();
    }

    fn arm_grace_timer(self: &Arc<Self>) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(STATUS_GRACE).await;
            if lock_state(&this.state).availability == Availability::Loading {
                this.badge_sync.poke();
            }
        });
    }

    fn resolve(&self, next: Availability) {
        {
            let mut state = lock_state(&self.state);
            if state.availability.is_terminal() {
                debug!(?next, "late availability signal ignored");
                return;
            }
            state.availability = next;
        }
        self.badge_sync.poke();
    }

    fn absorb(&self, batch: Vec<CapturedEntry>) {
        let history = {
            let mut state = lock_state(&self.state);
            for entry in batch {
                state.log.append(entry);
            }
            state.log.history_enabled()
        };
        if history {
            self.persist.poke();
        }
        self.badge_sync.poke();
    }

    fn query(&self, max_pages: u32) -> PagesBuffer {
        lock_state(&self.state).log.query(max_pages)
    }

    async fn clear(&self) -> Result<()> {
        lock_state(&self.state).log.clear();
        self.store.remove(PAGES_BUFFER_KEY).await?;
        Ok(())
    }

    async fn apply_config(&self, config: Config) -> Result<()> {
        let history = {
            let mut state = lock_state(&self.state);
            state.log.set_max_pages(config.max_pages);
            state.config = config.clone();
            state.log.history_enabled()
        };

        let serialized = serde_json::to_string(&config)?;
        self.store.write(VIEWER_CONFIG_KEY, &serialized).await?;

        if history {
            self.persist.poke();
        } else {
            // History switched off: stale persisted pages must not
            // resurface on the next load.
            self.store.remove(PAGES_BUFFER_KEY).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Handler for Aggregator {
    async fn handle(&self, event: EventKind, data: Value) -> HandlerResult {
        match event {
            EventKind::EntryFound => {
                self.resolve(Availability::Found);
                Ok(Some(Value::Bool(true)))
            }
            EventKind::EntryNotFound => {
                self.resolve(Availability::NotFound);
                Ok(Some(Value::Bool(true)))
            }
            EventKind::EntriesBatch => {
                let batch: Vec<CapturedEntry> = serde_json::from_value(data)?;
                self.absorb(batch);
                Ok(Some(Value::Bool(true)))
            }
            EventKind::GetStatus => Ok(Some(serde_json::to_value(StatusReply {
                status: self.availability(),
            })?)),
            EventKind::GetPagesEntries => {
                let query: PagesQuery = serde_json::from_value(data)?;
                Ok(Some(serde_json::to_value(self.query(query.max_pages))?))
            }
            EventKind::RemovePagesEntries => {
                self.clear().await?;
                Ok(Some(Value::Bool(true)))
            }
            EventKind::SyncConfig => {
                let config: Config = serde_json::from_value(data)?;
                self.apply_config(config).await?;
                Ok(Some(Value::Bool(true)))
            }
            EventKind::LoadConfig => Ok(Some(serde_json::to_value(self.config())?)),
            // Addressed at the badge sink, not at us.
            EventKind::SyncStatus => Ok(None),
        }
    }
}

async fn load_config(store: &dyn KvStore) -> Config {
    match store.read(VIEWER_CONFIG_KEY).await {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(config) => config,
            Err(error) => {
                warn!(%error, "stored config unreadable, using defaults");
                Config::default()
            }
        },
        Ok(None) => Config::default(),
        Err(error) => {
            warn!(%error, "config read failed, using defaults");
            Config::default()
        }
    }
}

async fn load_buffer(store: &dyn KvStore) -> Option<PagesBuffer> {
    match store.read(PAGES_BUFFER_KEY).await {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(buffer) => Some(buffer),
            Err(error) => {
                warn!(%error, "persisted history unreadable, starting fresh");
                None
            }
        },
        Ok(None) => None,
        Err(error) => {
            warn!(%error, "history read failed, starting fresh");
            None
        }
    }
}

fn normalize_url(url: &str) -> String {
    Url::parse(url).map_or_else(|_| url.to_string(), |parsed| parsed.to_string())
}

fn lock_state(state: &Mutex<HubState>) -> MutexGuard<'_, HubState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
