//! Wire all four endpoints on one bus, simulate a page pushing analytics
//! events, and log what the viewer ends up rendering.
//!
//! Run with: `cargo run -p layerscope-viewer --example watch_page`

use layerscope_bridge::{Bridge, Bus, Handler};
use layerscope_capture::{AgentConfig, BatchRelay, CaptureAgent, PageContext};
use layerscope_hub::{Aggregator, BadgeService, JsonFileStore, KvStore};
use layerscope_protocol::timing::{FLUSH_DEBOUNCE, POLL_BUDGET, POLL_INTERVAL};
use layerscope_protocol::{Config, Endpoint, RawValue};
use layerscope_viewer::{Panel, ViewerClient, poll_status};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let bus = Bus::default();
    let page_url = "https://shop.example/checkout";

    // Content endpoint: the aggregator hub with file-backed history.
    let store: Arc<dyn KvStore> = Arc::new(JsonFileStore::new(
        std::env::temp_dir().join("layerscope-demo"),
    ));
    let content = Arc::new(Bridge::new(bus.clone(), Endpoint::Content));
    let Ok((_aggregator, _content_service)) = Aggregator::start(content, store, page_url).await
    else {
        info!("aggregator failed to start");
        return;
    };

    // Background endpoint: the badge sink.
    let badge = Arc::new(BadgeService::new());
    let background = Bridge::new(bus.clone(), Endpoint::Background);
    let _background_service = background.serve(Arc::clone(&badge) as Arc<dyn Handler>);

    // Page endpoint: context, relay, agent.
    let ctx = Arc::new(PageContext::new(page_url));
    let page = Arc::new(Bridge::new(bus.clone(), Endpoint::Page));
    let relay = Arc::new(BatchRelay::new(
        Arc::clone(&ctx),
        Arc::clone(&page),
        FLUSH_DEBOUNCE,
    ));
    let agent = CaptureAgent::new(Arc::clone(&ctx), page, relay, AgentConfig::default());

    // The simulated page: the layer appears shortly after load with one
    // early event, then tags push a burst.
    let simulated = {
        let ctx = Arc::clone(&ctx);
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(300)).await;
            let layer = ctx.register("dataLayer");
            layer.push(RawValue::event("gtm.js", vec![]));

            tokio::time::sleep(std::time::Duration::from_millis(200)).await;
            for name in ["page_view", "view_item", "select_item", "purchase"] {
                layer.push(RawValue::event(
                    name,
                    vec![("value".to_string(), RawValue::from(19.99))],
                ));
            }
        })
    };
    let detection = tokio::spawn(async move { agent.run().await });

    // Viewer endpoint: poll, pull, render.
    let viewer = Arc::new(Bridge::new(bus, Endpoint::Viewer));
    let client = ViewerClient::new(viewer);
    let status = poll_status(&client, POLL_INTERVAL, POLL_BUDGET).await;
    info!(?status, "availability resolved");

    tokio::time::sleep(FLUSH_DEBOUNCE * 4).await;
    let _ = simulated.await;
    let report = detection.await.ok();
    info!(?report, "detection finished");

    match client.entries(Config::DEFAULT_MAX_PAGES).await {
        Ok(buffer) => {
            let mut panel = Panel::new(Config::default());
            let added = panel.refresh(&buffer);
            info!(added, "entries materialized");
            for card in panel.cards() {
                info!(
                    title = %card.title,
                    source = %card.source_name,
                    after_load = %card.after_load,
                    "entry"
                );
            }
        }
        Err(error) => info!(%error, "entries query failed"),
    }

    if let Some(snapshot) = badge.snapshot() {
        info!(text = snapshot.text, title = %snapshot.title, "badge");
    }
}
