//! Presentation state for the entry list.
//!
//! Cards are materialized exactly once: `refresh` diffs the pulled buffer
//! against the entries already shown and appends only the delta, so local
//! state (expand/collapse, filter visibility) survives every refresh.
//! Pages evicted from the hub's ring stay rendered here; the viewer is
//! append-only over what it has shown.

use crate::filter::is_matching;
use crate::format::format_duration_ms;
use crate::naming::event_name;
use layerscope_protocol::{CapturedEntry, Config, FormatMode, PageRecord, PagesBuffer};
use serde_json::Value;
use std::collections::HashSet;
use uuid::Uuid;

/// One materialized entry.
#[derive(Debug, Clone)]
pub struct EntryCard {
    pub entry_id: Uuid,
    pub page_id: Uuid,
    pub page_url: String,
    pub source_name: String,
    pub title: String,
    pub payload: Value,
    pub serialized: String,
    pub after_load: String,
    pub trace_info: Option<String>,
    pub expanded: bool,
    pub hidden: bool,
}

pub struct Panel {
    config: Config,
    cards: Vec<EntryCard>,
    seen: HashSet<Uuid>,
}

impl Panel {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cards: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cards(&self) -> &[EntryCard] {
        &self.cards
    }

    pub fn visible(&self) -> Vec<&EntryCard> {
        self.cards.iter().filter(|card| !card.hidden).collect()
    }

    pub fn has_visible(&self) -> bool {
        self.cards.iter().any(|card| !card.hidden)
    }

    /// Append cards for entries not materialized yet. Returns how many
    /// were added; existing cards are never rebuilt.
    pub fn refresh(&mut self, buffer: &PagesBuffer) -> usize {
        let mut added = 0;
        for page in &buffer.pages {
            for entry in &page.entries {
                if !self.seen.insert(entry.id) {
                    continue;
                }
                let card = self.materialize(page, entry);
                self.cards.push(card);
                added += 1;
            }
        }
        added
    }

    /// Update the filter and re-evaluate visibility on every card.
    pub fn set_search_term(&mut self, term: &str) {
        self.config.search_term = term.to_string();
        for card in &mut self.cards {
            card.hidden = !is_matching(&card.serialized, term);
        }
    }

    /// Expand or collapse everything, and make it the default for new cards.
    pub fn set_expand_all(&mut self, expand: bool) {
        self.config.expand_all = expand;
        for card in &mut self.cards {
            card.expanded = expand;
        }
    }

    /// Flip one card. Returns false when the id is unknown.
    pub fn toggle(&mut self, entry_id: Uuid) -> bool {
        match self.cards.iter_mut().find(|card| card.entry_id == entry_id) {
            Some(card) => {
                card.expanded = !card.expanded;
                true
            }
            None => false,
        }
    }

    /// All materialized payloads as one JSON array, for copy/export.
    pub fn export_json(&self) -> String {
        let payloads: Vec<Value> = self.cards.iter().map(|card| card.payload.clone()).collect();
        serde_json::to_string_pretty(&Value::Array(payloads))
            .unwrap_or_else(|_| "[]".to_string())
    }

    fn materialize(&self, page: &PageRecord, entry: &CapturedEntry) -> EntryCard {
        let serialized = match self.config.format_mode {
            FormatMode::Pretty => serde_json::to_string_pretty(&entry.payload),
            FormatMode::Compact => serde_json::to_string(&entry.payload),
        }
        .unwrap_or_else(|_| "null".to_string());
        let hidden = !is_matching(&serialized, &self.config.search_term);

        EntryCard {
            entry_id: entry.id,
            page_id: page.id,
            page_url: page.url.clone(),
            source_name: entry.source_name.clone(),
            title: event_name(&entry.payload),
            payload: entry.payload.clone(),
            serialized,
            after_load: format_duration_ms(entry.after_load_ms as i64),
            trace_info: entry.trace_info.clone(),
            expanded: self.config.expand_all,
            hidden,
        }
    }
}
