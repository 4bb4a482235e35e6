//! Page log: the current page record plus the bounded ring of past pages.
//!
//! Eviction only ever happens when a *new* page is started; growth of the
//! current page never evicts. The buffer's tail is kept as an up-to-date
//! copy of the current page so a query sees live entries.

use layerscope_protocol::{CapturedEntry, PageRecord, PagesBuffer};

pub struct PageLog {
    current: PageRecord,
    buffer: PagesBuffer,
}

impl PageLog {
    /// Fresh log for a page with no restored history.
    pub fn new(url: impl Into<String>, max_pages: u32) -> Self {
        let current = PageRecord::new(url);
        let mut log = Self {
            current,
            buffer: PagesBuffer::empty(max_pages),
        };
        if max_pages > 0 {
            log.push_current();
        }
        log
    }

    /// Continue from a persisted buffer: the restored pages stay as
    /// history and a new current page is started behind them.
    pub fn resume(buffer: PagesBuffer, url: impl Into<String>, max_pages: u32) -> Self {
        let mut log = Self {
            current: PageRecord::new(url),
            buffer,
        };
        log.buffer.max_pages = max_pages;
        if max_pages > 0 {
            log.trim_to_bound();
            log.push_current();
        } else {
            log.buffer.pages.clear();
        }
        log
    }

    pub fn history_enabled(&self) -> bool {
        self.buffer.max_pages > 0
    }

    pub fn current_page(&self) -> &PageRecord {
        &self.current
    }

    /// Entries captured on the current page so far.
    pub fn current_count(&self) -> usize {
        self.current.entries.len()
    }

    /// Append to the current page. Never evicts.
    pub fn append(&mut self, entry: CapturedEntry) {
        self.current.append(entry);
        if self.history_enabled() {
            self.sync_tail();
            self.buffer.touch();
        }
    }

    /// Start a new page on navigation.
    ///
    /// The tail record matching the outgoing page is overwritten with its
    /// final state; then the oldest page is evicted if the bound is full,
    /// and the new page's record is appended.
    pub fn start_new_page(&mut self, url: impl Into<String>) {
        if !self.history_enabled() {
            self.current = PageRecord::new(url);
            return;
        }

        self.sync_tail();
        self.current = PageRecord::new(url);
        self.push_current();
    }

    /// Drop all history. The current page record stays alive; the next
    /// query lazily re-seeds the buffer from it.
    pub fn clear(&mut self) {
        self.buffer.pages.clear();
        self.buffer.touch();
    }

    /// Buffered view for the viewer.
    ///
    /// `max_pages == 0` synthesizes a single-page view from the current
    /// page only and never touches buffered history.
    pub fn query(&mut self, max_pages: u32) -> PagesBuffer {
        if max_pages == 0 {
            return PagesBuffer {
                pages: vec![self.current.clone()],
                max_pages: 0,
                updated_at_ms: self.current.updated_at_ms,
            };
        }

        if self.buffer.pages.is_empty() {
            self.buffer.pages.push(self.current.clone());
            self.buffer.touch();
        }
        self.buffer.clone()
    }

    /// Apply a changed bound, trimming oldest pages if it shrank.
    pub fn set_max_pages(&mut self, max_pages: u32) {
        self.buffer.max_pages = max_pages;
        if max_pages == 0 {
            self.buffer.pages.clear();
        } else {
            self.trim_to_bound();
            if self.buffer.pages.is_empty() {
                self.push_current();
            }
        }
        self.buffer.touch();
    }

    /// Snapshot for persistence.
    pub fn buffer_snapshot(&self) -> PagesBuffer {
        self.buffer.clone()
    }

    fn sync_tail(&mut self) {
        if let Some(tail) = self.buffer.pages.last_mut() {
            if tail.id == self.current.id {
                *tail = self.current.clone();
            }
        }
    }

    fn push_current(&mut self) {
        let bound = self.buffer.max_pages as usize;
        while self.buffer.pages.len() >= bound {
            self.buffer.pages.remove(0);
        }
        self.buffer.pages.push(self.current.clone());
        self.buffer.touch();
    }

    fn trim_to_bound(&mut self) {
        let bound = self.buffer.max_pages as usize;
        while self.buffer.pages.len() > bound {
            self.buffer.pages.remove(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn entry(name: &str) -> CapturedEntry {
        CapturedEntry {
            id: Uuid::new_v4(),
            source_name: "dataLayer".to_string(),
            payload: json!({ "event": name }),
            trace_info: None,
            after_load_ms: 1,
        }
    }

    fn page_urls(buffer: &PagesBuffer) -> Vec<&str> {
        buffer.pages.iter().map(|page| page.url.as_str()).collect()
    }

    #[test]
    fn bound_holds_and_oldest_is_evicted_first() {
        let mut log = PageLog::new("https://example.com/p0", 2);
        log.start_new_page("https://example.com/p1");
        log.start_new_page("https://example.com/p2");
        log.start_new_page("https://example.com/p3");

        let view = log.query(2);
        assert_eq!(
            page_urls(&view),
            vec!["https://example.com/p2", "https://example.com/p3"]
        );
        assert!(view.pages.len() <= 2);
    }

    #[test]
    fn entry_growth_never_evicts() {
        let mut log = PageLog::new("https://example.com/", 2);
        for index in 0..100 {
            log.append(entry(&format!("e{index}")));
        }

        let view = log.query(2);
        assert_eq!(view.pages.len(), 1);
        assert_eq!(view.pages[0].entries.len(), 100);
    }

    #[test]
    fn tail_tracks_live_entries_of_current_page() {
        let mut log = PageLog::new("https://example.com/a", 3);
        log.append(entry("one"));
        log.start_new_page("https://example.com/b");
        log.append(entry("two"));
        log.append(entry("three"));

        let view = log.query(3);
        assert_eq!(view.pages.len(), 2);
        assert_eq!(view.pages[0].entries.len(), 1);
        assert_eq!(view.pages[1].entries.len(), 2);
    }

    #[test]
    fn history_off_yields_single_current_page_view() {
        let mut log = PageLog::new("https://example.com/", 0);
        log.append(entry("only"));

        let view = log.query(0);
        assert_eq!(view.pages.len(), 1);
        assert_eq!(view.pages[0].entries.len(), 1);
        assert_eq!(view.max_pages, 0);

        // Navigation with history off keeps nothing.
        log.start_new_page("https://example.com/next");
        let view = log.query(0);
        assert_eq!(view.pages.len(), 1);
        assert!(view.pages[0].entries.is_empty());
    }

    #[test]
    fn query_is_idempotent_without_mutation() {
        let mut log = PageLog::new("https://example.com/", 4);
        log.append(entry("a"));
        log.append(entry("b"));

        let first = log.query(4);
        let second = log.query(4);
        assert_eq!(first, second);
    }

    #[test]
    fn clear_drops_history_and_query_reseeds_lazily() {
        let mut log = PageLog::new("https://example.com/a", 3);
        log.append(entry("kept"));
        log.start_new_page("https://example.com/b");

        log.clear();
        let view = log.query(3);
        assert_eq!(page_urls(&view), vec!["https://example.com/b"]);
    }

    #[test]
    fn shrinking_bound_trims_oldest() {
        let mut log = PageLog::new("https://example.com/p0", 4);
        log.start_new_page("https://example.com/p1");
        log.start_new_page("https://example.com/p2");
        log.start_new_page("https://example.com/p3");

        log.set_max_pages(2);
        let view = log.query(2);
        assert_eq!(
            page_urls(&view),
            vec!["https://example.com/p2", "https://example.com/p3"]
        );
    }

    #[test]
    fn resume_restores_history_behind_a_fresh_page() {
        let mut first = PageLog::new("https://example.com/old", 3);
        first.append(entry("persisted"));
        let snapshot = first.buffer_snapshot();

        let mut resumed = PageLog::resume(snapshot, "https://example.com/new", 3);
        let view = resumed.query(3);
        assert_eq!(
            page_urls(&view),
            vec!["https://example.com/old", "https://example.com/new"]
        );
        assert_eq!(view.pages[0].entries.len(), 1);
        assert!(view.pages[1].entries.is_empty());
    }
}
