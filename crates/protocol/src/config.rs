//! Viewer configuration, owned by the persistent store behind the hub.

use serde::{Deserialize, Serialize};

/// How entry payloads are rendered in the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormatMode {
    #[default]
    Pretty,
    Compact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ThemeMode {
    #[default]
    System,
    Light,
    Dark,
}

/// Read at viewer start, written on every user change. Fields default
/// individually so a partial stored config still deserializes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Pre-fills the entry filter.
    pub search_term: String,
    /// Default expand/collapse state of newly materialized entries.
    pub expand_all: bool,
    /// 0 disables history; otherwise the ring buffer bound.
    pub max_pages: u32,
    pub format_mode: FormatMode,
    pub theme_mode: ThemeMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            expand_all: false,
            max_pages: Self::DEFAULT_MAX_PAGES,
            format_mode: FormatMode::default(),
            theme_mode: ThemeMode::default(),
        }
    }
}

impl Config {
    pub const DEFAULT_MAX_PAGES: u32 = 5;
}
