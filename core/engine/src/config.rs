//! FILENAME: core/engine/src/config.rs
//! PURPOSE: Construction options for the `Formula` facade.
//! CONTEXT: Hosts may load the scalar settings from their own config files
//! (serde); plugins are code and are always attached programmatically.

use crate::plugin::Plugin;
use serde::{Deserialize, Serialize};

/// Parse-cache size used when none is configured.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormulaOptions {
    /// How many distinct formula texts keep their parsed tree.
    /// Zero disables the cache.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Plugins registered, in order, at construction.
    #[serde(skip)]
    pub plugins: Vec<Plugin>,
}

impl Default for FormulaOptions {
    fn default() -> Self {
        FormulaOptions {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            plugins: Vec::new(),
        }
    }
}

impl FormulaOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn with_plugin(mut self, plugin: Plugin) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn with_plugins(mut self, plugins: impl IntoIterator<Item = Plugin>) -> Self {
        self.plugins.extend(plugins);
        self
    }
}
