//! Cache configuration

use serde::{Deserialize, Serialize};

/// Default number of entries a cache holds before evicting.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Name cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries kept before the least recently used one
    /// is evicted.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}
