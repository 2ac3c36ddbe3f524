//! namecache - Bounded name-to-value cache for DNS-shaped keys
//!
//! Features:
//! - Compressed radix tree over the `[a-z][0-9][-.]` alphabet
//! - LRU eviction threaded through the tree's own nodes
//! - Concurrent lookups that still refresh recency, without an exclusive
//!   tree lock
//! - Empty values interpreted as invalidations
//! - Process-wide default instance
//!
//! # Architecture
//!
//! ```text
//! +------------------------------------------------------------+
//! |                        NameCache                           |
//! |   update ----------------+----------------- resolve       |
//! |                          |                                 |
//! |        tree lock (rw)    |      recency mutex              |
//! |   +------------------+   |   +---------------------+       |
//! |   |    RadixTree     |   |   |      LruList        |       |
//! |   |  arena of nodes, |<--+-->|  head ... tail over |       |
//! |   |  38-slot fanout  |       |  the same node ids  |       |
//! |   +------------------+       +---------------------+       |
//! +------------------------------------------------------------+
//! ```
//!
//! Writers hold the tree lock exclusively and maintain both structures in
//! one critical section; readers walk the tree under the shared lock and
//! take the recency mutex only to move a hit entry to the front.

mod alphabet;
mod lru;
mod node;
mod tree;

pub mod cache;
pub mod config;
pub mod error;
pub mod global;

pub use cache::NameCache;
pub use config::{CacheConfig, DEFAULT_CAPACITY};
pub use error::{CacheError, Result};
pub use global::dns_cache;

#[cfg(test)]
mod tests;
