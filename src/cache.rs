//! Bounded name cache: the radix tree and the recency list behind two
//! locks.
//!
//! Updates take the tree lock exclusively for their whole duration and may
//! then touch the recency list freely. Lookups take the tree lock shared
//! and, on a hit, the recency mutex just long enough to promote the entry,
//! so concurrent readers never serialize on the tree itself.

use crate::alphabet;
use crate::config::CacheConfig;
use crate::lru::LruList;
use crate::node::NodeId;
use crate::tree::RadixTree;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace, warn};

/// State guarded by the tree lock.
struct Shared {
    tree: RadixTree,
    len: usize,
}

/// Bounded, thread-safe name-to-value cache with LRU eviction.
///
/// Names are non-empty strings over `[a-z][0-9][-.]`; anything else is
/// rejected at the boundary. Values are arbitrary strings, except that an
/// empty value passed to [`update`](Self::update) invalidates the entry.
/// When the entry count would exceed the capacity, the least recently
/// used entry is evicted; both lookups and updates count as use.
///
/// One instance per logical cache; the type is deliberately not `Clone`.
pub struct NameCache {
    shared: RwLock<Shared>,
    recency: Mutex<LruList>,
    capacity: usize,
}

impl NameCache {
    /// Create a cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            shared: RwLock::new(Shared {
                tree: RadixTree::new(),
                len: 0,
            }),
            recency: Mutex::new(LruList::new()),
            capacity,
        }
    }

    /// Create a cache from a configuration.
    pub fn with_config(config: &CacheConfig) -> Self {
        Self::new(config.capacity)
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current number of entries.
    pub fn len(&self) -> usize {
        self.shared.read().len
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert or refresh `name -> data`. An empty `data` invalidates the
    /// entry instead. The call never fails: invalid names are logged and
    /// dropped.
    pub fn update(&self, name: &str, data: &str) {
        let key = match alphabet::encode(name) {
            Ok(key) => key,
            Err(err) => {
                warn!("rejecting update for {:?}: {}", name, err);
                return;
            }
        };

        let mut shared = self.shared.write();
        let mut recency = self.recency.lock();

        if data.is_empty() {
            trace!("empty value, invalidating entry for {}", name);
            if let Some(id) = shared.tree.lookup(&key) {
                if shared.tree.node(id).has_value() {
                    Self::remove_node(&mut shared, &mut recency, id);
                }
            }
        } else {
            trace!("updating {} to {}", name, data);
            let id = shared.tree.insert(&key, data);
            if !recency.contains(id) {
                shared.len += 1;
            }
            recency.promote(id);

            while shared.len > self.capacity {
                let victim = recency.tail();
                debug!("capacity reached, evicting {}", shared.tree.full_key(victim));
                Self::remove_node(&mut shared, &mut recency, victim);
            }
        }

        trace!("cache size: {}\n{}", shared.len, Self::render(&shared, &recency));
    }

    /// Look up `name`, promoting the entry on a hit. Returns the stored
    /// value, or an empty string when the name is absent or invalid.
    pub fn resolve(&self, name: &str) -> String {
        let key = match alphabet::encode(name) {
            Ok(key) => key,
            Err(err) => {
                trace!("rejecting resolve for {:?}: {}", name, err);
                return String::new();
            }
        };

        let shared = self.shared.read();
        match shared.tree.lookup(&key) {
            Some(id) if shared.tree.node(id).has_value() => {
                let mut recency = self.recency.lock();
                recency.promote(id);
                trace!("cache hit: {}", name);
                shared.tree.value(id).to_owned()
            }
            _ => {
                trace!("cache miss: {}", name);
                String::new()
            }
        }
    }

    /// Log the tree and the recency list at debug level. The format is a
    /// diagnostic aid, not a stable interface.
    pub fn dump(&self) {
        let shared = self.shared.read();
        let recency = self.recency.lock();
        debug!("cache size: {}\n{}", shared.len, Self::render(&shared, &recency));
    }

    /// Drop one entry: recency first, then the tree, all under the
    /// exclusive lock held by the caller.
    fn remove_node(shared: &mut Shared, recency: &mut LruList, id: NodeId) {
        recency.detach(id);
        shared.len -= 1;
        shared.tree.remove(id);
    }

    fn render(shared: &Shared, recency: &LruList) -> String {
        use std::fmt::Write;

        let mut out = shared.tree.render();
        out.push_str("----\n");
        for id in recency.iter() {
            let _ = writeln!(
                out,
                " -> {}: {}",
                shared.tree.full_key(id),
                shared.tree.value(id)
            );
        }
        out
    }
}

#[cfg(test)]
impl NameCache {
    /// All stored `(name, value)` pairs, sorted by name.
    pub(crate) fn entries(&self) -> Vec<(String, String)> {
        let mut entries = self.shared.read().tree.collect_entries();
        entries.sort();
        entries
    }

    /// Rendering of the tree alone, for structural comparisons.
    pub(crate) fn render_tree(&self) -> String {
        self.shared.read().tree.render()
    }

    /// Assert every invariant of the tree, the recency list and their
    /// agreement.
    pub(crate) fn check_invariants(&self) {
        let shared = self.shared.read();
        let recency = self.recency.lock();

        shared.tree.check_invariants();
        assert!(shared.len <= self.capacity, "capacity exceeded");

        let forward: Vec<NodeId> = recency.iter().collect();
        let mut backward: Vec<NodeId> = recency.iter_rev().collect();
        backward.reverse();
        assert_eq!(forward, backward, "recency links disagree");
        assert_eq!(forward.len(), shared.len, "recency length != len");

        let mut listed = forward.clone();
        listed.sort_unstable();
        let mut valued = shared.tree.valued_nodes();
        valued.sort_unstable();
        assert_eq!(listed, valued, "recency membership != valued nodes");
    }

    /// Names from most to least recently used.
    pub(crate) fn recency_order(&self) -> Vec<String> {
        let shared = self.shared.read();
        let recency = self.recency.lock();
        recency.iter().map(|id| shared.tree.full_key(id)).collect()
    }
}
