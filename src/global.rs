//! Process-wide default cache instance.

use crate::cache::NameCache;
use crate::config::DEFAULT_CAPACITY;
use once_cell::sync::Lazy;

static DNS_CACHE: Lazy<NameCache> = Lazy::new(|| NameCache::new(DEFAULT_CAPACITY));

/// The shared default instance, created on first use with
/// [`DEFAULT_CAPACITY`] entries.
///
/// It behaves exactly like any user-constructed [`NameCache`]; nothing in
/// this crate assumes it is the only instance.
pub fn dns_cache() -> &'static NameCache {
    &DNS_CACHE
}
