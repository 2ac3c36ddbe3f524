//! Property-based tests for the cache.
//!
//! Each property drives the real cache next to a trivially-correct
//! reference model (a recency-ordered `Vec`) and asserts that the two
//! agree, then re-checks the structural invariants of the tree and the
//! recency list after the fact.

use crate::cache::NameCache;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

/// Names that collide on long prefixes, so that splits, merges and
/// branch-symbol terminals all get exercised.
const NAME_POOL: &[&str] = &[
    "a",
    "ab",
    "abc",
    "abd",
    "a.com",
    "a.org",
    "ab.com",
    "abc.com",
    "b.com",
    "mail.a.com",
    "maps.a.com",
    "x-1.dev",
];

/// Strategy for generating valid domain names
fn domain_strategy() -> impl Strategy<Value = String> {
    (
        "[a-z]{1,8}",
        prop::collection::vec("[a-z0-9-]{1,6}", 1..3),
        prop_oneof!["com", "org", "net", "io", "dev"],
    )
        .prop_map(|(prefix, parts, tld)| {
            let mut domain = prefix;
            for part in parts {
                domain.push('.');
                domain.push_str(&part);
            }
            domain.push('.');
            domain.push_str(&tld);
            domain
        })
}

/// Strategy for arbitrary names over the full alphabet, including shapes
/// no resolver would produce.
fn raw_name_strategy() -> impl Strategy<Value = String> + Clone {
    "[a-z0-9.-]{1,16}"
}

/// Strategy for IPv4-shaped values.
fn value_strategy() -> impl Strategy<Value = String> {
    (0u8..=255, 0u8..=255, 0u8..=255, 0u8..=255)
        .prop_map(|(a, b, c, d)| format!("{}.{}.{}.{}", a, b, c, d))
}

/// One step of a workload: insert, invalidate or look up.
#[derive(Debug, Clone)]
enum Op {
    Update(String, String),
    Invalidate(String),
    Resolve(String),
}

fn op_strategy(name: impl Strategy<Value = String> + Clone) -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (name.clone(), value_strategy()).prop_map(|(n, v)| Op::Update(n, v)),
        1 => name.clone().prop_map(Op::Invalidate),
        3 => name.prop_map(Op::Resolve),
    ]
}

fn pool_name_strategy() -> impl Strategy<Value = String> + Clone {
    prop::sample::select(NAME_POOL).prop_map(str::to_owned)
}

/// Reference model: a recency-ordered list of entries, most recent first.
struct ModelCache {
    capacity: usize,
    entries: Vec<(String, String)>,
}

impl ModelCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::new(),
        }
    }

    fn update(&mut self, name: &str, data: &str) {
        self.entries.retain(|(n, _)| n != name);
        if data.is_empty() {
            return;
        }
        self.entries.insert(0, (name.to_owned(), data.to_owned()));
        self.entries.truncate(self.capacity);
    }

    fn resolve(&mut self, name: &str) -> String {
        match self.entries.iter().position(|(n, _)| n == name) {
            Some(i) => {
                let entry = self.entries.remove(i);
                let value = entry.1.clone();
                self.entries.insert(0, entry);
                value
            }
            None => String::new(),
        }
    }

    fn sorted_entries(&self) -> Vec<(String, String)> {
        let mut entries = self.entries.clone();
        entries.sort();
        entries
    }

    fn recency_order(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }
}

/// Run a workload against the cache and the model in lockstep, checking
/// agreement and invariants at every step.
fn run_against_model(capacity: usize, ops: &[Op]) -> Result<(), TestCaseError> {
    let cache = NameCache::new(capacity);
    let mut model = ModelCache::new(capacity);

    for op in ops {
        match op {
            Op::Update(name, value) => {
                cache.update(name, value);
                model.update(name, value);
            }
            Op::Invalidate(name) => {
                cache.update(name, "");
                model.update(name, "");
            }
            Op::Resolve(name) => {
                prop_assert_eq!(cache.resolve(name), model.resolve(name));
            }
        }
        cache.check_invariants();
        prop_assert_eq!(cache.len(), model.entries.len());
    }

    prop_assert_eq!(cache.entries(), model.sorted_entries());
    prop_assert_eq!(cache.recency_order(), model.recency_order());
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// For any valid name and value, an insert followed by a lookup
    /// returns that value.
    #[test]
    fn test_round_trip(name in domain_strategy(), value in value_strategy()) {
        let cache = NameCache::new(1000);
        cache.update(&name, &value);
        prop_assert_eq!(cache.resolve(&name), value);
        cache.check_invariants();
    }

    /// For any valid name, the last written value wins.
    #[test]
    fn test_last_write_wins(
        name in domain_strategy(),
        first in value_strategy(),
        second in value_strategy()
    ) {
        let cache = NameCache::new(1000);
        cache.update(&name, &first);
        cache.update(&name, &second);
        prop_assert_eq!(cache.resolve(&name), second);
        cache.check_invariants();
    }

    /// For any valid name, writing an empty value removes the entry.
    #[test]
    fn test_empty_value_invalidates(name in domain_strategy(), value in value_strategy()) {
        let cache = NameCache::new(1000);
        cache.update(&name, &value);
        cache.update(&name, "");
        prop_assert_eq!(cache.resolve(&name), "");
        prop_assert!(cache.is_empty());
        cache.check_invariants();
    }

    /// For any two distinct names, caching one never disturbs the other.
    #[test]
    fn test_entries_are_isolated(
        first in domain_strategy(),
        second in domain_strategy(),
        value1 in value_strategy(),
        value2 in value_strategy()
    ) {
        prop_assume!(first != second);
        let cache = NameCache::new(1000);
        cache.update(&first, &value1);
        cache.update(&second, &value2);
        prop_assert_eq!(cache.resolve(&first), value1);
        prop_assert_eq!(cache.resolve(&second), value2);
        cache.check_invariants();
    }

    /// Applying the same update twice leaves the tree byte-identical to
    /// applying it once.
    #[test]
    fn test_update_is_idempotent(
        names in prop::collection::vec(pool_name_strategy(), 1..8),
        value in value_strategy()
    ) {
        let once = NameCache::new(1000);
        let twice = NameCache::new(1000);
        for name in &names {
            once.update(name, &value);
            twice.update(name, &value);
            twice.update(name, &value);
        }
        prop_assert_eq!(once.render_tree(), twice.render_tree());
        prop_assert_eq!(once.entries(), twice.entries());
        once.check_invariants();
        twice.check_invariants();
    }

    /// Inserting more distinct names than the capacity drops exactly the
    /// oldest ones.
    #[test]
    fn test_eviction_drops_oldest(capacity in 1usize..8, extra in 0usize..8) {
        let total = capacity + extra;
        let cache = NameCache::new(capacity);
        let names: Vec<String> = (0..total).map(|i| format!("h{}.test.com", i)).collect();
        for (i, name) in names.iter().enumerate() {
            cache.update(name, &i.to_string());
        }
        for (i, name) in names.iter().enumerate() {
            let expected = if i < extra { String::new() } else { i.to_string() };
            prop_assert_eq!(cache.resolve(name), expected);
        }
        cache.check_invariants();
    }

    /// A prefix-heavy workload agrees with the reference model at every
    /// step.
    #[test]
    fn test_model_agreement_prefix_pool(
        capacity in 1usize..7,
        ops in prop::collection::vec(op_strategy(pool_name_strategy()), 1..80)
    ) {
        run_against_model(capacity, &ops)?;
    }

    /// A fully random workload agrees with the reference model at every
    /// step.
    #[test]
    fn test_model_agreement_random_names(
        capacity in 1usize..16,
        ops in prop::collection::vec(op_strategy(raw_name_strategy()), 1..60)
    ) {
        run_against_model(capacity, &ops)?;
    }
}
