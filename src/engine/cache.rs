//! Precomputed classification cache.
//!
//! Classification walks pattern lists and allocates category vectors; doing
//! that for every movement-rate event is too slow. The cache classifies every
//! identity the world knows about once per reload and serves lookups from a
//! flat map afterwards.
//!
//! ## Generations
//!
//! ```text
//! rebuild(ids) ──▶ classify all ids into a fresh Table (no lock held)
//!                  └─ write-lock, swap Arc<Table>, generation += 1
//!
//! lookup(id)   ──▶ read-lock, clone Arc<Table>
//!                  ├─ hit  -> entry
//!                  └─ miss -> classify live with the *same* table's classifier
//!                            and (optionally) memoize into that table's `late` map
//! ```
//!
//! Generation 0 (before the first rebuild) never memoizes, and a generation's
//! `late` map stops growing at `Options::late_entry_limit`.
//!
//! A table is never mutated after publication except for its `late` map, which
//! belongs to that generation and is dropped with it. A lookup therefore sees
//! either the complete old table or the complete new one, and no memoized
//! entry survives a rebuild.
//!
//! Rebuilds are serialized by `rebuilding`; the last call to start wins.

use super::classifier::TypeClassifier;
use super::compiled_rules::normalize_identity;
use super::metrics::{CacheStats, Counters, RebuildMetrics};
use crate::api::Options;
use crate::{OperationType, Verb, VerbTable};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Instant;

#[derive(Debug)]
struct Table {
    generation: u64,
    classifier: Arc<TypeClassifier>,
    /// Identities as passed to the rebuild that produced this table.
    identities: Arc<[Box<str>]>,
    entries: HashMap<Box<str>, VerbTable>,
    late: RwLock<HashMap<Box<str>, VerbTable>>,
}

impl Table {
    fn find(&self, identity: &str) -> Option<VerbTable> {
        if let Some(found) = self.entries.get(identity) {
            return Some(*found);
        }

        let key = normalize_identity(identity, self.classifier.rules().namespace());
        if key.as_ref() != identity {
            if let Some(found) = self.entries.get(key.as_ref()) {
                return Some(*found);
            }
        }

        self.late.read().unwrap_or_else(PoisonError::into_inner).get(key.as_ref()).copied()
    }
}

/// Identity → per-verb operation cache over a [`TypeClassifier`].
#[derive(Debug)]
pub struct ClassificationCache {
    table: RwLock<Arc<Table>>,
    rebuilding: Mutex<()>,
    memoize_misses: bool,
    late_entry_limit: usize,
    counters: Counters,
}

impl ClassificationCache {
    /// An empty cache (generation 0). Every lookup falls back to live
    /// classification until the first rebuild.
    pub fn new(classifier: impl Into<Arc<TypeClassifier>>, options: &Options) -> Self {
        let table = Table {
            generation: 0,
            classifier: classifier.into(),
            identities: Arc::from(Vec::new()),
            entries: HashMap::new(),
            late: RwLock::default(),
        };

        Self {
            table: RwLock::new(Arc::new(table)),
            rebuilding: Mutex::new(()),
            memoize_misses: options.memoize_misses,
            late_entry_limit: options.late_entry_limit,
            counters: Counters::default(),
        }
    }

    fn current(&self) -> Arc<Table> {
        Arc::clone(&self.table.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replace the cache with a classification of `identities`.
    pub fn rebuild<I, S>(&self, identities: I) -> RebuildMetrics
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let identities: Arc<[Box<str>]> = identities.into_iter().map(|id| Box::from(id.as_ref())).collect();
        let _guard = self.rebuilding.lock().unwrap_or_else(PoisonError::into_inner);
        let classifier = Arc::clone(&self.current().classifier);
        self.publish(classifier, identities)
    }

    /// Swap in a new rule set and rebuild over the identities of the last
    /// rebuild.
    pub fn reload(&self, classifier: impl Into<Arc<TypeClassifier>>) -> RebuildMetrics {
        let _guard = self.rebuilding.lock().unwrap_or_else(PoisonError::into_inner);
        let identities = Arc::clone(&self.current().identities);
        self.publish(classifier.into(), identities)
    }

    // Callers hold `rebuilding`.
    fn publish(&self, classifier: Arc<TypeClassifier>, identities: Arc<[Box<str>]>) -> RebuildMetrics {
        let started = Instant::now();
        let namespace = classifier.rules().namespace();

        let mut entries: HashMap<Box<str>, VerbTable> = HashMap::with_capacity(identities.len());
        for identity in identities.iter() {
            if identity.trim().is_empty() {
                continue;
            }
            let key = normalize_identity(identity, namespace);
            if entries.contains_key(key.as_ref()) {
                continue;
            }
            let operations = classifier.operations(&key);
            entries.insert(Box::from(key.as_ref()), operations);
        }
        let classified = entries.len();
        let restricted = entries.values().filter(|ops| !ops.is_unrestricted()).count();

        let generation = {
            let mut slot = self.table.write().unwrap_or_else(PoisonError::into_inner);
            let generation = slot.generation + 1;
            *slot = Arc::new(Table { generation, classifier, identities, entries, late: RwLock::default() });
            generation
        };

        let metrics = RebuildMetrics { generation, identities: classified, restricted, duration: started.elapsed() };
        tracing::info!(
            generation,
            identities = classified,
            restricted,
            elapsed_us = metrics.duration.as_micros() as u64,
            "rebuilt classification cache"
        );
        metrics
    }

    /// The operation `verb` on `identity` represents, or `None` when it is
    /// unrestricted.
    pub fn lookup(&self, identity: &str, verb: Verb) -> Option<OperationType> {
        self.operations(identity).get(verb)
    }

    /// All verbs for `identity`; falls back to live classification on a miss.
    pub fn operations(&self, identity: &str) -> VerbTable {
        if identity.trim().is_empty() {
            return VerbTable::default();
        }

        let table = self.current();
        if let Some(found) = table.find(identity) {
            self.counters.hit();
            return found;
        }

        self.counters.miss();
        let key = normalize_identity(identity, table.classifier.rules().namespace());
        let operations = table.classifier.operations(&key);
        tracing::trace!(identity = %key, generation = table.generation, "classification cache miss");

        if self.memoize_misses && table.generation > 0 {
            let mut late = table.late.write().unwrap_or_else(PoisonError::into_inner);
            if late.len() < self.late_entry_limit {
                late.insert(Box::from(key.as_ref()), operations);
            }
        }
        operations
    }

    /// The classifier backing the current generation.
    pub fn classifier(&self) -> Arc<TypeClassifier> {
        Arc::clone(&self.current().classifier)
    }

    pub fn generation(&self) -> u64 {
        self.current().generation
    }

    pub fn stats(&self) -> CacheStats {
        let table = self.current();
        let (hits, misses) = self.counters.snapshot();
        CacheStats {
            generation: table.generation,
            entries: table.entries.len(),
            late_entries: table.late.read().unwrap_or_else(PoisonError::into_inner).len(),
            hits,
            misses,
        }
    }
}
