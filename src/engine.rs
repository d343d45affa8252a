//! Classification engine.
//!
//! This module turns engine identities (`minecraft:chest`, `minecraft:zombie`)
//! into the operation a given interaction with them represents. It is split
//! into focused submodules under `src/engine/`.
//!
//! ## How the parts work together
//!
//! ```text
//! YAML resource ──┐
//!                 │  RuleSet::from_slice + CompiledRules::new  (compiled_rules.rs)
//!                 └───────────────┬─────────────────────────
//!                                 │
//! identity ── normalize ──────────┼─ exact index, then namespace/global
//!                                 │  wildcards in declaration order
//!                                 v
//!                        [SemanticCategory, ...]   (classifier.rs)
//!                                 │
//!                                 v
//!                 resolve_operation(categories, verb)  (resolve.rs)
//!                                 │
//!                                 v
//!                       Option<OperationType>
//! ```
//!
//! The classifier is the ground truth. `ClassificationCache` (cache.rs)
//! precomputes it for every identity the world knows about and is rebuilt
//! wholesale on world start and data reload; `metrics.rs` reports what a
//! rebuild did.
//!
//! ## Responsibilities by module
//!
//! - `compiled_rules.rs`: resource format, pattern compilation, group
//!   expansion and the rule index.
//! - `classifier.rs`: identity → categories → operation, no caching.
//! - `resolve.rs`: the (category, verb) → operation table.
//! - `cache.rs`: generation-swapped precomputed lookups.
//! - `metrics.rs`: rebuild timings and hit/miss counters.
//!
//! ## Adding a category
//!
//! Add a name to `crate::category`, give it rows in
//! `resolve::category_operation`, and list its members in the default
//! resource. Rule files can use the new name immediately; without rows in the
//! table it behaves like any unknown category.

#[path = "engine/cache.rs"]
mod cache;
#[path = "engine/classifier.rs"]
mod classifier;
#[path = "engine/compiled_rules.rs"]
mod compiled_rules;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/resolve.rs"]
mod resolve;

pub use cache::ClassificationCache;
pub use classifier::TypeClassifier;
pub use compiled_rules::{ClassificationRule, CompiledRules, MatchPattern, RuleSet};
pub(crate) use compiled_rules::{DEFAULT_NAMESPACE, normalize_identity};
pub use metrics::{CacheStats, RebuildMetrics};
