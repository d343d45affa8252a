//! Rule loading, compilation and indexing.
//!
//! This module holds the *static* side of the classifier: the structures derived
//! from a classification resource that make per-identity lookups cheap.
//!
//! Classification is split into two phases:
//!
//! 1. **Compile/index rules** (this module): parse the YAML resource into a
//!    [`RuleSet`], expand `#group` references, turn every pattern into a
//!    [`MatchPattern`] and index it.
//! 2. **Resolve** (see `classifier.rs` and `resolve.rs`): collect the categories
//!    of an identity and map them to an operation for a verb.
//!
//! The index has three parts:
//!
//! - `exact`: full identity → rules naming it verbatim.
//! - `by_namespace`: namespace → wildcard rules whose namespace is literal
//!   (`minecraft:*`, `minecraft:*_door`).
//! - `always_on`: wildcard rules that can match any namespace (`*`, `*:chest`).
//!
//! ## Invariants
//!
//! - `RuleId` is an index into `CompiledRules::rules`, assigned in declaration
//!   order (group members keep their list order at the position of the rule
//!   that referenced the group).
//! - Every id list in the index is sorted ascending, so merging the namespace
//!   list with `always_on` yields declaration order without sorting.
//! - Patterns and identities are compared in normalized form: lowercase, with
//!   the default namespace filled in.

use crate::SemanticCategory;
use crate::error::LoadError;
use regex::Regex;
use serde::Deserialize;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::Read;

/// Rule identifier (index into the compiled rules vector).
pub(crate) type RuleId = usize;

pub(crate) const DEFAULT_NAMESPACE: &str = "minecraft";

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

/// One `pattern → category` association from the resource.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassificationRule {
    #[serde(rename = "match")]
    pub pattern: String,
    pub category: SemanticCategory,
}

impl ClassificationRule {
    pub fn new(pattern: impl Into<String>, category: impl Into<SemanticCategory>) -> Self {
        Self { pattern: pattern.into(), category: category.into() }
    }
}

/// The raw, uncompiled content of a classification resource.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSet {
    /// Namespace assumed for patterns and identities written without one.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Named pattern lists, referenced from rules as `#name`.
    #[serde(default)]
    pub groups: HashMap<String, Vec<String>>,
    pub rules: Vec<ClassificationRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<ClassificationRule>) -> Self {
        Self { namespace: default_namespace(), groups: HashMap::new(), rules }
    }

    pub fn with_group(mut self, name: impl Into<String>, patterns: Vec<String>) -> Self {
        self.groups.insert(name.into(), patterns);
        self
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, LoadError> {
        Ok(serde_yaml::from_slice(bytes)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LoadError> {
        Ok(serde_yaml::from_reader(reader)?)
    }
}

/// A compiled match pattern.
#[derive(Debug, Clone)]
pub enum MatchPattern {
    /// `domain:name`
    Exact(String),
    /// `domain:*`
    Namespace(String),
    /// Any other pattern containing `*`. `namespace` is set when the
    /// namespace part is literal, which lets the index scope the rule.
    Glob { namespace: Option<String>, regex: Regex },
}

impl MatchPattern {
    /// Parse and normalize `raw`, filling in `default_namespace` if the pattern
    /// has none. A lone `*` matches every identity.
    pub fn parse(raw: &str, default_namespace: &str) -> Result<Self, LoadError> {
        let lower = raw.trim().to_ascii_lowercase();
        let invalid = |reason| LoadError::InvalidPattern { pattern: raw.to_string(), reason };

        if lower.is_empty() {
            return Err(invalid("empty pattern"));
        }
        if !regex!(r"^[a-z0-9_.\-/*]+(:[a-z0-9_.\-/*]+)?$").is_match(&lower) {
            return Err(invalid("expected `namespace:name` built from [a-z0-9_.-/] and `*`"));
        }

        let (namespace, name) = match lower.split_once(':') {
            Some((namespace, name)) => (namespace, name),
            None if lower == "*" => ("*", "*"),
            None => (default_namespace, lower.as_str()),
        };

        let literal_namespace = !namespace.contains('*');
        if literal_namespace && !name.contains('*') {
            return Ok(MatchPattern::Exact(format!("{namespace}:{name}")));
        }
        if literal_namespace && name == "*" {
            return Ok(MatchPattern::Namespace(namespace.to_string()));
        }

        let full = format!("{namespace}:{name}");
        let body = full.split('*').map(regex::escape).collect::<Vec<_>>().join("[^:]*");
        let regex = Regex::new(&format!("^{body}$")).map_err(|_| invalid("could not compile wildcard"))?;

        Ok(MatchPattern::Glob { namespace: literal_namespace.then(|| namespace.to_string()), regex })
    }

    /// Test a normalized identity.
    pub fn matches(&self, identity: &str) -> bool {
        match self {
            MatchPattern::Exact(id) => id == identity,
            MatchPattern::Namespace(namespace) => {
                identity.split_once(':').is_some_and(|(candidate, _)| candidate == namespace)
            }
            MatchPattern::Glob { regex, .. } => regex.is_match(identity),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        !matches!(self, MatchPattern::Exact(_))
    }
}

/// Lowercase `identity` and give it `namespace` if it has none.
///
/// Borrows when the identity is already in normal form, which is the common
/// case for identities coming straight from an engine registry.
pub(crate) fn normalize_identity<'a>(identity: &'a str, namespace: &str) -> Cow<'a, str> {
    let trimmed = identity.trim();
    let needs_case = trimmed.bytes().any(|b| b.is_ascii_uppercase());
    let needs_namespace = !trimmed.contains(':');

    match (needs_case, needs_namespace) {
        (false, false) => Cow::Borrowed(trimmed),
        (true, false) => Cow::Owned(trimmed.to_ascii_lowercase()),
        (_, true) => Cow::Owned(format!("{namespace}:{}", trimmed.to_ascii_lowercase())),
    }
}

#[derive(Debug)]
pub(crate) struct CompiledRule {
    pub pattern: MatchPattern,
    pub category: SemanticCategory,
    /// The pattern as written (before group expansion and normalization).
    pub source: String,
}

#[derive(Default, Debug)]
pub(crate) struct RuleIndex {
    pub exact: HashMap<String, Vec<RuleId>>,
    pub by_namespace: HashMap<String, Vec<RuleId>>,
    pub always_on: Vec<RuleId>,
}

/// Pre-compiled rule set with indexes.
#[derive(Debug)]
pub struct CompiledRules {
    pub(crate) rules: Vec<CompiledRule>,
    pub(crate) index: RuleIndex,
    namespace: String,
}

impl CompiledRules {
    /// Compile and index a rule set.
    ///
    /// Fails on the first invalid pattern, unknown or nested group, or empty
    /// category; a partially valid resource is never accepted.
    pub fn new(set: &RuleSet) -> Result<Self, LoadError> {
        let namespace = set.namespace.trim().to_ascii_lowercase();

        let groups: HashMap<String, &Vec<String>> =
            set.groups.iter().map(|(name, patterns)| (name.trim().to_ascii_lowercase(), patterns)).collect();
        for (group, patterns) in &groups {
            if let Some(nested) = patterns.iter().find(|p| p.trim_start().starts_with('#')) {
                return Err(LoadError::NestedGroup { group: group.clone(), pattern: nested.clone() });
            }
        }

        let mut rules = Vec::with_capacity(set.rules.len());
        for (index, rule) in set.rules.iter().enumerate() {
            if rule.category.as_str().is_empty() {
                return Err(LoadError::EmptyCategory { index });
            }

            let pattern = rule.pattern.trim();
            let expanded: Vec<&str> = match pattern.strip_prefix('#') {
                Some(group) => {
                    let key = group.trim().to_ascii_lowercase();
                    let members = groups
                        .get(&key)
                        .ok_or_else(|| LoadError::UnknownGroup { index, group: group.trim().to_string() })?;
                    members.iter().map(String::as_str).collect()
                }
                None => vec![pattern],
            };

            for raw in expanded {
                rules.push(CompiledRule {
                    pattern: MatchPattern::parse(raw, &namespace)?,
                    category: rule.category.clone(),
                    source: rule.pattern.clone(),
                });
            }
        }

        // Build indexes
        let mut index = RuleIndex::default();
        for (id, rule) in rules.iter().enumerate() {
            match &rule.pattern {
                MatchPattern::Exact(identity) => index.exact.entry(identity.clone()).or_default().push(id),
                MatchPattern::Namespace(ns) | MatchPattern::Glob { namespace: Some(ns), .. } => {
                    index.by_namespace.entry(ns.clone()).or_default().push(id)
                }
                MatchPattern::Glob { namespace: None, .. } => index.always_on.push(id),
            }
        }

        Ok(CompiledRules { rules, index, namespace })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Namespace assumed for identities written without one.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// `(pattern as written, category)` for every compiled rule, in match order
    /// within each kind.
    pub fn rules(&self) -> impl Iterator<Item = (&str, &SemanticCategory)> {
        self.rules.iter().map(|rule| (rule.source.as_str(), &rule.category))
    }

    /// Categories of a normalized identity.
    ///
    /// Exact rules come first, then wildcard rules in declaration order. Each
    /// category is reported once, at the position of its first matching rule.
    pub(crate) fn categories(&self, identity: &str) -> Vec<SemanticCategory> {
        let mut out = Vec::new();

        if let Some(ids) = self.index.exact.get(identity) {
            for &id in ids {
                push_unique(&mut out, &self.rules[id].category);
            }
        }

        let scoped: &[RuleId] = identity
            .split_once(':')
            .and_then(|(namespace, _)| self.index.by_namespace.get(namespace))
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let global = self.index.always_on.as_slice();

        // Merge two ascending id lists.
        let (mut i, mut j) = (0, 0);
        while i < scoped.len() || j < global.len() {
            let id = if j >= global.len() || (i < scoped.len() && scoped[i] < global[j]) {
                i += 1;
                scoped[i - 1]
            } else {
                j += 1;
                global[j - 1]
            };

            let rule = &self.rules[id];
            if rule.pattern.matches(identity) {
                push_unique(&mut out, &rule.category);
            }
        }

        out
    }
}

fn push_unique(out: &mut Vec<SemanticCategory>, category: &SemanticCategory) {
    if !out.contains(category) {
        out.push(category.clone());
    }
}
