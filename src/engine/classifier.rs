//! Identity classification.
//!
//! `TypeClassifier` is the ground truth the cache is built from: given an
//! identity and a verb it computes the implied operation from scratch, with no
//! memoization of its own.

use super::compiled_rules::{CompiledRules, RuleSet, normalize_identity};
use super::resolve::resolve_operation;
use crate::error::LoadError;
use crate::{OperationType, SemanticCategory, Verb, VerbTable};
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Classifies identities against a compiled rule set.
#[derive(Debug)]
pub struct TypeClassifier {
    rules: CompiledRules,
}

impl TypeClassifier {
    pub fn from_rule_set(set: &RuleSet) -> Result<Self, LoadError> {
        let rules = CompiledRules::new(set)?;

        if rules.is_empty() {
            tracing::warn!("classification resource contains no rules; every interaction is unrestricted");
        } else {
            tracing::info!(
                rules = rules.len(),
                exact = rules.index.exact.len(),
                namespaces = rules.index.by_namespace.len(),
                global = rules.index.always_on.len(),
                "compiled classification rules"
            );
        }

        Ok(Self { rules })
    }

    /// Load a YAML classification resource.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, LoadError> {
        Self::from_rule_set(&RuleSet::from_slice(bytes)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LoadError> {
        Self::from_rule_set(&RuleSet::from_reader(reader)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn rules(&self) -> &CompiledRules {
        &self.rules
    }

    /// Categories of `identity`, exact matches first.
    pub fn categories(&self, identity: &str) -> Vec<SemanticCategory> {
        if identity.trim().is_empty() {
            return Vec::new();
        }
        self.rules.categories(&normalize_identity(identity, self.rules.namespace()))
    }

    /// The operation `verb` on `identity` represents, or `None` when no rule
    /// restricts it.
    pub fn classify(&self, identity: &str, verb: Verb) -> Option<OperationType> {
        resolve_operation(&self.categories(identity), verb)
    }

    /// Resolve every verb at once (one category pass).
    pub fn operations(&self, identity: &str) -> VerbTable {
        let categories = self.categories(identity);
        let mut table = VerbTable::default();
        if categories.is_empty() {
            return table;
        }
        for verb in Verb::ALL {
            table.set(verb, resolve_operation(&categories, verb));
        }
        table
    }
}

impl FromStr for TypeClassifier {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_slice(s.as_bytes())
    }
}
