extern crate self as opguard;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[macro_use]
mod macros;
mod api;
mod dispatch;
mod engine;
mod error;
mod handler;
mod inspect;
mod operation;

pub use api::{DEFAULT_RESOURCE, Options, default_classifier};
pub use dispatch::{Cancellable, Dispatcher, EntityTarget, TeleportCause, Verdict};
pub use engine::{
    CacheStats, ClassificationCache, ClassificationRule, CompiledRules, MatchPattern, RebuildMetrics, RuleSet,
    TypeClassifier,
};
pub use error::{LoadError, NameError};
pub use handler::{OperationPolicy, PolicyChain, PolicyHandler};
pub use inspect::{HeldItem, InspectionTool, InspectorCallback, InspectorRegistry};
pub use operation::{BlockPos, Environment, Operation, OperationSet, OperationType, Position, User, World};

// --- Classification vocabulary ------------------------------------------------

/// The interaction context an identity is being classified for.
///
/// The same block means different things depending on what is being done to
/// it: a chest is a container when right-clicked but an ordinary block when
/// mined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Verb {
    Break,
    Place,
    Interact,
    UseItem,
    Attack,
    Trample,
    Spawn,
}

impl Verb {
    pub const COUNT: usize = 7;
    pub const ALL: [Verb; Verb::COUNT] =
        [Verb::Break, Verb::Place, Verb::Interact, Verb::UseItem, Verb::Attack, Verb::Trample, Verb::Spawn];

    /// Fixed slot of this verb inside a [`VerbTable`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Break => "break",
            Verb::Place => "place",
            Verb::Interact => "interact",
            Verb::UseItem => "use-item",
            Verb::Attack => "attack",
            Verb::Trample => "trample",
            Verb::Spawn => "spawn",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        match wanted.as_str() {
            "use" => Ok(Verb::Interact),
            "damage" => Ok(Verb::Attack),
            other => Verb::ALL
                .into_iter()
                .find(|verb| verb.as_str() == other)
                .ok_or_else(|| NameError::Unknown { kind: "verb", value: s.to_string() }),
        }
    }
}

/// Well-known category names understood by the operation resolver.
///
/// Rule files may use any other name too; those categories still restrict the
/// identity, they just resolve through the generic per-verb mapping.
pub mod category {
    /// Ordinary blocks, items and entities: protected against breaking,
    /// placing and attacking, free to click.
    pub const BLOCK: &str = "block";
    pub const CONTAINER: &str = "container";
    pub const DOOR: &str = "door";
    pub const REDSTONE_COMPONENT: &str = "redstone-component";
    pub const PRESSURE_PLATE: &str = "pressure-plate";
    pub const FARM_BLOCK: &str = "farm-block";
    pub const SPAWN_EGG: &str = "spawn-egg";
    pub const EMPTY_BUCKET: &str = "empty-bucket";
    pub const FILLED_BUCKET: &str = "filled-bucket";
    pub const HANGING_ENTITY: &str = "hanging-entity";
    pub const MONSTER: &str = "monster";
    pub const PASSIVE_MOB: &str = "passive-mob";
    pub const PERSISTENT_ENTITY: &str = "persistent-entity";
    pub const GRIEFING_MOB: &str = "griefing-mob";
}

/// A semantic tag ("container", "door", ...) attached to identities by the
/// classification rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Deserialize)]
#[serde(from = "String")]
pub struct SemanticCategory(Arc<str>);

impl SemanticCategory {
    /// Normalizes (trims, lowercases) the name.
    pub fn new(name: &str) -> Self {
        SemanticCategory(Arc::from(name.trim().to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SemanticCategory {
    fn from(name: String) -> Self {
        SemanticCategory::new(&name)
    }
}

impl From<&str> for SemanticCategory {
    fn from(name: &str) -> Self {
        SemanticCategory::new(name)
    }
}

impl fmt::Display for SemanticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The resolved operation of one identity, for every verb.
///
/// Indexed by [`Verb::index`]; a fixed array keeps the cache hot path free of
/// nested hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VerbTable([Option<OperationType>; Verb::COUNT]);

impl VerbTable {
    pub fn get(&self, verb: Verb) -> Option<OperationType> {
        self.0[verb.index()]
    }

    pub fn set(&mut self, verb: Verb, kind: Option<OperationType>) {
        self.0[verb.index()] = kind;
    }

    /// True when no verb restricts this identity.
    pub fn is_unrestricted(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }

    /// Every operation this identity can imply.
    pub fn operations(&self) -> OperationSet {
        self.0.iter().flatten().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Verb, Option<OperationType>)> + '_ {
        Verb::ALL.into_iter().map(|verb| (verb, self.get(verb)))
    }
}
