use crate::engine::TypeClassifier;
use crate::error::LoadError;
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// The classification resource shipped with the crate.
pub const DEFAULT_RESOURCE: &str = include_str!("../resources/classification.yml");

static DEFAULT_CLASSIFIER: OnceCell<Arc<TypeClassifier>> = OnceCell::new();

/// Options that affect caching and dispatch behavior.
#[derive(Debug, Clone)]
pub struct Options {
    /// Memoize identities that were not part of the last rebuild (for example
    /// blocks registered after the world started) until the next rebuild.
    pub memoize_misses: bool,
    /// Cancel the native use-action when an inspection callback consumed it.
    pub cancel_on_inspect: bool,
    /// Most identities memoized per cache generation.
    pub late_entry_limit: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self { memoize_misses: true, cancel_on_inspect: true, late_entry_limit: 4096 }
    }
}

/// The classifier for [`DEFAULT_RESOURCE`], compiled on first use and shared.
pub fn default_classifier() -> Result<Arc<TypeClassifier>, LoadError> {
    DEFAULT_CLASSIFIER.get_or_try_init(|| TypeClassifier::from_slice(DEFAULT_RESOURCE.as_bytes()).map(Arc::new)).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OperationType, Verb};

    #[test]
    fn default_resource_compiles() {
        let classifier = default_classifier().unwrap();
        assert!(!classifier.rules().is_empty());
        assert!(Arc::ptr_eq(&classifier, &default_classifier().unwrap()));
    }

    #[test]
    fn default_resource_covers_common_blocks() {
        let c = default_classifier().unwrap();
        let cases = [
            ("minecraft:chest", Verb::Interact, Some(OperationType::ContainerOpen)),
            ("minecraft:chest", Verb::Break, Some(OperationType::BlockBreak)),
            ("minecraft:oak_door", Verb::Interact, Some(OperationType::BlockInteract)),
            ("minecraft:lever", Verb::Interact, Some(OperationType::RedstoneInteract)),
            ("minecraft:stone_pressure_plate", Verb::Trample, Some(OperationType::RedstoneInteract)),
            ("minecraft:farmland", Verb::Trample, Some(OperationType::FarmBlockInteract)),
            ("minecraft:wheat", Verb::Break, Some(OperationType::FarmBlockBreak)),
            ("minecraft:stone", Verb::Break, Some(OperationType::BlockBreak)),
            ("minecraft:stone", Verb::Interact, None),
            ("minecraft:bread", Verb::UseItem, None),
            ("minecraft:chest", Verb::UseItem, None),
            ("minecraft:zombie", Verb::Interact, None),
            ("minecraft:zombie_spawn_egg", Verb::UseItem, Some(OperationType::UseSpawnEgg)),
            ("minecraft:bucket", Verb::UseItem, Some(OperationType::FillBucket)),
            ("minecraft:water_bucket", Verb::UseItem, Some(OperationType::EmptyBucket)),
            ("minecraft:item_frame", Verb::UseItem, Some(OperationType::PlaceHangingEntity)),
            ("minecraft:zombie", Verb::Spawn, Some(OperationType::MonsterSpawn)),
            ("minecraft:zombie", Verb::Attack, Some(OperationType::PlayerDamageMonster)),
            ("minecraft:cow", Verb::Spawn, Some(OperationType::PassiveMobSpawn)),
            ("minecraft:armor_stand", Verb::Attack, Some(OperationType::PlayerDamagePersistentEntity)),
            ("minecraft:enderman", Verb::Break, Some(OperationType::MonsterDamageTerrain)),
        ];

        for (identity, verb, expected) in cases {
            assert_eq!(c.classify(identity, verb), expected, "{identity} {verb}");
        }
    }

    #[test]
    fn default_resource_leaves_other_namespaces_alone() {
        let c = default_classifier().unwrap();
        for verb in Verb::ALL {
            assert_eq!(c.classify("somemod:gadget", verb), None);
        }
    }
}
