//! Category → operation resolution.
//!
//! The classifier turns an identity into an ordered list of categories. This
//! module turns that list into a single `OperationType` for a given verb:
//!
//! ```text
//! [category, ...] ──┬─ first category with a (category, verb) row
//!                   │    ├─ Restricted(op) -> Some(op)
//!                   │    └─ Unrestricted   -> None
//!                   └─ otherwise the generic entry for the verb
//! []              ──── None (no restriction)
//! ```
//!
//! Keeping the table here, separate from rule matching, lets rule files decide
//! *what a thing is* while this module decides *what doing something to it
//! means*.

use crate::{OperationType, SemanticCategory, Verb, category};

/// One row of the (category, verb) table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Row {
    Restricted(OperationType),
    /// The category says this verb is harmless; the generic mapping is skipped.
    Unrestricted,
}

/// Resolve an ordered category list for `verb`.
pub(crate) fn resolve_operation(categories: &[SemanticCategory], verb: Verb) -> Option<OperationType> {
    if categories.is_empty() {
        return None;
    }

    match categories.iter().find_map(|c| category_operation(c.as_str(), verb)) {
        Some(Row::Restricted(kind)) => Some(kind),
        Some(Row::Unrestricted) => None,
        None => generic_operation(verb),
    }
}

/// The row for a specific category, if it overrides the generic mapping.
pub(crate) fn category_operation(category: &str, verb: Verb) -> Option<Row> {
    use OperationType as Op;
    use Row::Restricted as R;

    let row = match (category, verb) {
        (category::CONTAINER, Verb::Interact) => R(Op::ContainerOpen),

        (category::DOOR, Verb::Interact) => R(Op::BlockInteract),

        (category::REDSTONE_COMPONENT | category::PRESSURE_PLATE, Verb::Interact | Verb::Trample) => {
            R(Op::RedstoneInteract)
        }

        (category::FARM_BLOCK, Verb::Break) => R(Op::FarmBlockBreak),
        (category::FARM_BLOCK, Verb::Place) => R(Op::FarmBlockPlace),
        (category::FARM_BLOCK, Verb::Interact | Verb::Trample) => R(Op::FarmBlockInteract),

        (category::SPAWN_EGG, Verb::UseItem | Verb::Interact) => R(Op::UseSpawnEgg),

        (category::EMPTY_BUCKET, Verb::UseItem) => R(Op::FillBucket),
        (category::FILLED_BUCKET, Verb::UseItem) => R(Op::EmptyBucket),

        (category::HANGING_ENTITY, Verb::Place | Verb::UseItem) => R(Op::PlaceHangingEntity),
        (category::HANGING_ENTITY, Verb::Break | Verb::Attack) => R(Op::BreakHangingEntity),
        (category::HANGING_ENTITY, Verb::Interact) => R(Op::EntityInteract),

        (category::MONSTER, Verb::Spawn) => R(Op::MonsterSpawn),
        (category::MONSTER, Verb::Attack) => R(Op::PlayerDamageMonster),

        (category::PASSIVE_MOB, Verb::Spawn) => R(Op::PassiveMobSpawn),
        (category::PASSIVE_MOB, Verb::Attack) => R(Op::PlayerDamageEntity),
        (category::PASSIVE_MOB | category::PERSISTENT_ENTITY, Verb::Interact) => R(Op::EntityInteract),

        (category::PERSISTENT_ENTITY, Verb::Attack) => R(Op::PlayerDamagePersistentEntity),

        (category::GRIEFING_MOB, Verb::Break) => R(Op::MonsterDamageTerrain),

        (category::BLOCK, Verb::Break) => R(Op::BlockBreak),
        (category::BLOCK, Verb::Place) => R(Op::BlockPlace),
        (category::BLOCK, Verb::Attack) => R(Op::PlayerDamageEntity),
        (category::BLOCK, _) => Row::Unrestricted,

        _ => return None,
    };
    Some(row)
}

/// Operation implied by any classified identity for `verb`.
///
/// Spawning is only restricted for identities with a spawn-specific category.
pub(crate) fn generic_operation(verb: Verb) -> Option<OperationType> {
    match verb {
        Verb::Break => Some(OperationType::BlockBreak),
        Verb::Place => Some(OperationType::BlockPlace),
        Verb::Interact => Some(OperationType::BlockInteract),
        Verb::UseItem => Some(OperationType::ItemUse),
        Verb::Attack => Some(OperationType::PlayerDamageEntity),
        Verb::Trample => Some(OperationType::BlockInteract),
        Verb::Spawn => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cats(names: &[&str]) -> Vec<SemanticCategory> {
        names.iter().map(|n| SemanticCategory::new(n)).collect()
    }

    #[test]
    fn no_categories_means_no_restriction() {
        for verb in Verb::ALL {
            assert_eq!(resolve_operation(&[], verb), None);
        }
    }

    #[test]
    fn container_depends_on_verb() {
        let c = cats(&["container"]);
        assert_eq!(resolve_operation(&c, Verb::Interact), Some(OperationType::ContainerOpen));
        assert_eq!(resolve_operation(&c, Verb::Break), Some(OperationType::BlockBreak));
        assert_eq!(resolve_operation(&c, Verb::Place), Some(OperationType::BlockPlace));
    }

    #[test]
    fn first_category_with_an_entry_wins() {
        let door_first = cats(&["door", "redstone-component"]);
        assert_eq!(resolve_operation(&door_first, Verb::Interact), Some(OperationType::BlockInteract));
        // The door has nothing to say about trampling, so the next category decides.
        assert_eq!(resolve_operation(&door_first, Verb::Trample), Some(OperationType::RedstoneInteract));

        let redstone_first = cats(&["redstone-component", "door"]);
        assert_eq!(resolve_operation(&redstone_first, Verb::Interact), Some(OperationType::RedstoneInteract));
    }

    #[test]
    fn unknown_categories_use_generic_mapping() {
        let ore = cats(&["ore"]);
        assert_eq!(resolve_operation(&ore, Verb::Break), Some(OperationType::BlockBreak));
        assert_eq!(resolve_operation(&ore, Verb::Spawn), None);
    }

    #[test]
    fn plain_blocks_are_free_to_click() {
        let stone = cats(&["block"]);
        assert_eq!(resolve_operation(&stone, Verb::Break), Some(OperationType::BlockBreak));
        assert_eq!(resolve_operation(&stone, Verb::Place), Some(OperationType::BlockPlace));
        assert_eq!(resolve_operation(&stone, Verb::Attack), Some(OperationType::PlayerDamageEntity));
        for verb in [Verb::Interact, Verb::UseItem, Verb::Trample, Verb::Spawn] {
            assert_eq!(resolve_operation(&stone, verb), None, "{verb}");
        }
    }

    #[test]
    fn specific_categories_override_block() {
        let chest = cats(&["container", "block"]);
        assert_eq!(resolve_operation(&chest, Verb::Interact), Some(OperationType::ContainerOpen));
        assert_eq!(resolve_operation(&chest, Verb::UseItem), None);

        // A category without a row defers to the next one.
        let ore = cats(&["ore", "block"]);
        assert_eq!(resolve_operation(&ore, Verb::Interact), None);
        assert_eq!(category_operation("ore", Verb::Interact), None);
        assert_eq!(category_operation("block", Verb::Interact), Some(Row::Unrestricted));
    }

    #[test]
    fn entity_categories() {
        assert_eq!(resolve_operation(&cats(&["monster"]), Verb::Spawn), Some(OperationType::MonsterSpawn));
        assert_eq!(resolve_operation(&cats(&["monster"]), Verb::Attack), Some(OperationType::PlayerDamageMonster));
        assert_eq!(resolve_operation(&cats(&["passive-mob"]), Verb::Spawn), Some(OperationType::PassiveMobSpawn));
        assert_eq!(
            resolve_operation(&cats(&["persistent-entity"]), Verb::Attack),
            Some(OperationType::PlayerDamagePersistentEntity)
        );
        assert_eq!(resolve_operation(&cats(&["griefing-mob"]), Verb::Break), Some(OperationType::MonsterDamageTerrain));
    }
}
