//! Event dispatch.
//!
//! The dispatcher is the boundary platform adapters talk to. An adapter
//! subscribes to its engine's native events, pulls out the acting user, the
//! position and the identity involved, and calls the matching `on_*` function
//! here. The returned [`Verdict`] is applied back onto the native event.
//!
//! ```text
//! native event ─▶ adapter ─▶ Dispatcher::on_* ──┬─ inspection tool?  ─▶ callback (no handler)
//!                                               ├─ classify(identity, verb) ─▶ None ─▶ Allow
//!                                               └─ Operation ─▶ PolicyHandler ─▶ Verdict
//! native event ◀─ Verdict::apply ◀──────────────┘
//! ```
//!
//! Every function runs synchronously on the calling (tick) thread and makes at
//! most the handler calls it documents. Events that do not classify to an
//! operation are allowed without consulting the handler.

use crate::api::{Options, default_classifier};
use crate::engine::{ClassificationCache, RebuildMetrics, TypeClassifier};
use crate::error::LoadError;
use crate::handler::PolicyHandler;
use crate::inspect::{HeldItem, InspectionTool, InspectorCallback, InspectorRegistry};
use crate::{Operation, OperationType, Position, User, Verb};
use std::sync::Arc;

/// The outcome of dispatching one native event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Cancel,
}

impl Verdict {
    pub fn from_cancel(cancel: bool) -> Self {
        if cancel { Verdict::Cancel } else { Verdict::Allow }
    }

    pub fn is_cancelled(self) -> bool {
        self == Verdict::Cancel
    }

    /// Cancel `event` if this verdict says so. An allowed verdict leaves the
    /// event untouched (another listener may already have cancelled it).
    pub fn apply<E: Cancellable + ?Sized>(self, event: &mut E) {
        if self.is_cancelled() {
            event.set_cancelled(true);
        }
    }
}

/// A native event that can be suppressed.
pub trait Cancellable {
    fn set_cancelled(&mut self, cancelled: bool);
}

/// Why a user teleported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeleportCause {
    EnderPearl,
    ChorusFruit,
    Command,
    Portal,
    Other,
}

/// The entity on the receiving end of an attack.
#[derive(Debug, Clone, Copy)]
pub struct EntityTarget<'a> {
    pub identity: &'a str,
    /// Set when the entity is a user.
    pub player: Option<&'a User>,
}

impl<'a> EntityTarget<'a> {
    pub fn entity(identity: &'a str) -> Self {
        Self { identity, player: None }
    }

    pub fn player(identity: &'a str, user: &'a User) -> Self {
        Self { identity, player: Some(user) }
    }
}

/// Translates native events into operations and asks the handler about them.
#[derive(Debug)]
pub struct Dispatcher<H> {
    handler: H,
    cache: ClassificationCache,
    inspectors: InspectorRegistry,
    options: Options,
}

impl<H: PolicyHandler> Dispatcher<H> {
    pub fn new(handler: H, classifier: impl Into<Arc<TypeClassifier>>, options: Options) -> Self {
        let cache = ClassificationCache::new(classifier, &options);
        Self { handler, cache, inspectors: InspectorRegistry::new(), options }
    }

    /// Build a dispatcher from a YAML classification resource.
    ///
    /// The engine cannot run without rules, so a missing or malformed resource
    /// is an error the host should treat as fatal.
    pub fn from_resource(handler: H, resource: &[u8], options: Options) -> Result<Self, LoadError> {
        Ok(Self::new(handler, TypeClassifier::from_slice(resource)?, options))
    }

    /// Build a dispatcher over the embedded default rules.
    pub fn with_default_rules(handler: H, options: Options) -> Result<Self, LoadError> {
        Ok(Self::new(handler, default_classifier()?, options))
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn cache(&self) -> &ClassificationCache {
        &self.cache
    }

    pub fn inspectors(&self) -> &InspectorRegistry {
        &self.inspectors
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The operation `verb` on `identity` represents right now.
    pub fn classify(&self, identity: &str, verb: Verb) -> Option<OperationType> {
        self.cache.lookup(identity, verb)
    }

    /// Register the callback for `tool`, replacing any previous one.
    pub fn set_inspector_callback<F>(&self, tool: InspectionTool, callback: F) -> Option<InspectorCallback>
    where
        F: Fn(&User, &Position) + Send + Sync + 'static,
    {
        self.inspectors.set_callback(tool, callback)
    }

    // --- Lifecycle -------------------------------------------------------------

    /// Precompute classifications for every registered identity.
    pub fn on_server_started<I, S>(&self, identities: I) -> RebuildMetrics
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.cache.rebuild(identities)
    }

    /// The identity registry changed (data packs reloaded); recompute.
    pub fn on_data_reloaded<I, S>(&self, identities: I) -> RebuildMetrics
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.cache.rebuild(identities)
    }

    /// Replace the classification rules at runtime.
    ///
    /// On error the previous rules stay active.
    pub fn reload_rules(&self, resource: &[u8]) -> Result<RebuildMetrics, LoadError> {
        match TypeClassifier::from_slice(resource) {
            Ok(classifier) => Ok(self.cache.reload(classifier)),
            Err(err) => {
                tracing::warn!(error = %err, "classification reload failed; keeping previous rules");
                Err(err)
            }
        }
    }

    // --- Core checks -----------------------------------------------------------

    /// Ask the handler about a ready-made operation.
    pub fn check(&self, operation: &Operation) -> Verdict {
        let verdict = Verdict::from_cancel(self.handler.cancel_operation(operation));
        if verdict.is_cancelled() {
            tracing::debug!(%operation, "operation cancelled");
        }
        verdict
    }

    fn check_kind(&self, user: Option<&User>, kind: OperationType, position: &Position) -> Verdict {
        self.check(&Operation::with_actor(user.cloned(), kind, position.clone()))
    }

    fn check_classified(&self, user: Option<&User>, identity: &str, verb: Verb, position: &Position) -> Verdict {
        match self.classify(identity, verb) {
            Some(kind) => self.check_kind(user, kind, position),
            None => {
                tracing::trace!(identity, %verb, "unrestricted interaction");
                Verdict::Allow
            }
        }
    }

    // --- Blocks ----------------------------------------------------------------

    pub fn on_block_break(&self, user: &User, position: &Position, block: &str) -> Verdict {
        self.check_classified(Some(user), block, Verb::Break, position)
    }

    pub fn on_block_place(&self, user: &User, position: &Position, block: &str) -> Verdict {
        self.check_classified(Some(user), block, Verb::Place, position)
    }

    /// A user right-clicks `block`, optionally holding an item.
    ///
    /// A held inspection tool short-circuits: its callback runs and the handler
    /// is not consulted. Otherwise the block interaction is checked first, then
    /// the use of the held item on it.
    pub fn on_use_block(&self, user: &User, position: &Position, block: &str, held: Option<HeldItem<'_>>) -> Verdict {
        if let Some(item) = &held {
            if self.inspectors.inspect(item, user, position) {
                return Verdict::from_cancel(self.options.cancel_on_inspect);
            }
        }

        let verdict = self.check_classified(Some(user), block, Verb::Interact, position);
        match held {
            Some(item) if !verdict.is_cancelled() => {
                self.check_classified(Some(user), item.identity, Verb::UseItem, position)
            }
            _ => verdict,
        }
    }

    /// A user uses the held item without targeting a block.
    pub fn on_use_item(&self, user: &User, position: &Position, held: HeldItem<'_>) -> Verdict {
        self.check_classified(Some(user), held.identity, Verb::UseItem, position)
    }

    /// Stepping on or trampling a block (pressure plates, tripwires, farmland).
    /// `user` is `None` when a mob or item triggered it.
    pub fn on_physical_interact(&self, user: Option<&User>, position: &Position, block: &str) -> Verdict {
        self.check_classified(user, block, Verb::Trample, position)
    }

    pub fn on_take_lectern_book(&self, user: &User, position: &Position) -> Verdict {
        self.check_kind(Some(user), OperationType::ContainerOpen, position)
    }

    // --- Entities --------------------------------------------------------------

    pub fn on_use_entity(&self, user: &User, position: &Position, entity: &str) -> Verdict {
        match self.classify(entity, Verb::Interact) {
            // The generic reading of an interaction is a block one; on an
            // entity that means interacting with the entity.
            Some(OperationType::BlockInteract) => self.check_kind(Some(user), OperationType::EntityInteract, position),
            Some(kind) => self.check_kind(Some(user), kind, position),
            None => Verdict::Allow,
        }
    }

    pub fn on_attack_entity(&self, user: &User, position: &Position, target: EntityTarget<'_>) -> Verdict {
        match target.player {
            Some(_) => self.check_kind(Some(user), OperationType::PlayerDamagePlayer, position),
            None => self.check_classified(Some(user), target.identity, Verb::Attack, position),
        }
    }

    pub fn on_mob_spawn(&self, position: &Position, entity: &str) -> Verdict {
        self.check_classified(None, entity, Verb::Spawn, position)
    }

    /// A mob changes a block (enderman pickup, creeper crater, ravager trample).
    /// Only mobs classified as griefers are checked.
    pub fn on_mob_grief(&self, position: &Position, entity: &str) -> Verdict {
        match self.classify(entity, Verb::Break) {
            Some(kind @ OperationType::MonsterDamageTerrain) => self.check_kind(None, kind, position),
            _ => Verdict::Allow,
        }
    }

    pub fn on_projectile_hit_block(&self, shooter: Option<&User>, position: &Position) -> Verdict {
        self.check_kind(shooter, OperationType::ProjectileHitBlock, position)
    }

    pub fn on_projectile_hit_entity(&self, shooter: Option<&User>, position: &Position) -> Verdict {
        self.check_kind(shooter, OperationType::ProjectileHitEntity, position)
    }

    // --- Movement --------------------------------------------------------------

    /// Only block-boundary crossings reach the handler; moving within a block
    /// is always allowed without a call.
    pub fn on_player_move(&self, user: &User, from: &Position, to: &Position) -> Verdict {
        if from.same_block(to) {
            return Verdict::Allow;
        }

        let verdict = Verdict::from_cancel(self.handler.cancel_movement(user, from, to));
        if verdict.is_cancelled() {
            tracing::debug!(%user, %from, %to, "movement cancelled");
        }
        verdict
    }

    pub fn on_teleport(&self, user: &User, from: &Position, cause: TeleportCause) -> Verdict {
        match cause {
            TeleportCause::EnderPearl | TeleportCause::ChorusFruit => {
                self.check_kind(Some(user), OperationType::EnderPearlTeleport, from)
            }
            _ => Verdict::Allow,
        }
    }

    // --- Nature ----------------------------------------------------------------

    pub fn on_fire_spread(&self, position: &Position) -> Verdict {
        self.check_kind(None, OperationType::FireSpread, position)
    }

    pub fn on_fire_burn(&self, position: &Position) -> Verdict {
        self.check_kind(None, OperationType::FireBurn, position)
    }

    /// Remove the blocks an explosion may not destroy from `blocks`.
    /// Returns how many were removed.
    pub fn on_explosion_blocks(&self, source: Option<&User>, blocks: &mut Vec<Position>) -> usize {
        let before = blocks.len();
        blocks.retain(|block| !self.check_kind(source, OperationType::ExplosionDamageTerrain, block).is_cancelled());
        before - blocks.len()
    }

    pub fn on_explosion_damage_entity(&self, source: Option<&User>, position: &Position) -> Verdict {
        self.check_kind(source, OperationType::ExplosionDamageEntity, position)
    }

    /// A piston extends or retracts, moving `moved`.
    ///
    /// The actuation itself is checked first, then every block it moves must be
    /// allowed to travel from the piston's position.
    pub fn on_piston_actuate(&self, piston: &Position, moved: &[Position]) -> Verdict {
        if self.check_kind(None, OperationType::PistonActuate, piston).is_cancelled() {
            return Verdict::Cancel;
        }
        let cancel = moved.iter().any(|block| self.handler.cancel_nature(&piston.world, piston, block));
        Verdict::from_cancel(cancel)
    }

    pub fn on_fluid_flow(&self, from: &Position, to: &Position) -> Verdict {
        Verdict::from_cancel(self.handler.cancel_nature(&from.world, from, to))
    }

    pub fn on_dispenser_place(&self, dispenser: &Position, target: &Position) -> Verdict {
        Verdict::from_cancel(self.handler.cancel_nature(&dispenser.world, dispenser, target))
    }

    // --- Players affecting the world indirectly --------------------------------

    pub fn on_frost_walk(&self, user: &User, position: &Position) -> Verdict {
        self.check_kind(Some(user), OperationType::FrostWalk, position)
    }

    pub fn on_raid_trigger(&self, user: &User, position: &Position) -> Verdict {
        self.check_kind(Some(user), OperationType::StartRaid, position)
    }
}
