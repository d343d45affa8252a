//! Canonical operation model.
//!
//! Everything the policy handler reasons about is expressed with the small set
//! of value types in this module:
//!
//! ```text
//! World ──┐
//!         ├─ Position (x, y, z, facing) ──▶ BlockPos (floored, hashable)
//! User ───┤
//!         └─ Operation { kind: OperationType, position, user?, secondary? }
//! ```
//!
//! Values are immutable once built and cheap to clone (names are `Arc<str>`).
//! An `Operation` is built fresh for each native event and dropped once the
//! handler has answered.

use crate::error::NameError;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

// --- Worlds, positions, users -----------------------------------------------

/// Dimension flavour of a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Environment {
    #[default]
    Overworld,
    Nether,
    End,
    Custom,
}

/// A world (dimension) that positions live in.
///
/// Two worlds are the same world when their ids match; the name is only for
/// display.
#[derive(Debug, Clone)]
pub struct World {
    pub name: Arc<str>,
    pub id: Uuid,
    pub environment: Environment,
}

impl World {
    pub fn new(name: impl Into<Arc<str>>, id: Uuid, environment: Environment) -> Self {
        Self { name: name.into(), id, environment }
    }
}

impl PartialEq for World {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for World {}

impl Hash for World {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Integer block coordinates within a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockPos {
    pub world: Uuid,
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

/// A point in a world, with optional facing.
///
/// Equality and hashing are **block-granular**: two positions compare equal
/// when they fall into the same block of the same world, regardless of the
/// sub-block offset or facing. Movement checks rely on this.
#[derive(Debug, Clone)]
pub struct Position {
    pub world: World,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f32,
    pub pitch: f32,
}

impl Position {
    pub fn new(world: World, x: f64, y: f64, z: f64) -> Self {
        Self { world, x, y, z, yaw: 0.0, pitch: 0.0 }
    }

    /// Same position, looking in the given direction.
    pub fn facing(self, yaw: f32, pitch: f32) -> Self {
        Self { yaw, pitch, ..self }
    }

    /// The block containing this position.
    pub fn block(&self) -> BlockPos {
        BlockPos { world: self.world.id, x: floor(self.x), y: floor(self.y), z: floor(self.z) }
    }

    /// Whether both positions fall into the same block.
    pub fn same_block(&self, other: &Position) -> bool {
        self.block() == other.block()
    }
}

// `as` saturates, and maps NaN to 0.
fn floor(v: f64) -> i64 {
    v.floor() as i64
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.same_block(other)
    }
}

impl Eq for Position {}

impl Hash for Position {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.block().hash(state);
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.block();
        write!(f, "{}@({}, {}, {})", self.world, b.x, b.y, b.z)
    }
}

/// An acting user, identified by a stable id.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: Arc<str>,
}

impl User {
    pub fn new(id: Uuid, name: impl Into<Arc<str>>) -> Self {
        Self { id, name: name.into() }
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for User {}

impl Hash for User {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// --- Operation types ---------------------------------------------------------

/// The closed set of operation kinds a policy handler can be asked about.
///
/// Adding a variant changes the handler contract: every handler has to learn
/// how to treat the new kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperationType {
    BlockBreak,
    BlockPlace,
    BlockInteract,
    ContainerOpen,
    RedstoneInteract,
    FarmBlockBreak,
    FarmBlockPlace,
    FarmBlockInteract,
    ItemUse,
    UseSpawnEgg,
    FillBucket,
    EmptyBucket,
    PlaceHangingEntity,
    BreakHangingEntity,
    EntityInteract,
    PlayerDamagePlayer,
    PlayerDamageMonster,
    PlayerDamageEntity,
    PlayerDamagePersistentEntity,
    MonsterSpawn,
    PassiveMobSpawn,
    MonsterDamageTerrain,
    ExplosionDamageTerrain,
    ExplosionDamageEntity,
    FireBurn,
    FireSpread,
    PistonActuate,
    ProjectileHitBlock,
    ProjectileHitEntity,
    EnderPearlTeleport,
    FrostWalk,
    StartRaid,
    Movement,
}

impl OperationType {
    pub const ALL: [OperationType; 33] = [
        OperationType::BlockBreak,
        OperationType::BlockPlace,
        OperationType::BlockInteract,
        OperationType::ContainerOpen,
        OperationType::RedstoneInteract,
        OperationType::FarmBlockBreak,
        OperationType::FarmBlockPlace,
        OperationType::FarmBlockInteract,
        OperationType::ItemUse,
        OperationType::UseSpawnEgg,
        OperationType::FillBucket,
        OperationType::EmptyBucket,
        OperationType::PlaceHangingEntity,
        OperationType::BreakHangingEntity,
        OperationType::EntityInteract,
        OperationType::PlayerDamagePlayer,
        OperationType::PlayerDamageMonster,
        OperationType::PlayerDamageEntity,
        OperationType::PlayerDamagePersistentEntity,
        OperationType::MonsterSpawn,
        OperationType::PassiveMobSpawn,
        OperationType::MonsterDamageTerrain,
        OperationType::ExplosionDamageTerrain,
        OperationType::ExplosionDamageEntity,
        OperationType::FireBurn,
        OperationType::FireSpread,
        OperationType::PistonActuate,
        OperationType::ProjectileHitBlock,
        OperationType::ProjectileHitEntity,
        OperationType::EnderPearlTeleport,
        OperationType::FrostWalk,
        OperationType::StartRaid,
        OperationType::Movement,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OperationType::BlockBreak => "block-break",
            OperationType::BlockPlace => "block-place",
            OperationType::BlockInteract => "block-interact",
            OperationType::ContainerOpen => "container-open",
            OperationType::RedstoneInteract => "redstone-interact",
            OperationType::FarmBlockBreak => "farm-block-break",
            OperationType::FarmBlockPlace => "farm-block-place",
            OperationType::FarmBlockInteract => "farm-block-interact",
            OperationType::ItemUse => "item-use",
            OperationType::UseSpawnEgg => "use-spawn-egg",
            OperationType::FillBucket => "fill-bucket",
            OperationType::EmptyBucket => "empty-bucket",
            OperationType::PlaceHangingEntity => "place-hanging-entity",
            OperationType::BreakHangingEntity => "break-hanging-entity",
            OperationType::EntityInteract => "entity-interact",
            OperationType::PlayerDamagePlayer => "player-damage-player",
            OperationType::PlayerDamageMonster => "player-damage-monster",
            OperationType::PlayerDamageEntity => "player-damage-entity",
            OperationType::PlayerDamagePersistentEntity => "player-damage-persistent-entity",
            OperationType::MonsterSpawn => "monster-spawn",
            OperationType::PassiveMobSpawn => "passive-mob-spawn",
            OperationType::MonsterDamageTerrain => "monster-damage-terrain",
            OperationType::ExplosionDamageTerrain => "explosion-damage-terrain",
            OperationType::ExplosionDamageEntity => "explosion-damage-entity",
            OperationType::FireBurn => "fire-burn",
            OperationType::FireSpread => "fire-spread",
            OperationType::PistonActuate => "piston-actuate",
            OperationType::ProjectileHitBlock => "projectile-hit-block",
            OperationType::ProjectileHitEntity => "projectile-hit-entity",
            OperationType::EnderPearlTeleport => "ender-pearl-teleport",
            OperationType::FrostWalk => "frost-walk",
            OperationType::StartRaid => "start-raid",
            OperationType::Movement => "movement",
        }
    }

    /// Natural operations: nobody is around to be told they were blocked.
    pub fn is_silent(self) -> bool {
        matches!(
            self,
            OperationType::MonsterSpawn
                | OperationType::PassiveMobSpawn
                | OperationType::MonsterDamageTerrain
                | OperationType::ExplosionDamageTerrain
                | OperationType::ExplosionDamageEntity
                | OperationType::FireBurn
                | OperationType::FireSpread
                | OperationType::PistonActuate
        )
    }

    /// The single-bit set for this kind.
    pub fn flag(self) -> OperationSet {
        OperationSet::from_bits_retain(1u64 << (self as u32))
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationType {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        OperationType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| NameError::Unknown { kind: "operation type", value: s.to_string() })
    }
}

bitflags::bitflags! {
    /// A set of operation kinds, one bit per `OperationType` discriminant.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct OperationSet: u64 {
        const BLOCK_BREAK                     = 1 << 0;
        const BLOCK_PLACE                     = 1 << 1;
        const BLOCK_INTERACT                  = 1 << 2;
        const CONTAINER_OPEN                  = 1 << 3;
        const REDSTONE_INTERACT               = 1 << 4;
        const FARM_BLOCK_BREAK                = 1 << 5;
        const FARM_BLOCK_PLACE                = 1 << 6;
        const FARM_BLOCK_INTERACT             = 1 << 7;
        const ITEM_USE                        = 1 << 8;
        const USE_SPAWN_EGG                   = 1 << 9;
        const FILL_BUCKET                     = 1 << 10;
        const EMPTY_BUCKET                    = 1 << 11;
        const PLACE_HANGING_ENTITY            = 1 << 12;
        const BREAK_HANGING_ENTITY            = 1 << 13;
        const ENTITY_INTERACT                 = 1 << 14;
        const PLAYER_DAMAGE_PLAYER            = 1 << 15;
        const PLAYER_DAMAGE_MONSTER           = 1 << 16;
        const PLAYER_DAMAGE_ENTITY            = 1 << 17;
        const PLAYER_DAMAGE_PERSISTENT_ENTITY = 1 << 18;
        const MONSTER_SPAWN                   = 1 << 19;
        const PASSIVE_MOB_SPAWN               = 1 << 20;
        const MONSTER_DAMAGE_TERRAIN          = 1 << 21;
        const EXPLOSION_DAMAGE_TERRAIN        = 1 << 22;
        const EXPLOSION_DAMAGE_ENTITY         = 1 << 23;
        const FIRE_BURN                       = 1 << 24;
        const FIRE_SPREAD                     = 1 << 25;
        const PISTON_ACTUATE                  = 1 << 26;
        const PROJECTILE_HIT_BLOCK            = 1 << 27;
        const PROJECTILE_HIT_ENTITY           = 1 << 28;
        const ENDER_PEARL_TELEPORT            = 1 << 29;
        const FROST_WALK                      = 1 << 30;
        const START_RAID                      = 1 << 31;
        const MOVEMENT                        = 1 << 32;
    }
}

impl OperationSet {
    pub fn has(self, kind: OperationType) -> bool {
        self.contains(kind.flag())
    }

    pub fn kinds(self) -> impl Iterator<Item = OperationType> {
        OperationType::ALL.into_iter().filter(move |kind| self.has(*kind))
    }
}

impl FromIterator<OperationType> for OperationSet {
    fn from_iter<I: IntoIterator<Item = OperationType>>(iter: I) -> Self {
        iter.into_iter().fold(OperationSet::empty(), |set, kind| set | kind.flag())
    }
}

// --- Operation ---------------------------------------------------------------

/// One world interaction, ready to be judged.
///
/// `user` is `None` for natural operations (fire spread, explosions from
/// nobody in particular). `secondary` is only set for movement, where it holds
/// the destination.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    kind: OperationType,
    position: Position,
    user: Option<User>,
    secondary: Option<Position>,
}

impl Operation {
    /// An operation with no acting user.
    pub fn of(kind: OperationType, position: Position) -> Self {
        Self { kind, position, user: None, secondary: None }
    }

    /// An operation performed by `user`.
    pub fn by(user: User, kind: OperationType, position: Position) -> Self {
        Self { kind, position, user: Some(user), secondary: None }
    }

    pub fn with_actor(user: Option<User>, kind: OperationType, position: Position) -> Self {
        Self { kind, position, user, secondary: None }
    }

    /// `user` moving from `from` to `to`.
    pub fn movement(user: User, from: Position, to: Position) -> Self {
        Self { kind: OperationType::Movement, position: from, user: Some(user), secondary: Some(to) }
    }

    pub fn kind(&self) -> OperationType {
        self.kind
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn secondary(&self) -> Option<&Position> {
        self.secondary.as_ref()
    }

    pub fn is_silent(&self) -> bool {
        self.kind.is_silent()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.kind, self.position)?;
        if let Some(to) = &self.secondary {
            write!(f, " -> {to}")?;
        }
        if let Some(user) = &self.user {
            write!(f, " by {user}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overworld() -> World {
        World::new("world", Uuid::from_u128(1), Environment::Overworld)
    }

    #[test]
    fn positions_compare_by_block() {
        let a = Position::new(overworld(), 10.1, 64.0, -0.5);
        let b = Position::new(overworld(), 10.9, 64.99, -0.01).facing(90.0, 10.0);
        let c = Position::new(overworld(), 11.0, 64.0, -0.5);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.block(), BlockPos { world: Uuid::from_u128(1), x: 10, y: 64, z: -1 });
    }

    #[test]
    fn positions_in_different_worlds_differ() {
        let nether = World::new("world_nether", Uuid::from_u128(2), Environment::Nether);
        let a = Position::new(overworld(), 0.5, 0.5, 0.5);
        let b = Position::new(nether, 0.5, 0.5, 0.5);
        assert_ne!(a, b);
    }

    #[test]
    fn users_are_equal_by_id() {
        let id = Uuid::from_u128(7);
        assert_eq!(User::new(id, "Alice"), User::new(id, "alice_renamed"));
        assert_ne!(User::new(id, "Alice"), User::new(Uuid::from_u128(8), "Alice"));
    }

    #[test]
    fn movement_carries_destination() {
        let user = User::new(Uuid::from_u128(3), "Steve");
        let from = Position::new(overworld(), 0.0, 64.0, 0.0);
        let to = Position::new(overworld(), 1.0, 64.0, 0.0);
        let op = Operation::movement(user.clone(), from.clone(), to.clone());

        assert_eq!(op.kind(), OperationType::Movement);
        assert_eq!(op.position(), &from);
        assert_eq!(op.secondary(), Some(&to));
        assert_eq!(op.user(), Some(&user));
    }

    #[test]
    fn natural_operations_have_no_user() {
        let op = Operation::of(OperationType::FireSpread, Position::new(overworld(), 0.0, 0.0, 0.0));
        assert!(op.user().is_none());
        assert!(op.secondary().is_none());
        assert!(op.is_silent());
    }

    #[test]
    fn operation_names_round_trip_through_from_str() {
        for kind in OperationType::ALL {
            assert_eq!(kind.as_str().parse::<OperationType>().unwrap(), kind);
        }
        assert_eq!("BLOCK_BREAK".parse::<OperationType>().unwrap(), OperationType::BlockBreak);
        assert!("teleport-anywhere".parse::<OperationType>().is_err());
    }

    #[test]
    fn flags_line_up_with_named_constants() {
        assert_eq!(OperationType::BlockBreak.flag(), OperationSet::BLOCK_BREAK);
        assert_eq!(OperationType::PlayerDamagePersistentEntity.flag(), OperationSet::PLAYER_DAMAGE_PERSISTENT_ENTITY);
        assert_eq!(OperationType::Movement.flag(), OperationSet::MOVEMENT);
        assert_eq!(OperationSet::all().kinds().count(), OperationType::ALL.len());

        let set: OperationSet = [OperationType::FireSpread, OperationType::FireBurn].into_iter().collect();
        assert!(set.has(OperationType::FireBurn));
        assert!(!set.has(OperationType::BlockBreak));
    }
}
