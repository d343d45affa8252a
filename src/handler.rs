//! Policy handler contract.
//!
//! [`PolicyHandler`] is the single decision point of the engine. The dispatcher
//! builds an [`Operation`] for every classified event and asks the handler
//! whether to cancel it; the handler answers synchronously on the event
//! thread.
//!
//! ```text
//! native event ─▶ Dispatcher ─▶ Operation ─▶ PolicyHandler::cancel_operation ─▶ bool
//!             └─▶ (move)      ─────────────▶ PolicyHandler::cancel_movement  ─▶ bool
//!             └─▶ (fluid/piston) ──────────▶ PolicyHandler::cancel_nature    ─▶ bool
//! ```
//!
//! # Contract for implementors
//!
//! - Answer fast and never block on I/O; `cancel_movement` runs at movement
//!   rate.
//! - Read world/claim state, never mutate it.
//! - Kinds with no explicit rule are allowed (return `false`). An explicit deny
//!   wins over anything else in the same dispatch.
//! - A handler that panics is a broken handler: the engine does not catch the
//!   panic, and it does not pick a default answer on the handler's behalf.

use crate::{Operation, OperationSet, OperationType, Position, User, World};
use std::sync::Arc;

/// Decides which operations are cancelled.
///
/// # Example
///
/// ```
/// use opguard::{Operation, OperationType, PolicyHandler, Position, User};
///
/// struct NoFire;
///
/// impl PolicyHandler for NoFire {
///     fn cancel_operation(&self, operation: &Operation) -> bool {
///         matches!(operation.kind(), OperationType::FireSpread | OperationType::FireBurn)
///     }
///
///     fn cancel_movement(&self, _user: &User, _from: &Position, _to: &Position) -> bool {
///         false
///     }
/// }
/// ```
pub trait PolicyHandler: Send + Sync {
    /// Whether `operation` must be suppressed.
    fn cancel_operation(&self, operation: &Operation) -> bool;

    /// Whether `user` may not cross from `from` into `to`.
    ///
    /// Only called when the two positions are in different blocks.
    fn cancel_movement(&self, user: &User, from: &Position, to: &Position) -> bool;

    /// Whether something moving by itself (fluid, a pushed block, a dispensed
    /// block) may not travel from `from` to `to`.
    fn cancel_nature(&self, _world: &World, _from: &Position, _to: &Position) -> bool {
        false
    }
}

impl<H: PolicyHandler + ?Sized> PolicyHandler for &H {
    fn cancel_operation(&self, operation: &Operation) -> bool {
        (**self).cancel_operation(operation)
    }

    fn cancel_movement(&self, user: &User, from: &Position, to: &Position) -> bool {
        (**self).cancel_movement(user, from, to)
    }

    fn cancel_nature(&self, world: &World, from: &Position, to: &Position) -> bool {
        (**self).cancel_nature(world, from, to)
    }
}

impl<H: PolicyHandler + ?Sized> PolicyHandler for Arc<H> {
    fn cancel_operation(&self, operation: &Operation) -> bool {
        (**self).cancel_operation(operation)
    }

    fn cancel_movement(&self, user: &User, from: &Position, to: &Position) -> bool {
        (**self).cancel_movement(user, from, to)
    }

    fn cancel_nature(&self, world: &World, from: &Position, to: &Position) -> bool {
        (**self).cancel_nature(world, from, to)
    }
}

impl<H: PolicyHandler + ?Sized> PolicyHandler for Box<H> {
    fn cancel_operation(&self, operation: &Operation) -> bool {
        (**self).cancel_operation(operation)
    }

    fn cancel_movement(&self, user: &User, from: &Position, to: &Position) -> bool {
        (**self).cancel_movement(user, from, to)
    }

    fn cancel_nature(&self, world: &World, from: &Position, to: &Position) -> bool {
        (**self).cancel_nature(world, from, to)
    }
}

/// A flat, position-independent policy: deny a fixed set of kinds everywhere.
///
/// Useful as a server-wide baseline (no fire spread, no explosions) in front
/// of a claim-aware handler in a [`PolicyChain`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationPolicy {
    pub denied: OperationSet,
    pub deny_movement: bool,
    pub deny_nature: bool,
}

impl OperationPolicy {
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn denying(kinds: impl IntoIterator<Item = OperationType>) -> Self {
        Self { denied: kinds.into_iter().collect(), ..Self::default() }
    }

    pub fn deny(mut self, kind: OperationType) -> Self {
        self.denied |= kind.flag();
        self
    }

    pub fn allow(mut self, kind: OperationType) -> Self {
        self.denied.remove(kind.flag());
        self
    }
}

impl PolicyHandler for OperationPolicy {
    fn cancel_operation(&self, operation: &Operation) -> bool {
        self.denied.has(operation.kind())
    }

    fn cancel_movement(&self, _user: &User, _from: &Position, _to: &Position) -> bool {
        self.deny_movement || self.denied.has(OperationType::Movement)
    }

    fn cancel_nature(&self, _world: &World, _from: &Position, _to: &Position) -> bool {
        self.deny_nature
    }
}

/// Several handlers consulted together; any cancel wins.
///
/// Every member is asked, in order, even after one has cancelled, so handlers
/// that record what they saw stay consistent.
#[derive(Default)]
pub struct PolicyChain {
    handlers: Vec<Box<dyn PolicyHandler>>,
}

impl PolicyChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, handler: impl PolicyHandler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for PolicyChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyChain").field("handlers", &self.handlers.len()).finish()
    }
}

impl PolicyHandler for PolicyChain {
    fn cancel_operation(&self, operation: &Operation) -> bool {
        self.handlers.iter().fold(false, |cancel, h| h.cancel_operation(operation) | cancel)
    }

    fn cancel_movement(&self, user: &User, from: &Position, to: &Position) -> bool {
        self.handlers.iter().fold(false, |cancel, h| h.cancel_movement(user, from, to) | cancel)
    }

    fn cancel_nature(&self, world: &World, from: &Position, to: &Position) -> bool {
        self.handlers.iter().fold(false, |cancel, h| h.cancel_nature(world, from, to) | cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Environment;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    fn spot() -> Position {
        Position::new(World::new("world", Uuid::from_u128(1), Environment::Overworld), 0.0, 64.0, 0.0)
    }

    fn steve() -> User {
        User::new(Uuid::from_u128(9), "Steve")
    }

    struct Counting(Arc<AtomicUsize>, bool);

    impl PolicyHandler for Counting {
        fn cancel_operation(&self, _operation: &Operation) -> bool {
            self.0.fetch_add(1, Ordering::SeqCst);
            self.1
        }

        fn cancel_movement(&self, _user: &User, _from: &Position, _to: &Position) -> bool {
            self.0.fetch_add(1, Ordering::SeqCst);
            self.1
        }
    }

    #[test]
    fn operation_policy_allows_unlisted_kinds() {
        let policy = OperationPolicy::denying([OperationType::FireSpread, OperationType::ExplosionDamageTerrain]);

        assert!(policy.cancel_operation(&Operation::of(OperationType::FireSpread, spot())));
        assert!(!policy.cancel_operation(&Operation::of(OperationType::FireBurn, spot())));
        assert!(!policy.cancel_operation(&Operation::by(steve(), OperationType::BlockBreak, spot())));
        assert!(!policy.cancel_movement(&steve(), &spot(), &spot()));
        assert!(!policy.cancel_nature(&spot().world, &spot(), &spot()));
    }

    #[test]
    fn operation_policy_builders() {
        let policy = OperationPolicy::allow_all().deny(OperationType::Movement).deny(OperationType::BlockBreak);
        assert!(policy.cancel_movement(&steve(), &spot(), &spot()));

        let policy = policy.allow(OperationType::BlockBreak);
        assert!(!policy.cancel_operation(&Operation::by(steve(), OperationType::BlockBreak, spot())));
    }

    #[test]
    fn chain_denies_when_any_member_denies() {
        let seen = Arc::new(AtomicUsize::new(0));
        let chain = PolicyChain::new()
            .with(Counting(Arc::clone(&seen), false))
            .with(OperationPolicy::denying([OperationType::BlockPlace]))
            .with(Counting(Arc::clone(&seen), false));

        assert!(chain.cancel_operation(&Operation::by(steve(), OperationType::BlockPlace, spot())));
        assert!(!chain.cancel_operation(&Operation::by(steve(), OperationType::BlockBreak, spot())));
        assert_eq!(seen.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn empty_chain_allows_everything() {
        let chain = PolicyChain::new();
        assert!(chain.is_empty());
        assert!(!chain.cancel_operation(&Operation::of(OperationType::FireSpread, spot())));
        assert!(!chain.cancel_movement(&steve(), &spot(), &spot()));
    }

    #[test]
    fn shared_handlers_delegate() {
        let seen = Arc::new(AtomicUsize::new(0));
        let shared: Arc<dyn PolicyHandler> = Arc::new(Counting(Arc::clone(&seen), true));

        assert!(shared.cancel_operation(&Operation::of(OperationType::FireBurn, spot())));
        assert!((&shared).cancel_movement(&steve(), &spot(), &spot()));
        assert!(!shared.cancel_nature(&spot().world, &spot(), &spot()));
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }
}
