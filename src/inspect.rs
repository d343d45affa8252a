//! Inspection callbacks.
//!
//! Inspection is a side channel: a user clicking a position while holding a
//! registered tool triggers that tool's callback instead of a permission check.
//! It never gates anything by itself.
//!
//! One callback per tool; registering again replaces the previous callback.

use crate::engine::{DEFAULT_NAMESPACE, normalize_identity};
use crate::{Position, User};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

pub type InspectorCallback = Arc<dyn Fn(&User, &Position) + Send + Sync>;

/// An item that triggers an inspection when used on a block.
///
/// With `model_data` set, only items carrying that custom model value count;
/// otherwise any item with the identity does. `stick` and `minecraft:stick`
/// name the same tool.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InspectionTool {
    pub item: String,
    pub model_data: Option<i32>,
}

impl InspectionTool {
    pub fn new(item: impl AsRef<str>) -> Self {
        Self { item: normalize_identity(item.as_ref(), DEFAULT_NAMESPACE).into_owned(), model_data: None }
    }

    pub fn with_model_data(self, model_data: i32) -> Self {
        Self { model_data: Some(model_data), ..self }
    }
}

impl fmt::Display for InspectionTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.model_data {
            Some(data) => write!(f, "{}#{}", self.item, data),
            None => f.write_str(&self.item),
        }
    }
}

/// The item a user is holding when they interact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeldItem<'a> {
    pub identity: &'a str,
    pub model_data: Option<i32>,
}

impl<'a> HeldItem<'a> {
    pub fn new(identity: &'a str) -> Self {
        Self { identity, model_data: None }
    }

    pub fn with_model_data(self, model_data: i32) -> Self {
        Self { model_data: Some(model_data), ..self }
    }
}

/// Tool → callback map with last-write-wins registration.
#[derive(Default)]
pub struct InspectorRegistry {
    callbacks: RwLock<HashMap<InspectionTool, InspectorCallback>>,
}

impl InspectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for `tool`, returning the callback it replaced.
    pub fn set_callback<F>(&self, tool: InspectionTool, callback: F) -> Option<InspectorCallback>
    where
        F: Fn(&User, &Position) + Send + Sync + 'static,
    {
        tracing::debug!(%tool, "registered inspection callback");
        self.callbacks.write().unwrap_or_else(PoisonError::into_inner).insert(tool, Arc::new(callback))
    }

    pub fn remove(&self, tool: &InspectionTool) -> Option<InspectorCallback> {
        self.callbacks.write().unwrap_or_else(PoisonError::into_inner).remove(tool)
    }

    pub fn len(&self) -> usize {
        self.callbacks.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The callback for `held`: a tool with the exact model data first, then a
    /// tool registered for the bare item.
    pub fn find(&self, held: &HeldItem<'_>) -> Option<InspectorCallback> {
        let callbacks = self.callbacks.read().unwrap_or_else(PoisonError::into_inner);
        if callbacks.is_empty() {
            return None;
        }

        let mut key = InspectionTool::new(held.identity);
        if held.model_data.is_some() {
            key.model_data = held.model_data;
            if let Some(callback) = callbacks.get(&key) {
                return Some(Arc::clone(callback));
            }
            key.model_data = None;
        }
        callbacks.get(&key).cloned()
    }

    /// Run the callback for `held`, if any. Returns whether one ran.
    ///
    /// The callback runs after the registry lock is released, so it may
    /// register or replace tools itself.
    pub fn inspect(&self, held: &HeldItem<'_>, user: &User, position: &Position) -> bool {
        match self.find(held) {
            Some(callback) => {
                callback(user, position);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for InspectorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InspectorRegistry").field("tools", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Environment, World};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    fn spot() -> Position {
        Position::new(World::new("world", Uuid::from_u128(1), Environment::Overworld), 3.5, 70.0, -2.5)
    }

    fn alex() -> User {
        User::new(Uuid::from_u128(4), "Alex")
    }

    #[test]
    fn callback_receives_user_and_position() {
        let registry = InspectorRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        registry.set_callback(InspectionTool::new("minecraft:stick"), move |user, position| {
            sink.lock().unwrap().push((user.clone(), position.clone()));
        });

        assert!(registry.inspect(&HeldItem::new("minecraft:stick"), &alex(), &spot()));
        assert!(!registry.inspect(&HeldItem::new("minecraft:feather"), &alex(), &spot()));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.as_slice(), &[(alex(), spot())]);
    }

    #[test]
    fn second_registration_replaces_first() {
        let registry = InspectorRegistry::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&first);
        assert!(
            registry
                .set_callback(InspectionTool::new("minecraft:stick"), move |_, _| {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .is_none()
        );
        let counter = Arc::clone(&second);
        assert!(
            registry
                .set_callback(InspectionTool::new("minecraft:stick"), move |_, _| {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .is_some()
        );

        registry.inspect(&HeldItem::new("minecraft:stick"), &alex(), &spot());

        assert_eq!(registry.len(), 1);
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn model_data_is_matched_before_bare_item() {
        let registry = InspectorRegistry::new();
        let hits = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&hits);
        registry.set_callback(InspectionTool::new("minecraft:stick").with_model_data(7), move |_, _| {
            sink.lock().unwrap().push("wand");
        });
        let sink = Arc::clone(&hits);
        registry.set_callback(InspectionTool::new("minecraft:stick"), move |_, _| {
            sink.lock().unwrap().push("stick");
        });

        registry.inspect(&HeldItem::new("minecraft:stick").with_model_data(7), &alex(), &spot());
        registry.inspect(&HeldItem::new("minecraft:stick").with_model_data(8), &alex(), &spot());
        registry.inspect(&HeldItem::new("minecraft:stick"), &alex(), &spot());

        assert_eq!(*hits.lock().unwrap(), vec!["wand", "stick", "stick"]);
    }

    #[test]
    fn model_specific_tool_ignores_plain_items() {
        let registry = InspectorRegistry::new();
        registry.set_callback(InspectionTool::new("minecraft:stick").with_model_data(7), |_, _| {});

        assert!(registry.find(&HeldItem::new("minecraft:stick")).is_none());
        assert!(registry.find(&HeldItem::new("MINECRAFT:STICK").with_model_data(7)).is_some());
    }

    #[test]
    fn bare_and_namespaced_identities_name_the_same_tool() {
        let registry = InspectorRegistry::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        registry.set_callback(InspectionTool::new("minecraft:stick"), move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(registry.inspect(&HeldItem::new("stick"), &alex(), &spot()));
        assert!(registry.inspect(&HeldItem::new(" Minecraft:Stick"), &alex(), &spot()));

        let counter = Arc::clone(&fired);
        registry.set_callback(InspectionTool::new("blaze_rod").with_model_data(3), move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(registry.inspect(&HeldItem::new("minecraft:blaze_rod").with_model_data(3), &alex(), &spot()));

        assert_eq!(fired.load(Ordering::SeqCst), 3);
        assert_eq!(InspectionTool::new("stick"), InspectionTool::new("minecraft:stick"));
        assert_eq!(InspectionTool::new("stick").to_string(), "minecraft:stick");
    }

    #[test]
    fn callbacks_may_reregister_while_running() {
        let registry = Arc::new(InspectorRegistry::new());
        let inner = Arc::clone(&registry);
        registry.set_callback(InspectionTool::new("minecraft:stick"), move |_, _| {
            inner.set_callback(InspectionTool::new("minecraft:blaze_rod"), |_, _| {});
        });

        assert!(registry.inspect(&HeldItem::new("minecraft:stick"), &alex(), &spot()));
        assert_eq!(registry.len(), 2);
        assert!(registry.remove(&InspectionTool::new("minecraft:blaze_rod")).is_some());
    }
}
