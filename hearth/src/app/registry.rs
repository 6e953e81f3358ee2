use std::collections::{HashMap, hash_map};
use std::fmt;

use tokio::sync::mpsc;
use uuid::Uuid;

use super::{CallbackSlot, Control, ControlEvent, ControlEvents, ControlFactory, ControlKind};

/// Opaque handle naming a control inside one registry generation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId(String);

impl WidgetId {
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for WidgetId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for WidgetId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Placement {
    pub row: i32,
    pub col: i32,
}

pub struct ControlRecord {
    kind: ControlKind,
    placement: Placement,
    control: Box<dyn Control>,
    callbacks: HashMap<CallbackSlot, String>,
}

impl ControlRecord {
    pub fn kind(&self) -> ControlKind {
        self.kind
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn control(&self) -> &dyn Control {
        self.control.as_ref()
    }

    pub fn control_mut(&mut self) -> &mut dyn Control {
        self.control.as_mut()
    }

    /// Registered callback name for `slot`, empty when none.
    pub fn callback(&self, slot: CallbackSlot) -> &str {
        self.callbacks.get(&slot).map(String::as_str).unwrap_or("")
    }

    /// Overwrites the callback name for `slot`. Slots the control kind never
    /// raises are ignored; an empty name clears the slot.
    pub fn set_callback(&mut self, slot: CallbackSlot, name: &str) {
        if !self.kind.accepts(slot) {
            return;
        }
        if name.is_empty() {
            self.callbacks.remove(&slot);
        } else {
            self.callbacks.insert(slot, name.to_string());
        }
    }
}

/// Owns every control a hosted app placed and maps handles to them.
pub struct HandleRegistry {
    records: HashMap<WidgetId, ControlRecord>,
    generation: u64,
    factory: Box<dyn ControlFactory>,
    events_tx: mpsc::UnboundedSender<ControlEvent>,
}

impl HandleRegistry {
    pub fn new(
        factory: Box<dyn ControlFactory>,
        events_tx: mpsc::UnboundedSender<ControlEvent>,
    ) -> Self {
        Self {
            records: HashMap::new(),
            generation: 0,
            factory,
            events_tx,
        }
    }

    pub fn create(&mut self, kind: ControlKind, text: &str, placement: Placement) -> WidgetId {
        let id = WidgetId::generate();
        self.insert(id.clone(), kind, text, placement);
        id
    }

    /// Constructs a control under a caller-chosen handle.
    ///
    /// # Panics
    ///
    /// Panics if `id` is already live: handles are never overwritten.
    pub fn insert(&mut self, id: WidgetId, kind: ControlKind, text: &str, placement: Placement) {
        match self.records.entry(id) {
            hash_map::Entry::Occupied(entry) => {
                panic!("Duplicate control handle {}", entry.key());
            }
            hash_map::Entry::Vacant(entry) => {
                let events = ControlEvents::new(entry.key().clone(), self.events_tx.clone());
                let control = self.factory.construct(kind, text, events);
                tracing::trace!(id = %entry.key(), kind = kind.name(), "Placed control");
                entry.insert(ControlRecord {
                    kind,
                    placement,
                    control,
                    callbacks: HashMap::new(),
                });
            }
        }
    }

    pub fn resolve(&self, id: &WidgetId) -> Option<&ControlRecord> {
        self.records.get(id)
    }

    pub fn resolve_mut(&mut self, id: &WidgetId) -> Option<&mut ControlRecord> {
        self.records.get_mut(id)
    }

    /// Resolves `id` only if it names a control of `kind`.
    pub fn resolve_kind(&self, id: &WidgetId, kind: ControlKind) -> Option<&ControlRecord> {
        self.resolve(id).filter(|record| record.kind == kind)
    }

    /// Releases every control and starts a new generation.
    pub fn clear(&mut self) {
        self.records.clear();
        self.generation += 1;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Live handles ordered by grid position, the order a renderer lays them out.
    pub fn layout(&self) -> Vec<(WidgetId, ControlKind, Placement)> {
        let mut result: Vec<_> = self
            .records
            .iter()
            .map(|(id, record)| (id.clone(), record.kind, record.placement))
            .collect();
        result.sort_by(|a, b| a.2.cmp(&b.2).then_with(|| a.0.cmp(&b.0)));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::HeadlessControls;

    fn registry() -> HandleRegistry {
        let (tx, _rx) = mpsc::unbounded_channel();
        HandleRegistry::new(Box::new(HeadlessControls), tx)
    }

    #[test]
    #[should_panic(expected = "Duplicate control handle")]
    fn test_duplicate_insert_is_fatal() {
        let mut registry = registry();
        let id = WidgetId::from("fixed");
        let at = Placement { row: 0, col: 0 };
        registry.insert(id.clone(), ControlKind::Button, "a", at);
        registry.insert(id, ControlKind::Button, "b", at);
    }

    #[test]
    fn test_clear_invalidates_handles() {
        let mut registry = registry();
        let id = registry.create(ControlKind::Edit, "x", Placement { row: 1, col: 2 });
        assert!(registry.resolve(&id).is_some());
        registry.clear();
        assert!(registry.resolve(&id).is_none());
        assert_eq!(registry.generation(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_resolve_kind_filters_mismatch() {
        let mut registry = registry();
        let id = registry.create(ControlKind::Button, "x", Placement { row: 0, col: 0 });
        assert!(registry.resolve_kind(&id, ControlKind::Button).is_some());
        assert!(registry.resolve_kind(&id, ControlKind::Edit).is_none());
    }

    #[test]
    fn test_layout_is_ordered_by_grid() {
        let mut registry = registry();
        let b = registry.create(ControlKind::Button, "b", Placement { row: 1, col: 0 });
        let a = registry.create(ControlKind::Button, "a", Placement { row: 0, col: 3 });
        let ids: Vec<_> = registry.layout().into_iter().map(|(id, _, _)| id).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn test_callback_slots() {
        let mut registry = registry();
        let id = registry.create(ControlKind::Button, "b", Placement { row: 0, col: 0 });
        let record = registry.resolve_mut(&id).unwrap();
        record.set_callback(CallbackSlot::Edited, "nope");
        assert_eq!(record.callback(CallbackSlot::Edited), "");
        record.set_callback(CallbackSlot::Clicked, "go");
        assert_eq!(record.callback(CallbackSlot::Clicked), "go");
        record.set_callback(CallbackSlot::Clicked, "");
        assert_eq!(record.callback(CallbackSlot::Clicked), "");
    }
}
