//! Shared track segments and their exclusive locks
//!
//! Each slot is a capacity-1 permit. Routes claim their whole footprint in one
//! step or not at all, so no route ever sits on part of its footprint.

use log::warn;
use std::collections::HashMap;

use super::types::{RouteId, SlotId, SlotKey};

/// One shared track segment
#[derive(Debug, Clone)]
pub struct ResourceSlot {
    pub id: SlotId,
    pub key: SlotKey,
    /// The route currently holding the segment (if any)
    pub holder: Option<RouteId>,
    /// How many times the slot has been claimed
    pub acquisitions: u64,
}

impl ResourceSlot {
    fn new(id: SlotId, key: SlotKey) -> Self {
        Self {
            id,
            key,
            holder: None,
            acquisitions: 0,
        }
    }

    pub fn is_free(&self) -> bool {
        self.holder.is_none()
    }

    pub fn is_held_by(&self, route: RouteId) -> bool {
        self.holder == Some(route)
    }
}

/// Arena of slots indexed by `SlotId`, with a canonical-key lookup
#[derive(Debug, Clone, Default)]
pub struct ResourcePool {
    slots: Vec<ResourceSlot>,
    index: HashMap<SlotKey, SlotId>,
}

impl ResourcePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a slot, returning the existing id if the key is already known
    pub fn add_slot(&mut self, key: SlotKey) -> SlotId {
        if let Some(id) = self.index.get(&key) {
            return *id;
        }
        let id = SlotId(self.slots.len());
        self.index.insert(key.clone(), id);
        self.slots.push(ResourceSlot::new(id, key));
        id
    }

    /// Look up a slot by the two routes it is shared between, in either order
    pub fn slot_between(&self, a: &str, b: &str) -> Option<SlotId> {
        self.index.get(&SlotKey::new(a, b)).copied()
    }

    pub fn get(&self, id: SlotId) -> Option<&ResourceSlot> {
        self.slots.get(id.0)
    }

    pub fn slots(&self) -> &[ResourceSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn holder(&self, id: SlotId) -> Option<RouteId> {
        self.get(id).and_then(|slot| slot.holder)
    }

    /// Dry run: would `try_acquire_all` succeed right now?
    pub fn can_acquire_all(&self, slots: &[SlotId]) -> bool {
        slots
            .iter()
            .all(|id| self.get(*id).is_some_and(ResourceSlot::is_free))
    }

    /// Claim every slot for `holder` if all are free; otherwise claim none
    pub fn try_acquire_all(&mut self, holder: RouteId, slots: &[SlotId]) -> bool {
        if !self.can_acquire_all(slots) {
            return false;
        }
        for id in slots {
            let slot = &mut self.slots[id.0];
            slot.holder = Some(holder);
            slot.acquisitions += 1;
        }
        true
    }

    /// Free the given slots held by `holder`. Slots held by anyone else are left alone.
    pub fn release_all(&mut self, holder: RouteId, slots: &[SlotId]) {
        for id in slots {
            match self.slots.get_mut(id.0) {
                Some(slot) if slot.is_held_by(holder) => slot.holder = None,
                Some(slot) => warn!(
                    "Route {:?} released slot {} it does not hold (holder: {:?})",
                    holder, slot.key, slot.holder
                ),
                None => warn!("Route {:?} released unknown slot {:?}", holder, id),
            }
        }
    }

    /// Holder of every slot, in slot order
    pub fn holders(&self) -> Vec<Option<RouteId>> {
        self.slots.iter().map(|slot| slot.holder).collect()
    }
}
