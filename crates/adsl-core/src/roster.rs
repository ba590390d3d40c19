//! Aircraft slot arena.
//!
//! Every per-aircraft array in the core (broadcast records, separation
//! standards, closest-approach rows) is indexed by slot. Slots are reused
//! after removal; the generation counter makes stale handles detectable.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotHandle {
    pub index: usize,
    pub generation: u32,
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Roster {
    slots: Vec<Slot>,
    free: Vec<usize>,
    by_id: HashMap<String, SlotHandle>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a slot for `id`. Reuses the most recently freed slot if any.
    pub fn insert(&mut self, id: &str) -> Result<SlotHandle> {
        if self.by_id.contains_key(id) {
            return Err(CoreError::DuplicateAircraft { id: id.to_string() });
        }

        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot::default());
                self.slots.len() - 1
            }
        };

        let slot = &mut self.slots[index];
        slot.id = Some(id.to_string());
        let handle = SlotHandle {
            index,
            generation: slot.generation,
        };
        self.by_id.insert(id.to_string(), handle);
        Ok(handle)
    }

    /// Release the slot held by `id`; its handle becomes stale.
    pub fn remove(&mut self, id: &str) -> Result<SlotHandle> {
        let handle = self.by_id.remove(id).ok_or_else(|| CoreError::stale(id))?;
        let slot = &mut self.slots[handle.index];
        slot.id = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        Ok(handle)
    }

    pub fn resolve(&self, id: &str) -> Result<SlotHandle> {
        self.by_id.get(id).copied().ok_or_else(|| CoreError::stale(id))
    }

    pub fn id_of(&self, handle: SlotHandle) -> Result<&str> {
        match self.slots.get(handle.index) {
            Some(slot) if slot.generation == handle.generation => slot
                .id
                .as_deref()
                .ok_or_else(|| CoreError::stale(format!("slot {}", handle.index))),
            _ => Err(CoreError::stale(format!(
                "slot {} generation {}",
                handle.index, handle.generation
            ))),
        }
    }

    pub fn is_live(&self, handle: SlotHandle) -> bool {
        self.id_of(handle).is_ok()
    }

    /// Number of slots ever allocated; per-slot arrays are sized to this.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Live aircraft in slot order.
    pub fn live(&self) -> impl Iterator<Item = (SlotHandle, &str)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.id.as_deref().map(|id| {
                (
                    SlotHandle {
                        index,
                        generation: slot.generation,
                    },
                    id,
                )
            })
        })
    }
}
