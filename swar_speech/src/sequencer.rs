use std::collections::HashMap;
use std::sync::Mutex;

use swar_audio::Slot;

/// Marks one in-flight request for a slot. Only the most recent ticket of
/// a slot is current; results carried by older tickets are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    slot: Slot,
    generation: u64,
}

impl Ticket {
    pub fn slot(&self) -> &Slot {
        &self.slot
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Default)]
pub struct RequestSequencer {
    generations: Mutex<HashMap<Slot, u64>>,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, slot: Slot) -> Ticket {
        let mut generations = self.lock();
        let generation = generations.entry(slot.clone()).or_insert(0);
        *generation += 1;
        Ticket {
            slot,
            generation: *generation,
        }
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        self.lock().get(&ticket.slot).copied() == Some(ticket.generation)
    }

    /// Makes every outstanding ticket of `slot` stale.
    pub fn invalidate(&self, slot: &Slot) {
        if let Some(generation) = self.lock().get_mut(slot) {
            *generation += 1;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Slot, u64>> {
        self.generations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
