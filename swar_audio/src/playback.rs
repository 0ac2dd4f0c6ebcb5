//! Per-slot playback lifecycle.
//!
//! A slot is a logical playback context (the voice preview, or one history
//! item). Each slot is either idle or holds exactly one active flow; starting
//! in a busy slot stops and releases the previous flow first. Flows in
//! different slots are independent and may sound together.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tracing::{debug, warn};

use crate::buffer::AudioBuffer;
use crate::device::{DeviceState, OutputDevice, PlaybackError, SoundFlow};

/// Time constant for volume changes, short enough to feel immediate without
/// an audible click.
pub const VOLUME_SMOOTHING: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Slot {
    Preview,
    Clip(String),
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Preview => f.write_str("preview"),
            Slot::Clip(id) => write!(f, "clip:{id}"),
        }
    }
}

/// Identifies one started flow. Stale handles (whose flow ended or was
/// replaced) are accepted by every operation and simply do nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackHandle {
    slot: Slot,
    flow_id: u64,
}

impl PlaybackHandle {
    pub fn slot(&self) -> &Slot {
        &self.slot
    }
}

struct ActiveFlow {
    id: u64,
    flow: Box<dyn SoundFlow>,
}

#[derive(Default)]
struct Slots {
    next_id: u64,
    active: HashMap<Slot, ActiveFlow>,
}

/// Owns the currently sounding flow of every slot on one output device.
pub struct PlaybackSession<D: OutputDevice> {
    device: Arc<D>,
    slots: Arc<Mutex<Slots>>,
}

impl<D: OutputDevice> PlaybackSession<D> {
    pub fn new(device: Arc<D>) -> Self {
        Self {
            device,
            slots: Arc::new(Mutex::new(Slots::default())),
        }
    }

    pub fn device(&self) -> &Arc<D> {
        &self.device
    }

    /// Start playing `buffer` in `slot` from its first frame.
    ///
    /// A suspended device is resumed first. Any flow already active in the
    /// slot is stopped and released before the new one opens. `volume` adds
    /// a gain stage clamped to [0, 1]; `None` plays at unity with no gain.
    pub async fn start(
        &self,
        slot: Slot,
        buffer: Arc<AudioBuffer>,
        volume: Option<f32>,
    ) -> Result<PlaybackHandle, PlaybackError> {
        if self.device.state() == DeviceState::Suspended {
            self.device.resume().await?;
        }

        let mut slots = self.lock();
        if let Some(previous) = slots.active.remove(&slot) {
            debug!(%slot, flow = previous.id, "replacing active flow");
            release(previous.flow)?;
        }

        let id = slots.next_id;
        slots.next_id += 1;
        let on_ended = Box::new(completion(Arc::downgrade(&self.slots), slot.clone(), id));
        let flow = self
            .device
            .open_flow(buffer, volume.map(clamp_volume), on_ended)?;
        slots.active.insert(slot.clone(), ActiveFlow { id, flow });
        debug!(%slot, flow = id, "playback started");

        Ok(PlaybackHandle { slot, flow_id: id })
    }

    /// Stop the flow behind `handle` if it is still the slot's active flow.
    pub fn stop(&self, handle: &PlaybackHandle) -> Result<(), PlaybackError> {
        let mut slots = self.lock();
        match slots.active.get(&handle.slot) {
            Some(active) if active.id == handle.flow_id => {}
            _ => return Ok(()),
        }
        match slots.active.remove(&handle.slot) {
            Some(active) => release(active.flow),
            None => Ok(()),
        }
    }

    /// Stop whatever is active in `slot`. A no-op on an idle slot.
    pub fn stop_slot(&self, slot: &Slot) -> Result<(), PlaybackError> {
        let active = self.lock().active.remove(slot);
        match active {
            Some(active) => {
                debug!(%slot, flow = active.id, "playback stopped");
                release(active.flow)
            }
            None => Ok(()),
        }
    }

    pub fn stop_all(&self) {
        let drained: Vec<(Slot, ActiveFlow)> = self.lock().active.drain().collect();
        for (slot, active) in drained {
            if let Err(e) = release(active.flow) {
                warn!(%slot, error = %e, "failed to stop flow");
            }
        }
    }

    /// Smoothly move the gain of the handle's flow to `volume`.
    ///
    /// Returns `false` when the handle no longer refers to an active flow.
    pub fn set_volume(&self, handle: &PlaybackHandle, volume: f32) -> bool {
        let mut slots = self.lock();
        match slots.active.get_mut(&handle.slot) {
            Some(active) if active.id == handle.flow_id => {
                active.flow.ramp_gain(clamp_volume(volume), VOLUME_SMOOTHING);
                true
            }
            _ => false,
        }
    }

    /// Handle of the flow currently active in `slot`.
    pub fn current(&self, slot: &Slot) -> Option<PlaybackHandle> {
        self.lock().active.get(slot).map(|active| PlaybackHandle {
            slot: slot.clone(),
            flow_id: active.id,
        })
    }

    pub fn is_playing(&self, slot: &Slot) -> bool {
        self.lock().active.contains_key(slot)
    }

    pub fn active_count(&self) -> usize {
        self.lock().active.len()
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        lock_slots(&self.slots)
    }
}

impl<D: OutputDevice> Drop for PlaybackSession<D> {
    fn drop(&mut self) {
        self.stop_all();
    }
}

fn lock_slots(slots: &Mutex<Slots>) -> MutexGuard<'_, Slots> {
    slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        return 0.0;
    }
    volume.clamp(0.0, 1.0)
}

/// Stop and disconnect a flow. Always disconnects; swallows only the
/// already-inactive failure.
fn release(mut flow: Box<dyn SoundFlow>) -> Result<(), PlaybackError> {
    let stopped = match flow.stop() {
        Err(PlaybackError::AlreadyInactive) => Ok(()),
        other => other,
    };
    flow.disconnect();
    stopped
}

/// Natural end: return the slot to idle if this flow still owns it.
fn completion(slots: Weak<Mutex<Slots>>, slot: Slot, id: u64) -> impl FnOnce() + Send + 'static {
    move || {
        let Some(slots) = slots.upgrade() else {
            return;
        };
        let mut slots = lock_slots(&slots);
        let owns_slot = slots.active.get(&slot).is_some_and(|active| active.id == id);
        if owns_slot {
            if let Some(mut active) = slots.active.remove(&slot) {
                active.flow.disconnect();
                debug!(%slot, flow = id, "playback ended");
            }
        }
    }
}
