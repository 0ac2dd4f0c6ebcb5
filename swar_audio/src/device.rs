//! Output device seam and the in-process software device.
//!
//! A device turns an [`AudioBuffer`] into a sounding flow
//! (source -> optional gain -> destination). [`VirtualOutput`] is a software
//! mixer: it keeps every open flow, advances them on demand, and reports
//! natural completion through the callback handed to [`OutputDevice::open_flow`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use crate::buffer::AudioBuffer;

/// Sample rate of the shared output device.
pub const OUTPUT_SAMPLE_RATE: u32 = 24_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    /// The flow already ended or was stopped. Callers treat this as success.
    #[error("sound flow is no longer active")]
    AlreadyInactive,

    #[error("output device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("output device error: {0}")]
    Device(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    Suspended,
    Running,
}

/// Invoked once when a flow plays to its last frame.
pub type EndedCallback = Box<dyn FnOnce() + Send + 'static>;

/// One sound-producing flow on a device.
pub trait SoundFlow: Send {
    /// Halt output immediately. Returns [`PlaybackError::AlreadyInactive`]
    /// when the flow has already ended or been stopped.
    fn stop(&mut self) -> Result<(), PlaybackError>;

    /// Move the gain towards `target` exponentially with the given time
    /// constant. A flow opened without a gain stage ignores this.
    fn ramp_gain(&mut self, target: f32, time_constant: Duration);

    /// Release the flow's device resources. Safe to call repeatedly.
    fn disconnect(&mut self);
}

#[async_trait]
pub trait OutputDevice: Send + Sync + 'static {
    fn state(&self) -> DeviceState;

    async fn resume(&self) -> Result<(), PlaybackError>;

    /// Build and start a flow playing `buffer` from its first frame.
    ///
    /// `gain` of `None` connects the source straight to the destination.
    /// `on_ended` must be invoked from outside any call into this device's
    /// flows so callers may take their own locks in it.
    fn open_flow(
        &self,
        buffer: Arc<AudioBuffer>,
        gain: Option<f32>,
        on_ended: EndedCallback,
    ) -> Result<Box<dyn SoundFlow>, PlaybackError>;
}

struct GainStage {
    current: f32,
    target: f32,
    // per-frame smoothing coefficient, 1.0 jumps immediately
    coefficient: f32,
}

impl GainStage {
    fn next(&mut self) -> f32 {
        self.current += (self.target - self.current) * self.coefficient;
        self.current
    }
}

struct FlowState {
    buffer: Arc<AudioBuffer>,
    position: usize,
    playing: bool,
    gain: Option<GainStage>,
    on_ended: Option<EndedCallback>,
}

#[derive(Default)]
struct Mixer {
    suspended: bool,
    next_flow: u64,
    flows: HashMap<u64, FlowState>,
    released: u64,
}

/// Software output device.
///
/// Flows advance only when [`VirtualOutput::advance`] is called, either by a
/// real-time clock task or directly by tests. Buffers are read frame for
/// frame at the device rate; there is no resampling.
#[derive(Clone)]
pub struct VirtualOutput {
    sample_rate: u32,
    mixer: Arc<Mutex<Mixer>>,
}

impl VirtualOutput {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            mixer: Arc::new(Mutex::new(Mixer::default())),
        }
    }

    /// A device that starts out suspended, like a browser context created
    /// before any user gesture.
    pub fn suspended(sample_rate: u32) -> Self {
        let device = Self::new(sample_rate);
        device.lock().suspended = true;
        device
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn suspend(&self) {
        self.lock().suspended = true;
    }

    /// Flows that have been opened and not yet disconnected.
    pub fn open_flows(&self) -> usize {
        self.lock().flows.len()
    }

    /// Flows currently producing sound.
    pub fn playing_flows(&self) -> usize {
        self.lock().flows.values().filter(|f| f.playing).count()
    }

    /// Total flows released since the device was created.
    pub fn released_flows(&self) -> u64 {
        self.lock().released
    }

    /// Render `frames` frames of mono mixdown and advance every playing flow.
    ///
    /// Flows reaching their last frame stop and have their completion
    /// callbacks invoked after the mixer lock is dropped.
    pub fn advance(&self, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0f32; frames];
        let mut ended = Vec::new();
        {
            let mut mixer = self.lock();
            if mixer.suspended {
                return out;
            }
            for flow in mixer.flows.values_mut().filter(|f| f.playing) {
                for slot in out.iter_mut() {
                    if flow.position >= flow.buffer.frame_count() {
                        break;
                    }
                    let gain = flow.gain.as_mut().map_or(1.0, GainStage::next);
                    *slot += flow.buffer.mono_sample(flow.position) * gain;
                    flow.position += 1;
                }
                if flow.position >= flow.buffer.frame_count() {
                    flow.playing = false;
                    if let Some(callback) = flow.on_ended.take() {
                        ended.push(callback);
                    }
                }
            }
        }
        for callback in ended {
            callback();
        }
        out
    }

    /// Advance by wall-clock time.
    pub fn advance_by(&self, elapsed: Duration) -> Vec<f32> {
        let frames = (elapsed.as_secs_f64() * self.sample_rate as f64).round() as usize;
        self.advance(frames)
    }

    #[cfg(test)]
    fn gain_of(&self, id: u64) -> Option<f32> {
        self.lock()
            .flows
            .get(&id)
            .and_then(|f| f.gain.as_ref().map(|g| g.current))
    }

    fn lock(&self) -> MutexGuard<'_, Mixer> {
        // A poisoned mixer only holds plain sample state, keep going.
        self.mixer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for VirtualOutput {
    fn default() -> Self {
        Self::new(OUTPUT_SAMPLE_RATE)
    }
}

#[async_trait]
impl OutputDevice for VirtualOutput {
    fn state(&self) -> DeviceState {
        if self.lock().suspended {
            DeviceState::Suspended
        } else {
            DeviceState::Running
        }
    }

    async fn resume(&self) -> Result<(), PlaybackError> {
        let mut mixer = self.lock();
        if mixer.suspended {
            debug!("resuming virtual output");
            mixer.suspended = false;
        }
        Ok(())
    }

    fn open_flow(
        &self,
        buffer: Arc<AudioBuffer>,
        gain: Option<f32>,
        on_ended: EndedCallback,
    ) -> Result<Box<dyn SoundFlow>, PlaybackError> {
        let mut mixer = self.lock();
        let id = mixer.next_flow;
        mixer.next_flow += 1;
        mixer.flows.insert(
            id,
            FlowState {
                buffer,
                position: 0,
                playing: true,
                gain: gain.map(|g| GainStage {
                    current: g,
                    target: g,
                    coefficient: 1.0,
                }),
                on_ended: Some(on_ended),
            },
        );
        Ok(Box::new(VirtualFlow {
            id,
            sample_rate: self.sample_rate,
            device: self.clone(),
        }))
    }
}

struct VirtualFlow {
    id: u64,
    sample_rate: u32,
    device: VirtualOutput,
}

impl SoundFlow for VirtualFlow {
    fn stop(&mut self) -> Result<(), PlaybackError> {
        let mut mixer = self.device.lock();
        match mixer.flows.get_mut(&self.id) {
            Some(flow) if flow.playing => {
                flow.playing = false;
                // an explicitly stopped flow never reports natural completion
                flow.on_ended = None;
                Ok(())
            }
            _ => Err(PlaybackError::AlreadyInactive),
        }
    }

    fn ramp_gain(&mut self, target: f32, time_constant: Duration) {
        let frames = time_constant.as_secs_f32() * self.sample_rate as f32;
        let coefficient = if frames <= 0.0 {
            1.0
        } else {
            1.0 - (-1.0 / frames).exp()
        };
        let mut mixer = self.device.lock();
        if let Some(stage) = mixer.flows.get_mut(&self.id).and_then(|f| f.gain.as_mut()) {
            stage.target = target;
            stage.coefficient = coefficient;
        }
    }

    fn disconnect(&mut self) {
        let mut mixer = self.device.lock();
        if mixer.flows.remove(&self.id).is_some() {
            mixer.released += 1;
            debug!(flow = self.id, "released virtual flow");
        }
    }
}

static SHARED_OUTPUT: OnceLock<VirtualOutput> = OnceLock::new();

/// The process-wide output device, created on first use and kept for the
/// life of the process.
pub fn shared_output() -> &'static VirtualOutput {
    SHARED_OUTPUT.get_or_init(|| {
        info!(sample_rate = OUTPUT_SAMPLE_RATE, "creating shared audio output");
        VirtualOutput::suspended(OUTPUT_SAMPLE_RATE)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn tone(frames: usize) -> Arc<AudioBuffer> {
        Arc::new(AudioBuffer::new(OUTPUT_SAMPLE_RATE, vec![vec![0.5; frames]]).unwrap())
    }

    fn counter() -> (Arc<AtomicUsize>, EndedCallback) {
        let count = Arc::new(AtomicUsize::new(0));
        let hits = count.clone();
        (
            count,
            Box::new(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    #[test]
    fn flow_ends_naturally_once() {
        let device = VirtualOutput::default();
        let (ended, callback) = counter();
        let _flow = device.open_flow(tone(100), None, callback).unwrap();

        let rendered = device.advance(60);
        assert!(rendered.iter().all(|s| *s == 0.5));
        assert_eq!(ended.load(Ordering::SeqCst), 0);

        let rendered = device.advance(60);
        assert_eq!(&rendered[..40], &[0.5; 40]);
        assert!(rendered[40..].iter().all(|s| *s == 0.0));
        assert_eq!(ended.load(Ordering::SeqCst), 1);

        device.advance(60);
        assert_eq!(ended.load(Ordering::SeqCst), 1);
        assert_eq!(device.playing_flows(), 0);
    }

    #[test]
    fn stop_reports_already_inactive_after_end() {
        let device = VirtualOutput::default();
        let (_, callback) = counter();
        let mut flow = device.open_flow(tone(10), None, callback).unwrap();
        device.advance(10);
        assert_eq!(flow.stop(), Err(PlaybackError::AlreadyInactive));

        flow.disconnect();
        flow.disconnect();
        assert_eq!(device.open_flows(), 0);
        assert_eq!(device.released_flows(), 1);
    }

    #[test]
    fn stopped_flow_is_silent_and_never_reports_end() {
        let device = VirtualOutput::default();
        let (ended, callback) = counter();
        let mut flow = device.open_flow(tone(10), None, callback).unwrap();
        flow.stop().unwrap();
        assert!(device.advance(20).iter().all(|s| *s == 0.0));
        assert_eq!(ended.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn suspended_device_does_not_advance() {
        let device = VirtualOutput::suspended(OUTPUT_SAMPLE_RATE);
        assert_eq!(device.state(), DeviceState::Suspended);
        let (_, callback) = counter();
        let _flow = device.open_flow(tone(10), None, callback).unwrap();
        assert!(device.advance(10).iter().all(|s| *s == 0.0));
        assert_eq!(device.playing_flows(), 1);
    }

    #[test]
    fn gain_ramps_smoothly_towards_target() {
        let device = VirtualOutput::default();
        let (_, callback) = counter();
        let mut flow = device
            .open_flow(tone(OUTPUT_SAMPLE_RATE as usize), Some(1.0), callback)
            .unwrap();
        flow.ramp_gain(0.0, Duration::from_millis(50));

        let rendered = device.advance(10);
        assert!(rendered[0] < 0.5 && rendered[0] > 0.49, "no instantaneous jump");
        assert!(rendered.windows(2).all(|w| w[1] < w[0]));

        // after five time constants the gain has all but settled
        device.advance_by(Duration::from_millis(250));
        let gain = device.gain_of(0).unwrap();
        assert!(gain < 0.01, "gain still at {gain}");
    }

    #[test]
    fn shared_output_is_created_once() {
        let a = shared_output() as *const VirtualOutput;
        let b = shared_output() as *const VirtualOutput;
        assert_eq!(a, b);
    }
}
