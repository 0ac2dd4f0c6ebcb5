use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Reasons a set of channels cannot form an [`AudioBuffer`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    #[error("sample rate must be positive")]
    ZeroSampleRate,

    #[error("an audio buffer needs at least one channel")]
    NoChannels,

    #[error("channel {channel} has {actual} frames, expected {expected}")]
    RaggedChannels {
        channel: usize,
        expected: usize,
        actual: usize,
    },

    #[error("{0} channels exceed the 32767 a 16-bit PCM header can describe")]
    TooManyChannels(usize),

    #[error("byte rate of {channels} channels at {sample_rate} Hz does not fit in 32 bits")]
    ByteRateOverflow { sample_rate: u32, channels: usize },
}

/// Most channels whose 16-bit block alignment still fits the header's `u16`.
pub const MAX_CHANNELS: usize = (u16::MAX / 2) as usize;

/// Check that `sample_rate` and `channel_count` describe a buffer that a
/// 16-bit PCM header can represent.
pub fn check_format(sample_rate: u32, channel_count: usize) -> Result<(), BufferError> {
    if sample_rate == 0 {
        return Err(BufferError::ZeroSampleRate);
    }
    if channel_count == 0 {
        return Err(BufferError::NoChannels);
    }
    if channel_count > MAX_CHANNELS {
        return Err(BufferError::TooManyChannels(channel_count));
    }
    sample_rate
        .checked_mul(channel_count as u32 * 2)
        .ok_or(BufferError::ByteRateOverflow {
            sample_rate,
            channels: channel_count,
        })?;
    Ok(())
}

/// Decoded, channel-separated audio held entirely in memory.
///
/// Every channel holds exactly `frame_count` samples. The buffer is never
/// mutated after construction; share it with `Arc` between the history entry
/// that owns it and the playback flows reading it.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    sample_rate: u32,
    frame_count: usize,
    channels: Vec<Vec<f32>>,
}

impl AudioBuffer {
    /// Fails on ragged channels and on formats a 16-bit PCM header cannot
    /// carry (see [`check_format`]).
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self, BufferError> {
        check_format(sample_rate, channels.len())?;
        let frame_count = channels.first().map(Vec::len).ok_or(BufferError::NoChannels)?;
        if let Some((channel, data)) = channels
            .iter()
            .enumerate()
            .find(|(_, data)| data.len() != frame_count)
        {
            return Err(BufferError::RaggedChannels {
                channel,
                expected: frame_count,
                actual: data.len(),
            });
        }

        Ok(Self {
            sample_rate,
            frame_count,
            channels,
        })
    }

    /// A silent buffer, mostly useful for tests and placeholders.
    pub fn silence(sample_rate: u32, channel_count: usize, frame_count: usize) -> Result<Self, BufferError> {
        Self::new(sample_rate, vec![vec![0.0; frame_count]; channel_count])
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Samples of one channel, or `None` past the last channel.
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn channels(&self) -> impl Iterator<Item = &[f32]> {
        self.channels.iter().map(Vec::as_slice)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frame_count as f64 / self.sample_rate as f64)
    }

    /// Average of all channels at `frame`; silence past the end.
    pub fn mono_sample(&self, frame: usize) -> f32 {
        if frame >= self.frame_count {
            return 0.0;
        }
        let sum: f32 = self.channels.iter().map(|c| c[frame]).sum();
        sum / self.channels.len() as f32
    }

    pub fn info(&self) -> AudioInfo {
        AudioInfo {
            sample_rate: self.sample_rate,
            channels: self.channels.len(),
            frames: self.frame_count,
            duration_ms: self.duration().as_millis() as u64,
        }
    }
}

/// Serializable summary of a buffer's format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AudioInfo {
    pub sample_rate: u32,
    pub channels: usize,
    pub frames: usize,
    pub duration_ms: u64,
}
