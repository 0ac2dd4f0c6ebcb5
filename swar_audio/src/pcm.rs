//! Signed 16-bit little-endian PCM decoding.
//!
//! Remote speech models hand back raw interleaved s16le samples, usually
//! wrapped in base64. These helpers turn that payload into a normalized,
//! channel-separated [`AudioBuffer`].

use base64::{engine::general_purpose, Engine as _};
use thiserror::Error;
use tracing::debug;

use crate::buffer::{check_format, AudioBuffer, BufferError};

/// Divisor mapping an i16 sample into [-1.0, 1.0). The encoder's inverse
/// scales non-negative samples by 32767, so the pair round-trips within one step.
const NORMALIZATION: f32 = 32768.0;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("audio payload is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("invalid PCM format: {0}")]
    InvalidFormat(#[from] BufferError),
}

/// Decode a base64 payload of s16le interleaved PCM.
pub fn decode_base64_pcm(
    payload: &str,
    sample_rate: u32,
    channels: usize,
) -> Result<AudioBuffer, DecodeError> {
    let bytes = general_purpose::STANDARD.decode(payload.trim())?;
    pcm16_to_buffer(&bytes, sample_rate, channels)
}

/// Interpret `bytes` as s16le interleaved samples.
///
/// Samples are assembled byte by byte with `i16::from_le_bytes`, so the
/// slice may start at any offset of a larger allocation. Bytes that do not
/// complete a whole frame are dropped.
pub fn pcm16_to_buffer(
    bytes: &[u8],
    sample_rate: u32,
    channels: usize,
) -> Result<AudioBuffer, DecodeError> {
    check_format(sample_rate, channels)?;

    let total_samples = bytes.len() / 2;
    let frame_count = total_samples / channels;
    let dropped_bytes = bytes.len() - frame_count * channels * 2;
    if dropped_bytes > 0 {
        debug!(
            dropped_bytes,
            channels, "PCM payload does not end on a frame boundary, truncating"
        );
    }

    let mut out: Vec<Vec<f32>> = (0..channels).map(|_| Vec::with_capacity(frame_count)).collect();
    for frame in bytes.chunks_exact(channels * 2) {
        for (channel, sample) in frame.chunks_exact(2).enumerate() {
            let value = i16::from_le_bytes([sample[0], sample[1]]);
            out[channel].push(value as f32 / NORMALIZATION);
        }
    }

    Ok(AudioBuffer::new(sample_rate, out)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn le_bytes(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn normalizes_asymmetrically() {
        let buffer = pcm16_to_buffer(&le_bytes(&[i16::MIN, 0, i16::MAX, 16384]), 24_000, 1).unwrap();
        let samples = buffer.channel(0).unwrap();
        assert_eq!(samples[0], -1.0);
        assert_eq!(samples[1], 0.0);
        assert_eq!(samples[2], 32767.0 / 32768.0);
        assert!(samples[2] < 1.0);
        assert_eq!(samples[3], 0.5);
    }

    #[test]
    fn deinterleaves_channels() {
        let bytes = le_bytes(&[1, -1, 2, -2, 3, -3]);
        let buffer = pcm16_to_buffer(&bytes, 48_000, 2).unwrap();
        assert_eq!(buffer.frame_count(), 3);
        let left: Vec<i32> = buffer.channel(0).unwrap().iter().map(|s| (s * 32768.0) as i32).collect();
        let right: Vec<i32> = buffer.channel(1).unwrap().iter().map(|s| (s * 32768.0) as i32).collect();
        assert_eq!(left, vec![1, 2, 3]);
        assert_eq!(right, vec![-1, -2, -3]);
    }

    #[test]
    fn frame_count_follows_byte_length() {
        for channels in 1..=4 {
            for frames in [0usize, 1, 7, 240] {
                let bytes = vec![0u8; frames * channels * 2];
                let buffer = pcm16_to_buffer(&bytes, 24_000, channels).unwrap();
                assert_eq!(buffer.frame_count(), bytes.len() / 2 / channels);
                assert_eq!(buffer.channel_count(), channels);
            }
        }
    }

    #[test]
    fn drops_partial_frames() {
        // five samples across two channels: the last one is dropped
        let bytes = le_bytes(&[10, 20, 30, 40, 50]);
        let buffer = pcm16_to_buffer(&bytes, 24_000, 2).unwrap();
        assert_eq!(buffer.frame_count(), 2);

        // a trailing odd byte is ignored as well
        let mut odd = le_bytes(&[100, 200]);
        odd.push(0x7f);
        let buffer = pcm16_to_buffer(&odd, 24_000, 1).unwrap();
        assert_eq!(buffer.frame_count(), 2);
    }

    #[test]
    fn misaligned_offset_matches_aligned_copy() {
        let samples = [i16::MIN, -12345, -1, 0, 1, 12345, i16::MAX, 42];
        let mut shared = vec![0xAAu8];
        shared.extend(le_bytes(&samples));
        let misaligned = &shared[1..];

        let aligned: Vec<u8> = misaligned.to_vec();
        let a = pcm16_to_buffer(misaligned, 24_000, 2).unwrap();
        let b = pcm16_to_buffer(&aligned, 24_000, 2).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn decodes_base64_payload() {
        let payload = general_purpose::STANDARD.encode(le_bytes(&[0, 16384, -16384]));
        let buffer = decode_base64_pcm(&payload, 24_000, 1).unwrap();
        assert_eq!(buffer.channel(0).unwrap(), &[0.0, 0.5, -0.5]);
        assert_eq!(buffer.sample_rate(), 24_000);
    }

    #[test]
    fn rejects_malformed_base64() {
        let err = decode_base64_pcm("not*base64!", 24_000, 1).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidBase64(_)));
    }

    #[test]
    fn rejects_zero_channels() {
        let err = pcm16_to_buffer(&[0, 0], 24_000, 0).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidFormat(BufferError::NoChannels)));
    }
}
