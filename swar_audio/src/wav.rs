use crate::buffer::AudioBuffer;

/// MIME type for the container produced by [`encode_wav`].
pub const WAV_CONTENT_TYPE: &str = "audio/wav";

const HEADER_LEN: usize = 44;
const BITS_PER_SAMPLE: u16 = 16;
const BYTES_PER_SAMPLE: usize = 2;

/// Download name for a generated clip.
pub fn wav_file_name(id: impl std::fmt::Display) -> String {
    format!("swar_audio_{id}.wav")
}

/// Quantize one float sample to i16.
///
/// Negative values scale by 32768 and non-negative ones by 32767, the inverse
/// of the decoder's `/ 32768` normalization. Out-of-range input is clamped.
pub fn quantize(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    if clamped < 0.0 {
        (clamped * 32768.0) as i16
    } else {
        (clamped * 32767.0) as i16
    }
}

/// Serialize a buffer as a 16-bit PCM RIFF/WAVE file.
///
/// The output is exactly `44 + frames * channels * 2` bytes, samples
/// interleaved frame by frame. `AudioBuffer` construction guarantees the
/// channel count, block alignment and byte rate fit their header fields.
pub fn encode_wav(buffer: &AudioBuffer) -> Vec<u8> {
    let num_channels = buffer.channel_count();
    let data_len = buffer.frame_count() * num_channels * BYTES_PER_SAMPLE;
    let total_len = HEADER_LEN + data_len;

    let sample_rate = buffer.sample_rate();
    let channels_u16 = num_channels as u16;
    let block_align: u16 = channels_u16 * (BITS_PER_SAMPLE / 8);
    let byte_rate: u32 = sample_rate * u32::from(block_align);
    let riff_size = len_field(total_len - 8);
    let data_size = len_field(data_len);

    let mut out = Vec::<u8>::with_capacity(total_len);

    // RIFF header
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&riff_size.to_le_bytes());
    out.extend_from_slice(b"WAVE");

    // fmt chunk
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes()); // fmt chunk size
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&channels_u16.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    // data chunk
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_size.to_le_bytes());

    let channels: Vec<&[f32]> = buffer.channels().collect();
    for frame in 0..buffer.frame_count() {
        for channel in &channels {
            out.extend_from_slice(&quantize(channel[frame]).to_le_bytes());
        }
    }

    debug_assert_eq!(out.len(), total_len);
    out
}

// RIFF length fields are 32-bit; anything larger saturates.
fn len_field(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pcm::pcm16_to_buffer;
    use std::io::Cursor;

    fn u16_at(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
    }

    fn u32_at(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
    }

    fn ramp(frames: usize, phase: f32) -> Vec<f32> {
        (0..frames).map(|i| ((i as f32 * 0.01 + phase).sin() * 0.9)).collect()
    }

    #[test]
    fn header_layout_for_stereo_buffer() {
        let buffer = AudioBuffer::new(24_000, vec![ramp(1000, 0.0), ramp(1000, 1.0)]).unwrap();
        let wav = encode_wav(&buffer);

        assert_eq!(wav.len(), 4044);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(u32_at(&wav, 4), 4044 - 8);
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(u32_at(&wav, 16), 16);
        assert_eq!(u16_at(&wav, 20), 1);
        assert_eq!(u16_at(&wav, 22), 2);
        assert_eq!(u32_at(&wav, 24), 24_000);
        assert_eq!(u32_at(&wav, 28), 24_000 * 2 * 2);
        assert_eq!(u16_at(&wav, 32), 4);
        assert_eq!(u16_at(&wav, 34), 16);
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(u32_at(&wav, 40), 4044 - 44);
    }

    #[test]
    fn quantizes_extremes() {
        assert_eq!(quantize(1.0), 32767);
        assert_eq!(quantize(-1.0), -32768);
        assert_eq!(quantize(1.5), quantize(1.0));
        assert_eq!(quantize(-7.0), -32768);
        assert_eq!(quantize(0.0), 0);
        assert_eq!(quantize(f32::NAN), 0);
    }

    #[test]
    fn samples_are_interleaved_frame_major() {
        let buffer = AudioBuffer::new(8_000, vec![vec![1.0, 0.0], vec![-1.0, 0.5]]).unwrap();
        let wav = encode_wav(&buffer);
        let samples: Vec<i16> = wav[44..]
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        assert_eq!(samples, vec![32767, -32768, 0, 16383]);
    }

    #[test]
    fn empty_buffer_is_header_only() {
        let buffer = AudioBuffer::silence(24_000, 1, 0).unwrap();
        let wav = encode_wav(&buffer);
        assert_eq!(wav.len(), 44);
        assert_eq!(u32_at(&wav, 40), 0);
    }

    #[test]
    fn round_trips_within_one_step() {
        let original: Vec<i16> = (i16::MIN..=i16::MAX).step_by(97).chain([i16::MIN, -1, 0, 1, i16::MAX]).collect();
        let bytes: Vec<u8> = original.iter().flat_map(|s| s.to_le_bytes()).collect();
        let buffer = pcm16_to_buffer(&bytes, 24_000, 1).unwrap();

        let wav = encode_wav(&buffer);
        let decoded = pcm16_to_buffer(&wav[44..], 24_000, 1).unwrap();
        let requantized: Vec<i16> = wav[44..]
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();

        assert_eq!(decoded.frame_count(), original.len());
        for (before, after) in original.iter().zip(&requantized) {
            assert!(
                (*before as i32 - *after as i32).abs() <= 1,
                "{before} drifted to {after}"
            );
        }
    }

    #[test]
    fn hound_reads_the_container() {
        let buffer = AudioBuffer::new(24_000, vec![ramp(300, 0.2), ramp(300, 0.7)]).unwrap();
        let wav = encode_wav(&buffer);

        let mut reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 24_000);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);

        let samples: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
        assert_eq!(samples.len(), 600);
        assert_eq!(samples[0], quantize(buffer.channel(0).unwrap()[0]));
        assert_eq!(samples[1], quantize(buffer.channel(1).unwrap()[0]));
    }

    #[test]
    fn header_fields_at_the_format_limits() {
        let buffer = AudioBuffer::silence(1_000_000_000, 2, 1).unwrap();
        let wav = encode_wav(&buffer);
        assert_eq!(u32_at(&wav, 24), 1_000_000_000);
        assert_eq!(u32_at(&wav, 28), 4_000_000_000);

        let wide = AudioBuffer::silence(8_000, crate::buffer::MAX_CHANNELS, 1).unwrap();
        let wav = encode_wav(&wide);
        assert_eq!(u16_at(&wav, 22) as usize, crate::buffer::MAX_CHANNELS);
        assert_eq!(u16_at(&wav, 32), 65_534);
        assert_eq!(wav.len(), 44 + crate::buffer::MAX_CHANNELS * 2);
    }

    #[test]
    fn file_name_uses_clip_id() {
        assert_eq!(wav_file_name("abc-123"), "swar_audio_abc-123.wav");
    }
}
