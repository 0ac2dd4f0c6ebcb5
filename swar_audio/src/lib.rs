//! Audio pipeline for the Swar studio.
//!
//! Raw s16le PCM from the speech model is decoded into an [`AudioBuffer`],
//! played through a [`PlaybackSession`] on an [`OutputDevice`], and exported
//! as a 16-bit PCM WAV file with [`encode_wav`].

mod buffer;
mod device;
mod pcm;
mod playback;
mod wav;

pub use buffer::{check_format, AudioBuffer, AudioInfo, BufferError, MAX_CHANNELS};
pub use device::{
    shared_output, DeviceState, EndedCallback, OutputDevice, PlaybackError, SoundFlow,
    VirtualOutput, OUTPUT_SAMPLE_RATE,
};
pub use pcm::{decode_base64_pcm, pcm16_to_buffer, DecodeError};
pub use playback::{PlaybackHandle, PlaybackSession, Slot, VOLUME_SMOOTHING};
pub use wav::{encode_wav, quantize, wav_file_name, WAV_CONTENT_TYPE};
