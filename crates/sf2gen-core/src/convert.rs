//! Float to 16-bit PCM conversion and loop-window extraction.

use crate::buffer::{AudioBuffer, LoopWindow};
use crate::error::Sf2GenResult;

/// Longest crossfade ramp, in samples.
const CROSSFADE_LIMIT: usize = 256;

/// Mono 16-bit PCM prepared for the SF2 writer.
///
/// `loop_pcm` is a copy of `pcm[left..right]`, not a view; the writer
/// surrounds both regions with zero guards independently.
#[derive(Clone, Debug)]
pub struct SampleRecord {
    /// Full sample, channel 0 only.
    pub pcm: Vec<i16>,
    /// Loop-window slice of the sample.
    pub loop_pcm: Vec<i16>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl SampleRecord {
    /// Frame count of the full sample.
    pub fn frames(&self) -> usize {
        self.pcm.len()
    }

    /// Frame count of the loop region.
    pub fn loop_frames(&self) -> usize {
        self.loop_pcm.len()
    }
}

/// Convert one float sample to 16-bit PCM with clipping.
#[inline]
pub fn float_to_pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0).round() as i16
}

/// Convert channel 0 of `buffer` into a [`SampleRecord`].
///
/// `window` selects the loop region and must satisfy
/// `0 <= left < right <= frames`. The `crossfade` flag applies a short
/// fade-in/fade-out at the loop edges; it is off in the reference output.
pub fn convert(
    buffer: &AudioBuffer,
    window: LoopWindow,
    crossfade: bool,
) -> Sf2GenResult<SampleRecord> {
    window.validate(buffer.frames())?;

    let pcm: Vec<i16> = buffer.channel_samples(0).map(float_to_pcm16).collect();
    let mut loop_pcm = pcm[window.left..window.right].to_vec();
    if crossfade {
        apply_loop_crossfade(&mut loop_pcm);
    }

    Ok(SampleRecord {
        pcm,
        loop_pcm,
        sample_rate: buffer.sample_rate(),
    })
}

/// Fade the loop edges over `min(256, len / 10)` samples.
fn apply_loop_crossfade(loop_pcm: &mut [i16]) {
    let fade_len = CROSSFADE_LIMIT.min(loop_pcm.len() / 10);
    if fade_len == 0 {
        return;
    }

    // Fade in at the loop start.
    for i in 0..fade_len {
        let gain = i as f32 / fade_len as f32;
        loop_pcm[i] = (loop_pcm[i] as f32 * gain) as i16;
    }

    // Fade out over the last fade_len samples.
    let len = loop_pcm.len();
    for i in (len - fade_len)..len {
        let gain = (len - i) as f32 / fade_len as f32;
        loop_pcm[i] = (loop_pcm[i] as f32 * gain) as i16;
    }
}
