//! Whole-buffer sinc resampling to a target sample rate.
//!
//! The pipeline normalizes input audio to the requested rate before PCM
//! conversion. Resampling is done offline over the complete buffer: the
//! input is fed block-wise into a sinc resampler, the filter tail is
//! flushed with zero input, and the filter delay is skipped so that the
//! output length matches the rational rate ratio exactly.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::buffer::AudioBuffer;
use crate::error::{Sf2GenError, Sf2GenResult};

// Resampling configuration constants
/// Input block size for the sinc resampler.
const INPUT_BLOCK_SIZE: usize = 1024;

/// Sinc filter length. Determines the filter delay compensated below.
const SINC_LEN: usize = 256;

/// Greatest common divisor, used to reduce the rate ratio.
fn gcd(a: u64, b: u64) -> u64 {
    let (mut a, mut b) = (a, b);
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

/// Output length for resampling `frames` from `src_rate` to `dst_rate`.
///
/// With the ratio reduced to `num/den`, the length is `ceil(frames * den / num)`.
pub fn expected_output_frames(frames: usize, src_rate: u32, dst_rate: u32) -> usize {
    let d = gcd(src_rate as u64, dst_rate as u64);
    let num = src_rate as u64 / d;
    let den = dst_rate as u64 / d;
    ((frames as u64 * den + num - 1) / num) as usize
}

/// Resample a buffer to `target_rate`.
///
/// Returns the input unchanged (cloned) when the rates already match. The
/// output holds exactly [`expected_output_frames`] frames per channel.
pub fn resample(input: &AudioBuffer, target_rate: u32) -> Sf2GenResult<AudioBuffer> {
    let src_rate = input.sample_rate();
    if src_rate == target_rate {
        return Ok(input.clone());
    }

    let channels = input.channels();
    if input.is_empty() {
        return Ok(AudioBuffer::from_interleaved(
            Vec::new(),
            channels,
            target_rate,
        ));
    }

    let resample_failed = || Sf2GenError::ResampleFailed {
        from: src_rate,
        to: target_rate,
    };

    let ratio = target_rate as f64 / src_rate as f64;
    let expected = expected_output_frames(input.frames(), src_rate, target_rate);
    // The sinc filter delays the signal by half its length, measured in
    // output frames here so the skip below lands on the first real frame.
    let delay = ((SINC_LEN / 2) as f64 * ratio).round() as usize;

    let sinc_params = SincInterpolationParameters {
        sinc_len: SINC_LEN,
        f_cutoff: 0.95,
        oversampling_factor: 128,
        interpolation: SincInterpolationType::Linear,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler =
        SincFixedIn::<f32>::new(ratio, 1.0, sinc_params, INPUT_BLOCK_SIZE, channels)
            .map_err(|_e| resample_failed())?;

    let planar: Vec<Vec<f32>> = (0..channels).map(|ch| input.channel_to_vec(ch)).collect();
    let mut scratch = resampler.output_buffer_allocate(true);
    let mut collected: Vec<Vec<f32>> = vec![Vec::with_capacity(delay + expected + 1); channels];

    let frames = input.frames();
    let mut pos = 0;

    // Full blocks through the steady-state path.
    while pos + INPUT_BLOCK_SIZE <= frames {
        let block: Vec<&[f32]> = planar
            .iter()
            .map(|ch| &ch[pos..pos + INPUT_BLOCK_SIZE])
            .collect();
        let (consumed, produced) = resampler
            .process_into_buffer(&block, &mut scratch, None)
            .map_err(|_e| resample_failed())?;
        append_frames(&mut collected, &scratch, produced);
        pos += consumed;
    }

    // Remaining partial block, zero-padded internally by the resampler.
    if pos < frames {
        let block: Vec<&[f32]> = planar.iter().map(|ch| &ch[pos..]).collect();
        let (_consumed, produced) = resampler
            .process_partial_into_buffer(Some(block.as_slice()), &mut scratch, None)
            .map_err(|_e| resample_failed())?;
        append_frames(&mut collected, &scratch, produced);
    }

    // Flush the filter tail until the delay-compensated output is complete.
    let needed = delay + expected;
    let mut stalled = 0;
    while collected[0].len() < needed && stalled < 8 {
        let (_consumed, produced) = resampler
            .process_partial_into_buffer(Option::<&[&[f32]]>::None, &mut scratch, None)
            .map_err(|_e| resample_failed())?;
        if produced == 0 {
            stalled += 1;
        }
        append_frames(&mut collected, &scratch, produced);
    }
    // The tail past the input is filter ringing into silence; padding any
    // shortfall with zeros keeps the length contract without audible effect.
    for ch in collected.iter_mut() {
        ch.resize(needed.max(ch.len()), 0.0);
    }

    let mut interleaved = Vec::with_capacity(expected * channels);
    for frame in 0..expected {
        for ch in collected.iter() {
            interleaved.push(ch[delay + frame]);
        }
    }

    Ok(AudioBuffer::from_interleaved(
        interleaved,
        channels,
        target_rate,
    ))
}

fn append_frames(collected: &mut [Vec<f32>], scratch: &[Vec<f32>], produced: usize) {
    for (dst, src) in collected.iter_mut().zip(scratch.iter()) {
        dst.extend_from_slice(&src[..produced]);
    }
}
