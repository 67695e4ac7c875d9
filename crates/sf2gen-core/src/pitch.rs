//! Pitch estimation via Harmonic Product Spectrum.
//!
//! Estimates the dominant pitch of a buffer (first channel only) and maps
//! it to a MIDI root key plus a fine correction in cents. Meant for offline
//! use; the FFT plan and scratch buffers are scoped to a single call.

use rustfft::{num_complex::Complex, FftPlanner};

use crate::buffer::AudioBuffer;

/// Lower bound of the default search range.
pub const DEFAULT_MIN_FREQ_HZ: f64 = 20.0;

/// Upper bound of the default search range.
pub const DEFAULT_MAX_FREQ_HZ: f64 = 5000.0;

/// Peak amplitude below which the input counts as silent.
const SILENCE_THRESHOLD: f32 = 1e-4;

/// Number of harmonics folded into the product spectrum.
const NUM_HARMONICS: usize = 4;

/// Result of a pitch estimation.
///
/// A silent or degenerate input yields the all-zero default.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PitchEstimate {
    /// Nearest MIDI note (0-127).
    pub midi_note: u8,
    /// Correction from the note's nominal pitch, in cents (-50..=50).
    pub cents: i16,
    /// Detected fundamental frequency in Hz.
    pub frequency: f64,
}

/// Estimate pitch over the default 20 Hz .. 5 kHz range.
pub fn estimate_pitch(buffer: &AudioBuffer) -> PitchEstimate {
    estimate_pitch_in_range(buffer, DEFAULT_MIN_FREQ_HZ, DEFAULT_MAX_FREQ_HZ)
}

/// Estimate pitch, searching fundamentals in `[min_freq, max_freq]` Hz.
pub fn estimate_pitch_in_range(
    buffer: &AudioBuffer,
    min_freq: f64,
    max_freq: f64,
) -> PitchEstimate {
    let n = buffer.frames();
    if n < 2 {
        return PitchEstimate::default();
    }
    let sample_rate = buffer.sample_rate() as f64;

    // Peak amplitude of channel 0, for normalization and the silence gate.
    let mut max_abs = 0.0f32;
    for sample in buffer.channel_samples(0) {
        max_abs = max_abs.max(sample.abs());
    }
    if max_abs < SILENCE_THRESHOLD {
        return PitchEstimate::default();
    }

    // Normalize and apply a Hann window.
    let gain = 1.0 / max_abs;
    let mut spectrum: Vec<Complex<f32>> = buffer
        .channel_samples(0)
        .enumerate()
        .map(|(i, sample)| {
            let window = 0.5
                - 0.5 * (2.0 * std::f32::consts::PI * i as f32 / (n - 1) as f32).cos();
            Complex::new(sample * gain * window, 0.0)
        })
        .collect();

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut spectrum);

    let half = n / 2;
    let min_bin = ((min_freq * n as f64 / sample_rate).floor() as usize).max(1);
    let max_bin = ((max_freq * n as f64 / sample_rate).ceil() as usize).min(half);
    if min_bin > max_bin {
        return PitchEstimate::default();
    }

    let mut mags = vec![0.0f32; half + 1];
    for (k, mag) in mags
        .iter_mut()
        .enumerate()
        .take(max_bin + 1)
        .skip(min_bin)
    {
        *mag = spectrum[k].norm();
    }

    // Harmonic Product Spectrum: fold down-sampled copies into the
    // fundamental so the strongest harmonic stack wins over its overtones.
    let mut hps = mags.clone();
    for h in 2..=NUM_HARMONICS {
        for k in 0..mags.len() / h {
            hps[k] *= mags[k * h];
        }
    }

    let mut peak_index = 0usize;
    let mut peak_val = 0.0f32;
    for (k, &val) in hps
        .iter()
        .enumerate()
        .take(max_bin / NUM_HARMONICS + 1)
        .skip(min_bin)
    {
        if val > peak_val {
            peak_val = val;
            peak_index = k;
        }
    }

    // Parabolic interpolation around the peak, in the log domain.
    let mut interpolated = peak_index as f64;
    if peak_index > 0 && peak_index < half {
        let alpha = (hps[peak_index - 1] as f64 + 1e-12).ln();
        let beta = (hps[peak_index] as f64 + 1e-12).ln();
        let gamma = (hps[peak_index + 1] as f64 + 1e-12).ln();
        let denom = alpha - 2.0 * beta + gamma;
        if denom.abs() > f64::EPSILON {
            interpolated += 0.5 * (alpha - gamma) / denom;
        }
    }

    let frequency = interpolated * sample_rate / n as f64;
    if frequency <= 0.0 {
        return PitchEstimate::default();
    }

    let midi_float = 69.0 + 12.0 * (frequency / 440.0).log2();
    let mut midi_note = (midi_float + 0.5).floor() as i32;
    midi_note = midi_note.clamp(0, 127);

    let mut cents = cents_from(frequency, midi_note);
    if cents > 50.0 {
        if midi_note < 127 {
            midi_note += 1;
        }
        cents = cents_from(frequency, midi_note);
    } else if cents < -50.0 {
        if midi_note > 0 {
            midi_note -= 1;
        }
        cents = cents_from(frequency, midi_note);
    }
    let cents = (cents.round() as i16).clamp(-50, 50);

    PitchEstimate {
        midi_note: midi_note as u8,
        cents,
        frequency,
    }
}

/// Deviation of `frequency` from the nominal pitch of `midi_note`, in cents.
fn cents_from(frequency: f64, midi_note: i32) -> f64 {
    let target = 440.0 * 2f64.powf((midi_note - 69) as f64 / 12.0);
    1200.0 * (frequency / target).log2()
}
