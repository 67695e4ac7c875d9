//! Pitch estimator accuracy tests.
//!
//! Test tones are quantized to 16-bit amplitudes, matching what the
//! estimator sees after decoding PCM input.

use std::f64::consts::PI;

use sf2gen_core::buffer::AudioBuffer;
use sf2gen_core::pitch::{estimate_pitch, estimate_pitch_in_range, PitchEstimate};

/// A sine quantized to 16-bit levels, as a decoded WAV would deliver it.
fn quantized_sine(freq: f64, frames: usize, sample_rate: u32, amplitude: f64) -> AudioBuffer {
    let data: Vec<f32> = (0..frames)
        .map(|i| {
            let x = (2.0 * PI * freq * i as f64 / sample_rate as f64).sin() * amplitude;
            ((x * 32767.0).round() / 32767.0) as f32
        })
        .collect();
    AudioBuffer::from_interleaved(data, 1, sample_rate)
}

/// A tone with four partials, the input class the estimator is built for.
fn harmonic_tone(freq: f64, frames: usize, sample_rate: u32) -> AudioBuffer {
    let weights = [1.0, 0.5, 0.33, 0.25];
    let norm: f64 = weights.iter().sum();
    let data: Vec<f32> = (0..frames)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            let x: f64 = weights
                .iter()
                .enumerate()
                .map(|(h, w)| w * (2.0 * PI * freq * (h + 1) as f64 * t).sin())
                .sum::<f64>()
                / norm
                * 0.5;
            ((x * 32767.0).round() / 32767.0) as f32
        })
        .collect();
    AudioBuffer::from_interleaved(data, 1, sample_rate)
}

#[test]
fn test_a440_maps_to_midi_69() {
    let buf = quantized_sine(440.0, 44100, 44100, 0.5);
    let estimate = estimate_pitch(&buf);
    assert_eq!(estimate.midi_note, 69);
    assert_eq!(estimate.cents, 0);
    assert!((estimate.frequency - 440.0).abs() < 1.0);
}

#[test]
fn test_a440_sharp_by_30_cents() {
    // 440 * 2^(30/1200) = 447.69 Hz
    let buf = quantized_sine(447.69, 44100, 44100, 0.5);
    let estimate = estimate_pitch(&buf);
    assert_eq!(estimate.midi_note, 69);
    assert!(
        (estimate.cents - 30).abs() <= 1,
        "cents was {}",
        estimate.cents
    );
    assert!((estimate.frequency - 447.69).abs() / 447.69 < 0.005);
}

#[test]
fn test_a440_flat_by_30_cents() {
    // 440 * 2^(-30/1200) = 432.42 Hz
    let buf = quantized_sine(432.42, 44100, 44100, 0.5);
    let estimate = estimate_pitch(&buf);
    assert_eq!(estimate.midi_note, 69);
    assert!(
        (estimate.cents + 30).abs() <= 1,
        "cents was {}",
        estimate.cents
    );
}

#[test]
fn test_quarter_tone_recenters_to_nearest_note() {
    // Halfway between A4 and A#4: 440 * 2^(0.5/12) = 452.89 Hz. Whichever
    // neighbor wins, the final correction must stay within +-50 cents.
    let buf = quantized_sine(452.89, 44100, 44100, 0.5);
    let estimate = estimate_pitch(&buf);
    assert!(estimate.midi_note == 69 || estimate.midi_note == 70);
    assert!(estimate.cents.abs() <= 50);
    assert!((estimate.frequency - 452.89).abs() / 452.89 < 0.005);
}

#[test]
fn test_sine_sweep_accuracy() {
    // Pure tones in the register where the fundamental dominates the
    // product spectrum.
    for freq in [440.0, 523.25, 659.26, 880.0, 1046.5] {
        let buf = quantized_sine(freq, 32768, 48000, 0.5);
        let estimate = estimate_pitch(&buf);
        let relative_error = (estimate.frequency - freq).abs() / freq;
        assert!(
            relative_error < 0.005,
            "freq {} detected as {} (err {})",
            freq,
            estimate.frequency,
            relative_error
        );
    }
}

#[test]
fn test_harmonic_sweep_accuracy() {
    // Harmonic tones across the searchable range; the fundamental must be
    // found within 0.5%.
    for freq in [
        82.41, 110.0, 146.83, 220.0, 329.63, 440.0, 587.33, 880.0, 1174.66,
    ] {
        let buf = harmonic_tone(freq, 16384, 48000);
        let estimate = estimate_pitch(&buf);
        let relative_error = (estimate.frequency - freq).abs() / freq;
        assert!(
            relative_error < 0.005,
            "freq {} detected as {} (err {})",
            freq,
            estimate.frequency,
            relative_error
        );
    }
}

#[test]
fn test_low_register_accuracy() {
    // Down to the low E of a bass guitar. Longer windows keep the
    // fundamental's bin index high enough for accurate interpolation.
    for freq in [41.2, 55.0, 61.74] {
        let buf = harmonic_tone(freq, 49152, 48000);
        let estimate = estimate_pitch(&buf);
        let relative_error = (estimate.frequency - freq).abs() / freq;
        assert!(
            relative_error < 0.005,
            "freq {} detected as {} (err {})",
            freq,
            estimate.frequency,
            relative_error
        );
    }
}

#[test]
fn test_low_e_guitar_string() {
    // E2 with partials, a typical instrument sample.
    let buf = harmonic_tone(82.41, 44100, 44100);
    let estimate = estimate_pitch(&buf);
    assert_eq!(estimate.midi_note, 40);
    assert!(estimate.cents.abs() <= 2);
}

#[test]
fn test_silence_yields_zero_estimate() {
    let buf = AudioBuffer::silent(1, 16384, 48000);
    assert_eq!(estimate_pitch(&buf), PitchEstimate::default());
}

#[test]
fn test_degenerate_inputs_yield_zero_estimate() {
    let empty = AudioBuffer::from_interleaved(Vec::new(), 1, 48000);
    assert_eq!(estimate_pitch(&empty), PitchEstimate::default());

    let one = AudioBuffer::from_interleaved(vec![0.9], 1, 48000);
    assert_eq!(estimate_pitch(&one), PitchEstimate::default());
}

#[test]
fn test_custom_search_range() {
    // Restricting the range below the tone's frequency must not report it.
    let buf = quantized_sine(880.0, 16384, 48000, 0.5);
    let estimate = estimate_pitch_in_range(&buf, 20.0, 440.0);
    assert!(estimate.frequency < 500.0);
}

#[test]
fn test_stereo_estimation_reads_channel_zero() {
    let frames = 16384;
    let sample_rate = 48000;
    let mut data = Vec::with_capacity(frames * 2);
    for i in 0..frames {
        let t = i as f64 / sample_rate as f64;
        let left = ((2.0 * PI * 440.0 * t).sin() * 0.5 * 32767.0).round() / 32767.0;
        let right = ((2.0 * PI * 523.25 * t).sin() * 0.5 * 32767.0).round() / 32767.0;
        data.push(left as f32);
        data.push(right as f32);
    }
    let buf = AudioBuffer::from_interleaved(data, 2, sample_rate as u32);
    let estimate = estimate_pitch(&buf);
    assert_eq!(estimate.midi_note, 69);
}
