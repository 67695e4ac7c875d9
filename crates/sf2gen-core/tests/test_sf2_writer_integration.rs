//! End-to-end pipeline tests: decode a file, convert, write, re-parse.

use std::f64::consts::PI;
use std::path::Path;

use sf2gen_core::buffer::LoopWindow;
use sf2gen_core::convert::convert;
use sf2gen_core::error::Sf2GenError;
use sf2gen_core::loader::load;
use sf2gen_core::pitch::estimate_pitch;
use sf2gen_core::sf2::validator::validate_sf2;
use sf2gen_core::sf2::writer::{build_sf2, write_sf2_file, Sf2Params};

/// Write a 16-bit PCM WAV fixture with interleaved channel generators.
fn write_wav(path: &Path, sample_rate: u32, frames: usize, channels: &[&dyn Fn(usize) -> f64]) {
    let spec = hound::WavSpec {
        channels: channels.len() as u16,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..frames {
        for generate in channels {
            let sample = (generate(i).clamp(-1.0, 1.0) * 32767.0).round() as i16;
            writer.write_sample(sample).unwrap();
        }
    }
    writer.finalize().unwrap();
}

fn sine(freq: f64, sample_rate: u32, amplitude: f64) -> impl Fn(usize) -> f64 {
    move |i| (2.0 * PI * freq * i as f64 / sample_rate as f64).sin() * amplitude
}

#[test]
fn test_wav_to_sf2_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("tone.wav");
    let output = dir.path().join("tone.sf2");
    write_wav(&input, 44100, 44100, &[&sine(440.0, 44100, 0.5)]);

    let audio = load(&input, None).unwrap();
    assert_eq!(audio.channels(), 1);
    assert_eq!(audio.sample_rate(), 44100);
    assert_eq!(audio.frames(), 44100);

    let record = convert(&audio, LoopWindow::full(audio.frames()), false).unwrap();
    let result = write_sf2_file(&output, &record, &Sf2Params::default(), "Tone").unwrap();

    let on_disk = std::fs::read(&output).unwrap();
    assert_eq!(on_disk, result.data);

    let summary = validate_sf2(&on_disk).unwrap();
    assert_eq!(summary.presets[0].name, "OneShot");
    assert_eq!(summary.presets[1].name, "Looped");
    assert_eq!(summary.zone_sample_modes(0), Some(0));
    assert_eq!(summary.zone_sample_modes(1), Some(1));
    assert_eq!(summary.sample_headers[0].sample_rate, 44100);
}

#[test]
fn test_silent_input_still_produces_valid_font() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("silence.wav");
    write_wav(&input, 44100, 44100, &[&|_| 0.0]);

    let audio = load(&input, None).unwrap();
    let estimate = estimate_pitch(&audio);
    assert_eq!(estimate.midi_note, 0);
    assert_eq!(estimate.cents, 0);
    assert_eq!(estimate.frequency, 0.0);

    // The writer falls back to the default root key.
    let record = convert(&audio, LoopWindow::full(audio.frames()), false).unwrap();
    let font = build_sf2(&record, &Sf2Params::default(), "Silence").unwrap();
    let summary = validate_sf2(&font.data).unwrap();
    assert_eq!(summary.sample_headers[0].original_pitch, 60);
    assert_eq!(summary.sample_headers[0].pitch_correction, 0);
    assert_eq!(summary.sample_headers[0].sample_rate, 44100);
}

#[test]
fn test_stereo_input_uses_channel_zero() {
    let dir = tempfile::tempdir().unwrap();
    let stereo_path = dir.path().join("stereo.wav");
    let mono_path = dir.path().join("mono.wav");
    let left = sine(220.0, 44100, 0.5);
    let right = sine(330.0, 44100, 0.25);
    write_wav(&stereo_path, 44100, 4410, &[&left, &right]);
    write_wav(&mono_path, 44100, 4410, &[&left]);

    let stereo = load(&stereo_path, None).unwrap();
    let mono = load(&mono_path, None).unwrap();
    assert_eq!(stereo.channels(), 2);

    let window = LoopWindow::new(100, 4000);
    let stereo_record = convert(&stereo, window, false).unwrap();
    let mono_record = convert(&mono, window, false).unwrap();
    assert_eq!(stereo_record.pcm, mono_record.pcm);
    assert_eq!(stereo_record.loop_pcm, mono_record.loop_pcm);

    let font = build_sf2(&stereo_record, &Sf2Params::default(), "Stereo").unwrap();
    let summary = validate_sf2(&font.data).unwrap();
    assert_eq!(summary.sample_headers[0].sample_type, 1);
    assert_eq!(summary.sample_headers[1].sample_type, 1);
}

#[test]
fn test_three_channel_input_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("surround.wav");
    let ch = sine(220.0, 44100, 0.3);
    write_wav(&input, 44100, 1000, &[&ch, &ch, &ch]);

    let err = load(&input, None).unwrap_err();
    assert!(matches!(err, Sf2GenError::TooManyChannels { channels: 3 }));
}

#[test]
fn test_resample_to_target_rate() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("hi_rate.wav");
    write_wav(&input, 48000, 48000, &[&sine(440.0, 48000, 0.5)]);

    let audio = load(&input, Some(44100)).unwrap();
    assert_eq!(audio.sample_rate(), 44100);
    // One second of input resamples to one second at the target rate.
    assert!((audio.frames() as i64 - 44100).abs() <= 1);

    let record = convert(&audio, LoopWindow::full(audio.frames()), false).unwrap();
    let font = build_sf2(&record, &Sf2Params::default(), "Resampled").unwrap();
    let summary = validate_sf2(&font.data).unwrap();
    assert_eq!(summary.sample_headers[0].sample_rate, 44100);
}

#[test]
fn test_target_rate_equal_to_source_is_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("tone.wav");
    write_wav(&input, 44100, 4410, &[&sine(440.0, 44100, 0.5)]);

    let native = load(&input, None).unwrap();
    let targeted = load(&input, Some(44100)).unwrap();
    assert_eq!(native.interleaved(), targeted.interleaved());
}

#[test]
fn test_float_wav_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("float.wav");
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 48000,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(&input, spec).unwrap();
    for i in 0..4800 {
        let sample = (2.0 * PI * 440.0 * i as f64 / 48000.0).sin() * 0.5;
        writer.write_sample(sample as f32).unwrap();
    }
    writer.finalize().unwrap();

    let audio = load(&input, None).unwrap();
    assert_eq!(audio.frames(), 4800);
    let peak = audio
        .channel_samples(0)
        .fold(0.0f32, |max, s| max.max(s.abs()));
    assert!((peak - 0.5).abs() < 0.01);
}

#[test]
fn test_full_pipeline_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("tone.wav");
    write_wav(&input, 44100, 22050, &[&sine(261.63, 44100, 0.5)]);

    let run = || {
        let audio = load(&input, None).unwrap();
        let estimate = estimate_pitch(&audio);
        let params = Sf2Params {
            root_key: estimate.midi_note,
            pitch_correction: estimate.cents as i8,
            ..Sf2Params::default()
        };
        let record = convert(&audio, LoopWindow::full(audio.frames()), false).unwrap();
        build_sf2(&record, &params, "Idempotent").unwrap()
    };

    let first = run();
    let second = run();
    assert_eq!(first.data, second.data);
    assert_eq!(first.hash, second.hash);
}

#[test]
fn test_detected_pitch_lands_in_sample_header() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("a4.wav");
    write_wav(&input, 44100, 44100, &[&sine(440.0, 44100, 0.5)]);

    let audio = load(&input, None).unwrap();
    let estimate = estimate_pitch(&audio);
    assert_eq!(estimate.midi_note, 69);

    let params = Sf2Params {
        root_key: estimate.midi_note,
        pitch_correction: estimate.cents as i8,
        ..Sf2Params::default()
    };
    let record = convert(&audio, LoopWindow::full(audio.frames()), false).unwrap();
    let font = build_sf2(&record, &params, "A4").unwrap();
    let summary = validate_sf2(&font.data).unwrap();
    assert_eq!(summary.sample_headers[0].original_pitch, 69);
}
