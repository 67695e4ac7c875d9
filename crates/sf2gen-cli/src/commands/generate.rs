//! Generate command implementation.
//!
//! Loads the input sample, optionally estimates its pitch, converts it to
//! mono 16-bit PCM and writes the two-preset SoundFont.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;

use sf2gen_core::buffer::LoopWindow;
use sf2gen_core::{convert, estimate_pitch, load, validate_sf2, write_sf2_file, Sf2Params};

/// Everything the generate command needs, decoded from the CLI surface.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Input audio file.
    pub input: PathBuf,
    /// Output SoundFont file.
    pub output: PathBuf,
    /// MIDI root key (0..=127).
    pub root_key: u8,
    /// Chorus send in percent (0..=100).
    pub chorus_percent: u8,
    /// Reverb send in percent (0..=100).
    pub reverb_percent: u8,
    /// Instrument name stored in the font.
    pub name: String,
    /// Estimate root key and pitch correction from the sample.
    pub detect_pitch: bool,
    /// First frame of the loop window.
    pub loop_start: Option<usize>,
    /// One-past-last frame of the loop window.
    pub loop_end: Option<usize>,
    /// Resample the input to this rate.
    pub sample_rate: Option<u32>,
    /// Crossfade the loop edges.
    pub crossfade: bool,
    /// Re-parse the generated font and check its structure.
    pub verify: bool,
}

/// Run the generate command.
///
/// # Returns
/// Exit code 0 on success; any failure is returned as an error and maps
/// to exit code 1 in `main`.
pub fn run(request: &GenerateRequest) -> Result<ExitCode> {
    let audio = load(&request.input, request.sample_rate)
        .with_context(|| format!("failed to load {}", request.input.display()))?;

    let window = LoopWindow::new(
        request.loop_start.unwrap_or(0),
        request.loop_end.unwrap_or(audio.frames()),
    );

    let mut params = Sf2Params {
        root_key: request.root_key,
        pitch_correction: 0,
        chorus_send: request.chorus_percent as u16 * 10,
        reverb_send: request.reverb_percent as u16 * 10,
    };

    if request.detect_pitch {
        let estimate = estimate_pitch(&audio);
        if estimate.frequency > 0.0 {
            println!(
                "{} {:.2} Hz (root key {}, {:+} cents)",
                "Detected pitch:".cyan(),
                estimate.frequency,
                estimate.midi_note,
                estimate.cents
            );
            params.root_key = estimate.midi_note;
            params.pitch_correction = estimate.cents as i8;
        } else {
            println!(
                "{} no pitch detected, keeping root key {}",
                "Warning:".yellow(),
                params.root_key
            );
        }
    }

    let record = convert(&audio, window, request.crossfade)
        .context("failed to convert sample to 16-bit PCM")?;

    let result = write_sf2_file(&request.output, &record, &params, &request.name)
        .with_context(|| format!("failed to write {}", request.output.display()))?;

    if request.verify {
        validate_sf2(&result.data)
            .with_context(|| format!("{} failed structural checks", request.output.display()))?;
        println!("{}", "Structure verified.".green());
    }

    println!(
        "{} {} ({} bytes, blake3 {})",
        "SF2 created:".green().bold(),
        request.output.display(),
        result.data.len(),
        &result.hash[..16]
    );

    Ok(ExitCode::SUCCESS)
}
