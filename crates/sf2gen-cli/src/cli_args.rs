//! CLI argument definitions for the sf2gen command-line interface.
//!
//! The `#[derive(Parser)]` type lives here, keeping `main.rs` focused on
//! dispatch.

use clap::Parser;
use std::path::PathBuf;

/// sf2gen - build a minimal SF2 SoundFont from a single audio sample
#[derive(Parser, Debug)]
#[command(name = "sf2gen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Input audio file (WAV, FLAC, OGG, ...)
    pub input: PathBuf,

    /// Output SoundFont file
    pub output: PathBuf,

    /// MIDI root key of the sample
    #[arg(value_parser = clap::value_parser!(u8).range(0..=127), default_value_t = 60)]
    pub root_key: u8,

    /// Chorus send in percent
    #[arg(value_parser = clap::value_parser!(u8).range(0..=100), default_value_t = 50)]
    pub chorus: u8,

    /// Reverb send in percent
    #[arg(value_parser = clap::value_parser!(u8).range(0..=100), default_value_t = 50)]
    pub reverb: u8,

    /// Instrument name stored in the font
    #[arg(long, default_value = "Sample")]
    pub name: String,

    /// Estimate the root key and pitch correction from the sample,
    /// overriding ROOT_KEY
    #[arg(long)]
    pub detect_pitch: bool,

    /// First frame of the loop window (default: start of sample)
    #[arg(long)]
    pub loop_start: Option<usize>,

    /// One-past-last frame of the loop window (default: end of sample)
    #[arg(long)]
    pub loop_end: Option<usize>,

    /// Resample the input to this rate before conversion
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// Crossfade the loop edges to soften the seam
    #[arg(long)]
    pub crossfade: bool,

    /// Re-parse the generated font and check its structure
    #[arg(long)]
    pub verify: bool,
}
