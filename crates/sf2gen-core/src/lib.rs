//! sf2gen core
//!
//! This crate turns a single-note instrument sample into a minimal but
//! valid SoundFont 2 file holding two variants of the sample: a
//! non-looping "OneShot" preset and a "Looped" preset bounded by a
//! caller-selected loop window.
//!
//! # Pipeline
//!
//! ```ignore
//! use sf2gen_core::{buffer::LoopWindow, convert, loader, pitch, sf2};
//!
//! let audio = loader::load(input.as_ref(), None)?;
//! let estimate = pitch::estimate_pitch(&audio);
//! let record = convert::convert(&audio, LoopWindow::full(audio.frames()), false)?;
//! let params = sf2::Sf2Params {
//!     root_key: estimate.midi_note,
//!     pitch_correction: estimate.cents as i8,
//!     ..sf2::Sf2Params::default()
//! };
//! sf2::write_sf2_file(output.as_ref(), &record, &params, "Sample")?;
//! ```
//!
//! # Determinism
//!
//! Given identical inputs, the writer produces byte-identical files; no
//! timestamps or other variable metadata are embedded. [`sf2::Sf2Result`]
//! carries a BLAKE3 hash of the produced bytes.
//!
//! # Crate Structure
//!
//! - [`buffer`] - interleaved float audio buffer and loop window types
//! - [`loader`] - symphonia-based decoding to float
//! - [`resample`] - offline sinc resampling with exact length accounting
//! - [`pitch`] - Harmonic Product Spectrum pitch estimation
//! - [`convert`] - float to 16-bit PCM conversion and loop extraction
//! - [`sf2`] - SoundFont record writing, assembly and validation

pub mod buffer;
pub mod convert;
pub mod error;
pub mod loader;
pub mod pitch;
pub mod resample;
pub mod sf2;

// Re-export main types at crate root
pub use buffer::{AudioBuffer, LoopWindow};
pub use convert::{convert, SampleRecord};
pub use error::{Sf2GenError, Sf2GenResult};
pub use loader::load;
pub use pitch::{estimate_pitch, estimate_pitch_in_range, PitchEstimate};
pub use resample::resample;
pub use sf2::{build_sf2, validate_sf2, write_sf2_file, Sf2Params, Sf2Result};
