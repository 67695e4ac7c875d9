//! SoundFont 2 assembly and validation.
//!
//! - [`records`] - record structs and the SF2 constants they use
//! - [`writer`] - RIFF `sfbk` assembly and the disk write
//! - [`validator`] - structural re-parse of generated fonts

pub mod records;
pub mod validator;
pub mod writer;

pub use records::{generator, sample_modes, sample_types};
pub use validator::{validate_sf2, Sf2Summary, Sf2ValidationError};
pub use writer::{build_sf2, write_sf2_file, Sf2Params, Sf2Result};
