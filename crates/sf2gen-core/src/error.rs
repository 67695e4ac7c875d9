//! Error types shared by the sf2gen core pipeline.

use thiserror::Error;

/// Result type for core operations.
pub type Sf2GenResult<T> = Result<T, Sf2GenError>;

/// Errors that can occur while turning an audio file into a SoundFont.
#[derive(Debug, Error)]
pub enum Sf2GenError {
    /// The decoder could not open, probe or decode the input file.
    #[error("could not decode input: {message}")]
    DecodeOpenFailed {
        /// Decoder error message, including the offending path.
        message: String,
    },

    /// The input has more channels than the mono/stereo pipeline accepts.
    #[error("input has {channels} channels, at most 2 are supported")]
    TooManyChannels {
        /// Channel count reported by the decoder.
        channels: usize,
    },

    /// Resampler construction or processing failed.
    #[error("resampling from {from} Hz to {to} Hz failed")]
    ResampleFailed {
        /// Source sample rate.
        from: u32,
        /// Target sample rate.
        to: u32,
    },

    /// A loop window violates `0 <= left < right <= frames`.
    #[error("invalid loop window [{left}, {right}) for {frames} frames")]
    InvalidLoop {
        /// First frame of the loop region.
        left: usize,
        /// One-past-last frame of the loop region.
        right: usize,
        /// Total frame count of the sample.
        frames: usize,
    },

    /// A parameter is outside its valid range.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// Error message.
        message: String,
    },

    /// Filesystem write failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Sf2GenError {
    /// Creates a decode failure with the given message.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::DecodeOpenFailed {
            message: message.into(),
        }
    }

    /// Creates an invalid parameter error.
    pub fn invalid_param(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }
}
