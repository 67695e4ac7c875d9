//! Interleaved f32 audio buffer and loop window types.

use crate::error::{Sf2GenError, Sf2GenResult};

/// A multichannel f32 audio buffer in interleaved layout.
///
/// Data is stored as `frames` groups of `channels` samples each:
/// `data[frame * channels + ch]` gives the sample for channel `ch` at
/// `frame`. Decoders produce this layout directly and the SF2 pipeline only
/// ever reads channel 0.
#[derive(Clone, Debug)]
pub struct AudioBuffer {
    data: Vec<f32>,
    channels: usize,
    sample_rate: u32,
}

impl AudioBuffer {
    /// Create a buffer from interleaved sample data.
    ///
    /// A trailing partial frame is truncated.
    pub fn from_interleaved(mut data: Vec<f32>, channels: usize, sample_rate: u32) -> Self {
        assert!(channels > 0, "channel count must be non-zero");
        let usable = data.len() - data.len() % channels;
        data.truncate(usable);
        Self {
            data,
            channels,
            sample_rate,
        }
    }

    /// Create a silent buffer with the given dimensions.
    pub fn silent(channels: usize, frames: usize, sample_rate: u32) -> Self {
        Self::from_interleaved(vec![0.0; channels * frames], channels, sample_rate)
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.data.len() / self.channels
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// True when the buffer holds no frames.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Read-only access to the raw interleaved data.
    pub fn interleaved(&self) -> &[f32] {
        &self.data
    }

    /// Iterate over one channel's samples via the interleave stride.
    pub fn channel_samples(&self, ch: usize) -> impl Iterator<Item = f32> + '_ {
        assert!(ch < self.channels, "channel out of range");
        self.data.iter().skip(ch).step_by(self.channels).copied()
    }

    /// Collect one channel into a contiguous vector.
    pub fn channel_to_vec(&self, ch: usize) -> Vec<f32> {
        self.channel_samples(ch).collect()
    }
}

/// A `[left, right)` frame range selecting the looping region of a sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoopWindow {
    /// First frame of the loop region.
    pub left: usize,
    /// One-past-last frame of the loop region.
    pub right: usize,
}

impl LoopWindow {
    /// Create a loop window without validation.
    pub fn new(left: usize, right: usize) -> Self {
        Self { left, right }
    }

    /// A loop window covering the whole sample.
    pub fn full(frames: usize) -> Self {
        Self {
            left: 0,
            right: frames,
        }
    }

    /// Number of frames in the loop region.
    pub fn len(&self) -> usize {
        self.right.saturating_sub(self.left)
    }

    /// True when the window selects no frames.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check `0 <= left < right <= frames`.
    pub fn validate(&self, frames: usize) -> Sf2GenResult<()> {
        if self.left >= self.right || self.right > frames {
            return Err(Sf2GenError::InvalidLoop {
                left: self.left,
                right: self.right,
                frames,
            });
        }
        Ok(())
    }
}
