//! Audio file loading.
//!
//! Decodes any symphonia-supported container (WAV, FLAC, OGG/Vorbis, ...)
//! into an interleaved f32 [`AudioBuffer`] and optionally normalizes it to a
//! target sample rate. Only mono and stereo inputs are accepted; downstream
//! conversion reads channel 0.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::{AudioBuffer as DecodedBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};

use crate::buffer::AudioBuffer;
use crate::error::{Sf2GenError, Sf2GenResult};
use crate::resample::resample;

/// Maximum channel count the pipeline accepts.
pub const MAX_CHANNELS: usize = 2;

/// Decode `path` into an interleaved float buffer.
///
/// When `target_rate` is set and differs from the decoded rate, the buffer
/// is resampled before it is returned.
pub fn load(path: &Path, target_rate: Option<u32>) -> Sf2GenResult<AudioBuffer> {
    let file = File::open(path)
        .map_err(|e| Sf2GenError::decode(format!("{}: {}", path.display(), e)))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    // An extension hint helps the probe pick the right reader.
    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let probed = get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| Sf2GenError::decode(format!("{}: {}", path.display(), e)))?;
    let mut format_reader = probed.format;

    let track = format_reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Sf2GenError::decode(format!("{}: no audio track found", path.display())))?;
    let track_id = track.id;
    let params = &track.codec_params;

    let sample_rate = params.sample_rate.ok_or_else(|| {
        Sf2GenError::decode(format!("{}: sample rate not specified", path.display()))
    })?;
    let channels = params
        .channels
        .map(|c| c.count())
        .ok_or_else(|| Sf2GenError::decode(format!("{}: channel count not specified", path.display())))?;
    if channels == 0 {
        return Err(Sf2GenError::decode(format!("{}: no channels", path.display())));
    }
    if channels > MAX_CHANNELS {
        return Err(Sf2GenError::TooManyChannels { channels });
    }

    let mut samples = match params.n_frames {
        Some(n) => Vec::with_capacity(n as usize * channels),
        None => Vec::new(),
    };

    let mut decoder = get_codecs()
        .make(params, &DecoderOptions::default())
        .map_err(|e| Sf2GenError::decode(format!("{}: {}", path.display(), e)))?;

    loop {
        let packet = match format_reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            // Some decoders signal EOF with a decode error instead.
            Err(SymphoniaError::DecodeError(_)) => break,
            Err(e) => {
                return Err(Sf2GenError::decode(format!("{}: {}", path.display(), e)));
            }
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                match decoder.decode(&packet) {
                    Ok(decoded) => decoded,
                    Err(e) => {
                        return Err(Sf2GenError::decode(format!("{}: {}", path.display(), e)));
                    }
                }
            }
            Err(e) => {
                return Err(Sf2GenError::decode(format!("{}: {}", path.display(), e)));
            }
        };
        append_interleaved(decoded, &mut samples);
    }

    let buffer = AudioBuffer::from_interleaved(samples, channels, sample_rate);
    if buffer.is_empty() {
        return Err(Sf2GenError::decode(format!(
            "{}: no audio frames decoded",
            path.display()
        )));
    }

    match target_rate {
        Some(rate) if rate != sample_rate => resample(&buffer, rate),
        _ => Ok(buffer),
    }
}

/// Append a decoded packet to `out` as interleaved f32 samples.
fn append_interleaved(decoded: AudioBufferRef, out: &mut Vec<f32>) {
    match decoded {
        AudioBufferRef::F32(buf) => extend_interleaved(&buf, out, |s| s),
        AudioBufferRef::F64(buf) => extend_interleaved(&buf, out, |s| s as f32),
        AudioBufferRef::S8(buf) => extend_interleaved(&buf, out, scale_s8),
        AudioBufferRef::S16(buf) => extend_interleaved(&buf, out, scale_s16),
        AudioBufferRef::S24(buf) => extend_interleaved(&buf, out, |s| scale_s24(s.inner())),
        AudioBufferRef::S32(buf) => extend_interleaved(&buf, out, scale_s32),
        AudioBufferRef::U8(buf) => extend_interleaved(&buf, out, scale_u8),
        AudioBufferRef::U16(buf) => extend_interleaved(&buf, out, scale_u16),
        AudioBufferRef::U24(buf) => extend_interleaved(&buf, out, |s| scale_u24(s.inner())),
        AudioBufferRef::U32(buf) => extend_interleaved(&buf, out, scale_u32),
    }
}

/// Interleave planar samples from a decoded buffer through `convert`.
fn extend_interleaved<T, F>(buf: &DecodedBuffer<T>, out: &mut Vec<f32>, convert: F)
where
    T: symphonia::core::sample::Sample,
    F: Fn(T) -> f32,
{
    let frames = buf.frames();
    let channels = buf.spec().channels.count();
    let planes = buf.planes();
    out.reserve(frames * channels);
    for frame_idx in 0..frames {
        for ch_idx in 0..channels {
            out.push(convert(planes.planes()[ch_idx][frame_idx]));
        }
    }
}

#[inline]
fn scale_s8(sample: i8) -> f32 {
    sample as f32 / (1i64 << 7) as f32
}

#[inline]
fn scale_s16(sample: i16) -> f32 {
    sample as f32 / (1i64 << 15) as f32
}

#[inline]
fn scale_s24(sample: i32) -> f32 {
    sample as f32 / (1i64 << 23) as f32
}

#[inline]
fn scale_s32(sample: i32) -> f32 {
    sample as f32 / (1i64 << 31) as f32
}

#[inline]
fn scale_u8(sample: u8) -> f32 {
    (sample as f32 / u8::MAX as f32) * 2.0 - 1.0
}

#[inline]
fn scale_u16(sample: u16) -> f32 {
    (sample as f32 / u16::MAX as f32) * 2.0 - 1.0
}

#[inline]
fn scale_u24(sample: u32) -> f32 {
    let max = (1u32 << 24) - 1;
    (sample as f32 / max as f32) * 2.0 - 1.0
}

#[inline]
fn scale_u32(sample: u32) -> f32 {
    (sample as f32 / u32::MAX as f32) * 2.0 - 1.0
}
