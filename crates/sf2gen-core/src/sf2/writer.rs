//! SoundFont 2 file assembly.
//!
//! Builds a complete `RIFF sfbk` byte stream from one mono PCM sample: an
//! INFO list, a sample-data list holding the full sample and its loop
//! window, and the nine-table preset/instrument/sample hierarchy exposing
//! the sample as two presets, a one-shot and a continuously looping
//! variant. All chunk sizes in this layout are closed-form, so every size
//! field is emitted exactly rather than patched afterwards.

use byteorder::{LittleEndian, WriteBytesExt};
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use super::records::{
    generator, sample_modes, sample_types, write_padded_str, write_terminal_modulator, Bag,
    Generator, InstrumentHeader, PresetHeader, SampleHeader, NAME_LEN,
};
use crate::convert::SampleRecord;
use crate::error::{Sf2GenError, Sf2GenResult};

/// SoundFont format version written to the ifil sub-chunk.
pub const FORMAT_VERSION: (u16, u16) = (2, 1);

/// Target sound engine written to the isng sub-chunk.
pub const SOUND_ENGINE: &str = "EMU8000";

/// Creation date written to the ICRD sub-chunk. A fixed value keeps the
/// output byte-identical across runs.
pub const CREATION_DATE: &str = "2026";

/// Zero samples surrounding each PCM region in the smpl chunk, as the
/// SoundFont spec requires between sample data.
pub const GUARD_SAMPLES: usize = 16;

/// Maximum chorus/reverb send, in tenths of a percent.
pub const MAX_SEND: u16 = 1000;

const ENGINE_FIELD_LEN: usize = 10;
const DATE_FIELD_LEN: usize = 10;

const ONE_SHOT_NAME: &str = "OneShot";
const LOOPED_NAME: &str = "Looped";
const PRESET_TERMINATOR_NAME: &str = "EOP";
const INSTRUMENT_TERMINATOR_NAME: &str = "EOI";
const ONE_SHOT_SAMPLE_NAME: &str = "OneShoot";
const LOOP_SAMPLE_NAME: &str = "Loop";

/// Synthesis parameters stored in the generated font.
#[derive(Clone, Debug)]
pub struct Sf2Params {
    /// MIDI root key at which the sample plays unpitched (0..=127).
    pub root_key: u8,
    /// Fine pitch correction in cents (-50..=50).
    pub pitch_correction: i8,
    /// Chorus send in tenths of a percent (0..=1000).
    pub chorus_send: u16,
    /// Reverb send in tenths of a percent (0..=1000).
    pub reverb_send: u16,
}

impl Default for Sf2Params {
    fn default() -> Self {
        Self {
            root_key: 60,
            pitch_correction: 0,
            chorus_send: 500,
            reverb_send: 500,
        }
    }
}

impl Sf2Params {
    fn validate(&self) -> Sf2GenResult<()> {
        if self.root_key > 127 {
            return Err(Sf2GenError::invalid_param(
                "root_key",
                format!("must be 0..=127, got {}", self.root_key),
            ));
        }
        if !(-50..=50).contains(&self.pitch_correction) {
            return Err(Sf2GenError::invalid_param(
                "pitch_correction",
                format!("must be -50..=50, got {}", self.pitch_correction),
            ));
        }
        if self.chorus_send > MAX_SEND {
            return Err(Sf2GenError::invalid_param(
                "chorus_send",
                format!("must be 0..={}, got {}", MAX_SEND, self.chorus_send),
            ));
        }
        if self.reverb_send > MAX_SEND {
            return Err(Sf2GenError::invalid_param(
                "reverb_send",
                format!("must be 0..={}, got {}", MAX_SEND, self.reverb_send),
            ));
        }
        Ok(())
    }
}

/// Result of building a SoundFont.
#[derive(Debug)]
pub struct Sf2Result {
    /// Complete file bytes.
    pub data: Vec<u8>,
    /// BLAKE3 hash of the file bytes.
    pub hash: String,
}

/// Assemble the complete SoundFont byte stream in memory.
pub fn build_sf2(
    record: &SampleRecord,
    params: &Sf2Params,
    name: &str,
) -> Sf2GenResult<Sf2Result> {
    params.validate()?;
    if record.pcm.is_empty() {
        return Err(Sf2GenError::invalid_param("sample", "sample data is empty"));
    }
    if record.loop_pcm.is_empty() || record.loop_pcm.len() > record.pcm.len() {
        return Err(Sf2GenError::InvalidLoop {
            left: 0,
            right: record.loop_pcm.len(),
            frames: record.pcm.len(),
        });
    }

    let info = build_info(name)?;
    let sdta = build_sdta(record)?;
    let pdta = build_pdta(record, params)?;

    let mut body = Vec::with_capacity(info.len() + sdta.len() + pdta.len() + 36);
    write_list(&mut body, b"INFO", &info)?;
    write_list(&mut body, b"sdta", &sdta)?;
    write_list(&mut body, b"pdta", &pdta)?;

    let mut data = Vec::with_capacity(body.len() + 12);
    data.extend_from_slice(b"RIFF");
    data.extend_from_slice(&((body.len() + 4) as u32).to_le_bytes());
    data.extend_from_slice(b"sfbk");
    data.extend_from_slice(&body);

    let hash = blake3::hash(&data).to_hex().to_string();
    Ok(Sf2Result { data, hash })
}

/// Build the font and stream it to `path` in a single binary write.
///
/// On an I/O error a partial file may remain on disk; the caller decides
/// whether to unlink it.
pub fn write_sf2_file(
    path: &Path,
    record: &SampleRecord,
    params: &Sf2Params,
    name: &str,
) -> Sf2GenResult<Sf2Result> {
    let result = build_sf2(record, params, name)?;
    fs::write(path, &result.data)?;
    Ok(result)
}

/// Write a sub-chunk: tag, payload size, payload.
fn write_chunk(out: &mut Vec<u8>, tag: &[u8; 4], payload: &[u8]) -> io::Result<()> {
    out.write_all(tag)?;
    out.write_u32::<LittleEndian>(payload.len() as u32)?;
    out.write_all(payload)
}

/// Write a LIST chunk; the declared size covers the form type and payload.
fn write_list(out: &mut Vec<u8>, form: &[u8; 4], payload: &[u8]) -> io::Result<()> {
    out.write_all(b"LIST")?;
    out.write_u32::<LittleEndian>((payload.len() + 4) as u32)?;
    out.write_all(form)?;
    out.write_all(payload)
}

/// INFO list payload: version, engine, name and date sub-chunks.
fn build_info(name: &str) -> io::Result<Vec<u8>> {
    let mut payload = Vec::new();

    let mut ifil = Vec::with_capacity(4);
    ifil.write_u16::<LittleEndian>(FORMAT_VERSION.0)?;
    ifil.write_u16::<LittleEndian>(FORMAT_VERSION.1)?;
    write_chunk(&mut payload, b"ifil", &ifil)?;

    let mut isng = Vec::with_capacity(ENGINE_FIELD_LEN);
    write_padded_str(&mut isng, SOUND_ENGINE, ENGINE_FIELD_LEN)?;
    write_chunk(&mut payload, b"isng", &isng)?;

    let mut inam = Vec::with_capacity(NAME_LEN);
    write_padded_str(&mut inam, name, NAME_LEN)?;
    write_chunk(&mut payload, b"INAM", &inam)?;

    let mut icrd = Vec::with_capacity(DATE_FIELD_LEN);
    write_padded_str(&mut icrd, CREATION_DATE, DATE_FIELD_LEN)?;
    write_chunk(&mut payload, b"ICRD", &icrd)?;

    Ok(payload)
}

/// sdta list payload: one smpl chunk with zero guards around both regions.
fn build_sdta(record: &SampleRecord) -> io::Result<Vec<u8>> {
    let sample_count = 3 * GUARD_SAMPLES + record.pcm.len() + record.loop_pcm.len();
    let mut smpl = Vec::with_capacity(sample_count * 2);

    write_guard(&mut smpl)?;
    for &sample in &record.pcm {
        smpl.write_i16::<LittleEndian>(sample)?;
    }
    write_guard(&mut smpl)?;
    for &sample in &record.loop_pcm {
        smpl.write_i16::<LittleEndian>(sample)?;
    }
    write_guard(&mut smpl)?;

    let mut payload = Vec::with_capacity(smpl.len() + 8);
    write_chunk(&mut payload, b"smpl", &smpl)?;
    Ok(payload)
}

fn write_guard(out: &mut Vec<u8>) -> io::Result<()> {
    for _ in 0..GUARD_SAMPLES {
        out.write_i16::<LittleEndian>(0)?;
    }
    Ok(())
}

/// pdta list payload: the nine hydra sub-chunks in their mandated order.
fn build_pdta(record: &SampleRecord, params: &Sf2Params) -> io::Result<Vec<u8>> {
    let mut payload = Vec::new();

    // phdr: the two presets plus the EOP terminator, whose bag index
    // points one past the last real bag.
    let mut phdr = Vec::new();
    PresetHeader::new(ONE_SHOT_NAME, 0, 0, 0).write(&mut phdr)?;
    PresetHeader::new(LOOPED_NAME, 1, 0, 1).write(&mut phdr)?;
    PresetHeader::new(PRESET_TERMINATOR_NAME, 0, 0, 2).write(&mut phdr)?;
    write_chunk(&mut payload, b"phdr", &phdr)?;

    // pbag: one single-generator zone per preset.
    let mut pbag = Vec::new();
    for index in 0..3u16 {
        Bag::new(index, 0).write(&mut pbag)?;
    }
    write_chunk(&mut payload, b"pbag", &pbag)?;

    let mut pmod = Vec::new();
    write_terminal_modulator(&mut pmod)?;
    write_chunk(&mut payload, b"pmod", &pmod)?;

    // pgen: each preset zone selects its instrument.
    let mut pgen = Vec::new();
    Generator::new(generator::INSTRUMENT, 0).write(&mut pgen)?;
    Generator::new(generator::INSTRUMENT, 1).write(&mut pgen)?;
    Generator::terminator().write(&mut pgen)?;
    write_chunk(&mut payload, b"pgen", &pgen)?;

    let mut inst = Vec::new();
    InstrumentHeader::new(ONE_SHOT_NAME, 0).write(&mut inst)?;
    InstrumentHeader::new(LOOPED_NAME, 1).write(&mut inst)?;
    InstrumentHeader::new(INSTRUMENT_TERMINATOR_NAME, 2).write(&mut inst)?;
    write_chunk(&mut payload, b"inst", &inst)?;

    // ibag: four generators per instrument zone.
    let mut ibag = Vec::new();
    for index in 0..3u16 {
        Bag::new(index * 4, 0).write(&mut ibag)?;
    }
    write_chunk(&mut payload, b"ibag", &ibag)?;

    let mut imod = Vec::new();
    write_terminal_modulator(&mut imod)?;
    write_chunk(&mut payload, b"imod", &imod)?;

    // igen: both zones carry the same sends; they differ in loop mode and
    // the sample header they reference.
    let mut igen = Vec::new();
    let zones = [
        (sample_modes::NO_LOOP, 0u16),
        (sample_modes::CONTINUOUS_LOOP, 1u16),
    ];
    for (mode, sample_id) in zones {
        Generator::new(generator::CHORUS_EFFECTS_SEND, params.chorus_send).write(&mut igen)?;
        Generator::new(generator::REVERB_EFFECTS_SEND, params.reverb_send).write(&mut igen)?;
        Generator::new(generator::SAMPLE_MODES, mode).write(&mut igen)?;
        Generator::new(generator::SAMPLE_ID, sample_id).write(&mut igen)?;
    }
    Generator::terminator().write(&mut igen)?;
    write_chunk(&mut payload, b"igen", &igen)?;

    // shdr: offsets are in samples from the start of the smpl data; each
    // region sits behind a 16-sample zero guard.
    let guard = GUARD_SAMPLES as u32;
    let pcm_len = record.pcm.len() as u32;
    let loop_len = record.loop_pcm.len() as u32;

    let mut shdr = Vec::new();
    SampleHeader {
        name: ONE_SHOT_SAMPLE_NAME.to_string(),
        start: guard,
        end: guard + pcm_len - 1,
        start_loop: guard,
        end_loop: guard + pcm_len - 1,
        sample_rate: record.sample_rate,
        original_pitch: params.root_key,
        pitch_correction: params.pitch_correction,
        sample_link: 0,
        sample_type: sample_types::MONO,
    }
    .write(&mut shdr)?;
    SampleHeader {
        name: LOOP_SAMPLE_NAME.to_string(),
        start: 2 * guard + pcm_len,
        end: 2 * guard + pcm_len + loop_len - 1,
        start_loop: 2 * guard + pcm_len,
        end_loop: 2 * guard + pcm_len + loop_len - 1,
        sample_rate: record.sample_rate,
        original_pitch: params.root_key,
        pitch_correction: params.pitch_correction,
        sample_link: 0,
        sample_type: sample_types::MONO,
    }
    .write(&mut shdr)?;
    SampleHeader::terminator().write(&mut shdr)?;
    write_chunk(&mut payload, b"shdr", &shdr)?;

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_record() -> SampleRecord {
        SampleRecord {
            pcm: vec![100, 200, 300, 400],
            loop_pcm: vec![200, 300],
            sample_rate: 44100,
        }
    }

    #[test]
    fn test_riff_envelope() {
        let result = build_sf2(&test_record(), &Sf2Params::default(), "Sample").unwrap();
        let data = &result.data;
        assert_eq!(&data[0..4], b"RIFF");
        assert_eq!(&data[8..12], b"sfbk");
        let declared = u32::from_le_bytes(data[4..8].try_into().unwrap());
        assert_eq!(declared as usize, data.len() - 8);
    }

    #[test]
    fn test_info_layout() {
        let info = build_info("Sample").unwrap();
        // ifil(8+4) + isng(8+10) + INAM(8+20) + ICRD(8+10)
        assert_eq!(info.len(), 12 + 18 + 28 + 18);
        assert_eq!(&info[0..4], b"ifil");
        assert_eq!(u16::from_le_bytes(info[8..10].try_into().unwrap()), 2);
        assert_eq!(u16::from_le_bytes(info[10..12].try_into().unwrap()), 1);
        assert_eq!(&info[12..16], b"isng");
        assert_eq!(&info[20..27], b"EMU8000");
        assert_eq!(&info[30..34], b"INAM");
        assert_eq!(&info[38..44], b"Sample");
        assert_eq!(&info[58..62], b"ICRD");
    }

    #[test]
    fn test_sdta_length() {
        let sdta = build_sdta(&test_record()).unwrap();
        // smpl header + (16 + 4 + 16 + 2 + 16) samples * 2 bytes
        assert_eq!(sdta.len(), 8 + 54 * 2);
        let declared = u32::from_le_bytes(sdta[4..8].try_into().unwrap());
        assert_eq!(declared, 54 * 2);
    }

    #[test]
    fn test_pdta_chunk_sizes() {
        let pdta = build_pdta(&test_record(), &Sf2Params::default()).unwrap();
        let expected = 8 + 114 + 8 + 12 + 8 + 10 + 8 + 12 + 8 + 66 + 8 + 12 + 8 + 10 + 8 + 36
            + 8 + 138;
        assert_eq!(pdta.len(), expected);
    }

    #[test]
    fn test_build_is_deterministic() {
        let record = test_record();
        let params = Sf2Params::default();
        let a = build_sf2(&record, &params, "Sample").unwrap();
        let b = build_sf2(&record, &params, "Sample").unwrap();
        assert_eq!(a.data, b.data);
        assert_eq!(a.hash, b.hash);
        assert_eq!(a.hash.len(), 64);
    }

    #[test]
    fn test_rejects_out_of_range_params() {
        let record = test_record();
        let params = Sf2Params {
            root_key: 128,
            ..Sf2Params::default()
        };
        assert!(build_sf2(&record, &params, "Sample").is_err());

        let params = Sf2Params {
            chorus_send: 1001,
            ..Sf2Params::default()
        };
        assert!(build_sf2(&record, &params, "Sample").is_err());
    }

    #[test]
    fn test_rejects_empty_sample() {
        let record = SampleRecord {
            pcm: Vec::new(),
            loop_pcm: Vec::new(),
            sample_rate: 44100,
        };
        assert!(build_sf2(&record, &Sf2Params::default(), "Sample").is_err());
    }

    #[test]
    fn test_rejects_oversized_loop() {
        let record = SampleRecord {
            pcm: vec![0; 4],
            loop_pcm: vec![0; 8],
            sample_rate: 44100,
        };
        let err = build_sf2(&record, &Sf2Params::default(), "Sample").unwrap_err();
        assert!(matches!(err, Sf2GenError::InvalidLoop { .. }));
    }

    #[test]
    fn test_write_sf2_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.sf2");
        let result = write_sf2_file(&path, &test_record(), &Sf2Params::default(), "Sample")
            .unwrap();
        let on_disk = std::fs::read(&path).unwrap();
        assert_eq!(on_disk, result.data);
    }
}
