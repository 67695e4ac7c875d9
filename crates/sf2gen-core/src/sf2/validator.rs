//! Structural validation for generated SoundFont 2 files.
//!
//! Re-parses a font byte stream and checks the invariants the writer
//! guarantees: RIFF/LIST size consistency, the nine pdta sub-chunks in
//! their mandated order with whole records, terminator records in place,
//! and sample header offsets that stay ordered and inside the smpl data.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;
use thiserror::Error;

use super::records::{
    generator, BAG_SIZE, GENERATOR_SIZE, INSTRUMENT_HEADER_SIZE, MODULATOR_SIZE,
    PRESET_HEADER_SIZE, SAMPLE_HEADER_SIZE,
};

/// Errors reported while validating a font.
#[derive(Debug, Error)]
pub enum Sf2ValidationError {
    /// The data is shorter than a RIFF envelope.
    #[error("file too small: {0} bytes")]
    FileTooSmall(usize),

    /// A magic tag is missing or wrong.
    #[error("missing or invalid {0} identifier")]
    BadMagic(&'static str),

    /// The outer RIFF size disagrees with the file size.
    #[error("RIFF declares {declared} bytes but the file holds {actual}")]
    RiffSizeMismatch {
        /// Declared size (excluding the 8-byte header).
        declared: u32,
        /// Actual byte count past the header.
        actual: usize,
    },

    /// A LIST size disagrees with its content.
    #[error("LIST {form} declares {declared} bytes but contains {actual}")]
    ListSizeMismatch {
        /// Form type of the list.
        form: String,
        /// Declared size.
        declared: u32,
        /// Bytes actually consumed by the form type and sub-chunks.
        actual: usize,
    },

    /// A chunk appeared out of order or with the wrong tag.
    #[error("expected chunk {expected}, found {found}")]
    UnexpectedChunk {
        /// Tag that should appear here.
        expected: String,
        /// Tag found instead.
        found: String,
    },

    /// A chunk does not divide into whole records.
    #[error("chunk {chunk} has size {size}, not a multiple of {record_size}-byte records")]
    RaggedChunk {
        /// Chunk tag.
        chunk: &'static str,
        /// Declared size.
        size: u32,
        /// Record size for this table.
        record_size: usize,
    },

    /// A chunk extends past its container.
    #[error("truncated chunk {0}")]
    Truncated(&'static str),

    /// A table is missing its terminator record.
    #[error("missing terminator record in {0}")]
    MissingTerminator(&'static str),

    /// A table holds a different number of records than this layout allows.
    #[error("chunk {chunk} holds {count} records, expected {expected}")]
    UnexpectedRecordCount {
        /// Chunk tag.
        chunk: &'static str,
        /// Records found.
        count: usize,
        /// Records the layout mandates.
        expected: usize,
    },

    /// A sample header violates start <= startLoop <= endLoop <= end.
    #[error("sample header {index} has inconsistent offsets")]
    BadSampleOffsets {
        /// Index of the offending header.
        index: usize,
    },

    /// A sample header points outside the smpl data.
    #[error("sample header {index} ends at {end}, but smpl holds {available} samples")]
    SampleOutOfRange {
        /// Index of the offending header.
        index: usize,
        /// End offset in samples.
        end: u32,
        /// Samples available in the smpl chunk.
        available: u32,
    },
}

/// A parsed phdr record.
#[derive(Debug, Clone)]
pub struct ParsedPreset {
    /// Preset name.
    pub name: String,
    /// MIDI preset number.
    pub preset: u16,
    /// MIDI bank number.
    pub bank: u16,
    /// First bag index.
    pub bag_index: u16,
}

/// A parsed inst record.
#[derive(Debug, Clone)]
pub struct ParsedInstrument {
    /// Instrument name.
    pub name: String,
    /// First bag index.
    pub bag_index: u16,
}

/// A parsed generator record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedGenerator {
    /// Generator operator code.
    pub oper: u16,
    /// Generator amount.
    pub amount: u16,
}

/// A parsed shdr record.
#[derive(Debug, Clone)]
pub struct ParsedSampleHeader {
    /// Sample name.
    pub name: String,
    /// First sample of the region.
    pub start: u32,
    /// Last sample of the region.
    pub end: u32,
    /// First sample of the loop.
    pub start_loop: u32,
    /// Last sample of the loop.
    pub end_loop: u32,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// MIDI root key.
    pub original_pitch: u8,
    /// Fine pitch correction in cents.
    pub pitch_correction: i8,
    /// Linked sample index.
    pub sample_link: u16,
    /// sfSampleType value.
    pub sample_type: u16,
}

/// Everything the validator extracts from a well-formed font.
#[derive(Debug)]
pub struct Sf2Summary {
    /// Declared outer RIFF size.
    pub riff_size: u32,
    /// smpl chunk length in 16-bit samples.
    pub smpl_len_samples: u32,
    /// phdr records, terminator included.
    pub presets: Vec<ParsedPreset>,
    /// pbag records as (gen_index, mod_index).
    pub preset_bags: Vec<(u16, u16)>,
    /// pgen records, terminator included.
    pub preset_generators: Vec<ParsedGenerator>,
    /// inst records, terminator included.
    pub instruments: Vec<ParsedInstrument>,
    /// ibag records as (gen_index, mod_index).
    pub instrument_bags: Vec<(u16, u16)>,
    /// igen records, terminator included.
    pub instrument_generators: Vec<ParsedGenerator>,
    /// shdr records, terminator included.
    pub sample_headers: Vec<ParsedSampleHeader>,
}

impl Sf2Summary {
    /// Generators of one instrument zone, resolved through ibag.
    pub fn instrument_zone_generators(&self, zone: usize) -> &[ParsedGenerator] {
        let start = self.instrument_bags[zone].0 as usize;
        let end = self.instrument_bags[zone + 1].0 as usize;
        &self.instrument_generators[start..end]
    }

    /// The sampleModes amount of one instrument zone, if present.
    pub fn zone_sample_modes(&self, zone: usize) -> Option<u16> {
        self.instrument_zone_generators(zone)
            .iter()
            .find(|g| g.oper == generator::SAMPLE_MODES)
            .map(|g| g.amount)
    }

    /// The sampleID amount of one instrument zone, if present.
    pub fn zone_sample_id(&self, zone: usize) -> Option<u16> {
        self.instrument_zone_generators(zone)
            .iter()
            .find(|g| g.oper == generator::SAMPLE_ID)
            .map(|g| g.amount)
    }
}

/// The nine pdta sub-chunks in their mandated order, with record sizes.
const PDTA_LAYOUT: [(&[u8; 4], usize); 9] = [
    (b"phdr", PRESET_HEADER_SIZE),
    (b"pbag", BAG_SIZE),
    (b"pmod", MODULATOR_SIZE),
    (b"pgen", GENERATOR_SIZE),
    (b"inst", INSTRUMENT_HEADER_SIZE),
    (b"ibag", BAG_SIZE),
    (b"imod", MODULATOR_SIZE),
    (b"igen", GENERATOR_SIZE),
    (b"shdr", SAMPLE_HEADER_SIZE),
];

/// Validate a font and return its parsed summary.
pub fn validate_sf2(data: &[u8]) -> Result<Sf2Summary, Sf2ValidationError> {
    if data.len() < 12 {
        return Err(Sf2ValidationError::FileTooSmall(data.len()));
    }
    if &data[0..4] != b"RIFF" {
        return Err(Sf2ValidationError::BadMagic("RIFF"));
    }
    let riff_size = read_u32(data, 4);
    if riff_size as usize != data.len() - 8 {
        return Err(Sf2ValidationError::RiffSizeMismatch {
            declared: riff_size,
            actual: data.len() - 8,
        });
    }
    if &data[8..12] != b"sfbk" {
        return Err(Sf2ValidationError::BadMagic("sfbk"));
    }

    let mut pos = 12;
    let info = read_list(data, &mut pos, b"INFO")?;
    validate_info(info)?;
    let sdta = read_list(data, &mut pos, b"sdta")?;
    let smpl_len_samples = validate_sdta(sdta)?;
    let pdta = read_list(data, &mut pos, b"pdta")?;

    let summary = parse_pdta(pdta, riff_size, smpl_len_samples)?;
    check_terminators(&summary)?;
    check_sample_headers(&summary)?;
    Ok(summary)
}

fn read_u32(data: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes(data[pos..pos + 4].try_into().expect("bounds checked"))
}

/// Read one LIST chunk with the expected form type; returns its sub-chunk
/// payload and advances `pos` past it.
fn read_list<'a>(
    data: &'a [u8],
    pos: &mut usize,
    form: &'static [u8; 4],
) -> Result<&'a [u8], Sf2ValidationError> {
    if *pos + 12 > data.len() {
        return Err(Sf2ValidationError::Truncated("LIST"));
    }
    if &data[*pos..*pos + 4] != b"LIST" {
        return Err(Sf2ValidationError::UnexpectedChunk {
            expected: "LIST".to_string(),
            found: tag_string(&data[*pos..*pos + 4]),
        });
    }
    let declared = read_u32(data, *pos + 4);
    let found_form = &data[*pos + 8..*pos + 12];
    if found_form != form {
        return Err(Sf2ValidationError::UnexpectedChunk {
            expected: tag_string(form),
            found: tag_string(found_form),
        });
    }
    if declared < 4 || *pos + 8 + declared as usize > data.len() {
        return Err(Sf2ValidationError::Truncated("LIST"));
    }
    let payload = &data[*pos + 12..*pos + 8 + declared as usize];

    // The declared size must equal the form type plus whole sub-chunks.
    let mut consumed = 0;
    while consumed < payload.len() {
        if consumed + 8 > payload.len() {
            return Err(Sf2ValidationError::ListSizeMismatch {
                form: tag_string(form),
                declared,
                actual: consumed + 4,
            });
        }
        let sub_size = read_u32(payload, consumed + 4) as usize;
        if consumed + 8 + sub_size > payload.len() {
            return Err(Sf2ValidationError::ListSizeMismatch {
                form: tag_string(form),
                declared,
                actual: consumed + 4,
            });
        }
        consumed += 8 + sub_size;
    }

    *pos += 8 + declared as usize;
    Ok(payload)
}

fn tag_string(tag: &[u8]) -> String {
    String::from_utf8_lossy(tag).to_string()
}

/// Extract a fixed-width zero-padded name field.
fn extract_name(data: &[u8]) -> String {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    String::from_utf8_lossy(&data[..end]).to_string()
}

/// Walk the INFO sub-chunks and require the version record.
fn validate_info(payload: &[u8]) -> Result<(), Sf2ValidationError> {
    let mut pos = 0;
    let mut saw_version = false;
    while pos + 8 <= payload.len() {
        let tag = &payload[pos..pos + 4];
        let size = read_u32(payload, pos + 4) as usize;
        if tag == b"ifil" {
            if size != 4 {
                return Err(Sf2ValidationError::RaggedChunk {
                    chunk: "ifil",
                    size: size as u32,
                    record_size: 4,
                });
            }
            saw_version = true;
        }
        pos += 8 + size;
    }
    if !saw_version {
        return Err(Sf2ValidationError::BadMagic("ifil"));
    }
    Ok(())
}

/// Check the sdta list holds a single smpl chunk; returns its length in
/// 16-bit samples.
fn validate_sdta(payload: &[u8]) -> Result<u32, Sf2ValidationError> {
    if payload.len() < 8 {
        return Err(Sf2ValidationError::Truncated("smpl"));
    }
    if &payload[0..4] != b"smpl" {
        return Err(Sf2ValidationError::UnexpectedChunk {
            expected: "smpl".to_string(),
            found: tag_string(&payload[0..4]),
        });
    }
    let size = read_u32(payload, 4);
    if size % 2 != 0 {
        return Err(Sf2ValidationError::RaggedChunk {
            chunk: "smpl",
            size,
            record_size: 2,
        });
    }
    if 8 + size as usize != payload.len() {
        return Err(Sf2ValidationError::Truncated("smpl"));
    }
    Ok(size / 2)
}

fn parse_pdta(
    payload: &[u8],
    riff_size: u32,
    smpl_len_samples: u32,
) -> Result<Sf2Summary, Sf2ValidationError> {
    let mut pos = 0;
    let mut chunks: Vec<&[u8]> = Vec::with_capacity(PDTA_LAYOUT.len());

    for (tag, record_size) in PDTA_LAYOUT {
        if pos + 8 > payload.len() {
            return Err(Sf2ValidationError::Truncated("pdta"));
        }
        let found = &payload[pos..pos + 4];
        if found != tag {
            return Err(Sf2ValidationError::UnexpectedChunk {
                expected: tag_string(tag),
                found: tag_string(found),
            });
        }
        let size = read_u32(payload, pos + 4);
        if size as usize % record_size != 0 {
            return Err(Sf2ValidationError::RaggedChunk {
                chunk: tag_str(tag),
                size,
                record_size,
            });
        }
        if pos + 8 + size as usize > payload.len() {
            return Err(Sf2ValidationError::Truncated(tag_str(tag)));
        }
        chunks.push(&payload[pos + 8..pos + 8 + size as usize]);
        pos += 8 + size as usize;
    }
    if pos != payload.len() {
        return Err(Sf2ValidationError::UnexpectedChunk {
            expected: "end of pdta".to_string(),
            found: tag_string(&payload[pos..payload.len().min(pos + 4)]),
        });
    }

    let presets = chunks[0]
        .chunks_exact(PRESET_HEADER_SIZE)
        .map(|rec| {
            let mut cursor = Cursor::new(&rec[20..]);
            ParsedPreset {
                name: extract_name(&rec[..20]),
                preset: cursor.read_u16::<LittleEndian>().expect("sized"),
                bank: cursor.read_u16::<LittleEndian>().expect("sized"),
                bag_index: cursor.read_u16::<LittleEndian>().expect("sized"),
            }
        })
        .collect();

    let preset_bags = parse_bags(chunks[1]);
    let preset_generators = parse_generators(chunks[3]);

    let instruments = chunks[4]
        .chunks_exact(INSTRUMENT_HEADER_SIZE)
        .map(|rec| ParsedInstrument {
            name: extract_name(&rec[..20]),
            bag_index: u16::from_le_bytes(rec[20..22].try_into().expect("sized")),
        })
        .collect();

    let instrument_bags = parse_bags(chunks[5]);
    let instrument_generators = parse_generators(chunks[7]);

    // pmod/imod must hold exactly one record, the all-zero terminator.
    for (index, tag) in [(2usize, "pmod"), (6usize, "imod")] {
        if chunks[index].len() != MODULATOR_SIZE {
            return Err(Sf2ValidationError::UnexpectedRecordCount {
                chunk: tag,
                count: chunks[index].len() / MODULATOR_SIZE,
                expected: 1,
            });
        }
        if chunks[index].iter().any(|&b| b != 0) {
            return Err(Sf2ValidationError::MissingTerminator(tag));
        }
    }

    let sample_headers = chunks[8]
        .chunks_exact(SAMPLE_HEADER_SIZE)
        .map(|rec| {
            let mut cursor = Cursor::new(&rec[20..]);
            ParsedSampleHeader {
                name: extract_name(&rec[..20]),
                start: cursor.read_u32::<LittleEndian>().expect("sized"),
                end: cursor.read_u32::<LittleEndian>().expect("sized"),
                start_loop: cursor.read_u32::<LittleEndian>().expect("sized"),
                end_loop: cursor.read_u32::<LittleEndian>().expect("sized"),
                sample_rate: cursor.read_u32::<LittleEndian>().expect("sized"),
                original_pitch: cursor.read_u8().expect("sized"),
                pitch_correction: cursor.read_i8().expect("sized"),
                sample_link: cursor.read_u16::<LittleEndian>().expect("sized"),
                sample_type: cursor.read_u16::<LittleEndian>().expect("sized"),
            }
        })
        .collect();

    Ok(Sf2Summary {
        riff_size,
        smpl_len_samples,
        presets,
        preset_bags,
        preset_generators,
        instruments,
        instrument_bags,
        instrument_generators,
        sample_headers,
    })
}

fn tag_str(tag: &'static [u8; 4]) -> &'static str {
    std::str::from_utf8(tag).expect("pdta tags are ASCII")
}

fn parse_bags(data: &[u8]) -> Vec<(u16, u16)> {
    data.chunks_exact(BAG_SIZE)
        .map(|rec| {
            (
                u16::from_le_bytes(rec[0..2].try_into().expect("sized")),
                u16::from_le_bytes(rec[2..4].try_into().expect("sized")),
            )
        })
        .collect()
}

fn parse_generators(data: &[u8]) -> Vec<ParsedGenerator> {
    data.chunks_exact(GENERATOR_SIZE)
        .map(|rec| ParsedGenerator {
            oper: u16::from_le_bytes(rec[0..2].try_into().expect("sized")),
            amount: u16::from_le_bytes(rec[2..4].try_into().expect("sized")),
        })
        .collect()
}

/// Every table must close with its terminator record.
fn check_terminators(summary: &Sf2Summary) -> Result<(), Sf2ValidationError> {
    match summary.presets.last() {
        Some(last) if last.name == "EOP" => {}
        _ => return Err(Sf2ValidationError::MissingTerminator("phdr")),
    }
    match summary.instruments.last() {
        Some(last) if last.name == "EOI" => {}
        _ => return Err(Sf2ValidationError::MissingTerminator("inst")),
    }
    match summary.sample_headers.last() {
        Some(last) if last.name == "EOS" => {}
        _ => return Err(Sf2ValidationError::MissingTerminator("shdr")),
    }
    match summary.preset_generators.last() {
        Some(last) if last.oper == 0 && last.amount == 0 => {}
        _ => return Err(Sf2ValidationError::MissingTerminator("pgen")),
    }
    match summary.instrument_generators.last() {
        Some(last) if last.oper == 0 && last.amount == 0 => {}
        _ => return Err(Sf2ValidationError::MissingTerminator("igen")),
    }
    if summary.preset_bags.is_empty() || summary.instrument_bags.is_empty() {
        return Err(Sf2ValidationError::MissingTerminator("pbag"));
    }
    Ok(())
}

/// Non-terminal sample headers must stay ordered and inside the smpl data.
fn check_sample_headers(summary: &Sf2Summary) -> Result<(), Sf2ValidationError> {
    let count = summary.sample_headers.len();
    for (index, header) in summary.sample_headers.iter().take(count - 1).enumerate() {
        let ordered = header.start <= header.start_loop
            && header.start_loop <= header.end_loop
            && header.end_loop <= header.end;
        if !ordered {
            return Err(Sf2ValidationError::BadSampleOffsets { index });
        }
        if header.end >= summary.smpl_len_samples {
            return Err(Sf2ValidationError::SampleOutOfRange {
                index,
                end: header.end,
                available: summary.smpl_len_samples,
            });
        }
    }
    Ok(())
}
