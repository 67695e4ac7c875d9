//! SoundFont 2 record structures and constants.

use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{self, Write};

/// Length of fixed-width name fields.
pub const NAME_LEN: usize = 20;

/// Size of one preset header record.
pub const PRESET_HEADER_SIZE: usize = 38;

/// Size of one bag record (preset or instrument zone index).
pub const BAG_SIZE: usize = 4;

/// Size of one modulator record.
pub const MODULATOR_SIZE: usize = 10;

/// Size of one generator record.
pub const GENERATOR_SIZE: usize = 4;

/// Size of one instrument header record.
pub const INSTRUMENT_HEADER_SIZE: usize = 22;

/// Size of one sample header record.
pub const SAMPLE_HEADER_SIZE: usize = 46;

/// Generator operator codes used by this writer.
pub mod generator {
    /// Chorus send level, tenths of a percent.
    pub const CHORUS_EFFECTS_SEND: u16 = 15;
    /// Reverb send level, tenths of a percent.
    pub const REVERB_EFFECTS_SEND: u16 = 16;
    /// Preset zone -> instrument index.
    pub const INSTRUMENT: u16 = 41;
    /// Instrument zone -> sample header index.
    pub const SAMPLE_ID: u16 = 53;
    /// Loop behavior of the zone's sample.
    pub const SAMPLE_MODES: u16 = 54;
}

/// Values for the sampleModes generator.
pub mod sample_modes {
    /// Play the sample once, ignoring its loop points.
    pub const NO_LOOP: u16 = 0;
    /// Loop continuously between the loop points.
    pub const CONTINUOUS_LOOP: u16 = 1;
}

/// Values for the shdr sfSampleType field.
pub mod sample_types {
    /// Mono sample.
    pub const MONO: u16 = 1;
}

/// Write a zero-padded, truncating fixed-width string field.
pub(crate) fn write_padded_str<W: Write>(writer: &mut W, s: &str, len: usize) -> io::Result<()> {
    let bytes = s.as_bytes();
    let copy_len = bytes.len().min(len);
    writer.write_all(&bytes[..copy_len])?;
    for _ in copy_len..len {
        writer.write_u8(0)?;
    }
    Ok(())
}

/// One phdr record.
#[derive(Debug, Clone)]
pub struct PresetHeader {
    /// Preset name (20 characters max).
    pub name: String,
    /// MIDI preset number.
    pub preset: u16,
    /// MIDI bank number.
    pub bank: u16,
    /// Index of the preset's first bag; the terminator points past the end.
    pub bag_index: u16,
}

impl PresetHeader {
    /// Create a preset header in bank 0.
    pub fn new(name: &str, preset: u16, bank: u16, bag_index: u16) -> Self {
        Self {
            name: name.to_string(),
            preset,
            bank,
            bag_index,
        }
    }

    /// Write the 38-byte record.
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_padded_str(writer, &self.name, NAME_LEN)?;
        writer.write_u16::<LittleEndian>(self.preset)?;
        writer.write_u16::<LittleEndian>(self.bank)?;
        writer.write_u16::<LittleEndian>(self.bag_index)?;
        writer.write_u32::<LittleEndian>(0)?; // dwLibrary
        writer.write_u32::<LittleEndian>(0)?; // dwGenre
        writer.write_u32::<LittleEndian>(0)?; // dwMorphology
        Ok(())
    }
}

/// One pbag/ibag record: indices of the zone's first generator and modulator.
#[derive(Debug, Clone, Copy)]
pub struct Bag {
    /// Index into the zone's generator table.
    pub gen_index: u16,
    /// Index into the zone's modulator table.
    pub mod_index: u16,
}

impl Bag {
    /// Create a bag record.
    pub fn new(gen_index: u16, mod_index: u16) -> Self {
        Self {
            gen_index,
            mod_index,
        }
    }

    /// Write the 4-byte record.
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u16::<LittleEndian>(self.gen_index)?;
        writer.write_u16::<LittleEndian>(self.mod_index)
    }
}

/// One pgen/igen record.
#[derive(Debug, Clone, Copy)]
pub struct Generator {
    /// Generator operator code.
    pub oper: u16,
    /// Generator amount, interpreted per operator.
    pub amount: u16,
}

impl Generator {
    /// Create a generator record.
    pub fn new(oper: u16, amount: u16) -> Self {
        Self { oper, amount }
    }

    /// The `(0, 0)` record closing a generator table.
    pub fn terminator() -> Self {
        Self { oper: 0, amount: 0 }
    }

    /// Write the 4-byte record.
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u16::<LittleEndian>(self.oper)?;
        writer.write_u16::<LittleEndian>(self.amount)
    }
}

/// Write the all-zero modulator record that terminates pmod/imod.
pub fn write_terminal_modulator<W: Write>(writer: &mut W) -> io::Result<()> {
    writer.write_all(&[0u8; MODULATOR_SIZE])
}

/// One inst record.
#[derive(Debug, Clone)]
pub struct InstrumentHeader {
    /// Instrument name (20 characters max).
    pub name: String,
    /// Index of the instrument's first bag.
    pub bag_index: u16,
}

impl InstrumentHeader {
    /// Create an instrument header.
    pub fn new(name: &str, bag_index: u16) -> Self {
        Self {
            name: name.to_string(),
            bag_index,
        }
    }

    /// Write the 22-byte record.
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_padded_str(writer, &self.name, NAME_LEN)?;
        writer.write_u16::<LittleEndian>(self.bag_index)
    }
}

/// One shdr record. All offsets are in samples from the start of the smpl
/// chunk's data, not bytes.
#[derive(Debug, Clone)]
pub struct SampleHeader {
    /// Sample name (20 characters max).
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
    /// MIDI root key at which the sample plays unpitched.
    pub original_pitch: u8,
    /// Fine pitch correction in cents.
    pub pitch_correction: i8,
    /// Linked sample index; unused for mono samples.
    pub sample_link: u16,
    /// sfSampleType; 1 = mono.
    pub sample_type: u16,
}

impl SampleHeader {
    /// The "EOS" record closing the shdr table.
    pub fn terminator() -> Self {
        Self {
            name: "EOS".to_string(),
            start: 0,
            end: 0,
            start_loop: 0,
            end_loop: 0,
            sample_rate: 0,
            original_pitch: 0,
            pitch_correction: 0,
            sample_link: 0,
            sample_type: sample_types::MONO,
        }
    }

    /// Write the 46-byte record.
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_padded_str(writer, &self.name, NAME_LEN)?;
        writer.write_u32::<LittleEndian>(self.start)?;
        writer.write_u32::<LittleEndian>(self.end)?;
        writer.write_u32::<LittleEndian>(self.start_loop)?;
        writer.write_u32::<LittleEndian>(self.end_loop)?;
        writer.write_u32::<LittleEndian>(self.sample_rate)?;
        writer.write_u8(self.original_pitch)?;
        writer.write_i8(self.pitch_correction)?;
        writer.write_u16::<LittleEndian>(self.sample_link)?;
        writer.write_u16::<LittleEndian>(self.sample_type)
    }
}
