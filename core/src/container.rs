//! Audio container headers: RIFF/WAVE and Sun AU, or none at all for raw
//! sample output.
//!
//! Headers are written once, before the first sample, and never patched
//! afterwards. When the number of frames is not known up front the length
//! fields carry [`UNKNOWN_LENGTH`].

use crate::byte_order::{tag, write_tag, write_u16, write_u32, Endian};
use crate::error::{CassetteError, Result};
use crate::sample::{SampleEncoding, SampleWidth};
use crate::NUM_CHANNELS;
use std::io::Write;

pub const UNKNOWN_LENGTH: u32 = 0xFFFF_FFFF;

/// Size of the complete WAV header, also used for the RIFF length field
pub const WAV_HEADER_SIZE: u32 = 5 * 4 + 24;
/// Minimum AU header: six 32-bit fields plus a 4-byte annotation
pub const AU_HEADER_SIZE: u32 = 28;

const WAV_ID_RIFF: u32 = tag(b"RIFF");
const WAV_ID_WAVE: u32 = tag(b"WAVE");
const WAV_ID_FMT: u32 = tag(b"fmt ");
const WAV_ID_DATA: u32 = tag(b"data");
const WAV_FMT_CHUNK_SIZE: u32 = 16;
const WAVE_FORMAT_PCM: u16 = 0x0001;

const AU_MAGIC: u32 = tag(b".snd");
const AU_ENCODING_LINEAR_8: u32 = 2;
const AU_ENCODING_LINEAR_16: u32 = 3;
const AU_ENCODING_LINEAR_24: u32 = 4;
const AU_ENCODING_LINEAR_32: u32 = 5;
const AU_ANNOTATION: [u8; 4] = *b"ABC\0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Wav,
    Au,
    Raw,
}

impl ContainerKind {
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "wav" => Ok(ContainerKind::Wav),
            "au" => Ok(ContainerKind::Au),
            "raw" => Ok(ContainerKind::Raw),
            other => Err(CassetteError::InvalidConfig(format!(
                "unknown audio format '{}' (expected wav, au or raw)",
                other
            ))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ContainerKind::Wav => "wav",
            ContainerKind::Au => "au",
            ContainerKind::Raw => "raw",
        }
    }

    /// Sample layout inside the container. Raw output uses the WAV layout.
    pub fn sample_encoding(self) -> SampleEncoding {
        match self {
            ContainerKind::Wav | ContainerKind::Raw => SampleEncoding::LITTLE_ENDIAN_UNSIGNED_8,
            ContainerKind::Au => SampleEncoding::BIG_ENDIAN_SIGNED,
        }
    }

    pub fn header_size(self) -> u32 {
        match self {
            ContainerKind::Wav => WAV_HEADER_SIZE,
            ContainerKind::Au => AU_HEADER_SIZE,
            ContainerKind::Raw => 0,
        }
    }
}

/// Sample geometry shared by both headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSpec {
    pub sample_rate: u32,
    pub channels: u16,
    pub width: SampleWidth,
}

impl AudioSpec {
    pub fn mono(sample_rate: u32, width: SampleWidth) -> Self {
        Self {
            sample_rate,
            channels: NUM_CHANNELS,
            width,
        }
    }

    /// Bytes per frame, `ceil(bits * channels / 8)`.
    pub fn frame_size(&self) -> u16 {
        (self.width.bits() * self.channels).div_ceil(8)
    }

    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.frame_size() as u32
    }

    pub fn data_bytes(&self, frames: u64) -> u64 {
        frames * self.frame_size() as u64
    }
}

fn to_u32(len: u64) -> Result<u32> {
    u32::try_from(len)
        .ok()
        .filter(|&v| v != UNKNOWN_LENGTH)
        .ok_or(CassetteError::OutputTooLarge(len))
}

/// Resolve the (total, data) length fields for a header, failing before
/// anything is written if the sizes overflow 32 bits.
fn length_fields(header_size: u32, spec: &AudioSpec, frames: Option<u64>) -> Result<(u32, u32)> {
    match frames {
        None => Ok((UNKNOWN_LENGTH, UNKNOWN_LENGTH)),
        Some(frames) => {
            let data = spec.data_bytes(frames);
            Ok((to_u32(header_size as u64 + data)?, to_u32(data)?))
        }
    }
}

pub fn write_wav_header<W: Write + ?Sized>(out: &mut W, spec: &AudioSpec, frames: Option<u64>) -> Result<()> {
    let (total_len, data_len) = length_fields(WAV_HEADER_SIZE, spec, frames)?;
    let le = Endian::Little;

    write_tag(out, WAV_ID_RIFF)?;
    write_u32(out, total_len, le)?;
    write_tag(out, WAV_ID_WAVE)?;

    write_tag(out, WAV_ID_FMT)?;
    write_u32(out, WAV_FMT_CHUNK_SIZE, le)?;
    write_u16(out, WAVE_FORMAT_PCM, le)?;
    write_u16(out, spec.channels, le)?;
    write_u32(out, spec.sample_rate, le)?;
    write_u32(out, spec.byte_rate(), le)?;
    write_u16(out, spec.frame_size(), le)?;
    write_u16(out, spec.width.bits(), le)?;

    write_tag(out, WAV_ID_DATA)?;
    write_u32(out, data_len, le)?;
    Ok(())
}

pub fn write_au_header<W: Write + ?Sized>(out: &mut W, spec: &AudioSpec, frames: Option<u64>) -> Result<()> {
    let (_, data_len) = length_fields(AU_HEADER_SIZE, spec, frames)?;
    let encoding = match spec.width {
        SampleWidth::Width8 => AU_ENCODING_LINEAR_8,
        SampleWidth::Width16 => AU_ENCODING_LINEAR_16,
        SampleWidth::Width24 => AU_ENCODING_LINEAR_24,
        SampleWidth::Width32 => AU_ENCODING_LINEAR_32,
    };
    let be = Endian::Big;

    write_u32(out, AU_MAGIC, be)?;
    write_u32(out, AU_HEADER_SIZE, be)?;
    write_u32(out, data_len, be)?;
    write_u32(out, encoding, be)?;
    write_u32(out, spec.sample_rate, be)?;
    write_u32(out, spec.channels as u32, be)?;
    out.write_all(&AU_ANNOTATION)?;
    Ok(())
}

/// Write the header for `kind`; raw output has none.
pub fn write_header<W: Write + ?Sized>(
    out: &mut W,
    kind: ContainerKind,
    spec: &AudioSpec,
    frames: Option<u64>,
) -> Result<()> {
    match kind {
        ContainerKind::Wav => write_wav_header(out, spec, frames),
        ContainerKind::Au => write_au_header(out, spec, frames),
        ContainerKind::Raw => Ok(()),
    }
}
