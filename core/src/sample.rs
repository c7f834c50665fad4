//! PCM sample widths and the quantized square-wave levels.

use crate::byte_order::Endian;
use crate::error::{CassetteError, Result};
use byteorder::{BigEndian, ByteOrder, LittleEndian};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleWidth {
    Width8,
    Width16,
    Width24,
    Width32,
}

impl SampleWidth {
    pub fn from_bits(bits: u16) -> Result<Self> {
        match bits {
            8 => Ok(SampleWidth::Width8),
            16 => Ok(SampleWidth::Width16),
            24 => Ok(SampleWidth::Width24),
            32 => Ok(SampleWidth::Width32),
            other => Err(CassetteError::InvalidBitDepth(other)),
        }
    }

    pub fn bits(self) -> u16 {
        match self {
            SampleWidth::Width8 => 8,
            SampleWidth::Width16 => 16,
            SampleWidth::Width24 => 24,
            SampleWidth::Width32 => 32,
        }
    }

    pub fn bytes(self) -> usize {
        self.bits() as usize / 8
    }

    /// Largest positive signed value at this width.
    fn full_scale(self) -> f64 {
        ((1i64 << (self.bits() - 1)) - 1) as f64
    }
}

/// How a container expects sample values laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleEncoding {
    pub endian: Endian,
    /// 8-bit samples are stored offset by 128 (WAV) rather than signed (AU).
    pub unsigned_8bit: bool,
}

impl SampleEncoding {
    pub const LITTLE_ENDIAN_UNSIGNED_8: SampleEncoding = SampleEncoding {
        endian: Endian::Little,
        unsigned_8bit: true,
    };

    pub const BIG_ENDIAN_SIGNED: SampleEncoding = SampleEncoding {
        endian: Endian::Big,
        unsigned_8bit: false,
    };
}

/// One encoded mono frame, ready to be copied to the output verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleLevel {
    Width8([u8; 1]),
    Width16([u8; 2]),
    Width24([u8; 3]),
    Width32([u8; 4]),
}

impl SampleLevel {
    /// Quantize an amplitude in `[-1.0, 1.0]` to the nearest integer step.
    pub fn quantize(amplitude: f64, width: SampleWidth, encoding: SampleEncoding) -> Self {
        let value = (amplitude.clamp(-1.0, 1.0) * width.full_scale()).round() as i64;

        match width {
            SampleWidth::Width8 => {
                let byte = if encoding.unsigned_8bit {
                    (value + 128) as u8
                } else {
                    value as i8 as u8
                };
                SampleLevel::Width8([byte])
            }
            SampleWidth::Width16 => {
                let mut buf = [0u8; 2];
                match encoding.endian {
                    Endian::Little => LittleEndian::write_i16(&mut buf, value as i16),
                    Endian::Big => BigEndian::write_i16(&mut buf, value as i16),
                }
                SampleLevel::Width16(buf)
            }
            SampleWidth::Width24 => {
                let mut buf = [0u8; 3];
                match encoding.endian {
                    Endian::Little => LittleEndian::write_i24(&mut buf, value as i32),
                    Endian::Big => BigEndian::write_i24(&mut buf, value as i32),
                }
                SampleLevel::Width24(buf)
            }
            SampleWidth::Width32 => {
                let mut buf = [0u8; 4];
                match encoding.endian {
                    Endian::Little => LittleEndian::write_i32(&mut buf, value as i32),
                    Endian::Big => BigEndian::write_i32(&mut buf, value as i32),
                }
                SampleLevel::Width32(buf)
            }
        }
    }

    pub fn width(&self) -> SampleWidth {
        match self {
            SampleLevel::Width8(_) => SampleWidth::Width8,
            SampleLevel::Width16(_) => SampleWidth::Width16,
            SampleLevel::Width24(_) => SampleWidth::Width24,
            SampleLevel::Width32(_) => SampleWidth::Width32,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            SampleLevel::Width8(b) => b,
            SampleLevel::Width16(b) => b,
            SampleLevel::Width24(b) => b,
            SampleLevel::Width32(b) => b,
        }
    }
}
