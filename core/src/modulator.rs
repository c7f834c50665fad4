use crate::sample::SampleLevel;
use std::io::{self, Write};

// Bi-phase square wave as read by the ABC80 cassette loader.
//
//   "0": one transition per bit      "1": two transitions per bit
//
//   +---------+                      +----+    +
//   |         |                      |    |    |
//   |         +----                  +    +----+
//
// Every bit starts with a polarity flip, so the receiver can recover the
// clock from the edges. A "1" flips again mid-bit.

/// Bi-phase modulator producing square-wave PCM frames.
///
/// Holds one precomputed half-bit run for each level and the current
/// polarity. The polarity carries over between bits, bytes and blocks and
/// is only set at construction.
pub struct BiphaseModulator {
    half_bit_samples: usize,
    low_run: Vec<u8>,
    high_run: Vec<u8>,
    high: bool,
    frames_written: u64,
}

impl BiphaseModulator {
    pub fn new(half_bit_samples: u32, low: SampleLevel, high: SampleLevel) -> Self {
        debug_assert_eq!(low.width(), high.width());
        let half_bit_samples = half_bit_samples as usize;

        Self {
            half_bit_samples,
            low_run: low.as_bytes().repeat(half_bit_samples),
            high_run: high.as_bytes().repeat(half_bit_samples),
            high: true,
            frames_written: 0,
        }
    }

    /// Current polarity; `true` when the last half-bit written was high.
    pub fn is_high(&self) -> bool {
        self.high
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    fn write_half_bit<W: Write + ?Sized>(&mut self, out: &mut W) -> io::Result<()> {
        let run = if self.high { &self.high_run } else { &self.low_run };
        out.write_all(run)?;
        self.frames_written += self.half_bit_samples as u64;
        Ok(())
    }

    pub fn emit_bit<W: Write + ?Sized>(&mut self, bit: bool, out: &mut W) -> io::Result<()> {
        self.high = !self.high;
        self.write_half_bit(out)?;

        if bit {
            self.high = !self.high;
        }
        self.write_half_bit(out)
    }

    /// Emit the 8 bits of `byte`, least significant first.
    pub fn emit_byte<W: Write + ?Sized>(&mut self, byte: u8, out: &mut W) -> io::Result<()> {
        for i in 0..8 {
            self.emit_bit((byte >> i) & 1 == 1, out)?;
        }
        Ok(())
    }

    pub fn emit_u16_le<W: Write + ?Sized>(&mut self, word: u16, out: &mut W) -> io::Result<()> {
        self.emit_byte(word as u8, out)?;
        self.emit_byte((word >> 8) as u8, out)
    }
}
