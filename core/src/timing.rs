use crate::error::{CassetteError, Result};
use crate::{MAX_HALF_BIT_SAMPLES, MIN_SAMPLE_RATE};

/// Bit rates understood by the ABC80 (700) and ABC800 (700/2400) loaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Baud {
    B700,
    B2400,
}

impl Baud {
    pub fn from_u32(baud: u32) -> Result<Self> {
        match baud {
            700 => Ok(Baud::B700),
            2400 => Ok(Baud::B2400),
            other => Err(CassetteError::InvalidBaud(other)),
        }
    }

    pub fn bits_per_second(self) -> u32 {
        match self {
            Baud::B700 => 700,
            Baud::B2400 => 2400,
        }
    }
}

/// Sample timing derived from a requested (baud, sample rate) pair.
///
/// The sample rate is adjusted so that one bit spans an even, integral number
/// of samples; the bit rate itself is never approximated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    baud: Baud,
    half_bit_samples: u32,
    sample_rate: u32,
}

impl Timing {
    pub fn derive(baud: Baud, requested_rate: u32) -> Result<Self> {
        if requested_rate < MIN_SAMPLE_RATE {
            return Err(CassetteError::SampleRateTooLow {
                rate: requested_rate,
                min: MIN_SAMPLE_RATE,
            });
        }

        let bps = baud.bits_per_second();
        let mut samples_per_bit = requested_rate.div_ceil(bps);
        if samples_per_bit % 2 == 1 {
            samples_per_bit += 1;
        }
        let half_bit_samples = samples_per_bit / 2;

        if !(1..=MAX_HALF_BIT_SAMPLES).contains(&half_bit_samples) {
            return Err(CassetteError::HalfBitOutOfRange {
                half_bit_samples,
                max: MAX_HALF_BIT_SAMPLES,
            });
        }

        Ok(Self {
            baud,
            half_bit_samples,
            sample_rate: samples_per_bit * bps,
        })
    }

    pub fn baud(&self) -> Baud {
        self.baud
    }

    pub fn half_bit_samples(&self) -> u32 {
        self.half_bit_samples
    }

    pub fn samples_per_bit(&self) -> u32 {
        self.half_bit_samples * 2
    }

    /// Actual output sample rate, always `2 * half_bit_samples * baud`.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
