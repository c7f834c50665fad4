use thiserror::Error;

#[derive(Debug, Error)]
pub enum CassetteError {
    #[error("Invalid baud rate {0} (expected 700 or 2400)")]
    InvalidBaud(u32),

    #[error("Sample rate {rate} Hz is below the minimum of {min} Hz")]
    SampleRateTooLow { rate: u32, min: u32 },

    #[error("Invalid bits per sample {0} (expected 8, 16, 24 or 32)")]
    InvalidBitDepth(u16),

    #[error("Rate / baud out of range: {half_bit_samples} samples per half bit (allowed 1..={max})")]
    HalfBitOutOfRange { half_bit_samples: u32, max: u32 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Output of {0} bytes does not fit a 32-bit container length field")]
    OutputTooLarge(u64),

    #[error("Input needs more than {0} data blocks")]
    TooManyBlocks(usize),

    #[error("Declared {expected} frames but wrote {actual}")]
    LengthMismatch { expected: u64, actual: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CassetteError {
    /// Configuration errors are raised before any output byte is written.
    pub fn is_config(&self) -> bool {
        !matches!(
            self,
            CassetteError::Io(_) | CassetteError::LengthMismatch { .. } | CassetteError::TooManyBlocks(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CassetteError>;
