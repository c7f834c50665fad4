//! ABC80 / ABC800 cassette tape audio encoder
//!
//! Turns a file into the bi-phase square wave the ABC loader reads with
//! `LOAD CAS:`, framed into 256-byte blocks and wrapped in WAV, AU or raw PCM.

pub mod byte_order;
pub mod container;
pub mod encoder;
pub mod error;
pub mod framing;
pub mod lines;
pub mod modulator;
pub mod name;
pub mod sample;
pub mod timing;

pub use container::{AudioSpec, ContainerKind};
pub use encoder::{CassetteEncoder, EncoderConfig, TransmissionPlan, TransmissionSummary};
pub use error::{CassetteError, Result};
pub use name::{CassetteName, FileKind};
pub use sample::SampleWidth;
pub use timing::{Baud, Timing};

// Timing configuration
pub const DEFAULT_BAUD: u32 = 700;
pub const DEFAULT_SAMPLE_RATE: u32 = 11200;
pub const MIN_SAMPLE_RATE: u32 = 1400;
pub const MAX_HALF_BIT_SAMPLES: u32 = 128;

// Output configuration
pub const DEFAULT_BITS: u16 = 16;
pub const NUM_CHANNELS: u16 = 1;

// Square wave levels as a fraction of full scale. The asymmetry is what the
// ABC cassette interface expects; do not center them.
pub const LOW_LEVEL: f64 = -0.504;
pub const HIGH_LEVEL: f64 = 0.678;
