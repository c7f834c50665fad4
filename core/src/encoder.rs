use crate::container::{write_header, AudioSpec, ContainerKind};
use crate::error::{CassetteError, Result};
use crate::framing::{data_block_count, BlockFramer, BLOCK_WIRE_BYTES, DATA_BLOCK_PAYLOAD, MAX_DATA_BLOCKS};
use crate::lines::{convert_line_endings, LineConverter};
use crate::modulator::BiphaseModulator;
use crate::name::CassetteName;
use crate::sample::{SampleLevel, SampleWidth};
use crate::timing::{Baud, Timing};
use crate::{DEFAULT_SAMPLE_RATE, HIGH_LEVEL, LOW_LEVEL};
use log::{debug, info};
use std::borrow::Cow;
use std::io::{ErrorKind, Read, Write};

/// Validated encoder settings, fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderConfig {
    pub baud: Baud,
    /// Requested sample rate; the actual rate comes from [`Timing`]
    pub sample_rate: u32,
    pub width: SampleWidth,
    pub container: ContainerKind,
    /// Translate `\n` to `\r` before framing
    pub convert_lines: bool,
    /// Never buffer the input, even when the container could declare a length
    pub streaming: bool,
}

impl EncoderConfig {
    pub fn new(baud: u32, sample_rate: u32, bits: u16, container: ContainerKind) -> Result<Self> {
        let config = Self {
            baud: Baud::from_u32(baud)?,
            sample_rate,
            width: SampleWidth::from_bits(bits)?,
            container,
            convert_lines: false,
            streaming: false,
        };
        // Surface rate errors here rather than at encoder construction
        Timing::derive(config.baud, sample_rate)?;
        Ok(config)
    }

    pub fn with_line_conversion(mut self, convert: bool) -> Self {
        self.convert_lines = convert;
        self
    }

    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    /// Whether the whole input is read up front so the header can carry
    /// the exact length. Only WAV headers declare a length.
    pub fn buffered(&self) -> bool {
        self.container == ContainerKind::Wav && !self.streaming
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            baud: Baud::B700,
            sample_rate: DEFAULT_SAMPLE_RATE,
            width: SampleWidth::Width16,
            container: ContainerKind::Wav,
            convert_lines: false,
            streaming: false,
        }
    }
}

/// Sizes of a transmission for an input of known length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransmissionPlan {
    pub input_bytes: usize,
    pub data_blocks: usize,
    /// Data blocks plus the name block
    pub total_blocks: usize,
    pub frames: u64,
    pub data_bytes: u64,
    /// Header plus sample data
    pub file_bytes: u64,
}

/// What a finished run actually wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransmissionSummary {
    pub input_bytes: u64,
    pub data_blocks: usize,
    pub frames: u64,
    pub bytes_written: u64,
    /// The header declared the exact length up front
    pub length_declared: bool,
}

/// Encodes a file as ABC80 cassette audio.
///
/// Each run builds a fresh modulator, so one encoder can be reused for any
/// number of files.
pub struct CassetteEncoder {
    config: EncoderConfig,
    timing: Timing,
    spec: AudioSpec,
    low: SampleLevel,
    high: SampleLevel,
}

impl CassetteEncoder {
    pub fn new(config: EncoderConfig) -> Result<Self> {
        let timing = Timing::derive(config.baud, config.sample_rate)?;
        let encoding = config.container.sample_encoding();
        let low = SampleLevel::quantize(LOW_LEVEL, config.width, encoding);
        let high = SampleLevel::quantize(HIGH_LEVEL, config.width, encoding);

        debug!(
            "baud={}, rate'={}, rate={}, bitsz={}, hbitsz={}",
            timing.baud().bits_per_second(),
            config.sample_rate,
            timing.sample_rate(),
            timing.samples_per_bit(),
            timing.half_bit_samples()
        );
        debug!(
            "format={} bits={} low={:02x?} high={:02x?}",
            config.container.name(),
            config.width.bits(),
            low.as_bytes(),
            high.as_bytes()
        );

        Ok(Self {
            config,
            timing,
            spec: AudioSpec::mono(timing.sample_rate(), config.width),
            low,
            high,
        })
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub fn audio_spec(&self) -> &AudioSpec {
        &self.spec
    }

    pub fn frames_per_block(&self) -> u64 {
        BLOCK_WIRE_BYTES as u64 * 8 * self.timing.samples_per_bit() as u64
    }

    /// Sizes for `input_bytes` of (already converted) input.
    pub fn plan(&self, input_bytes: usize) -> TransmissionPlan {
        let data_blocks = data_block_count(input_bytes);
        let total_blocks = data_blocks + 1;
        let frames = total_blocks as u64 * self.frames_per_block();
        let data_bytes = self.spec.data_bytes(frames);

        TransmissionPlan {
            input_bytes,
            data_blocks,
            total_blocks,
            frames,
            data_bytes,
            file_bytes: self.config.container.header_size() as u64 + data_bytes,
        }
    }

    fn framer<W: Write>(&self, out: W) -> BlockFramer<W> {
        let modulator = BiphaseModulator::new(self.timing.half_bit_samples(), self.low, self.high);
        BlockFramer::new(modulator, out)
    }

    fn summary<W: Write>(&self, framer: &BlockFramer<W>, input_bytes: u64, length_declared: bool) -> TransmissionSummary {
        let frames = framer.modulator().frames_written();
        TransmissionSummary {
            input_bytes,
            data_blocks: framer.data_blocks_sent(),
            frames,
            bytes_written: self.config.container.header_size() as u64 + self.spec.data_bytes(frames),
            length_declared,
        }
    }

    /// Encode a complete input held in memory.
    ///
    /// WAV output gets the exact length in its header; the other containers
    /// get the unknown-length marker.
    pub fn encode_buffered<W: Write>(&self, name: &CassetteName, data: &[u8], out: W) -> Result<TransmissionSummary> {
        let data: Cow<[u8]> = if self.config.convert_lines {
            Cow::Owned(convert_line_endings(data))
        } else {
            Cow::Borrowed(data)
        };

        let plan = self.plan(data.len());
        debug!(
            "Size:{} Blk:{} Byte:{} Samp:{}",
            plan.input_bytes, plan.total_blocks, plan.data_bytes, plan.frames
        );
        if plan.data_blocks > MAX_DATA_BLOCKS {
            return Err(CassetteError::TooManyBlocks(MAX_DATA_BLOCKS));
        }

        let length_declared = self.config.container == ContainerKind::Wav;
        let declared = length_declared.then_some(plan.frames);

        let mut framer = self.framer(out);
        write_header(framer.get_mut(), self.config.container, &self.spec, declared)?;
        framer.transmit_name_block(name)?;
        framer.transmit_data_blocks(&data)?;
        framer.flush()?;

        let actual = framer.modulator().frames_written();
        if actual != plan.frames {
            return Err(CassetteError::LengthMismatch {
                expected: plan.frames,
                actual,
            });
        }

        let summary = self.summary(&framer, data.len() as u64, length_declared);
        info!(
            "{}: {} bytes in {} data blocks, {} frames",
            name, summary.input_bytes, summary.data_blocks, summary.frames
        );
        Ok(summary)
    }

    /// Encode while reading, one block at a time. The header always carries
    /// the unknown-length marker.
    pub fn encode_streaming<R: Read, W: Write>(
        &self,
        name: &CassetteName,
        mut input: R,
        out: W,
    ) -> Result<TransmissionSummary> {
        let mut framer = self.framer(out);
        write_header(framer.get_mut(), self.config.container, &self.spec, None)?;
        framer.transmit_name_block(name)?;

        let mut converter = self.config.convert_lines.then(LineConverter::new);
        let mut pending = Vec::with_capacity(2 * DATA_BLOCK_PAYLOAD);
        let mut buf = [0u8; DATA_BLOCK_PAYLOAD];
        let mut input_bytes = 0u64;

        loop {
            let n = match input.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            match converter.as_mut() {
                Some(conv) => conv.convert_into(&buf[..n], &mut pending),
                None => pending.extend_from_slice(&buf[..n]),
            }

            while pending.len() >= DATA_BLOCK_PAYLOAD {
                framer.transmit_data_block(&pending[..DATA_BLOCK_PAYLOAD])?;
                pending.drain(..DATA_BLOCK_PAYLOAD);
                input_bytes += DATA_BLOCK_PAYLOAD as u64;
            }
        }
        if !pending.is_empty() {
            framer.transmit_data_block(&pending)?;
            input_bytes += pending.len() as u64;
        }
        framer.flush()?;

        let summary = self.summary(&framer, input_bytes, false);
        info!(
            "{}: {} bytes in {} data blocks, {} frames (streamed)",
            name, summary.input_bytes, summary.data_blocks, summary.frames
        );
        Ok(summary)
    }

    /// Encode `input`, buffering it when the configuration allows a declared
    /// length and streaming it otherwise.
    pub fn encode<R: Read, W: Write>(&self, name: &CassetteName, mut input: R, out: W) -> Result<TransmissionSummary> {
        if self.config.buffered() {
            let mut data = Vec::new();
            input.read_to_end(&mut data)?;
            debug!("input filelen = {}", data.len());
            self.encode_buffered(name, &data, out)
        } else {
            self.encode_streaming(name, input, out)
        }
    }

    /// Encode an in-memory input into a new buffer.
    pub fn encode_to_vec(&self, name: &CassetteName, data: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.encode(name, data, &mut out)?;
        Ok(out)
    }
}
