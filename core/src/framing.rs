use crate::error::{CassetteError, Result};
use crate::modulator::BiphaseModulator;
use crate::name::{CassetteName, EXT_LEN, NAME_LEN};
use log::trace;
use std::io::Write;

pub const LEADER_BYTES: usize = 32;
pub const SYNC: u8 = 0x16;
pub const SYNC_BYTES: usize = 3;
pub const STX: u8 = 0x02;
pub const ETX: u8 = 0x03;

pub const BLOCK_SIZE: usize = 256;
pub const DATA_BLOCK_HEADER: usize = 3; // pad (1) + block counter (2)
pub const DATA_BLOCK_PAYLOAD: usize = BLOCK_SIZE - DATA_BLOCK_HEADER; // 253

/// Bytes on tape per block: leader + sync + STX + block + ETX + checksum
pub const BLOCK_WIRE_BYTES: usize = LEADER_BYTES + SYNC_BYTES + 1 + BLOCK_SIZE + 1 + 2; // 295

/// The block counter is 16 bits wide
pub const MAX_DATA_BLOCKS: usize = u16::MAX as usize + 1;

/// Plain 16-bit additive checksum
pub fn checksum16(data: &[u8]) -> u16 {
    data.iter().fold(0u16, |acc, &b| acc.wrapping_add(b as u16))
}

/// Number of data blocks needed for `len` payload bytes
pub fn data_block_count(len: usize) -> usize {
    len.div_ceil(DATA_BLOCK_PAYLOAD)
}

/// A complete 256-byte block payload, name or data.
#[derive(Clone, PartialEq, Eq)]
pub struct Block([u8; BLOCK_SIZE]);

impl Block {
    /// `FF FF FF`, 8-byte name, 3-byte extension, zeros.
    pub fn name_block(name: &CassetteName) -> Self {
        let mut buf = [0u8; BLOCK_SIZE];
        buf[..3].fill(0xFF);
        buf[3..3 + NAME_LEN].copy_from_slice(name.name());
        buf[3 + NAME_LEN..3 + NAME_LEN + EXT_LEN].copy_from_slice(name.ext());
        Block(buf)
    }

    /// Zero pad byte, little-endian counter, up to 253 bytes of data.
    /// A short chunk is zero-filled; anything past 253 bytes is ignored.
    pub fn data_block(counter: u16, chunk: &[u8]) -> Self {
        let mut buf = [0u8; BLOCK_SIZE];
        buf[1..3].copy_from_slice(&counter.to_le_bytes());
        let len = chunk.len().min(DATA_BLOCK_PAYLOAD);
        buf[DATA_BLOCK_HEADER..DATA_BLOCK_HEADER + len].copy_from_slice(&chunk[..len]);
        Block(buf)
    }

    pub fn as_bytes(&self) -> &[u8; BLOCK_SIZE] {
        &self.0
    }

    /// Checksum sent after the block. It covers the 256 block bytes and the
    /// trailing ETX as well, as the ABC loader expects.
    pub fn checksum(&self) -> u16 {
        checksum16(&self.0).wrapping_add(ETX as u16)
    }
}

impl std::fmt::Debug for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Block")
            .field("head", &&self.0[..16])
            .field("checksum", &self.checksum())
            .finish()
    }
}

/// Frames blocks onto the tape and drives the modulator byte by byte.
///
/// Owns the data block counter so blocks sent one at a time and blocks sent
/// from a whole buffer number identically.
pub struct BlockFramer<W: Write> {
    modulator: BiphaseModulator,
    out: W,
    next_counter: usize,
    blocks_sent: usize,
}

impl<W: Write> BlockFramer<W> {
    pub fn new(modulator: BiphaseModulator, out: W) -> Self {
        Self {
            modulator,
            out,
            next_counter: 0,
            blocks_sent: 0,
        }
    }

    pub fn modulator(&self) -> &BiphaseModulator {
        &self.modulator
    }

    /// Blocks of either kind sent so far
    pub fn blocks_sent(&self) -> usize {
        self.blocks_sent
    }

    pub fn data_blocks_sent(&self) -> usize {
        self.next_counter
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit_byte(&mut self, byte: u8) -> Result<()> {
        self.modulator.emit_byte(byte, &mut self.out)?;
        Ok(())
    }

    /// Leader, sync, STX, the block itself, ETX and checksum.
    pub fn transmit_block(&mut self, block: &Block) -> Result<()> {
        for _ in 0..LEADER_BYTES {
            self.emit_byte(0)?;
        }
        for _ in 0..SYNC_BYTES {
            self.emit_byte(SYNC)?;
        }
        self.emit_byte(STX)?;

        for &byte in block.as_bytes() {
            self.emit_byte(byte)?;
        }
        self.emit_byte(ETX)?;

        self.modulator.emit_u16_le(block.checksum(), &mut self.out)?;
        self.blocks_sent += 1;
        Ok(())
    }

    pub fn transmit_name_block(&mut self, name: &CassetteName) -> Result<()> {
        trace!("name block {}", name);
        self.transmit_block(&Block::name_block(name))
    }

    /// Send the next data block holding `chunk` (at most 253 bytes).
    pub fn transmit_data_block(&mut self, chunk: &[u8]) -> Result<()> {
        debug_assert!(chunk.len() <= DATA_BLOCK_PAYLOAD);
        if self.next_counter >= MAX_DATA_BLOCKS {
            return Err(CassetteError::TooManyBlocks(MAX_DATA_BLOCKS));
        }

        let block = Block::data_block(self.next_counter as u16, chunk);
        trace!("data block #{} len={}", self.next_counter, chunk.len());
        self.transmit_block(&block)?;
        self.next_counter += 1;
        Ok(())
    }

    /// Split `data` into 253-byte blocks and send them all.
    pub fn transmit_data_blocks(&mut self, data: &[u8]) -> Result<usize> {
        if self.next_counter + data_block_count(data.len()) > MAX_DATA_BLOCKS {
            return Err(CassetteError::TooManyBlocks(MAX_DATA_BLOCKS));
        }

        let mut sent = 0;
        for chunk in data.chunks(DATA_BLOCK_PAYLOAD) {
            self.transmit_data_block(chunk)?;
            sent += 1;
        }
        Ok(sent)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
