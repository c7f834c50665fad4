//! Fixed-width integer serialization with explicit byte order.
//!
//! Container headers mix conventions: WAV stores chunk ids big-endian and
//! every numeric field little-endian, AU stores everything big-endian.

use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// Build a chunk tag from its four ASCII characters, first character in the
/// most significant byte.
pub const fn tag(id: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*id)
}

pub fn write_u16<W: Write + ?Sized>(w: &mut W, value: u16, endian: Endian) -> io::Result<()> {
    match endian {
        Endian::Little => w.write_u16::<LittleEndian>(value),
        Endian::Big => w.write_u16::<BigEndian>(value),
    }
}

pub fn write_u32<W: Write + ?Sized>(w: &mut W, value: u32, endian: Endian) -> io::Result<()> {
    match endian {
        Endian::Little => w.write_u32::<LittleEndian>(value),
        Endian::Big => w.write_u32::<BigEndian>(value),
    }
}

/// Tags always go out in network order, whatever the host.
pub fn write_tag<W: Write + ?Sized>(w: &mut W, tag: u32) -> io::Result<()> {
    w.write_u32::<BigEndian>(tag)
}

pub fn read_u16<R: Read + ?Sized>(r: &mut R, endian: Endian) -> io::Result<u16> {
    match endian {
        Endian::Little => r.read_u16::<LittleEndian>(),
        Endian::Big => r.read_u16::<BigEndian>(),
    }
}

pub fn read_u32<R: Read + ?Sized>(r: &mut R, endian: Endian) -> io::Result<u32> {
    match endian {
        Endian::Little => r.read_u32::<LittleEndian>(),
        Endian::Big => r.read_u32::<BigEndian>(),
    }
}

pub fn read_tag<R: Read + ?Sized>(r: &mut R) -> io::Result<u32> {
    r.read_u32::<BigEndian>()
}
