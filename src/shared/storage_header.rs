use crc32fast::Hasher as Crc32Hasher;
use std::io::{Read, Write};

/// Fixed 20-byte header that prefixes every persisted session blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryHeader {
    pub magic: [u8; 8],
    pub version: u16,
    pub flags: u16,
    pub reserved: u32,
    pub header_crc32: u32,
}

impl BinaryHeader {
    pub const LEN_WITHOUT_CRC: usize = 8 + 2 + 2 + 4;
    pub const TOTAL_LEN: usize = Self::LEN_WITHOUT_CRC + 4;

    pub fn new(magic: [u8; 8], version: u16, flags: u16) -> Self {
        let mut header = Self {
            magic,
            version,
            flags,
            reserved: 0,
            header_crc32: 0,
        };
        header.header_crc32 = header.compute_crc32();
        header
    }

    /// Fields without the CRC, little-endian.
    fn body(&self) -> [u8; Self::LEN_WITHOUT_CRC] {
        let mut body = [0u8; Self::LEN_WITHOUT_CRC];
        body[0..8].copy_from_slice(&self.magic);
        body[8..10].copy_from_slice(&self.version.to_le_bytes());
        body[10..12].copy_from_slice(&self.flags.to_le_bytes());
        body[12..16].copy_from_slice(&self.reserved.to_le_bytes());
        body
    }

    fn compute_crc32(&self) -> u32 {
        let mut hasher = Crc32Hasher::new();
        hasher.update(&self.body());
        hasher.finalize()
    }

    pub fn to_bytes(&self) -> [u8; Self::TOTAL_LEN] {
        let mut raw = [0u8; Self::TOTAL_LEN];
        raw[..Self::LEN_WITHOUT_CRC].copy_from_slice(&self.body());
        raw[Self::LEN_WITHOUT_CRC..].copy_from_slice(&self.header_crc32.to_le_bytes());
        raw
    }

    pub fn write_to<W: Write>(&self, mut w: W) -> std::io::Result<()> {
        w.write_all(&self.to_bytes())
    }

    pub fn read_from<R: Read>(mut r: R) -> std::io::Result<Self> {
        let mut raw = [0u8; Self::TOTAL_LEN];
        r.read_exact(&mut raw)?;

        let le_u16 = |at: usize| u16::from_le_bytes([raw[at], raw[at + 1]]);
        let le_u32 = |at: usize| u32::from_le_bytes([raw[at], raw[at + 1], raw[at + 2], raw[at + 3]]);
        let mut magic = [0u8; 8];
        magic.copy_from_slice(&raw[0..8]);

        let hdr = Self {
            magic,
            version: le_u16(8),
            flags: le_u16(10),
            reserved: le_u32(12),
            header_crc32: le_u32(16),
        };
        if hdr.compute_crc32() != hdr.header_crc32 {
            return Err(invalid("header CRC mismatch"));
        }
        Ok(hdr)
    }
}

/// A blob kind identified by its magic and version.
pub trait MagicFile {
    const MAGIC: [u8; 8];
    const VERSION: u16 = 1;

    fn write_header<W: Write>(writer: &mut W) -> std::io::Result<()> {
        let header = BinaryHeader::new(Self::MAGIC, Self::VERSION, 0);
        header.write_to(writer)
    }

    fn read_and_validate_header<R: Read>(reader: &mut R) -> std::io::Result<BinaryHeader> {
        let header = BinaryHeader::read_from(reader)?;
        if header.magic != Self::MAGIC {
            return Err(invalid("invalid magic"));
        }
        if header.version != Self::VERSION {
            return Err(invalid("unsupported version"));
        }
        Ok(header)
    }

    /// Header followed by `payload`, in one buffer.
    fn frame(payload: &[u8]) -> std::io::Result<Vec<u8>> {
        let mut out = Vec::with_capacity(BinaryHeader::TOTAL_LEN + payload.len());
        Self::write_header(&mut out)?;
        out.extend_from_slice(payload);
        Ok(out)
    }

    /// Validates the header of `blob` and returns the payload after it.
    fn unframe(blob: &[u8]) -> std::io::Result<&[u8]> {
        if blob.len() < BinaryHeader::TOTAL_LEN {
            return Err(invalid("blob too small for header"));
        }
        let mut head = &blob[..BinaryHeader::TOTAL_LEN];
        Self::read_and_validate_header(&mut head)?;
        Ok(&blob[BinaryHeader::TOTAL_LEN..])
    }
}

pub enum BlobKind {
    PivotKeyMap,
}

impl BlobKind {
    pub const fn magic(&self) -> [u8; 8] {
        match self {
            BlobKind::PivotKeyMap => *b"PVTKMAP\0",
        }
    }
}

fn invalid(message: &'static str) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, message)
}
