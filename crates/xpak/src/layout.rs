use crate::id::AssetId;
use crate::{PakError, PakResult};
use bitflags::bitflags;
use std::io::{Read, Write};

pub const PAK_MAGIC: &[u8; 4] = b"XPAK";
pub const BLOCK_MAGIC: &[u8; 4] = b"ASET";
pub const CURRENT_VERSION: u16 = 1;

pub const HEADER_SIZE: usize = 32;
pub const TABLE_ENTRY_SIZE: usize = 64;
pub const BLOCK_HEADER_SIZE: usize = BLOCK_MAGIC.len();
pub const BLOCK_ALIGNMENT: u64 = 64;

const HEADER_RESERVED: usize = 16;
// asset id + flags + offset + compressed size + size
const TABLE_ENTRY_FIELDS: usize = 8 + 2 + 8 + 8 + 8;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AssetFlags: u16 {
        const COMPRESSED = 1 << 0;
        /// Reserved, never set by the writer
        const ENCRYPTED  = 1 << 1;
        const STREAMABLE = 1 << 2;
        /// Textual descriptor formats (materials, scenes)
        const DESCRIPTOR = 1 << 3;
    }
}

/// Rounds `value` up to the next multiple of `alignment`
pub fn align_up(value: u64, alignment: u64) -> u64 {
    value.div_ceil(alignment) * alignment
}

/// Offset of the block following one that starts at `current` and spans `block_len` bytes
pub fn next_aligned_offset(current: u64, block_len: u64, alignment: u64) -> u64 {
    align_up(current + block_len, alignment)
}

/// Offset of the first asset block in an archive with `entries` table records
pub fn data_start(entries: u64) -> u64 {
    align_up(
        HEADER_SIZE as u64 + entries * TABLE_ENTRY_SIZE as u64,
        BLOCK_ALIGNMENT,
    )
}

fn read_array<const N: usize>(r: &mut impl Read) -> PakResult<[u8; N]> {
    let mut buf = [0u8; N];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

fn read_u16(r: &mut impl Read) -> PakResult<u16> {
    Ok(u16::from_le_bytes(read_array::<2>(r)?))
}

fn read_u64(r: &mut impl Read) -> PakResult<u64> {
    Ok(u64::from_le_bytes(read_array::<8>(r)?))
}

fn truncated(what: &str, expected: usize, got: usize) -> PakError {
    PakError::FormatError(format!(
        "truncated {}: expected {} bytes, got {}",
        what, expected, got
    ))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u16,
    pub flags: u16,
    pub entries: u64,
}

impl Header {
    pub fn new(entries: u64) -> Self {
        Header {
            version: CURRENT_VERSION,
            flags: 0,
            entries,
        }
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> PakResult<()> {
        writer.write_all(PAK_MAGIC)?;
        writer.write_all(&self.version.to_le_bytes())?;
        writer.write_all(&self.flags.to_le_bytes())?;
        writer.write_all(&self.entries.to_le_bytes())?;
        writer.write_all(&[0u8; HEADER_RESERVED])?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(HEADER_SIZE);
        data.extend_from_slice(PAK_MAGIC);
        data.extend_from_slice(&self.version.to_le_bytes());
        data.extend_from_slice(&self.flags.to_le_bytes());
        data.extend_from_slice(&self.entries.to_le_bytes());
        data.extend_from_slice(&[0u8; HEADER_RESERVED]);
        data
    }

    /// Parses the header from the first `HEADER_SIZE` bytes of `data`,
    /// validating the magic and the version.
    pub fn from_bytes(data: &[u8]) -> PakResult<Header> {
        if data.len() < HEADER_SIZE {
            return Err(truncated("header", HEADER_SIZE, data.len()));
        }

        let mut r = &data[..HEADER_SIZE];
        let magic = read_array::<4>(&mut r)?;
        if &magic != PAK_MAGIC {
            return Err(PakError::FormatError(format!(
                "invalid magic {:?}",
                String::from_utf8_lossy(&magic)
            )));
        }

        let version = read_u16(&mut r)?;
        if version != CURRENT_VERSION {
            return Err(PakError::FormatError(format!(
                "unsupported version {} (expected {})",
                version, CURRENT_VERSION
            )));
        }

        // No header flags are defined yet, they are carried as-is
        let flags = read_u16(&mut r)?;
        let entries = read_u64(&mut r)?;

        Ok(Header {
            version,
            flags,
            entries,
        })
    }

    pub fn describe(&self) -> String {
        format!(
            "Magic: XPAK, Version: {}, Flags: {}, Entries: {}",
            self.version, self.flags, self.entries
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableEntry {
    pub asset_id: AssetId,
    pub flags: AssetFlags,
    pub offset: u64,
    pub compressed_size: u64,
    pub size: u64,
}

impl TableEntry {
    pub fn to_bytes(&self) -> [u8; TABLE_ENTRY_SIZE] {
        let mut data = [0u8; TABLE_ENTRY_SIZE];
        data[0..8].copy_from_slice(&self.asset_id.raw().to_le_bytes());
        data[8..10].copy_from_slice(&self.flags.bits().to_le_bytes());
        data[10..18].copy_from_slice(&self.offset.to_le_bytes());
        data[18..26].copy_from_slice(&self.compressed_size.to_le_bytes());
        data[26..34].copy_from_slice(&self.size.to_le_bytes());
        // Padding after the fields stays zeroed
        data
    }

    pub fn from_bytes(data: &[u8]) -> PakResult<TableEntry> {
        if data.len() < TABLE_ENTRY_SIZE {
            return Err(truncated("table entry", TABLE_ENTRY_SIZE, data.len()));
        }

        let mut r = &data[..TABLE_ENTRY_FIELDS];
        let asset_id = AssetId::from_raw(read_u64(&mut r)?);
        // Unknown flag bits are preserved so a round trip stays lossless
        let flags = AssetFlags::from_bits_retain(read_u16(&mut r)?);
        let offset = read_u64(&mut r)?;
        let compressed_size = read_u64(&mut r)?;
        let size = read_u64(&mut r)?;

        Ok(TableEntry {
            asset_id,
            flags,
            offset,
            compressed_size,
            size,
        })
    }

    pub fn is_compressed(&self) -> bool {
        self.flags.contains(AssetFlags::COMPRESSED)
    }

    pub fn describe(&self) -> String {
        format!(
            "id={} type={} flags={:?} offset={} compressed={} size={}",
            self.asset_id,
            self.asset_id.asset_type(),
            self.flags,
            self.offset,
            self.compressed_size,
            self.size
        )
    }
}

/// Encoded asset payload as it is laid out in the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetBlock {
    pub payload: Vec<u8>,
    pub padding: usize,
}

impl AssetBlock {
    pub fn new(payload: Vec<u8>) -> Self {
        AssetBlock {
            payload,
            padding: 0,
        }
    }

    /// Magic plus payload, without padding
    pub fn content_len(&self) -> u64 {
        (BLOCK_HEADER_SIZE + self.payload.len()) as u64
    }

    pub fn total_len(&self) -> u64 {
        self.content_len() + self.padding as u64
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> PakResult<()> {
        writer.write_all(BLOCK_MAGIC)?;
        writer.write_all(&self.payload)?;
        writer.write_all(&vec![0u8; self.padding])?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.total_len() as usize);
        data.extend_from_slice(BLOCK_MAGIC);
        data.extend_from_slice(&self.payload);
        data.resize(data.len() + self.padding, 0);
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::AssetType;

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0, 64), 0);
        assert_eq!(align_up(1, 64), 64);
        assert_eq!(align_up(64, 64), 64);
        assert_eq!(align_up(65, 64), 128);
    }

    #[test]
    fn test_next_aligned_offset() {
        // 4 + 1024 bytes round up to 1088
        assert_eq!(next_aligned_offset(128, 4 + 1024, 64), 128 + 1088);
        assert_eq!(next_aligned_offset(128, 4 + 60, 64), 192);
        assert_eq!(next_aligned_offset(128, 4, 64), 192);
        assert_eq!(next_aligned_offset(0, 0, 64), 0);
    }

    #[test]
    fn test_data_start_is_aligned() {
        assert_eq!(data_start(0), 64);
        assert_eq!(data_start(1), 128);
        assert_eq!(data_start(2), 192);
        for entries in 0..32 {
            assert_eq!(data_start(entries) % BLOCK_ALIGNMENT, 0);
            assert!(data_start(entries) >= HEADER_SIZE as u64 + entries * TABLE_ENTRY_SIZE as u64);
        }
    }

    #[test]
    fn test_header_layout() {
        let header = Header::new(3);
        let bytes = header.to_bytes();
        assert_eq!(bytes.len(), HEADER_SIZE);
        assert_eq!(&bytes[0..4], b"XPAK");
        assert_eq!(&bytes[4..6], &1u16.to_le_bytes());
        assert_eq!(&bytes[8..16], &3u64.to_le_bytes());
        assert!(bytes[16..].iter().all(|b| *b == 0));
        assert_eq!(Header::from_bytes(&bytes).unwrap(), header);

        let mut written = Vec::new();
        header.write(&mut written).unwrap();
        assert_eq!(written, bytes);
    }

    #[test]
    fn test_header_rejects_bad_magic() {
        let mut bytes = Header::new(0).to_bytes();
        bytes[0] = b'Y';
        assert!(matches!(
            Header::from_bytes(&bytes),
            Err(PakError::FormatError(_))
        ));
    }

    #[test]
    fn test_header_rejects_other_version() {
        let mut bytes = Header::new(0).to_bytes();
        bytes[4..6].copy_from_slice(&2u16.to_le_bytes());
        assert!(matches!(
            Header::from_bytes(&bytes),
            Err(PakError::FormatError(_))
        ));
    }

    #[test]
    fn test_header_rejects_truncated_input() {
        let bytes = Header::new(0).to_bytes();
        assert!(matches!(
            Header::from_bytes(&bytes[..HEADER_SIZE - 1]),
            Err(PakError::FormatError(_))
        ));
    }

    #[test]
    fn test_table_entry_layout() {
        let entry = TableEntry {
            asset_id: AssetId::new(AssetType::Material, 0xBEEF),
            flags: AssetFlags::COMPRESSED | AssetFlags::DESCRIPTOR,
            offset: 192,
            compressed_size: 77,
            size: 300,
        };
        let bytes = entry.to_bytes();
        assert_eq!(&bytes[0..8], &entry.asset_id.raw().to_le_bytes());
        assert_eq!(&bytes[8..10], &9u16.to_le_bytes());
        assert_eq!(&bytes[10..18], &192u64.to_le_bytes());
        assert_eq!(&bytes[18..26], &77u64.to_le_bytes());
        assert_eq!(&bytes[26..34], &300u64.to_le_bytes());
        assert_eq!(TABLE_ENTRY_SIZE - TABLE_ENTRY_FIELDS, 30);
        assert!(bytes[34..].iter().all(|b| *b == 0));
        assert_eq!(TableEntry::from_bytes(&bytes).unwrap(), entry);
        assert!(TableEntry::from_bytes(&bytes[..40]).is_err());
    }

    #[test]
    fn test_block_bytes() {
        let block = AssetBlock {
            payload: vec![1, 2, 3],
            padding: 57,
        };
        let bytes = block.to_bytes();
        assert_eq!(bytes.len(), 64);
        assert_eq!(&bytes[0..4], b"ASET");
        assert_eq!(&bytes[4..7], &[1, 2, 3]);
        assert!(bytes[7..].iter().all(|b| *b == 0));

        let mut written = Vec::new();
        block.write(&mut written).unwrap();
        assert_eq!(written, bytes);
    }
}
