use crate::compression_backend::decompress;
use crate::id::AssetId;
use crate::layout::{
    Header, TableEntry, BLOCK_HEADER_SIZE, BLOCK_MAGIC, HEADER_SIZE, TABLE_ENTRY_SIZE,
};
use crate::{PakError, PakResult};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use xpak_util::profile::Measure;

/// Lookup table from asset id to its record in the archive
pub type AssetTable = HashMap<AssetId, TableEntry>;

fn table_len(header: &Header) -> PakResult<usize> {
    usize::try_from(header.entries)
        .ok()
        .and_then(|n| n.checked_mul(TABLE_ENTRY_SIZE))
        .ok_or_else(|| {
            PakError::FormatError(format!("entry count {} is out of range", header.entries))
        })
}

/// Reads exactly `len` bytes, growing the buffer only by what was actually read.
/// Fewer bytes than `len` is truncated input.
fn read_bounded<R: Read>(reader: &mut R, len: u64, what: &str) -> PakResult<Vec<u8>> {
    let mut data = Vec::new();
    reader.take(len).read_to_end(&mut data)?;
    if (data.len() as u64) < len {
        return Err(PakError::FormatError(format!(
            "truncated {}: expected {} bytes, got {}",
            what,
            len,
            data.len()
        )));
    }
    Ok(data)
}

fn parse_table(header: &Header, data: &[u8]) -> PakResult<Vec<TableEntry>> {
    data.chunks_exact(TABLE_ENTRY_SIZE)
        .take(header.entries as usize)
        .map(TableEntry::from_bytes)
        .collect()
}

/// Decodes the header and the table of contents from the beginning of `data`.
/// Block bytes do not need to be present.
pub fn from_bytes(data: &[u8]) -> PakResult<(Header, Vec<TableEntry>)> {
    let header = Header::from_bytes(data)?;
    let table_len = table_len(&header)?;

    let table = data
        .get(HEADER_SIZE..)
        .and_then(|rest| rest.get(..table_len))
        .ok_or_else(|| {
            PakError::FormatError(format!(
                "truncated table: {} entries need {} bytes, got {}",
                header.entries,
                table_len,
                data.len().saturating_sub(HEADER_SIZE)
            ))
        })?;

    Ok((header, parse_table(&header, table)?))
}

/// Reads the header and the table of contents from a stream,
/// leaving the reader positioned right after the table.
pub fn read_index<R: Read>(reader: &mut R) -> PakResult<(Header, Vec<TableEntry>)> {
    let mut header_bytes = [0u8; HEADER_SIZE];
    read_exact_or_truncated(reader, &mut header_bytes, "header")?;
    let header = Header::from_bytes(&header_bytes)?;

    let table = read_bounded(reader, table_len(&header)? as u64, "table")?;

    Ok((header, parse_table(&header, &table)?))
}

fn read_exact_or_truncated<R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> PakResult<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            PakError::FormatError(format!("truncated {}", what))
        } else {
            PakError::IOError(e)
        }
    })
}

/// Reads only the header and the table of contents of an archive file.
pub fn read_pak_index(path: &Path) -> PakResult<(Header, Vec<TableEntry>)> {
    let mut reader = BufReader::new(File::open(path)?);
    read_index(&mut reader)
}

/// Reads the table of contents of an archive file into an id lookup table.
pub fn read_pak_table(path: &Path) -> PakResult<AssetTable> {
    let (_, table) = read_pak_index(path)?;
    Ok(into_asset_table(table))
}

pub fn table_from_bytes(data: &[u8]) -> PakResult<AssetTable> {
    let (_, table) = from_bytes(data)?;
    Ok(into_asset_table(table))
}

fn into_asset_table(table: Vec<TableEntry>) -> AssetTable {
    table.into_iter().map(|e| (e.asset_id, e)).collect()
}

/// Reads one asset block by random access and returns its decoded bytes.
pub fn read_asset<R: Read + Seek>(reader: &mut R, entry: &TableEntry) -> PakResult<Vec<u8>> {
    reader.seek(SeekFrom::Start(entry.offset))?;

    let mut magic = [0u8; BLOCK_HEADER_SIZE];
    read_exact_or_truncated(reader, &mut magic, "asset block")?;
    if &magic != BLOCK_MAGIC {
        return Err(PakError::FormatError(format!(
            "no asset block at offset {} for asset {}",
            entry.offset, entry.asset_id
        )));
    }

    let stored = read_bounded(reader, entry.compressed_size, "asset payload")?;

    let data = if entry.is_compressed() {
        let expected = usize::try_from(entry.size).ok();
        decompress(&stored, expected)?
    } else {
        stored
    };

    if data.len() as u64 != entry.size {
        return Err(PakError::SizeMismatch {
            expected: entry.size,
            actual: data.len() as u64,
        });
    }

    Ok(data)
}

/// Opens the archive at `path` and fetches a single asset.
/// Only the block of that asset is read.
pub fn fetch_asset_data(path: &Path, entry: &TableEntry) -> PakResult<Vec<u8>> {
    let _measure = Measure::new(format!("Fetched asset {}", entry.asset_id));
    let mut file = File::open(path)?;
    read_asset(&mut file, entry)
}
