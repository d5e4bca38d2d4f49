use std::path::PathBuf;
use thiserror::Error;

pub mod compression_backend;
pub mod config;
pub mod descriptor;
pub mod generator;
pub mod id;
pub mod layout;
pub mod project;
pub mod reader;
pub mod script;
pub mod writer;

pub use config::{CompressionLevel, PackConfig, ReadMode};
pub use descriptor::AssetDescriptor;
pub use id::{AssetId, AssetType, IdGenerator};
pub use layout::{AssetBlock, AssetFlags, Header, TableEntry};
pub use reader::{
    fetch_asset_data, from_bytes, read_asset, read_index, read_pak_index, read_pak_table,
    table_from_bytes, AssetTable,
};
pub use writer::{PakArchive, PakBuilder};

// XPAK file format:
// - Header (32 bytes):
//   - 4 bytes: "XPAK" magic
//   - 2 bytes: version (u16 little-endian)
//   - 2 bytes: flags (u16 little-endian, unused)
//   - 8 bytes: entry count (u64 little-endian)
//   - 16 bytes: reserved, zeroed
// - Table of contents, entry count records of 64 bytes each:
//   - 8 bytes: asset id
//   - 2 bytes: asset flags
//   - 8 bytes: block offset from the start of the file
//   - 8 bytes: stored payload size
//   - 8 bytes: original size
//   - 30 bytes: padding, zeroed
// - Zero padding up to the next 64-byte boundary
// - Asset blocks in table order, each starting at a 64-byte boundary:
//   - 4 bytes: "ASET" magic
//   - N bytes: payload (raw, brotli-compressed or script bytecode)
//   - padding up to the next 64-byte boundary

#[derive(Error, Debug)]
pub enum PakError {
    #[error("Input of {0} bytes is too large to be compressed")]
    InputTooLarge(usize),
    #[error("Failed to decode compressed stream: {0}")]
    DecodeError(String),
    #[error("Failed to compile script: {0}")]
    CompileError(String),
    #[error("Failed to parse {0}: {1}")]
    ParseError(PathBuf, String),
    #[error("Invalid archive format: {0}")]
    FormatError(String),
    #[error("Size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: u64, actual: u64 },
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),
}

pub type PakResult<T> = Result<T, PakError>;
