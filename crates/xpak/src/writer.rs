use crate::config::PackConfig;
use crate::descriptor::AssetDescriptor;
use crate::id::{AssetId, AssetType};
use crate::layout::{
    data_start, next_aligned_offset, AssetBlock, AssetFlags, Header, TableEntry, BLOCK_ALIGNMENT,
    HEADER_SIZE, TABLE_ENTRY_SIZE,
};
use crate::{compression_backend, script, PakError, PakResult};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use xpak_util::profile::Measure;

/// Built archive: header, table of contents and encoded blocks, in table order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PakArchive {
    header: Header,
    table: Vec<TableEntry>,
    blocks: Vec<AssetBlock>,
}

impl PakArchive {
    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn table(&self) -> &[TableEntry] {
        &self.table
    }

    pub fn blocks(&self) -> &[AssetBlock] {
        &self.blocks
    }

    /// Total archive size in bytes
    pub fn len(&self) -> u64 {
        match (self.table.last(), self.blocks.last()) {
            (Some(entry), Some(block)) => entry.offset + block.total_len(),
            _ => data_start(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> PakResult<()> {
        self.header.write(writer)?;
        for entry in &self.table {
            writer.write_all(&entry.to_bytes())?;
        }

        let table_end = (HEADER_SIZE + self.table.len() * TABLE_ENTRY_SIZE) as u64;
        let gap = data_start(self.header.entries) - table_end;
        writer.write_all(&vec![0u8; gap as usize])?;

        for block in &self.blocks {
            block.write(writer)?;
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.len() as usize);
        data.extend_from_slice(&self.header.to_bytes());
        for entry in &self.table {
            data.extend_from_slice(&entry.to_bytes());
        }
        data.resize(data_start(self.header.entries) as usize, 0);
        for block in &self.blocks {
            data.extend_from_slice(&block.to_bytes());
        }
        data
    }

    /// Writes the archive next to `path` and renames it into place,
    /// so readers never observe a partially written file.
    pub fn write_to_file(&self, path: &Path) -> PakResult<()> {
        let mut staging = path.as_os_str().to_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);

        let staged = File::create(&staging)
            .map_err(PakError::from)
            .and_then(|file| {
                let mut writer = BufWriter::new(file);
                self.write(&mut writer)?;
                writer.flush()?;
                Ok(())
            })
            .and_then(|_| std::fs::rename(&staging, path).map_err(PakError::from));
        if let Err(err) = staged {
            if let Err(cleanup) = std::fs::remove_file(&staging) {
                debug!("Could not remove {}: {}", staging.display(), cleanup);
            }
            return Err(err);
        }

        info!(
            "Written {} ({} assets, {} bytes)",
            path.display(),
            self.table.len(),
            self.len()
        );
        Ok(())
    }
}

struct PendingAsset {
    id: AssetId,
    flags: AssetFlags,
    size: u64,
    payload: Vec<u8>,
}

/// Collects descriptors from one or more directories and encodes their sources.
/// Scanning is not recursive: every directory has to be added explicitly.
pub struct PakBuilder {
    config: PackConfig,
    pending: Vec<PendingAsset>,
    ids: HashSet<AssetId>,
}

impl PakBuilder {
    pub fn new(config: PackConfig) -> Self {
        PakBuilder {
            config,
            pending: Vec::new(),
            ids: HashSet::new(),
        }
    }

    /// Encodes every `.xasset` descriptor found directly in `directory`,
    /// in file name order. Returns the number of assets added.
    pub fn add_directory(&mut self, directory: &Path) -> PakResult<usize> {
        let mut descriptors = Vec::new();
        for entry in std::fs::read_dir(directory)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_file() && AssetDescriptor::is_descriptor_file(&path) {
                descriptors.push(path);
            }
        }
        descriptors.sort();

        let mut added = 0;
        for path in descriptors {
            if self.add_descriptor(&path)? {
                added += 1;
            }
        }

        debug!("Added {} assets from {}", added, directory.display());
        Ok(added)
    }

    /// Encodes a single descriptor. Descriptors of invalid type are skipped
    /// and reported with `Ok(false)`.
    pub fn add_descriptor(&mut self, path: &Path) -> PakResult<bool> {
        let descriptor = AssetDescriptor::from_file(path)?;
        let asset_type = descriptor.asset_type();
        if asset_type == AssetType::Invalid {
            warn!(
                "Skipping {}: invalid asset type {}",
                path.display(),
                descriptor.id.type_code()
            );
            return Ok(false);
        }

        if !self.ids.insert(descriptor.id) {
            return Err(PakError::ParseError(
                path.to_path_buf(),
                format!("duplicate asset id {}", descriptor.id),
            ));
        }

        let source = descriptor.resolve_source(path);
        let _measure = Measure::new(format!("Encoded {} {}", asset_type, source.display()));
        let pending = self.encode(&descriptor, &source)?;
        debug!(
            "Asset {} ({}) from {}: {} -> {} bytes, flags {:?}",
            pending.id,
            asset_type,
            source.display(),
            pending.size,
            pending.payload.len(),
            pending.flags
        );

        self.pending.push(pending);
        Ok(true)
    }

    fn encode(&self, descriptor: &AssetDescriptor, source: &Path) -> PakResult<PendingAsset> {
        let asset_type = descriptor.asset_type();
        let (flags, size, payload) = match asset_type {
            // Streamed straight from disk
            AssetType::Texture | AssetType::Audio => {
                let data = std::fs::read(source)?;
                (AssetFlags::STREAMABLE, data.len() as u64, data)
            }
            AssetType::Script => {
                let text = std::fs::read_to_string(source)?;
                // Must not depend on where the content is packed from
                let chunk_name = descriptor.source.to_string_lossy();
                let bytecode = script::compile(&text, &chunk_name)?;
                (AssetFlags::empty(), bytecode.len() as u64, bytecode)
            }
            _ => {
                let data = std::fs::read(source)?;
                let (quality, window) = self.config.compression_level.params();
                let compressed = compression_backend::compress(&data, quality, window)?;

                let mut flags = AssetFlags::COMPRESSED;
                if matches!(asset_type, AssetType::Material | AssetType::Scene) {
                    flags |= AssetFlags::DESCRIPTOR;
                }
                (flags, data.len() as u64, compressed)
            }
        };

        Ok(PendingAsset {
            id: descriptor.id,
            flags,
            size,
            payload,
        })
    }

    /// Assigns 64-byte aligned offsets in a single forward pass and
    /// produces the archive.
    pub fn finish(self) -> PakArchive {
        let header = Header::new(self.pending.len() as u64);

        let mut table = Vec::with_capacity(self.pending.len());
        let mut blocks = Vec::with_capacity(self.pending.len());
        let mut offset = data_start(header.entries);
        for asset in self.pending {
            let mut block = AssetBlock::new(asset.payload);
            let next = next_aligned_offset(offset, block.content_len(), BLOCK_ALIGNMENT);
            block.padding = (next - offset - block.content_len()) as usize;

            table.push(TableEntry {
                asset_id: asset.id,
                flags: asset.flags,
                offset,
                compressed_size: block.payload.len() as u64,
                size: asset.size,
            });
            blocks.push(block);
            offset = next;
        }

        PakArchive {
            header,
            table,
            blocks,
        }
    }
}

/// Packs the descriptors of a single content directory.
/// Any descriptor, source or script failure aborts the whole run.
pub fn create(content_dir: &Path, config: PackConfig) -> PakResult<PakArchive> {
    let _measure = Measure::new(format!("Packed {}", content_dir.display()));
    let mut builder = PakBuilder::new(config);
    builder.add_directory(content_dir)?;
    let archive = builder.finish();
    info!("Processed {} assets", archive.table().len());
    Ok(archive)
}
