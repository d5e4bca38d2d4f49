use crate::id::{AssetId, AssetType};
use crate::{PakError, PakResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Extension of the descriptor sidecar files
pub const DESCRIPTOR_EXTENSION: &str = "xasset";

/// Sidecar record pointing at the real source asset.
/// Stored as YAML:
/// ```yaml
/// asset:
///   id: 72057594037927937
///   source: texture.dds
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AssetDescriptor {
    pub id: AssetId,
    /// Path of the source file, relative to the descriptor's directory
    pub source: PathBuf,
}

#[derive(Serialize, Deserialize)]
struct DescriptorFile {
    asset: AssetDescriptor,
}

impl AssetDescriptor {
    pub fn asset_type(&self) -> AssetType {
        self.id.asset_type()
    }

    /// Reads and validates a sidecar file.
    /// The id must be nonzero and the source must exist next to the descriptor.
    pub fn from_file(path: &Path) -> PakResult<AssetDescriptor> {
        let content = std::fs::read_to_string(path)?;
        let descriptor = Self::parse(&content, path)?;

        let source = descriptor.resolve_source(path);
        if !source.is_file() {
            return Err(PakError::ParseError(
                path.to_path_buf(),
                format!("source file {} does not exist", source.display()),
            ));
        }

        Ok(descriptor)
    }

    /// Parses the sidecar content without touching the filesystem.
    /// `origin` is only used for error reporting.
    pub fn parse(content: &str, origin: &Path) -> PakResult<AssetDescriptor> {
        let parse_error = |message: String| PakError::ParseError(origin.to_path_buf(), message);

        let file: DescriptorFile =
            serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string()))?;
        let descriptor = file.asset;

        if descriptor.id.raw() == 0 {
            return Err(parse_error("asset id is zero".to_string()));
        }
        if descriptor.source.as_os_str().is_empty() {
            return Err(parse_error("asset source is empty".to_string()));
        }

        Ok(descriptor)
    }

    pub fn to_yaml(&self) -> PakResult<String> {
        serde_yaml::to_string(&DescriptorFile {
            asset: self.clone(),
        })
        .map_err(|e| PakError::FormatError(e.to_string()))
    }

    /// Absolute (or descriptor-relative) location of the source file
    pub fn resolve_source(&self, descriptor_path: &Path) -> PathBuf {
        match descriptor_path.parent() {
            Some(dir) => dir.join(&self.source),
            None => self.source.clone(),
        }
    }

    pub fn is_descriptor_file(path: &Path) -> bool {
        path.extension().and_then(|e| e.to_str()) == Some(DESCRIPTOR_EXTENSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_sidecar() {
        let content = "asset:\n  id: 72057594037927937\n  source: brick.dds\n";
        let descriptor = AssetDescriptor::parse(content, Path::new("brick.dds.xasset")).unwrap();
        assert_eq!(descriptor.id.raw(), 72057594037927937);
        assert_eq!(descriptor.asset_type(), AssetType::Texture);
        assert_eq!(descriptor.source, PathBuf::from("brick.dds"));
    }

    #[test]
    fn test_zero_id_is_rejected() {
        let content = "asset:\n  id: 0\n  source: brick.dds\n";
        assert!(matches!(
            AssetDescriptor::parse(content, Path::new("x.xasset")),
            Err(PakError::ParseError(_, _))
        ));
    }

    #[test]
    fn test_empty_source_is_rejected() {
        let content = "asset:\n  id: 5\n  source: ''\n";
        assert!(matches!(
            AssetDescriptor::parse(content, Path::new("x.xasset")),
            Err(PakError::ParseError(_, _))
        ));
    }

    #[test]
    fn test_malformed_yaml_is_rejected() {
        let content = "<Asset id=\"5\"><Source>brick.dds</Source></Asset>";
        assert!(matches!(
            AssetDescriptor::parse(content, Path::new("x.xasset")),
            Err(PakError::ParseError(_, _))
        ));
    }

    #[test]
    fn test_missing_source_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ghost.wav.xasset");
        std::fs::write(&path, "asset:\n  id: 216172782113783808\n  source: ghost.wav\n").unwrap();
        assert!(matches!(
            AssetDescriptor::from_file(&path),
            Err(PakError::ParseError(_, _))
        ));

        std::fs::write(dir.path().join("ghost.wav"), b"RIFF").unwrap();
        let descriptor = AssetDescriptor::from_file(&path).unwrap();
        assert_eq!(descriptor.asset_type(), AssetType::Audio);
    }

    #[test]
    fn test_yaml_round_trip() {
        let descriptor = AssetDescriptor {
            id: AssetId::new(AssetType::Scene, 1234),
            source: PathBuf::from("levels/intro.scene"),
        };
        let yaml = descriptor.to_yaml().unwrap();
        let parsed = AssetDescriptor::parse(&yaml, Path::new("intro.xasset")).unwrap();
        assert_eq!(parsed, descriptor);
    }
}
