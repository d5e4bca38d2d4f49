use crate::descriptor::{AssetDescriptor, DESCRIPTOR_EXTENSION};
use crate::id::{AssetType, IdGenerator};
use crate::{PakError, PakResult};
use log::info;
use rand::RngCore;
use std::path::{Component, Path, PathBuf};

/// Computes `target` relative to `base`. Both are made absolute first,
/// climbing out of `base` with `..` where the paths diverge.
pub fn relative_path(base: &Path, target: &Path) -> PakResult<PathBuf> {
    let base = std::path::absolute(base)?;
    let target = std::path::absolute(target)?;

    let base: Vec<Component> = base.components().collect();
    let target: Vec<Component> = target.components().collect();

    let common = base
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut result = PathBuf::new();
    for _ in common..base.len() {
        result.push("..");
    }
    for component in &target[common..] {
        result.push(component.as_os_str());
    }

    Ok(result)
}

/// Allocates a fresh id for `source_file` and writes `<file name>.xasset` into `output_dir`.
/// Every call allocates a new id, so repeated calls produce distinct descriptors.
pub fn generate_asset<R: RngCore>(
    ids: &mut IdGenerator<R>,
    source_file: &Path,
    asset_type: AssetType,
    output_dir: &Path,
) -> PakResult<PathBuf> {
    let file_name = source_file.file_name().ok_or_else(|| {
        PakError::ParseError(source_file.to_path_buf(), "path has no file name".to_string())
    })?;

    let descriptor = AssetDescriptor {
        id: ids.generate(asset_type),
        source: relative_path(output_dir, source_file)?,
    };

    let mut descriptor_name = file_name.to_os_string();
    descriptor_name.push(".");
    descriptor_name.push(DESCRIPTOR_EXTENSION);
    let descriptor_path = output_dir.join(descriptor_name);

    std::fs::write(&descriptor_path, descriptor.to_yaml()?)?;

    info!(
        "Generated {} asset {} for {}",
        asset_type,
        descriptor.id,
        descriptor.source.display()
    );

    Ok(descriptor_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_relative_path_same_dir() {
        let rel = relative_path(Path::new("/content"), Path::new("/content/brick.dds")).unwrap();
        assert_eq!(rel, PathBuf::from("brick.dds"));
    }

    #[test]
    fn test_relative_path_sibling_dir() {
        let rel = relative_path(
            Path::new("/project/descriptors"),
            Path::new("/project/content/audio/boom.wav"),
        )
        .unwrap();
        assert_eq!(rel, PathBuf::from("../content/audio/boom.wav"));
    }

    #[test]
    fn test_generated_descriptor_is_readable() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("brick.dds");
        std::fs::write(&source, vec![0u8; 16]).unwrap();

        let mut ids = IdGenerator::seeded(3);
        let path = generate_asset(&mut ids, &source, AssetType::Texture, dir.path()).unwrap();
        assert_eq!(path, dir.path().join("brick.dds.xasset"));

        let descriptor = AssetDescriptor::from_file(&path).unwrap();
        assert_eq!(descriptor.asset_type(), AssetType::Texture);
        assert_eq!(descriptor.source, PathBuf::from("brick.dds"));
        assert_eq!(descriptor.resolve_source(&path), source);
    }

    #[test]
    fn test_descriptor_in_other_directory() {
        let dir = tempdir().unwrap();
        let content = dir.path().join("content");
        let sidecars = dir.path().join("sidecars");
        std::fs::create_dir_all(&content).unwrap();
        std::fs::create_dir_all(&sidecars).unwrap();
        let source = content.join("intro.lua");
        std::fs::write(&source, "return 1").unwrap();

        let mut ids = IdGenerator::seeded(4);
        let path = generate_asset(&mut ids, &source, AssetType::Script, &sidecars).unwrap();
        let descriptor = AssetDescriptor::from_file(&path).unwrap();
        assert_eq!(descriptor.source, PathBuf::from("../content/intro.lua"));
    }

    #[test]
    fn test_repeated_generation_allocates_new_ids() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("hero.fbx");
        std::fs::write(&source, b"mesh").unwrap();

        let mut ids = IdGenerator::seeded(5);
        let path = generate_asset(&mut ids, &source, AssetType::Mesh, dir.path()).unwrap();
        let first = AssetDescriptor::from_file(&path).unwrap();
        let path = generate_asset(&mut ids, &source, AssetType::Mesh, dir.path()).unwrap();
        let second = AssetDescriptor::from_file(&path).unwrap();

        assert_ne!(first.id, second.id);
    }
}
