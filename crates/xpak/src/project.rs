use crate::config::ReadMode;
use crate::{PakError, PakResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Game project file (`.xproj`):
/// ```yaml
/// project:
///   name: SpaceGame
///   engineVersion: 1.0
///   contentDirectory: Content
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDescriptor {
    pub name: String,
    pub engine_version: f32,
    /// Resolved against the project file's directory
    pub content_directory: PathBuf,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectNode {
    name: String,
    #[serde(default)]
    engine_version: f32,
    content_directory: PathBuf,
}

#[derive(Deserialize)]
struct ProjectFile {
    project: ProjectNode,
}

impl ProjectDescriptor {
    pub fn from_file(path: &Path) -> PakResult<ProjectDescriptor> {
        let content = std::fs::read_to_string(path)?;
        let file: ProjectFile = serde_yaml::from_str(&content)
            .map_err(|e| PakError::ParseError(path.to_path_buf(), e.to_string()))?;

        if file.project.name.trim().is_empty() {
            return Err(PakError::ParseError(
                path.to_path_buf(),
                "project name is empty".to_string(),
            ));
        }

        let project_dir = path.parent().unwrap_or(Path::new("."));
        Ok(ProjectDescriptor {
            name: file.project.name,
            engine_version: file.project.engine_version,
            content_directory: project_dir.join(file.project.content_directory),
        })
    }

    /// Directories to feed to the builder, in a stable order.
    /// The content directory always comes first.
    pub fn asset_directories(&self, read_mode: ReadMode) -> PakResult<Vec<PathBuf>> {
        let mut directories = vec![self.content_directory.clone()];
        if read_mode == ReadMode::Recursive {
            let walker = walkdir::WalkDir::new(&self.content_directory)
                .min_depth(1)
                .sort_by_file_name();
            for entry in walker {
                let entry = entry.map_err(std::io::Error::from)?;
                if entry.file_type().is_dir() {
                    directories.push(entry.into_path());
                }
            }
        }

        Ok(directories)
    }
}
