use std::{
    fs, io,
    path::{Component, Path, PathBuf},
};

use chrono::{DateTime, Utc};

use crate::{
    error::Result,
    files::{FileRecord, FileSource},
};

/// Looks up files in a directory on disk.
///
/// Paths that would leave the root, and dot-prefixed entries, are reported as missing.
#[derive(Debug, Clone)]
pub struct PhysicalFileSource {
    root: PathBuf,
}

impl PhysicalFileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, subpath: &str) -> Option<PathBuf> {
        let mut resolved = self.root.clone();

        for component in Path::new(subpath.trim_start_matches(['/', '\\'])).components() {
            match component {
                Component::Normal(segment) => {
                    if segment.to_string_lossy().starts_with('.') {
                        return None;
                    }
                    resolved.push(segment);
                }
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }

        Some(resolved)
    }
}

impl FileSource for PhysicalFileSource {
    fn lookup(&self, subpath: &str) -> Result<FileRecord> {
        let Some(physical_path) = self.resolve(subpath) else {
            return Ok(FileRecord::missing(subpath));
        };

        let metadata = match fs::metadata(&physical_path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::PermissionDenied => return Err(err.into()),
            Err(_) => return Ok(FileRecord::missing(subpath)),
        };

        let name = physical_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| subpath.to_string());

        if metadata.is_dir() {
            return Ok(FileRecord::directory(name, physical_path));
        }

        let last_modified: DateTime<Utc> = metadata.modified()?.into();

        Ok(FileRecord::disk(
            name,
            physical_path,
            metadata.len(),
            last_modified,
        ))
    }
}
