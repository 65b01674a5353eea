use std::{
    fs::File,
    io::{Cursor, Read},
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::{DateTime, Utc};

use crate::error::Result;

/// Where the content of a [`FileRecord`] comes from.
#[derive(Debug, Clone)]
pub enum FileBody {
    Missing,
    Directory {
        physical_path: PathBuf,
    },
    /// Verbatim pass-through of a file in the backing store.
    Disk {
        physical_path: PathBuf,
        length: u64,
        last_modified: DateTime<Utc>,
    },
    /// Content held in memory as UTF-8 text.
    ///
    /// `physical_path` is only kept when the text is identical to the backing file.
    Text {
        text: Arc<str>,
        physical_path: Option<PathBuf>,
        last_modified: DateTime<Utc>,
    },
}

/// The result of a file lookup.
#[derive(Debug, Clone)]
pub struct FileRecord {
    name: String,
    body: FileBody,
}

impl FileRecord {
    pub fn missing(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: FileBody::Missing,
        }
    }

    pub fn directory(name: impl Into<String>, physical_path: PathBuf) -> Self {
        Self {
            name: name.into(),
            body: FileBody::Directory { physical_path },
        }
    }

    pub fn disk(
        name: impl Into<String>,
        physical_path: PathBuf,
        length: u64,
        last_modified: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            body: FileBody::Disk {
                physical_path,
                length,
                last_modified,
            },
        }
    }

    pub fn text(
        name: impl Into<String>,
        text: impl Into<Arc<str>>,
        physical_path: Option<PathBuf>,
        last_modified: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            body: FileBody::Text {
                text: text.into(),
                physical_path,
                last_modified,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn body(&self) -> &FileBody {
        &self.body
    }

    pub fn exists(&self) -> bool {
        !matches!(self.body, FileBody::Missing)
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.body, FileBody::Directory { .. })
    }

    /// Byte count of the content as currently represented. Zero for missing files and directories.
    pub fn length(&self) -> u64 {
        match &self.body {
            FileBody::Missing | FileBody::Directory { .. } => 0,
            FileBody::Disk { length, .. } => *length,
            FileBody::Text { text, .. } => text.len() as u64,
        }
    }

    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        match &self.body {
            FileBody::Missing | FileBody::Directory { .. } => None,
            FileBody::Disk { last_modified, .. } | FileBody::Text { last_modified, .. } => {
                Some(*last_modified)
            }
        }
    }

    pub fn physical_path(&self) -> Option<&Path> {
        match &self.body {
            FileBody::Missing => None,
            FileBody::Directory { physical_path } | FileBody::Disk { physical_path, .. } => {
                Some(physical_path)
            }
            FileBody::Text { physical_path, .. } => physical_path.as_deref(),
        }
    }

    /// Opens a fresh reader over the content. Can be called any number of times.
    pub fn open(&self) -> Result<Box<dyn Read + Send>> {
        match &self.body {
            FileBody::Disk { physical_path, .. } => Ok(Box::new(File::open(physical_path)?)),
            FileBody::Text { text, .. } => Ok(Box::new(Cursor::new(TextBytes(text.clone())))),
            FileBody::Missing => Err(anyhow::anyhow!("File not found: {}", self.name).into()),
            FileBody::Directory { .. } => {
                Err(anyhow::anyhow!("Cannot read a directory: {}", self.name).into())
            }
        }
    }

    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        if let FileBody::Text { text, .. } = &self.body {
            return Ok(text.as_bytes().to_vec());
        }

        let mut bytes = Vec::with_capacity(self.length() as usize);
        self.open()?.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

/// Shares the text of a [`FileBody::Text`] with the readers opened over it.
struct TextBytes(Arc<str>);

impl AsRef<[u8]> for TextBytes {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}
