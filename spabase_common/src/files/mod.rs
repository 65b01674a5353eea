pub mod physical;
pub mod record;
pub mod rewriting;

pub use physical::PhysicalFileSource;
pub use record::{FileBody, FileRecord};
pub use rewriting::RewritingFileSource;

use crate::error::Result;

/// Looks up files relative to some root.
///
/// A missing file is not an error: it is returned as a record whose `exists()` is false.
pub trait FileSource: Send + Sync {
    fn lookup(&self, subpath: &str) -> Result<FileRecord>;
}

