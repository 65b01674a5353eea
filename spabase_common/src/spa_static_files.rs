use std::{path::PathBuf, sync::Arc};

use scorched::{logf, LogData, LogImportance};

use crate::{
    error::SetupError,
    files::{PhysicalFileSource, RewritingFileSource},
    options::RewriteOptions,
    request::RequestContextAccessor,
};

pub type SpaFileSource = RewritingFileSource<PhysicalFileSource>;

/// The rewriting file source for the built single-page application.
///
/// Holds no file source when the root directory does not exist, in which case nothing is
/// served from it.
pub struct SpaStaticFiles {
    file_source: Option<SpaFileSource>,
}

impl SpaStaticFiles {
    pub fn builder() -> SpaStaticFilesBuilder {
        SpaStaticFilesBuilder::default()
    }

    pub fn file_source(&self) -> Option<&SpaFileSource> {
        self.file_source.as_ref()
    }
}

#[derive(Default)]
pub struct SpaStaticFilesBuilder {
    content_root: Option<PathBuf>,
    request_accessor: Option<Arc<dyn RequestContextAccessor>>,
    options: RewriteOptions,
}

impl SpaStaticFilesBuilder {
    /// Directory that `root_path` is resolved against.
    pub fn content_root(mut self, content_root: impl Into<PathBuf>) -> Self {
        self.content_root = Some(content_root.into());
        self
    }

    pub fn request_accessor(mut self, accessor: Arc<dyn RequestContextAccessor>) -> Self {
        self.request_accessor = Some(accessor);
        self
    }

    /// Adjusts the options. They are frozen once [`SpaStaticFilesBuilder::build`] runs.
    pub fn configure(mut self, configure: impl FnOnce(&mut RewriteOptions)) -> Self {
        configure(&mut self.options);
        self
    }

    pub fn build(self) -> Result<SpaStaticFiles, SetupError> {
        self.options.validate()?;

        let content_root = self
            .content_root
            .ok_or(SetupError::MissingCollaborator("content root"))?;
        let request_accessor = self
            .request_accessor
            .ok_or(SetupError::MissingCollaborator("request context accessor"))?;

        let root = content_root.join(&self.options.root_path);
        if !root.is_dir() {
            logf!(
                Info,
                "Static file root {} does not exist, no static files will be served",
                root.display()
            );
            return Ok(SpaStaticFiles { file_source: None });
        }

        let file_source = RewritingFileSource::new(
            PhysicalFileSource::new(root),
            request_accessor,
            &self.options,
        );

        Ok(SpaStaticFiles {
            file_source: Some(file_source),
        })
    }
}
