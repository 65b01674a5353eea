use std::sync::Arc;

use chrono::Utc;

use crate::{
    error::Result,
    files::{FileRecord, FileSource},
    options::{PathBaseSelector, RewriteOptions},
    request::{RequestContext, RequestContextAccessor},
    rewriting::{HtmlRewriter, Rewriter, ServiceWorkerRewriter},
};

/// Serves files from an inner [`FileSource`], replacing the build-time path base in their
/// content with the path base of the current request.
///
/// The inner source is never written to. A rewritten file is returned as a new in-memory
/// record without a physical path and with the current time as its modification time, so
/// caches upstream see it as different from the file on disk. When rewriting leaves the
/// content untouched the original physical path and modification time are kept.
pub struct RewritingFileSource<S> {
    inner: S,
    request_accessor: Arc<dyn RequestContextAccessor>,
    rewriters: Vec<Arc<dyn Rewriter>>,
    source_path_base: String,
    source_path_base_selector: Option<PathBaseSelector>,
    target_path_base_selector: Option<PathBaseSelector>,
    max_file_length_for_rewrite: Option<u64>,
}

impl<S: FileSource> RewritingFileSource<S> {
    pub fn new(
        inner: S,
        request_accessor: Arc<dyn RequestContextAccessor>,
        options: &RewriteOptions,
    ) -> Self {
        Self {
            inner,
            request_accessor,
            rewriters: rewriter_chain(options),
            source_path_base: options.source_path_base.clone(),
            source_path_base_selector: options.source_path_base_selector.clone(),
            target_path_base_selector: options.target_path_base_selector.clone(),
            max_file_length_for_rewrite: options.max_file_length_for_rewrite,
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn rewriters(&self) -> &[Arc<dyn Rewriter>] {
        &self.rewriters
    }

    fn rewrite_if_necessary(&self, record: FileRecord) -> Result<FileRecord> {
        if record.is_directory() || !record.exists() {
            return Ok(record);
        }

        if let Some(max_length) = self.max_file_length_for_rewrite {
            if record.length() == 0 || record.length() > max_length {
                return Ok(record);
            }
        }

        let Some(rewriter) = self
            .rewriters
            .iter()
            .find(|rewriter| rewriter.can_rewrite(record.name()))
        else {
            return Ok(record);
        };

        let request = self.request_accessor.current();
        let source_base = self.source_path_base(request.as_ref());
        let target_base = self.target_path_base(request.as_ref());
        if source_base.is_empty() || target_base.is_empty() || source_base == target_base {
            return Ok(record);
        }

        let Ok(content) = String::from_utf8(record.read_bytes()?) else {
            return Ok(record);
        };

        let rewritten = rewriter.rewrite(&content, &source_base, &target_base)?;

        if rewritten != content {
            return Ok(FileRecord::text(record.name(), rewritten, None, Utc::now()));
        }

        Ok(FileRecord::text(
            record.name(),
            content,
            record.physical_path().map(ToOwned::to_owned),
            record.last_modified().unwrap_or_else(Utc::now),
        ))
    }

    fn source_path_base(&self, request: Option<&RequestContext>) -> String {
        match &self.source_path_base_selector {
            Some(selector) => selector(request),
            None => self.source_path_base.clone(),
        }
    }

    fn target_path_base(&self, request: Option<&RequestContext>) -> String {
        match &self.target_path_base_selector {
            Some(selector) => selector(request),
            None => normalize_path_base(request.map_or("", |request| request.path_base.as_str())),
        }
    }
}

impl<S: FileSource> FileSource for RewritingFileSource<S> {
    fn lookup(&self, subpath: &str) -> Result<FileRecord> {
        let record = self.inner.lookup(subpath)?;
        self.rewrite_if_necessary(record)
    }
}

/// Custom rewriters first, then the HTML and service worker rewriters.
fn rewriter_chain(options: &RewriteOptions) -> Vec<Arc<dyn Rewriter>> {
    let mut rewriters = options.custom_rewriters.clone();
    rewriters.push(Arc::new(HtmlRewriter::new(options.html_base_element_only)));
    rewriters.push(Arc::new(ServiceWorkerRewriter::new()));
    rewriters
}

/// Makes sure the path base starts and ends with `/`. An empty path base becomes `/`.
pub fn normalize_path_base(path_base: &str) -> String {
    let mut normalized = String::with_capacity(path_base.len() + 2);
    if !path_base.starts_with('/') {
        normalized.push('/');
    }
    normalized.push_str(path_base);
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    normalized
}
