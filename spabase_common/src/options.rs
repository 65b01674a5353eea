use std::{fmt, sync::Arc};

use crate::{error::SetupError, request::RequestContext, rewriting::Rewriter};

/// Path base used when neither a source path base nor a selector is configured.
pub const DEFAULT_SOURCE_PATH_BASE: &str = "./";

/// Picks a path base for the current request. Receives `None` outside of a request.
pub type PathBaseSelector = Arc<dyn Fn(Option<&RequestContext>) -> String + Send + Sync>;

/// Configures how static files are rewritten.
#[derive(Clone)]
pub struct RewriteOptions {
    /// Directory below the content root that holds the built assets.
    pub root_path: String,
    /// Base path baked into the built assets.
    pub source_path_base: String,
    /// Overrides `source_path_base` per request.
    pub source_path_base_selector: Option<PathBaseSelector>,
    /// Overrides the request's normalized path base as the replacement.
    pub target_path_base_selector: Option<PathBaseSelector>,
    /// Files longer than this many bytes, or empty files, are never rewritten.
    pub max_file_length_for_rewrite: Option<u64>,
    /// Only rewrite the `<base href>` element in HTML files.
    pub html_base_element_only: bool,
    /// Tried in order before the built-in rewriters.
    pub custom_rewriters: Vec<Arc<dyn Rewriter>>,
}

impl RewriteOptions {
    pub fn new(root_path: impl Into<String>) -> Self {
        Self {
            root_path: root_path.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), SetupError> {
        if self.root_path.is_empty() {
            return Err(SetupError::MissingRootPath);
        }
        Ok(())
    }
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            root_path: String::new(),
            source_path_base: DEFAULT_SOURCE_PATH_BASE.to_string(),
            source_path_base_selector: None,
            target_path_base_selector: None,
            max_file_length_for_rewrite: None,
            html_base_element_only: false,
            custom_rewriters: Vec::new(),
        }
    }
}

impl fmt::Debug for RewriteOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RewriteOptions")
            .field("root_path", &self.root_path)
            .field("source_path_base", &self.source_path_base)
            .field(
                "source_path_base_selector",
                &self.source_path_base_selector.is_some(),
            )
            .field(
                "target_path_base_selector",
                &self.target_path_base_selector.is_some(),
            )
            .field(
                "max_file_length_for_rewrite",
                &self.max_file_length_for_rewrite,
            )
            .field("html_base_element_only", &self.html_base_element_only)
            .field("custom_rewriters", &self.custom_rewriters.len())
            .finish()
    }
}
