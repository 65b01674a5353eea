use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
    options::{RewriteOptions, DEFAULT_SOURCE_PATH_BASE},
    spa_static_files::SpaStaticFiles,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The listen address for the server
    pub host: SocketAddr,
    /// The directory that `root_path` is resolved against
    pub content_root: PathBuf,
    /// The directory, relative to `content_root`, holding the built application
    pub root_path: String,
    /// The base path the build tool baked into the assets, e.g. `./`
    pub source_path_base: String,
    /// A fixed prefix the application is mounted under. Requests below it have it stripped.
    pub path_base: Option<String>,
    /// Take the path base from the `X-Forwarded-Prefix` header set by a reverse proxy
    pub trust_forwarded_prefix: bool,
    /// Files larger than this many bytes are served without rewriting
    pub max_file_length_for_rewrite: Option<u64>,
    /// Only rewrite the `<base href>` element of HTML files
    pub html_base_element_only: bool,
    /// Served for paths that do not match a file, so client-side routing works
    pub default_page: String,
}

/// The server caps rewriting at 1 MiB. The library itself has no ceiling.
pub const DEFAULT_MAX_FILE_LENGTH_FOR_REWRITE: u64 = 1024 * 1024;

impl Default for Config {
    fn default() -> Self {
        Config {
            host: SocketAddr::from(([0, 0, 0, 0], 3069)),
            content_root: PathBuf::from("."),
            root_path: "ClientApp/build".to_string(),
            source_path_base: DEFAULT_SOURCE_PATH_BASE.to_string(),
            path_base: None,
            trust_forwarded_prefix: false,
            max_file_length_for_rewrite: Some(DEFAULT_MAX_FILE_LENGTH_FOR_REWRITE),
            html_base_element_only: false,
            default_page: "index.html".to_string(),
        }
    }
}

impl Config {
    /// Copies the rewrite related settings onto `options`.
    pub fn apply(&self, options: &mut RewriteOptions) {
        options.root_path = self.root_path.clone();
        options.source_path_base = self.source_path_base.clone();
        options.max_file_length_for_rewrite = self.max_file_length_for_rewrite;
        options.html_base_element_only = self.html_base_element_only;
    }
}

#[derive(Clone)]
/// The state that is passed to the static file handler and the path base middleware
pub struct AppState {
    pub config: Arc<Config>,
    pub files: Arc<SpaStaticFiles>,
}
