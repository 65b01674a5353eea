use std::path::Path;

use crate::{
    error::Result,
    rewriting::rewriter::{is_noop, PatternCache, Rewriter},
};

/// Opens a quoted string literal used as an array element, call argument, assignment or
/// object value.
const LITERAL_OPENER: &str = r#"([\[(=:]\s*["'])"#;

const SERVICE_WORKER_STEMS: [&str; 2] = ["service-worker", "serviceworker"];
const SERVICE_WORKER_STEM_SUFFIXES: [&str; 3] = ["-service-worker", "-serviceworker", "-sw"];
const PRECACHE_MANIFEST: &str = "precache-manifest";

/// Rewrites quoted path literals in service worker and precache manifest scripts.
#[derive(Debug)]
pub struct ServiceWorkerRewriter {
    patterns: PatternCache,
}

impl ServiceWorkerRewriter {
    pub fn new() -> Self {
        Self {
            patterns: PatternCache::new(LITERAL_OPENER),
        }
    }
}

impl Default for ServiceWorkerRewriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Rewriter for ServiceWorkerRewriter {
    fn can_rewrite(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        if !name.ends_with(".js") {
            return false;
        }

        let stem = Path::new(&name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default();

        SERVICE_WORKER_STEMS.contains(&stem)
            || SERVICE_WORKER_STEM_SUFFIXES
                .iter()
                .any(|suffix| stem.ends_with(suffix))
            || name.starts_with(PRECACHE_MANIFEST)
            || name.contains(&format!("-{PRECACHE_MANIFEST}"))
    }

    fn rewrite(&self, js: &str, source_base: &str, target_base: &str) -> Result<String> {
        if is_noop(source_base, target_base) {
            return Ok(js.to_string());
        }

        self.patterns.replace(js, source_base, target_base)
    }
}
