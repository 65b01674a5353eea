use dashmap::DashMap;
use regex::{Regex, RegexBuilder};

use crate::error::Result;

/// Rewrites path references inside the content of a static file.
///
/// Rewriters are tried in chain order and the first one whose [`Rewriter::can_rewrite`]
/// accepts the file name is used.
pub trait Rewriter: Send + Sync {
    /// Returns true if this rewriter handles the file with the given name.
    fn can_rewrite(&self, name: &str) -> bool;

    /// Replaces `source_base` with `target_base` wherever the rewriter recognizes a path
    /// reference. An empty base means "absent" and leaves the content untouched.
    fn rewrite(&self, content: &str, source_base: &str, target_base: &str) -> Result<String>;
}

/// True when there is nothing to substitute for the given pair of bases.
pub fn is_noop(source_base: &str, target_base: &str) -> bool {
    source_base.is_empty() || target_base.is_empty() || source_base == target_base
}

/// Escapes `$` so the text is inserted literally into a replacement template.
pub fn escape_replacement(replacement: &str) -> String {
    replacement.replace('$', "$$")
}

/// Source bases are usually fixed for the life of a rewriter, so there are rarely more than one
/// or two patterns. The cache is emptied when a selector produces more than this.
const MAX_CACHED_PATTERNS: usize = 64;

/// Compiled `opener` + source base patterns, one per source base seen so far.
///
/// `opener` must be a single capture group; it is kept in the output.
#[derive(Debug)]
pub(crate) struct PatternCache {
    opener: &'static str,
    patterns: DashMap<String, Regex>,
}

impl PatternCache {
    pub(crate) fn new(opener: &'static str) -> Self {
        Self {
            opener,
            patterns: DashMap::new(),
        }
    }

    fn pattern(&self, source_base: &str) -> Result<Regex> {
        let cached = self.patterns.get(source_base).map(|pattern| pattern.clone());
        if let Some(pattern) = cached {
            return Ok(pattern);
        }

        let pattern = RegexBuilder::new(&format!("{}{}", self.opener, regex::escape(source_base)))
            .case_insensitive(true)
            .build()?;

        if self.patterns.len() >= MAX_CACHED_PATTERNS {
            self.patterns.clear();
        }
        self.patterns.insert(source_base.to_string(), pattern.clone());

        Ok(pattern)
    }

    /// Replaces `source_base` when it directly follows the text matched by the opener.
    pub(crate) fn replace(
        &self,
        content: &str,
        source_base: &str,
        target_base: &str,
    ) -> Result<String> {
        let pattern = self.pattern(source_base)?;
        let replacement = format!("${{1}}{}", escape_replacement(target_base));

        Ok(pattern
            .replace_all(content, replacement.as_str())
            .into_owned())
    }
}
