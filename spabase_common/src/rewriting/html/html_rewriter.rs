use crate::{
    error::Result,
    rewriting::rewriter::{is_noop, PatternCache, Rewriter},
};

/// Opens an `href`/`src` attribute value that starts at the beginning of the text or after whitespace.
const ATTRIBUTE_OPENER: &str = r#"((?:^|\s)(?:href|src)\s*=\s*")"#;

/// Opens the `href` value of a `<base>` element.
const BASE_ELEMENT_OPENER: &str = r#"(<base\s*href\s*=\s*")"#;

/// Rewrites `href` and `src` attribute values in `.html` files.
///
/// With `base_element_only` set, only the `<base href>` element is updated and every other
/// attribute is left alone.
#[derive(Debug)]
pub struct HtmlRewriter {
    patterns: PatternCache,
}

impl HtmlRewriter {
    pub fn new(base_element_only: bool) -> Self {
        let opener = if base_element_only {
            BASE_ELEMENT_OPENER
        } else {
            ATTRIBUTE_OPENER
        };

        Self {
            patterns: PatternCache::new(opener),
        }
    }
}

impl Default for HtmlRewriter {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Rewriter for HtmlRewriter {
    fn can_rewrite(&self, name: &str) -> bool {
        name.to_ascii_lowercase().ends_with(".html")
    }

    fn rewrite(&self, html: &str, source_base: &str, target_base: &str) -> Result<String> {
        if is_noop(source_base, target_base) {
            return Ok(html.to_string());
        }

        self.patterns.replace(html, source_base, target_base)
    }
}
