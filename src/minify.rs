//! HTML and CSS minification.
//!
//! HTML goes through `minify_html`, which only applies transformations that
//! keep the document equivalent. The stylesheet goes through a short regex
//! pipeline.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// How aggressively to minify a page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Profile {
    /// Post pages: closing tags and `<html>`/`<head>` opening tags that the
    /// HTML spec marks optional are dropped.
    Post,

    /// Listing pages: whitespace, comments, inline CSS and JS only.
    Page,
}

/// Minifies an HTML document. Minification is cosmetic: if the minified
/// bytes can't be decoded as UTF-8 the unminified document is returned and a
/// warning is logged.
pub fn html<'a>(input: &'a str, profile: Profile) -> Cow<'a, str> {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = profile == Profile::Page;
    cfg.keep_html_and_head_opening_tags = profile == Profile::Page;
    cfg.keep_comments = false;
    cfg.minify_css = true;
    cfg.minify_js = true;
    cfg.remove_bangs = true;
    cfg.remove_processing_instructions = true;

    match String::from_utf8(minify_html::minify(input.as_bytes(), &cfg)) {
        Ok(minified) => Cow::Owned(minified),
        Err(err) => {
            log::warn!("minification produced invalid UTF-8, keeping original: {}", err);
            Cow::Borrowed(input)
        }
    }
}

/// Minifies a stylesheet: drops comments, collapses whitespace and removes
/// the spacing around braces, colons and trailing semicolons.
pub fn css(input: &str) -> String {
    static COMMENTS: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"/\*[\s\S]*?\*/").expect("valid regex"));
    static WHITESPACE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
    static TRAILING_SEMICOLON: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r";\s*\}").expect("valid regex"));
    static COLON: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r":\s+").expect("valid regex"));
    static OPEN_BRACE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\s*\{\s*").expect("valid regex"));
    static CLOSE_BRACE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\s*\}\s*").expect("valid regex"));

    let css = COMMENTS.replace_all(input, "");
    let css = WHITESPACE.replace_all(&css, " ");
    let css = TRAILING_SEMICOLON.replace_all(&css, "}");
    let css = COLON.replace_all(&css, ":");
    let css = OPEN_BRACE.replace_all(&css, "{");
    let css = CLOSE_BRACE.replace_all(&css, "}");
    css.trim().to_owned()
}
