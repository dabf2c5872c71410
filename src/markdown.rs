//! Markdown to HTML conversion for post bodies.

use pulldown_cmark::{html, CowStr, Event, LinkType, Options, Parser, Tag};

const MARKDOWN_SUFFIX: &str = ".md";
const HTML_SUFFIX: &str = ".html";

/// Converts `markdown` to HTML, appending the result to `out`.
pub fn to_html(out: &mut String, markdown: &str) {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    html::push_html(out, Parser::new_ext(markdown, options).map(convert_event));
}

fn convert_event(ev: Event) -> Event {
    match ev {
        // Posts link to each other by source file name (`other-post.md`);
        // those links need to point at the rendered page instead. Both pages
        // live in the same `posts/` directory, so only the suffix changes.
        Event::Start(Tag::Link(link, url, title))
            if !matches!(link, LinkType::Autolink | LinkType::Email) =>
        {
            Event::Start(Tag::Link(link, convert_link(url), title))
        }
        _ => ev,
    }
}

/// Rewrites relative links to Markdown sources (`foo.md`, `./foo.md#bar`) so
/// they point at the corresponding `.html` page. Absolute URLs are left alone.
fn convert_link(url: CowStr) -> CowStr {
    if url.contains("://") || url.starts_with("mailto:") || url.starts_with('/') {
        return url;
    }

    let converted = {
        let (path, fragment) = match url.find(|c: char| c == '#' || c == '?') {
            Some(i) => (&url[..i], &url[i..]),
            None => (&url[..], ""),
        };
        match path.strip_suffix(MARKDOWN_SUFFIX) {
            Some(stem) if !stem.is_empty() => {
                Some(format!("{}{}{}", stem, HTML_SUFFIX, fragment))
            }
            _ => None,
        }
    };
    match converted {
        Some(converted) => CowStr::Boxed(converted.into_boxed_str()),
        None => url,
    }
}

/// Counts the whitespace-separated words in `text`.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
