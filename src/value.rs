//! Conversions from site and post data into template [`Value`]s.
//!
//! Templates print values as-is, so every plain-text field is HTML-escaped
//! here. The rendered post body is the only field that carries markup.

use std::collections::HashMap;

use gtmpl::Value;
use pulldown_cmark::escape::escape_html;

use crate::config::SiteMeta;
use crate::post::Post;
use crate::render::image_url;

fn string<S: Into<String>>(s: S) -> Value {
    Value::String(s.into())
}

/// Escapes `&`, `<`, `>` and `"` so `s` is safe in element content and in
/// double-quoted attributes.
fn text(s: &str) -> Value {
    let mut escaped = String::with_capacity(s.len());
    // Writing into a `String` can't fail.
    let _ = escape_html(&mut escaped, s);
    Value::String(escaped)
}

fn optional_text(s: Option<&str>) -> Value {
    match s {
        Some(s) => text(s),
        None => Value::Nil,
    }
}

/// Converts [`SiteMeta`] into a [`Value::Object`] with fields `title`,
/// `description`, `url`, `author`, `logo_text` and `language`.
pub fn site(site: &SiteMeta) -> Value {
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("title".to_owned(), text(&site.title));
    m.insert("description".to_owned(), text(&site.description));
    m.insert("url".to_owned(), text(site.base_url()));
    m.insert("author".to_owned(), text(&site.author));
    m.insert("logo_text".to_owned(), text(&site.logo_text));
    m.insert("language".to_owned(), text(&site.language));
    Value::Object(m)
}

/// Paths to the site-wide assets and pages, relative to a page `depth`
/// directories below the output root (0 for `index.html`, 1 for
/// `posts/{slug}.html`).
pub fn paths(depth: usize) -> Value {
    let prefix = "../".repeat(depth);
    let mut m: HashMap<String, Value> = HashMap::new();
    for (key, target) in [
        ("root", ""),
        ("css", "styles.css"),
        ("favicon", "favicon.ico"),
        ("manifest", "site.webmanifest"),
        ("images", "images/"),
        ("home", "index.html"),
        ("about", "about.html"),
        ("writing", "writing.html"),
        ("rss", "rss.xml"),
    ] {
        m.insert(key.to_owned(), string(format!("{}{}", prefix, target)));
    }
    Value::Object(m)
}

/// Converts a [`Post`] into a [`Value::Object`]. Besides the post's own
/// fields this carries the canonical `url` and, when the post has an image,
/// the absolute `image_url`.
pub fn post(post: &Post, site: &SiteMeta) -> Value {
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("slug".to_owned(), string(&*post.slug));
    m.insert("title".to_owned(), text(&post.title));
    m.insert("description".to_owned(), text(&post.description));
    m.insert("body".to_owned(), string(&*post.body));
    m.insert("date".to_owned(), string(post.date.format("%Y-%m-%d").to_string()));
    m.insert("formatted_date".to_owned(), string(&*post.formatted_date));
    m.insert("keywords".to_owned(), text(&post.keywords));
    m.insert(
        "categories".to_owned(),
        Value::Array(post.categories.iter().map(|c| text(c)).collect()),
    );
    m.insert("image".to_owned(), optional_text(post.image.as_deref()));
    m.insert(
        "image_url".to_owned(),
        optional_text(post.image.as_deref().map(|img| image_url(site, img)).as_deref()),
    );
    m.insert("url".to_owned(), text(&site.post_url(&post.slug)));
    m.insert("read_time".to_owned(), string(post.read_time.to_string()));
    m.insert("published".to_owned(), Value::Bool(post.published));
    m.insert(
        "extra".to_owned(),
        Value::Object(
            post.extra
                .iter()
                .map(|(k, v)| (k.clone(), yaml(v)))
                .collect(),
        ),
    );
    Value::Object(m)
}

/// Converts arbitrary front-matter YAML into a [`Value`]. Numbers become
/// strings; mapping keys that aren't scalars are dropped.
pub fn yaml(v: &serde_yaml::Value) -> Value {
    use serde_yaml::Value as Yaml;
    match v {
        Yaml::Null => Value::Nil,
        Yaml::Bool(b) => Value::Bool(*b),
        Yaml::Number(n) => string(n.to_string()),
        Yaml::String(s) => text(s),
        Yaml::Sequence(items) => Value::Array(items.iter().map(yaml).collect()),
        Yaml::Mapping(mapping) => Value::Object(
            mapping
                .iter()
                .filter_map(|(k, v)| {
                    let key = match k {
                        Yaml::String(s) => s.clone(),
                        Yaml::Number(n) => n.to_string(),
                        Yaml::Bool(b) => b.to_string(),
                        _ => return None,
                    };
                    Some((key, yaml(v)))
                })
                .collect(),
        ),
    }
}
