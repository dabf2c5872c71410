//! Defines the [`Post`] type and the normalization step that turns a
//! [`RawPost`] into one: default filling, slug and date validation, Markdown
//! rendering and the derived display fields.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate};
use regex::Regex;

use crate::markdown;
use crate::parser::{RawPost, SourceKind};

/// Reading speed used for the read-time estimate.
const WORDS_PER_MINUTE: usize = 200;

static SLUG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9-]+$").expect("slug pattern is valid"));

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->|<[^>]*>").expect("tag pattern is valid"));

/// A normalized post. Posts are immutable once built; the renderer and the
/// feed generators only read them.
#[derive(Clone, Debug, PartialEq)]
pub struct Post {
    /// The source file name minus its extension. Unique across a build.
    pub slug: String,

    /// The file the post was loaded from.
    pub source: PathBuf,

    pub title: String,

    /// Defaults to the empty string.
    pub description: String,

    /// The rendered body.
    pub body: String,

    /// The publication date. Defaults to the build date.
    pub date: NaiveDate,

    /// `date` rendered as e.g. `March 5, 2024`.
    pub formatted_date: String,

    /// Comma-separated keywords. Defaults to the empty string.
    pub keywords: String,

    pub categories: Vec<String>,

    /// The image path exactly as written in the front-matter.
    pub image: Option<String>,

    /// Estimated minutes to read the body. Always at least 1.
    pub read_time: usize,

    /// Drafts (`published: false`) get a page but are left out of every
    /// listing and feed.
    pub published: bool,

    /// Front-matter keys with no dedicated field.
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Post {
    /// Normalizes a [`RawPost`]. `today` stands in for a missing date, so this
    /// is deterministic for a given build date.
    pub fn from_raw(raw: RawPost, today: NaiveDate) -> Result<Post> {
        let RawPost {
            source,
            stem,
            kind,
            frontmatter,
            body: raw_body,
        } = raw;

        if !SLUG_PATTERN.is_match(&stem) {
            return Err(Error::InvalidSlug {
                suggestion: slug::slugify(&stem),
                slug: stem,
                path: source,
            });
        }

        let date = match frontmatter.date.as_deref().map(str::trim) {
            None | Some("") => today,
            Some(date) => parse_date(date).ok_or_else(|| Error::InvalidDate {
                date: date.to_owned(),
                path: source.clone(),
            })?,
        };

        let mut body = String::new();
        let words = match kind {
            SourceKind::Markdown => {
                markdown::to_html(&mut body, &raw_body);
                markdown::word_count(&raw_body)
            }
            SourceKind::Html => {
                body.push_str(&raw_body);
                markdown::word_count(&TAG_PATTERN.replace_all(&raw_body, " "))
            }
        };

        Ok(Post {
            read_time: read_time(words),
            formatted_date: format_date(date),
            slug: stem,
            source,
            title: frontmatter.title,
            description: frontmatter.description.unwrap_or_default(),
            body,
            date,
            keywords: frontmatter.keywords.unwrap_or_default(),
            categories: frontmatter.categories.unwrap_or_default(),
            image: frontmatter.img.filter(|img| !img.trim().is_empty()),
            published: frontmatter.published.unwrap_or(true),
            extra: frontmatter.extra,
        })
    }
}

/// Normalizes every [`RawPost`] and rejects duplicate slugs (e.g. `a.md` next
/// to `a.html`). The error names both files.
pub fn normalize_posts(raw_posts: Vec<RawPost>, today: NaiveDate) -> Result<Vec<Post>> {
    let mut seen: HashMap<String, PathBuf> = HashMap::new();
    let mut posts = Vec::with_capacity(raw_posts.len());
    for raw in raw_posts {
        let post = Post::from_raw(raw, today)?;
        if let Some(first) = seen.insert(post.slug.clone(), post.source.clone()) {
            return Err(Error::DuplicateSlug {
                slug: post.slug,
                first,
                second: post.source,
            });
        }
        posts.push(post);
    }
    Ok(posts)
}

/// Returns the published posts, newest first. Posts sharing a date keep
/// their relative order.
pub fn published(posts: &[Post]) -> Vec<&Post> {
    let mut published: Vec<&Post> = posts.iter().filter(|p| p.published).collect();
    published.sort_by(|a, b| b.date.cmp(&a.date));
    published
}

/// Parses `YYYY-MM-DD`, or the date part of an RFC 3339 date-time.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(input).ok().map(|dt| dt.date_naive()))
}

/// Formats a date as `Month D, YYYY`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// `ceil(words / 200)`, at least 1.
pub fn read_time(words: usize) -> usize {
    ((words + WORDS_PER_MINUTE - 1) / WORDS_PER_MINUTE).max(1)
}

/// Represents the result of normalizing posts.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a post that can't be normalized.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a file name isn't made of lowercase letters, digits and
    /// hyphens.
    #[error(
        "invalid slug `{slug}` for `{}`: use lowercase letters, digits and hyphens (e.g. `{suggestion}`)",
        path.display()
    )]
    InvalidSlug {
        slug: String,
        suggestion: String,
        path: PathBuf,
    },

    /// Returned when the front-matter date isn't a calendar date.
    #[error("invalid date `{date}` in `{}`: expected YYYY-MM-DD", path.display())]
    InvalidDate { date: String, path: PathBuf },

    /// Returned when two source files map to the same slug.
    #[error(
        "duplicate slug `{slug}`: `{}` conflicts with `{}`",
        second.display(),
        first.display()
    )]
    DuplicateSlug {
        slug: String,
        first: PathBuf,
        second: PathBuf,
    },
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::Frontmatter;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 2).unwrap()
    }

    fn raw(stem: &str, frontmatter: Frontmatter, body: &str) -> RawPost {
        RawPost {
            source: PathBuf::from(format!("content/posts/{}.md", stem)),
            stem: stem.to_owned(),
            kind: SourceKind::Markdown,
            frontmatter,
            body: body.to_owned(),
        }
    }

    fn titled(title: &str) -> Frontmatter {
        Frontmatter {
            title: title.to_owned(),
            ..Frontmatter::default()
        }
    }

    #[test]
    fn test_from_raw() -> Result<()> {
        let frontmatter = Frontmatter {
            date: Some("2024-03-05".to_owned()),
            published: Some(true),
            ..titled("Hello")
        };
        let post = Post::from_raw(raw("hello", frontmatter, "World"), today())?;
        assert_eq!(post.slug, "hello");
        assert_eq!(post.title, "Hello");
        assert_eq!(post.body, "<p>World</p>\n");
        assert_eq!(post.date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(post.formatted_date, "March 5, 2024");
        assert_eq!(post.read_time, 1);
        assert!(post.published);
        Ok(())
    }

    #[test]
    fn test_defaults() -> Result<()> {
        let post = Post::from_raw(raw("plain", titled("Plain"), ""), today())?;
        assert_eq!(post.date, today());
        assert_eq!(post.formatted_date, "January 2, 2026");
        assert_eq!(post.description, "");
        assert_eq!(post.keywords, "");
        assert!(post.categories.is_empty());
        assert_eq!(post.image, None);
        assert!(post.published);
        Ok(())
    }

    #[test]
    fn test_html_body_is_verbatim() -> Result<()> {
        let mut raw = raw("page", titled("Page"), "<p>*not markdown*</p>");
        raw.kind = SourceKind::Html;
        assert_eq!(Post::from_raw(raw, today())?.body, "<p>*not markdown*</p>");
        Ok(())
    }

    #[test]
    fn test_draft() -> Result<()> {
        let frontmatter = Frontmatter {
            published: Some(false),
            ..titled("Draft")
        };
        assert!(!Post::from_raw(raw("draft", frontmatter, ""), today())?.published);
        Ok(())
    }

    #[test]
    fn test_invalid_slug() {
        let err = Post::from_raw(raw("Hello World", titled("Hi"), ""), today()).unwrap_err();
        match err {
            Error::InvalidSlug { slug, suggestion, .. } => {
                assert_eq!(slug, "Hello World");
                assert_eq!(suggestion, "hello-world");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_invalid_date() {
        let frontmatter = Frontmatter {
            date: Some("2024-02-30".to_owned()),
            ..titled("Leap")
        };
        let err = Post::from_raw(raw("leap", frontmatter, ""), today()).unwrap_err();
        assert!(matches!(err, Error::InvalidDate { ref date, .. } if date == "2024-02-30"));
    }

    #[test]
    fn test_parse_date() {
        let want = NaiveDate::from_ymd_opt(2024, 3, 5);
        assert_eq!(parse_date("2024-03-05"), want);
        assert_eq!(parse_date("2024-03-05T23:10:00+00:00"), want);
        assert_eq!(parse_date("March 5"), None);
    }

    #[test]
    fn test_read_time() {
        assert_eq!(read_time(0), 1);
        assert_eq!(read_time(200), 1);
        assert_eq!(read_time(400), 2);
        assert_eq!(read_time(401), 3);
    }

    #[test]
    fn test_read_time_from_body() -> Result<()> {
        let body = vec!["word"; 401].join(" ");
        assert_eq!(Post::from_raw(raw("long", titled("Long"), &body), today())?.read_time, 3);
        Ok(())
    }

    #[test]
    fn test_read_time_ignores_markup() -> Result<()> {
        let body = vec![r#"<span class="a b c" data-x="y z">word</span>"#; 400].join("\n<!-- a note -->\n");
        let mut raw = raw("markup", titled("Markup"), &body);
        raw.kind = SourceKind::Html;
        assert_eq!(Post::from_raw(raw, today())?.read_time, 2);
        Ok(())
    }

    #[test]
    fn test_duplicate_slug() {
        let mut second = raw("same", titled("Two"), "");
        second.source = PathBuf::from("content/posts/same.html");
        second.kind = SourceKind::Html;
        let err = normalize_posts(vec![raw("same", titled("One"), ""), second], today())
            .unwrap_err();
        match err {
            Error::DuplicateSlug { slug, first, second } => {
                assert_eq!(slug, "same");
                assert_eq!(first, PathBuf::from("content/posts/same.md"));
                assert_eq!(second, PathBuf::from("content/posts/same.html"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_published_sorted_newest_first() -> Result<()> {
        let dated = |stem: &str, date: &str, published: Option<bool>| {
            raw(
                stem,
                Frontmatter {
                    date: Some(date.to_owned()),
                    published,
                    ..titled(stem)
                },
                "",
            )
        };
        let posts = normalize_posts(
            vec![
                dated("a", "2023-01-01", None),
                dated("b", "2024-06-01", Some(false)),
                dated("c", "2024-01-01", None),
                dated("d", "2023-01-01", Some(true)),
            ],
            today(),
        )?;
        let slugs: Vec<&str> = published(&posts).iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["c", "a", "d"]);
        Ok(())
    }
}
