//! Defines the [`RawPost`], [`Frontmatter`], and [`Error`] types, along with
//! the logic for loading post source files from disk into memory. No
//! normalization happens here; see [`crate::post`] for that.

use std::collections::BTreeMap;
use std::fs::{self, read_dir};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};

const MARKDOWN_EXTENSION: &str = "md";
const HTML_EXTENSION: &str = "html";
const FENCE: &str = "---";

/// The markup language of a post body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    /// The body is Markdown and is converted to HTML during normalization.
    Markdown,

    /// The body is already HTML and is used verbatim.
    Html,
}

impl SourceKind {
    fn from_path(path: &Path) -> Option<SourceKind> {
        match path.extension()?.to_str()? {
            MARKDOWN_EXTENSION => Some(SourceKind::Markdown),
            HTML_EXTENSION => Some(SourceKind::Html),
            _ => None,
        }
    }
}

/// The as-parsed contents of a single post source file.
#[derive(Clone, Debug)]
pub struct RawPost {
    /// The path of the source file.
    pub source: PathBuf,

    /// The file name minus its extension. This becomes the post's slug.
    pub stem: String,

    /// Whether the body is Markdown or HTML.
    pub kind: SourceKind,

    /// The post's front-matter.
    pub frontmatter: Frontmatter,

    /// Everything after the closing front-matter fence.
    pub body: String,
}

/// A post's YAML front-matter. Only `title` is required.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Frontmatter {
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    /// `YYYY-MM-DD` or an RFC 3339 date-time.
    #[serde(default)]
    pub date: Option<String>,

    /// A site-relative image path, e.g. `../images/cover.png`.
    #[serde(default)]
    pub img: Option<String>,

    /// Either a comma-separated string or a list of keywords.
    #[serde(default, deserialize_with = "deserialize_keywords")]
    pub keywords: Option<String>,

    #[serde(default)]
    pub categories: Option<Vec<String>>,

    #[serde(default)]
    pub published: Option<bool>,

    /// Any other keys. These are passed to templates untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

fn deserialize_keywords<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Keywords {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<Keywords>::deserialize(deserializer)? {
        None => None,
        Some(Keywords::One(s)) => Some(s),
        Some(Keywords::Many(v)) => Some(v.join(", ")),
    })
}

/// Loads [`RawPost`]s from a content directory.
pub struct Parser<'a> {
    /// `content_directory` is the directory holding one source file per post.
    content_directory: &'a Path,
}

impl<'a> Parser<'a> {
    pub fn new(content_directory: &'a Path) -> Parser<'a> {
        Parser { content_directory }
    }

    /// Reads every `.md` and `.html` file directly inside the content
    /// directory and returns one [`RawPost`] per file. Each file must be
    /// structured as follows:
    ///
    /// 1. Initial front-matter fence (`---`)
    /// 2. YAML front-matter with a `title` and optionally `description`,
    ///    `date`, `img`, `keywords`, `categories` and `published`
    /// 3. Terminal front-matter fence (`---`) on its own line
    /// 4. Post body
    ///
    /// For example:
    ///
    /// ```md
    /// ---
    /// title: Hello
    /// date: 2024-03-05
    /// categories: [greetings]
    /// ---
    /// World
    /// ```
    ///
    /// Files are visited in file-name order. Nothing downstream relies on
    /// that order, but it keeps builds reproducible.
    pub fn parse_posts(&self) -> Result<Vec<RawPost>> {
        let entries = read_dir(self.content_directory).map_err(|err| Error::ReadDirectory {
            path: self.content_directory.to_owned(),
            err,
        })?;

        let mut sources = Vec::new();
        for result in entries {
            let entry = result.map_err(|err| Error::ReadDirectory {
                path: self.content_directory.to_owned(),
                err,
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Some(kind) = SourceKind::from_path(&path) {
                sources.push((path, kind));
            }
        }
        sources.sort_by(|(a, _), (b, _)| a.cmp(b));

        sources
            .into_iter()
            .map(|(path, kind)| self.parse_post(&path, kind))
            .collect()
    }

    fn parse_post(&self, path: &Path, kind: SourceKind) -> Result<RawPost> {
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| Error::InvalidFileName(path.to_owned()))?
            .to_owned();

        let contents = fs::read_to_string(path).map_err(|err| Error::ReadFile {
            path: path.to_owned(),
            err,
        })?;
        let (yaml, body) = split_frontmatter(&contents).map_err(|err| Error::Annotated {
            path: path.to_owned(),
            err: Box::new(err),
        })?;
        let frontmatter: Frontmatter =
            serde_yaml::from_str(yaml).map_err(|err| Error::DeserializeYaml {
                path: path.to_owned(),
                err,
            })?;

        Ok(RawPost {
            source: path.to_owned(),
            stem,
            kind,
            frontmatter,
            body: body.to_owned(),
        })
    }
}

/// Splits a source file into its YAML front-matter and its body. The closing
/// fence must be a line of its own, so `---` inside a YAML string doesn't end
/// the front-matter early.
pub fn split_frontmatter(input: &str) -> Result<(&str, &str)> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let rest = match input.strip_prefix(FENCE) {
        Some(rest) if rest.starts_with('\n') || rest.starts_with("\r\n") => rest,
        _ => return Err(Error::FrontmatterMissingStartFence),
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if offset > 0 && line.trim_end() == FENCE {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Ok((yaml, body));
        }
        offset += line.len();
    }
    Err(Error::FrontmatterMissingEndFence)
}

/// Represents the result of a [`RawPost`]-loading operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading a [`RawPost`]. Every variant amounts to "the
/// content couldn't be read".
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a post source file is missing its starting front-matter
    /// fence (`---`).
    #[error("post must begin with `---`")]
    FrontmatterMissingStartFence,

    /// Returned when the starting fence was found but the ending one was
    /// missing.
    #[error("missing closing `---`")]
    FrontmatterMissingEndFence,

    /// Returned when the front-matter isn't valid YAML or lacks a required
    /// field.
    #[error("parsing front-matter of `{}`: {err}", path.display())]
    DeserializeYaml {
        path: PathBuf,
        err: serde_yaml::Error,
    },

    /// Returned when the content directory can't be listed.
    #[error("reading content directory `{}`: {err}", path.display())]
    ReadDirectory { path: PathBuf, err: std::io::Error },

    /// Returned when a source file can't be read.
    #[error("reading `{}`: {err}", path.display())]
    ReadFile { path: PathBuf, err: std::io::Error },

    /// Returned when a source file name isn't valid UTF-8.
    #[error("invalid file name: {0:?}")]
    InvalidFileName(PathBuf),

    /// An error with the path of the file it concerns.
    #[error("parsing `{}`: {err}", path.display())]
    Annotated { path: PathBuf, err: Box<Error> },
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_split_frontmatter() -> Result<()> {
        let (yaml, body) = split_frontmatter("---\ntitle: Hi\n---\nBody\n")?;
        assert_eq!(yaml, "\ntitle: Hi\n");
        assert_eq!(body, "Body\n");
        Ok(())
    }

    #[test]
    fn test_split_frontmatter_ignores_inline_dashes() -> Result<()> {
        let (yaml, body) =
            split_frontmatter("---\ntitle: a---b\n---\n---not a fence\n")?;
        assert_eq!(yaml, "\ntitle: a---b\n");
        assert_eq!(body, "---not a fence\n");
        Ok(())
    }

    #[test]
    fn test_split_frontmatter_missing_fences() {
        assert!(matches!(
            split_frontmatter("title: Hi\n"),
            Err(Error::FrontmatterMissingStartFence)
        ));
        assert!(matches!(
            split_frontmatter("---\ntitle: Hi\n"),
            Err(Error::FrontmatterMissingEndFence)
        ));
    }

    #[test]
    fn test_parse_posts() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        fs::write(
            dir.path().join("hello.md"),
            "---\ntitle: Hello\ndate: 2024-03-05\nkeywords: [rust, blog]\ncategories: [dev]\nmood: happy\n---\nWorld\n",
        )?;
        fs::write(
            dir.path().join("draft.html"),
            "---\ntitle: Draft\npublished: false\n---\n<p>Soon</p>\n",
        )?;
        fs::write(dir.path().join("notes.txt"), "ignored")?;
        fs::create_dir(dir.path().join("nested.md"))?;

        let posts = Parser::new(dir.path()).parse_posts()?;
        assert_eq!(posts.len(), 2);

        let draft = &posts[0];
        assert_eq!(draft.stem, "draft");
        assert_eq!(draft.kind, SourceKind::Html);
        assert_eq!(draft.frontmatter.published, Some(false));
        assert_eq!(draft.body, "<p>Soon</p>\n");

        let hello = &posts[1];
        assert_eq!(hello.stem, "hello");
        assert_eq!(hello.kind, SourceKind::Markdown);
        assert_eq!(hello.frontmatter.title, "Hello");
        assert_eq!(hello.frontmatter.date.as_deref(), Some("2024-03-05"));
        assert_eq!(hello.frontmatter.keywords.as_deref(), Some("rust, blog"));
        assert_eq!(hello.frontmatter.categories, Some(vec!["dev".to_owned()]));
        assert_eq!(hello.frontmatter.published, None);
        assert_eq!(
            hello.frontmatter.extra.get("mood"),
            Some(&serde_yaml::Value::String("happy".to_owned()))
        );
        Ok(())
    }

    #[test]
    fn test_parse_posts_missing_title() -> std::io::Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("untitled.md"), "---\ndate: 2024-01-01\n---\n")?;
        let err = Parser::new(dir.path()).parse_posts().unwrap_err();
        assert!(matches!(err, Error::DeserializeYaml { .. }));
        assert!(err.to_string().contains("untitled.md"));
        Ok(())
    }

    #[test]
    fn test_parse_posts_missing_directory() {
        let missing = Path::new("./does/not/exist");
        assert!(matches!(
            Parser::new(missing).parse_posts(),
            Err(Error::ReadDirectory { .. })
        ));
    }
}
