//! Defines [`SiteMeta`], the site-wide metadata shared by every build stage,
//! and [`Paths`], which fixes the location of every input and output relative
//! to a project root.

use std::path::{Path, PathBuf};
use url::Url;

const DEFAULT_TITLE: &str = "Your Blog";
const DEFAULT_DESCRIPTION: &str =
    "Personal blog about technology, thoughts, and experiences";
const DEFAULT_URL: &str = "https://yourdomain.com";
const DEFAULT_AUTHOR: &str = "Your Name";
const DEFAULT_LOGO_TEXT: &str = "Y";
const DEFAULT_LANGUAGE: &str = "en";

/// Site-wide metadata. Constructed once at startup and then only read.
#[derive(Clone, Debug, PartialEq)]
pub struct SiteMeta {
    /// The site title, used for the index page and the feed channel.
    pub title: String,

    /// A one-line description of the site.
    pub description: String,

    /// The canonical base URL. All absolute URLs (posts, images, sitemap
    /// entries) are built from this.
    pub url: Url,

    /// The author's name.
    pub author: String,

    /// Short text rendered in place of a logo image.
    pub logo_text: String,

    /// Language code for the feed channel and the `<html lang>` attribute.
    pub language: String,

    /// Whether rendered HTML and the stylesheet are minified.
    pub minify: bool,
}

impl SiteMeta {
    /// Builds a [`SiteMeta`] from the process environment. See
    /// [`SiteMeta::from_lookup`] for the recognized variables.
    pub fn from_env() -> Result<SiteMeta> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a [`SiteMeta`] from a key lookup function. Recognized keys are
    /// `SITE_TITLE`, `SITE_DESCRIPTION`, `SITE_URL`, `SITE_AUTHOR`,
    /// `SITE_LOGO_TEXT`, `SITE_LANGUAGE`, and `SITE_MINIFY`. Missing or empty
    /// values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<SiteMeta>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| -> String {
            match lookup(key) {
                Some(value) if !value.trim().is_empty() => value.trim().to_owned(),
                _ => default.to_owned(),
            }
        };

        let raw_url = get("SITE_URL", DEFAULT_URL);
        let url = Url::parse(&raw_url).map_err(|err| Error::InvalidUrl {
            url: raw_url.clone(),
            err,
        })?;
        if url.cannot_be_a_base() {
            return Err(Error::NotABase(raw_url));
        }

        let minify = match get("SITE_MINIFY", "true").to_ascii_lowercase().as_str() {
            "false" | "0" | "no" | "off" => false,
            _ => true,
        };

        Ok(SiteMeta {
            title: get("SITE_TITLE", DEFAULT_TITLE),
            description: get("SITE_DESCRIPTION", DEFAULT_DESCRIPTION),
            url,
            author: get("SITE_AUTHOR", DEFAULT_AUTHOR),
            logo_text: get("SITE_LOGO_TEXT", DEFAULT_LOGO_TEXT),
            language: get("SITE_LANGUAGE", DEFAULT_LANGUAGE),
            minify,
        })
    }

    /// The base URL without a trailing slash, e.g. `https://example.com`.
    pub fn base_url(&self) -> &str {
        self.url.as_str().trim_end_matches('/')
    }

    /// Joins a site-relative path onto the base URL. `absolute("")` is the
    /// home page.
    pub fn absolute(&self, path: &str) -> String {
        format!("{}/{}", self.base_url(), path.trim_start_matches('/'))
    }

    /// The canonical URL of the post page for `slug`.
    pub fn post_url(&self, slug: &str) -> String {
        self.absolute(&format!("posts/{}.html", slug))
    }
}

/// The fixed project layout. Every path is derived from `root`.
#[derive(Clone, Debug)]
pub struct Paths {
    pub root: PathBuf,
}

impl Paths {
    pub fn new<P: AsRef<Path>>(root: P) -> Paths {
        Paths {
            root: root.as_ref().to_owned(),
        }
    }

    /// `{root}/content/posts`, one source file per post.
    pub fn content_directory(&self) -> PathBuf {
        self.root.join("content").join("posts")
    }

    /// `{root}/templates`, holding `post.html`, `index.html`, `about.html`
    /// and `writing.html`.
    pub fn templates_directory(&self) -> PathBuf {
        self.root.join("templates")
    }

    /// `{root}/templates/partials`, whose files are prepended to every
    /// page template.
    pub fn partials_directory(&self) -> PathBuf {
        self.templates_directory().join("partials")
    }

    /// `{root}/dist`
    pub fn output_directory(&self) -> PathBuf {
        self.root.join("dist")
    }

    pub fn stylesheet(&self) -> PathBuf {
        self.root.join("styles.css")
    }

    pub fn images_directory(&self) -> PathBuf {
        self.root.join("images")
    }

    /// Files copied verbatim into the output root when present.
    pub fn root_passthrough_files(&self) -> Vec<PathBuf> {
        ["site.webmanifest", "favicon.ico", "robots.txt"]
            .iter()
            .map(|name| self.root.join(name))
            .collect()
    }
}

/// Bundles the site metadata with the project layout.
#[derive(Clone, Debug)]
pub struct Config {
    pub site: SiteMeta,
    pub paths: Paths,
}

impl Config {
    /// Loads the [`SiteMeta`] from the environment for the project at `root`.
    pub fn from_env<P: AsRef<Path>>(root: P) -> Result<Config> {
        Ok(Config {
            site: SiteMeta::from_env()?,
            paths: Paths::new(root),
        })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when `SITE_URL` doesn't parse as a URL.
    #[error("invalid SITE_URL `{url}`: {err}")]
    InvalidUrl { url: String, err: url::ParseError },

    /// Returned when `SITE_URL` parses but can't serve as a base for post
    /// URLs (e.g., `mailto:` URLs).
    #[error("SITE_URL `{0}` cannot be used as a base URL")]
    NotABase(String),
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() -> Result<()> {
        let site = SiteMeta::from_lookup(|_| None)?;
        assert_eq!(site.title, "Your Blog");
        assert_eq!(site.author, "Your Name");
        assert_eq!(site.language, "en");
        assert!(site.minify);
        assert_eq!(site.base_url(), "https://yourdomain.com");
        Ok(())
    }

    #[test]
    fn test_overrides() -> Result<()> {
        let site = SiteMeta::from_lookup(lookup(&[
            ("SITE_TITLE", "Notes"),
            ("SITE_URL", "https://example.com/blog/"),
            ("SITE_AUTHOR", "Sam"),
            ("SITE_MINIFY", "off"),
            ("SITE_LOGO_TEXT", "  "),
        ]))?;
        assert_eq!(site.title, "Notes");
        assert_eq!(site.author, "Sam");
        assert_eq!(site.logo_text, "Y");
        assert!(!site.minify);
        assert_eq!(
            site.post_url("hello"),
            "https://example.com/blog/posts/hello.html"
        );
        assert_eq!(site.absolute(""), "https://example.com/blog/");
        Ok(())
    }

    #[test]
    fn test_invalid_url() {
        let err = SiteMeta::from_lookup(lookup(&[("SITE_URL", "not a url")]))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidUrl { .. }));

        let err = SiteMeta::from_lookup(lookup(&[("SITE_URL", "mailto:a@b.c")]))
            .unwrap_err();
        assert!(matches!(err, Error::NotABase(_)));
    }

    #[test]
    fn test_paths() {
        let paths = Paths::new("/site");
        assert_eq!(paths.content_directory(), PathBuf::from("/site/content/posts"));
        assert_eq!(
            paths.partials_directory(),
            PathBuf::from("/site/templates/partials")
        );
        assert_eq!(paths.output_directory(), PathBuf::from("/site/dist"));
    }
}
