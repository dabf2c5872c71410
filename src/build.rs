//! Exports [`build_site`], which runs the pipeline end to end: loading the
//! sources ([`crate::parser`]), normalizing them ([`crate::post`]), rendering
//! every page ([`crate::render`]), deriving the sitemap and feed
//! ([`crate::sitemap`], [`crate::feed`]) and writing the output tree
//! ([`crate::write`]).
//!
//! Every stage completes before the next one starts, and nothing touches the
//! output directory until all artifacts have been rendered in memory.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::config::{self, Config};
use crate::feed;
use crate::parser::{self, Parser};
use crate::post::{self, normalize_posts, published};
use crate::render::{self, Page, Renderer, Templates};
use crate::sitemap::sitemap;
use crate::write::{self, Artifact, Writer};

/// What a successful build produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Summary {
    /// Every post, drafts included.
    pub posts: usize,

    /// Posts that made it into the listings and feeds.
    pub published: usize,

    pub output_directory: PathBuf,
}

/// Builds the site described by `config`, stamped with the current time.
pub fn build_site(config: &Config) -> Result<Summary> {
    build_site_at(config, Utc::now())
}

/// Builds the site as of `generated_at`. The build date (for posts without a
/// date and for the sitemap's static entries) is the UTC date of
/// `generated_at`, so two builds with the same timestamp and inputs produce
/// byte-identical output.
pub fn build_site_at(config: &Config, generated_at: DateTime<Utc>) -> Result<Summary> {
    let today = generated_at.date_naive();
    let site = &config.site;
    let paths = &config.paths;

    let content_directory = paths.content_directory();
    let raw_posts = Parser::new(&content_directory).parse_posts()?;
    log::info!(
        "loaded {} post(s) from `{}`",
        raw_posts.len(),
        content_directory.display()
    );

    let posts = normalize_posts(raw_posts, today)?;
    let listed = published(&posts);
    log::info!("{} published, {} draft(s)", listed.len(), posts.len() - listed.len());

    // Load every template up front so a missing one fails before any output
    // is produced.
    let templates = Templates::load(&paths.templates_directory(), &paths.partials_directory())?;
    let renderer = Renderer {
        templates: &templates,
        site,
        generated_at,
    };

    let mut artifacts = Vec::with_capacity(posts.len() + Page::ALL.len() + 2);
    for post in &posts {
        artifacts.push(Artifact::new(
            PathBuf::from("posts").join(format!("{}.html", post.slug)),
            renderer.render_post(post)?,
        ));
    }
    for page in Page::ALL {
        artifacts.push(Artifact::new(
            page.file_name(),
            renderer.render_page(page, &listed)?,
        ));
    }
    log::info!("rendered {} page(s)", artifacts.len());

    artifacts.push(Artifact::new("sitemap.xml", sitemap(site, &listed, today)));
    artifacts.push(Artifact::new("rss.xml", feed::feed(site, &listed, generated_at)?));
    log::info!("generated sitemap.xml and rss.xml");

    let output_directory = paths.output_directory();
    Writer {
        output_directory: &output_directory,
        paths,
        minify: site.minify,
    }
    .write_site(&artifacts)?;
    log::info!("wrote site to `{}`", output_directory.display());

    Ok(Summary {
        posts: posts.len(),
        published: listed.len(),
        output_directory,
    })
}

/// The result of a build.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can stop a build. Each variant wraps the stage error that
/// caused it, so the message names the offending file.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the site configuration is invalid.
    #[error(transparent)]
    Config(#[from] config::Error),

    /// Returned when the content directory or a source file can't be read
    /// or parsed.
    #[error(transparent)]
    ContentRead(#[from] parser::Error),

    /// Returned when a file name isn't a valid slug.
    #[error(transparent)]
    InvalidSlug(post::Error),

    /// Returned when a front-matter date doesn't parse.
    #[error(transparent)]
    InvalidDate(post::Error),

    /// Returned when two source files share a slug.
    #[error(transparent)]
    DuplicateSlug(post::Error),

    /// Returned when a required template file is missing.
    #[error("template not found: `{}`", .0.display())]
    TemplateNotFound(PathBuf),

    /// Returned when a template can't be read, parsed or applied.
    #[error(transparent)]
    Render(render::Error),

    /// Returned when the feed can't be generated.
    #[error(transparent)]
    Feed(#[from] feed::Error),

    /// Returned when the output tree can't be written.
    #[error(transparent)]
    Write(#[from] write::Error),
}

impl From<post::Error> for Error {
    fn from(err: post::Error) -> Error {
        match err {
            post::Error::InvalidSlug { .. } => Error::InvalidSlug(err),
            post::Error::InvalidDate { .. } => Error::InvalidDate(err),
            post::Error::DuplicateSlug { .. } => Error::DuplicateSlug(err),
        }
    }
}

impl From<render::Error> for Error {
    fn from(err: render::Error) -> Error {
        match err {
            render::Error::TemplateNotFound(path) => Error::TemplateNotFound(path),
            err => Error::Render(err),
        }
    }
}
