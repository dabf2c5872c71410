//! Defines [`Templates`], which loads the theme, and [`Renderer`], which
//! applies it to posts and listing pages and minifies the result.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Utc};
use gtmpl::{Context, Template, Value};
use url::Url;

use crate::config::SiteMeta;
use crate::minify::{self, Profile};
use crate::post::Post;
use crate::value;

const TEMPLATE_EXTENSION: &str = "html";

/// The top-level pages rendered from the full set of published posts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Page {
    Index,
    About,
    Writing,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::Index, Page::About, Page::Writing];

    /// The name of the page's template file, which is also the name of the
    /// output file.
    pub fn file_name(self) -> &'static str {
        match self {
            Page::Index => "index.html",
            Page::About => "about.html",
            Page::Writing => "writing.html",
        }
    }
}

/// The parsed theme: one template per page kind.
pub struct Templates {
    post: Template,
    index: Template,
    about: Template,
    writing: Template,
}

impl Templates {
    /// Loads `post.html`, `index.html`, `about.html` and `writing.html` from
    /// `templates_directory`. The `.html` files in `partials_directory` (if it
    /// exists) are prepended to each in file-name order, so a partial is
    /// typically a `{{ define "header" }}...{{ end }}` block.
    pub fn load(templates_directory: &Path, partials_directory: &Path) -> Result<Templates> {
        let partials = read_partials(partials_directory)?;
        let load = |name: &str| -> Result<Template> {
            let path = templates_directory.join(name);
            let mut contents = partials.clone();
            contents.push_str(&read_template_file(&path)?);
            parse_template(name, &contents)
        };

        Ok(Templates {
            post: load("post.html")?,
            index: load(Page::Index.file_name())?,
            about: load(Page::About.file_name())?,
            writing: load(Page::Writing.file_name())?,
        })
    }

    fn page(&self, page: Page) -> &Template {
        match page {
            Page::Index => &self.index,
            Page::About => &self.about,
            Page::Writing => &self.writing,
        }
    }
}

fn read_template_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => Error::TemplateNotFound(path.to_owned()),
        _ => Error::ReadTemplate {
            path: path.to_owned(),
            err,
        },
    })
}

// Concatenates the partial templates, each followed by a space.
fn read_partials(dir: &Path) -> Result<String> {
    if !dir.is_dir() {
        return Ok(String::new());
    }

    let mut files = Vec::new();
    for result in fs::read_dir(dir).map_err(|err| Error::ReadTemplate {
        path: dir.to_owned(),
        err,
    })? {
        let entry = result.map_err(|err| Error::ReadTemplate {
            path: dir.to_owned(),
            err,
        })?;
        let path = entry.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == TEMPLATE_EXTENSION) {
            files.push(path);
        }
    }
    files.sort();

    let mut contents = String::new();
    for file in files {
        contents.push_str(&read_template_file(&file)?);
        contents.push(' ');
    }
    Ok(contents)
}

fn parse_template(name: &str, contents: &str) -> Result<Template> {
    check_actions_closed(contents).map_err(|message| Error::Parse {
        name: name.to_owned(),
        message,
    })?;
    let mut template = Template::default();
    template.parse(contents).map_err(|message| Error::Parse {
        name: name.to_owned(),
        message,
    })?;
    Ok(template)
}

// gtmpl's lexer never returns on an action that is opened but not closed, so
// those are rejected before parsing.
fn check_actions_closed(contents: &str) -> std::result::Result<(), String> {
    let mut rest = contents;
    while let Some(start) = rest.find("{{") {
        let action = &rest[start + 2..];
        match action.find("}}") {
            Some(end) => rest = &action[end + 2..],
            None => {
                let snippet: String = action.chars().take(20).collect();
                return Err(format!("unclosed action `{{{{{}`", snippet.trim_end()));
            }
        }
    }
    Ok(())
}

/// Applies [`Templates`] to posts and pages. Every template receives `site`
/// (see [`value::site`]), `paths` (see [`value::paths`]) and `year`, the
/// year of the build.
pub struct Renderer<'a> {
    pub templates: &'a Templates,
    pub site: &'a SiteMeta,

    /// The time of the build.
    pub generated_at: DateTime<Utc>,
}

impl Renderer<'_> {
    /// Renders the standalone page for `post`, which lives one directory
    /// below the output root. The template additionally receives `post`
    /// (see [`value::post`]).
    pub fn render_post(&self, post: &Post) -> Result<String> {
        let mut m = self.common(1);
        m.insert("post".to_owned(), value::post(post, self.site));
        self.execute(&self.templates.post, &post.slug, Value::Object(m), Profile::Post)
    }

    /// Renders a top-level page. `posts` must be the published posts, newest
    /// first; the template receives them as `posts`.
    pub fn render_page(&self, page: Page, posts: &[&Post]) -> Result<String> {
        let mut m = self.common(0);
        m.insert(
            "posts".to_owned(),
            Value::Array(posts.iter().map(|p| value::post(p, self.site)).collect()),
        );
        self.execute(self.templates.page(page), page.file_name(), Value::Object(m), Profile::Page)
    }

    fn common(&self, depth: usize) -> HashMap<String, Value> {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("site".to_owned(), value::site(self.site));
        m.insert("paths".to_owned(), value::paths(depth));
        m.insert("year".to_owned(), Value::String(self.generated_at.year().to_string()));
        m
    }

    fn execute(&self, template: &Template, name: &str, value: Value, profile: Profile) -> Result<String> {
        let execute_error = |message: String| Error::Execute {
            name: name.to_owned(),
            message,
        };
        let context = Context::from(value).map_err(execute_error)?;
        let mut buf: Vec<u8> = Vec::new();
        template.execute(&mut buf, &context).map_err(execute_error)?;
        let html = String::from_utf8(buf).map_err(|err| execute_error(err.to_string()))?;

        if self.site.minify {
            Ok(minify::html(&html, profile).into_owned())
        } else {
            Ok(html)
        }
    }
}

/// Builds the absolute URL for a front-matter image path. Relative prefixes
/// (`./`, `../`, `/`) are dropped because images are addressed from the site
/// root; absolute `http(s)` URLs are returned unchanged.
pub fn image_url(site: &SiteMeta, img: &str) -> String {
    let img = img.trim();
    if let Ok(url) = Url::parse(img) {
        if url.scheme() == "http" || url.scheme() == "https" {
            return url.to_string();
        }
    }

    let mut path = img;
    loop {
        let stripped = path
            .strip_prefix("../")
            .or_else(|| path.strip_prefix("./"))
            .or_else(|| path.strip_prefix('/'));
        match stripped {
            Some(rest) => path = rest,
            None => break,
        }
    }
    site.absolute(path)
}

/// Represents the result of a rendering operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading templates or rendering a page.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a required template file doesn't exist.
    #[error("template not found: `{}`", .0.display())]
    TemplateNotFound(PathBuf),

    /// Returned for other I/O problems reading templates.
    #[error("reading template `{}`: {err}", path.display())]
    ReadTemplate { path: PathBuf, err: io::Error },

    /// Returned when a template doesn't parse.
    #[error("parsing template `{name}`: {message}")]
    Parse { name: String, message: String },

    /// Returned when applying a template fails, e.g. because it calls a
    /// method on a missing field.
    #[error("rendering `{name}`: {message}")]
    Execute { name: String, message: String },
}
