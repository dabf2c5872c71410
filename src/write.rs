//! Defines the [`Writer`], which turns a list of rendered [`Artifact`]s plus
//! the passthrough assets into the output directory.
//!
//! The output is assembled in a staging directory next to the real one and
//! only swapped into place once everything has been written, so a failed
//! build leaves the previous output as it was.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::Paths;
use crate::minify;

/// A rendered file and its location relative to the output root.
#[derive(Clone, Debug, PartialEq)]
pub struct Artifact {
    pub path: PathBuf,
    pub contents: String,
}

impl Artifact {
    pub fn new<P: Into<PathBuf>, S: Into<String>>(path: P, contents: S) -> Artifact {
        Artifact {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// Writes artifacts and passthrough assets into `output_directory`.
pub struct Writer<'a> {
    /// The directory the finished site ends up in. It is replaced wholesale.
    pub output_directory: &'a Path,

    /// Where to find the passthrough assets.
    pub paths: &'a Paths,

    /// Whether to minify the stylesheet on its way through.
    pub minify: bool,
}

impl Writer<'_> {
    /// Writes the whole site. On success `output_directory` holds exactly
    /// the artifacts, a `posts/` directory and whichever optional assets
    /// exist. On failure the staging directory is removed and
    /// `output_directory` holds the previous site, if there was one.
    pub fn write_site(&self, artifacts: &[Artifact]) -> Result<()> {
        let staging = self.sibling("staging")?;
        let previous = self.sibling("previous")?;
        rmdir(&staging)?;
        create_dir(&staging)?;

        let result = self
            .populate(&staging, artifacts)
            .and_then(|()| swap(&staging, self.output_directory, &previous));
        if result.is_err() {
            if let Err(err) = rmdir(&staging) {
                log::warn!("{}", err);
            }
        }
        result
    }

    /// `{parent}/.{name}.{suffix}`, so renames stay on one filesystem.
    fn sibling(&self, suffix: &str) -> Result<PathBuf> {
        let name = self
            .output_directory
            .file_name()
            .ok_or_else(|| Error::InvalidOutputDirectory(self.output_directory.to_owned()))?;
        let parent = self
            .output_directory
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Ok(parent.join(format!(".{}.{}", name.to_string_lossy(), suffix)))
    }

    fn populate(&self, dir: &Path, artifacts: &[Artifact]) -> Result<()> {
        create_dir(&dir.join("posts"))?;
        for artifact in artifacts {
            let path = dir.join(&artifact.path);
            if let Some(parent) = path.parent() {
                create_dir(parent)?;
            }
            write_file(&path, artifact.contents.as_bytes())?;
        }
        self.copy_assets(dir)
    }

    /// Copies the stylesheet, the images directory and the root passthrough
    /// files. Missing assets are skipped; errors reading assets that do exist
    /// are not.
    fn copy_assets(&self, dir: &Path) -> Result<()> {
        let stylesheet = self.paths.stylesheet();
        if stylesheet.is_file() {
            let css = fs::read_to_string(&stylesheet).map_err(|err| Error::Read {
                path: stylesheet.clone(),
                err,
            })?;
            let css = match self.minify {
                true => minify::css(&css),
                false => css,
            };
            write_file(&dir.join("styles.css"), css.as_bytes())?;
        } else {
            log::debug!("no stylesheet at `{}`", stylesheet.display());
        }

        let images = self.paths.images_directory();
        if images.is_dir() {
            copy_dir(&images, &dir.join("images"))?;
        } else {
            log::debug!("no images directory at `{}`", images.display());
        }

        for file in self.paths.root_passthrough_files() {
            match file.file_name() {
                Some(name) if file.is_file() => copy_file(&file, &dir.join(name))?,
                _ => log::debug!("skipping missing asset `{}`", file.display()),
            }
        }
        Ok(())
    }
}

/// Moves `staging` to `output`. An existing `output` is first moved to
/// `previous` and only deleted once `staging` is in place; if that rename
/// fails, it is moved back.
fn swap(staging: &Path, output: &Path, previous: &Path) -> Result<()> {
    rmdir(previous)?;
    let had_previous = match fs::rename(output, previous) {
        Ok(()) => true,
        Err(err) if err.kind() == io::ErrorKind::NotFound => false,
        Err(err) => {
            return Err(Error::Write {
                path: output.to_owned(),
                err,
            })
        }
    };

    if let Err(err) = fs::rename(staging, output) {
        if had_previous {
            if let Err(restore) = fs::rename(previous, output) {
                log::error!(
                    "previous site left at `{}`: restoring it failed: {}",
                    previous.display(),
                    restore
                );
            }
        }
        return Err(Error::Write {
            path: output.to_owned(),
            err,
        });
    }

    if had_previous {
        if let Err(err) = rmdir(previous) {
            log::warn!("{}", err);
        }
    }
    Ok(())
}

fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    for result in WalkDir::new(src).sort_by_file_name() {
        let entry = result?;
        // strip_prefix() can't fail; every entry is below `src`
        let relative = match entry.path().strip_prefix(src) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            create_dir(&target)?;
        } else if entry.file_type().is_file() {
            copy_file(entry.path(), &target)?;
        }
    }
    Ok(())
}

fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    fs::copy(src, dst).map(|_| ()).map_err(|err| Error::Copy {
        src: src.to_owned(),
        dst: dst.to_owned(),
        err,
    })
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    fs::write(path, contents).map_err(|err| Error::Write {
        path: path.to_owned(),
        err,
    })
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|err| Error::Write {
        path: path.to_owned(),
        err,
    })
}

fn rmdir(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}

/// The result of a fallible output operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error writing the output directory.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the output path has no final component (e.g. `/`).
    #[error("invalid output directory `{}`", .0.display())]
    InvalidOutputDirectory(PathBuf),

    /// Returned when an old output or staging directory can't be removed.
    #[error("cleaning directory `{}`: {err}", path.display())]
    Clean { path: PathBuf, err: io::Error },

    /// Returned when a file or directory can't be created.
    #[error("writing `{}`: {err}", path.display())]
    Write { path: PathBuf, err: io::Error },

    /// Returned when an asset that exists can't be read.
    #[error("reading `{}`: {err}", path.display())]
    Read { path: PathBuf, err: io::Error },

    /// Returned when an asset that exists can't be copied.
    #[error("copying `{}` to `{}`: {err}", src.display(), dst.display())]
    Copy {
        src: PathBuf,
        dst: PathBuf,
        err: io::Error,
    },

    /// Returned when walking the images directory fails.
    #[error("copying images: {0}")]
    WalkDir(#[from] walkdir::Error),
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::TempDir;

    fn artifacts() -> Vec<Artifact> {
        vec![
            Artifact::new("index.html", "<p>index</p>"),
            Artifact::new("posts/hello.html", "<p>hello</p>"),
            Artifact::new("rss.xml", "<rss/>"),
        ]
    }

    #[test]
    fn test_write_site() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let root = TempDir::new()?;
        fs::write(root.path().join("styles.css"), "body {\n  margin: 0;\n}\n")?;
        fs::write(root.path().join("robots.txt"), "User-agent: *\n")?;
        fs::create_dir_all(root.path().join("images").join("icons"))?;
        fs::write(root.path().join("images").join("icons").join("a.png"), [1u8, 2, 3])?;

        let paths = Paths::new(root.path());
        let output = paths.output_directory();
        Writer {
            output_directory: &output,
            paths: &paths,
            minify: true,
        }
        .write_site(&artifacts())?;

        assert_eq!(fs::read_to_string(output.join("index.html"))?, "<p>index</p>");
        assert_eq!(fs::read_to_string(output.join("posts/hello.html"))?, "<p>hello</p>");
        assert_eq!(fs::read_to_string(output.join("styles.css"))?, "body{margin:0}");
        assert_eq!(fs::read_to_string(output.join("robots.txt"))?, "User-agent: *\n");
        assert_eq!(fs::read(output.join("images/icons/a.png"))?, vec![1u8, 2, 3]);
        assert!(!output.join("site.webmanifest").exists());
        assert!(!output.join("favicon.ico").exists());
        assert!(!root.path().join(".dist.staging").exists());
        Ok(())
    }

    #[test]
    fn test_write_site_replaces_stale_output() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let root = TempDir::new()?;
        let paths = Paths::new(root.path());
        let output = paths.output_directory();
        fs::create_dir_all(output.join("posts"))?;
        fs::write(output.join("posts").join("deleted.html"), "stale")?;

        Writer {
            output_directory: &output,
            paths: &paths,
            minify: false,
        }
        .write_site(&artifacts())?;

        assert!(!output.join("posts/deleted.html").exists());
        assert!(output.join("posts/hello.html").exists());
        Ok(())
    }

    #[test]
    fn test_failed_swap_restores_previous_output() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let root = TempDir::new()?;
        let output = root.path().join("dist");
        let previous = root.path().join(".dist.previous");
        fs::create_dir_all(&output)?;
        fs::write(output.join("index.html"), "previous")?;

        // The staging directory is gone, so moving it into place fails after
        // the old output has been moved aside.
        let result = swap(&root.path().join(".dist.staging"), &output, &previous);

        assert!(matches!(result, Err(Error::Write { .. })));
        assert_eq!(fs::read_to_string(output.join("index.html"))?, "previous");
        assert!(!previous.exists());
        Ok(())
    }

    #[test]
    fn test_swap() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let root = TempDir::new()?;
        let staging = root.path().join(".dist.staging");
        let output = root.path().join("dist");
        let previous = root.path().join(".dist.previous");
        fs::create_dir_all(&staging)?;
        fs::write(staging.join("index.html"), "new")?;

        swap(&staging, &output, &previous)?;
        assert_eq!(fs::read_to_string(output.join("index.html"))?, "new");

        fs::create_dir_all(&staging)?;
        fs::write(staging.join("index.html"), "newer")?;
        swap(&staging, &output, &previous)?;
        assert_eq!(fs::read_to_string(output.join("index.html"))?, "newer");
        assert!(!staging.exists());
        assert!(!previous.exists());
        Ok(())
    }

    #[test]
    fn test_failed_write_keeps_previous_output() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let root = TempDir::new()?;
        let paths = Paths::new(root.path());
        let output = paths.output_directory();
        fs::create_dir_all(&output)?;
        fs::write(output.join("index.html"), "previous")?;

        // `posts` is created as a directory first, so writing a file at the
        // same path fails.
        let result = Writer {
            output_directory: &output,
            paths: &paths,
            minify: false,
        }
        .write_site(&[Artifact::new("posts", "not a directory")]);

        assert!(matches!(result, Err(Error::Write { .. })));
        assert_eq!(fs::read_to_string(output.join("index.html"))?, "previous");
        assert!(!root.path().join(".dist.staging").exists());
        Ok(())
    }
}
