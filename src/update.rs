//! Exports the [`update_blog`] function which stitches together the steps of
//! a run: locating the most recent document ([`crate::locate`]), extracting
//! its content ([`crate::extract`]), wrapping it in a [`Card`], splicing the
//! card into the page ([`crate::page`]), and publishing the page with git
//! ([`crate::publish`]).

use crate::card::Card;
use crate::config::Config;
use crate::page::{Insertion, Page};
use crate::publish::{Git, PublishOutcome};
use crate::{extract, locate, page, publish};
use chrono::{Local, NaiveDate};
use log::{debug, info};
use std::fmt;
use std::path::{Path, PathBuf};

/// Per-run switches layered over the [`Config`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Options {
    /// Build and check the card but write nothing and run no git commands.
    pub dry_run: bool,

    /// Commit and push the page after writing it.
    pub publish: bool,
}

/// What a run did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// No document with the configured extension was found; nothing was
    /// touched.
    NoDocument,

    /// The document's card is already on the page, so the page wasn't
    /// rewritten. The page is still published if it has uncommitted changes
    /// left over from an earlier run; `published` is `None` when publishing
    /// was disabled.
    Duplicate {
        title: String,
        document: PathBuf,
        published: Option<PublishOutcome>,
    },

    /// A dry run: `card` is what would have been inserted.
    DryRun { title: String, card: String },

    /// The card was inserted and the page rewritten. `published` is `None`
    /// when publishing was disabled.
    Updated {
        title: String,
        document: PathBuf,
        published: Option<PublishOutcome>,
    },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Outcome::NoDocument => write!(f, "No matching documents found in the folder."),
            Outcome::Duplicate {
                title, published, ..
            } => {
                write!(f, "\"{}\" is already on the page", title)?;
                match published {
                    Some(PublishOutcome::Pushed) => {
                        write!(f, "; committed and pushed the pending page.")
                    }
                    _ => write!(f, "; nothing to do."),
                }
            }
            Outcome::DryRun { title, card } => {
                write!(f, "Dry run: would insert \"{}\":{}", title, card)
            }
            Outcome::Updated {
                document,
                published,
                ..
            } => {
                let name = document
                    .file_name()
                    .map(|n| n.to_string_lossy())
                    .unwrap_or_default();
                write!(f, "Blog updated with the most recent file: {}", name)?;
                match published {
                    Some(PublishOutcome::Pushed) => write!(f, " (committed and pushed)"),
                    Some(PublishOutcome::Clean) => write!(f, " (no changes to commit)"),
                    None => Ok(()),
                }
            }
        }
    }
}

/// Runs the whole pipeline with today's local date.
pub fn update_blog(config: &Config, options: &Options) -> Result<Outcome> {
    update_blog_on(config, options, Local::now().date_naive())
}

/// Runs the whole pipeline, stamping the card with `date`.
pub fn update_blog_on(config: &Config, options: &Options, date: NaiveDate) -> Result<Outcome> {
    let document = match locate::most_recent(&config.document_folder, &config.extension_filter)? {
        Some(document) => document,
        None => {
            info!(
                "no `.{}` files in `{}`",
                config.extension_filter,
                config.document_folder.display()
            );
            return Ok(Outcome::NoDocument);
        }
    };
    info!("most recent document: `{}`", document.display());

    let content = extract::extract(&document).map_err(|err| Error::Extract {
        path: document.clone(),
        err,
    })?;
    let card = Card::new(&document, date, content);
    debug!("card key {}", card.key());

    let html = std::fs::read_to_string(&config.page_path).map_err(|err| Error::Io {
        path: config.page_path.clone(),
        err,
    })?;
    let mut page = Page::parse(&html, &config.anchor_marker)?;

    let should_publish = options.publish && config.publish.enabled && !options.dry_run;

    if page.insert(&card)? == Insertion::Duplicate {
        info!("card for \"{}\" already on the page", card.title);
        let published = match should_publish {
            true => Some(publish_page(config)?),
            false => None,
        };
        return Ok(Outcome::Duplicate {
            title: card.title,
            document,
            published,
        });
    }

    if options.dry_run {
        return Ok(Outcome::DryRun {
            card: card.to_html().map_err(page::Error::from)?,
            title: card.title,
        });
    }

    std::fs::write(&config.page_path, page.render()).map_err(|err| Error::Io {
        path: config.page_path.clone(),
        err,
    })?;
    info!("wrote `{}`", config.page_path.display());

    let published = match should_publish {
        true => Some(publish_page(config)?),
        false => None,
    };

    Ok(Outcome::Updated {
        title: card.title,
        document,
        published,
    })
}

fn publish_page(config: &Config) -> Result<PublishOutcome> {
    let (work_dir, page) = split_page_path(&config.page_path);
    let git = Git {
        work_dir,
        remote: config.publish.remote.clone(),
        branch: config.publish.branch.clone(),
    };
    Ok(git.publish(&page, &config.publish.commit_message)?)
}

/// Splits the page path into the directory git runs in and the page's path
/// relative to it.
fn split_page_path(page_path: &Path) -> (PathBuf, PathBuf) {
    match (page_path.parent(), page_path.file_name()) {
        (Some(dir), Some(name)) if !dir.as_os_str().is_empty() => {
            (dir.to_owned(), PathBuf::from(name))
        }
        _ => (PathBuf::from("."), page_path.to_owned()),
    }
}

/// The result of a run.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for a run. Errors can come from scanning the document
/// folder, extracting the document, reading or writing the page, patching
/// the page, or publishing.
#[derive(Debug)]
pub enum Error {
    /// Returned when the document folder can't be scanned.
    Locate(locate::Error),

    /// Returned when the document can't be read or converted.
    Extract { path: PathBuf, err: extract::Error },

    /// Returned when the page can't be patched (e.g., missing anchor).
    Page(page::Error),

    /// Returned when git fails. The page has already been written.
    Publish(publish::Error),

    /// Returned for I/O errors on the page file.
    Io { path: PathBuf, err: std::io::Error },
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Locate(err) => err.fmt(f),
            Error::Extract { path, err } => {
                write!(f, "Extracting '{}': {}", path.display(), err)
            }
            Error::Page(err) => err.fmt(f),
            Error::Publish(err) => write!(f, "Publishing: {}", err),
            Error::Io { path, err } => write!(f, "Accessing page '{}': {}", path.display(), err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Locate(err) => Some(err),
            Error::Extract { path: _, err } => Some(err),
            Error::Page(err) => Some(err),
            Error::Publish(err) => Some(err),
            Error::Io { path: _, err } => Some(err),
        }
    }
}

impl From<locate::Error> for Error {
    /// Converts [`locate::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: locate::Error) -> Error {
        Error::Locate(err)
    }
}

impl From<page::Error> for Error {
    /// Converts [`page::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: page::Error) -> Error {
        Error::Page(err)
    }
}

impl From<publish::Error> for Error {
    /// Converts [`publish::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: publish::Error) -> Error {
        Error::Publish(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::PublishConfig;
    use crate::docx::fixture;

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    const ANCHOR: &str = r#"<div id="blog-content">"#;
    const PAGE: &str = "<html><body><div id=\"blog-content\"><p>older</p></div></body></html>";

    fn config(root: &Path, extension: &str) -> Config {
        Config {
            document_folder: root.join("docs"),
            page_path: root.join("Blog.html"),
            anchor_marker: ANCHOR.to_owned(),
            extension_filter: extension.to_owned(),
            publish: PublishConfig {
                enabled: false,
                remote: String::from("origin"),
                branch: None,
                commit_message: String::from("Update blog"),
            },
        }
    }

    fn options() -> Options {
        Options {
            dry_run: false,
            publish: true,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, 5).unwrap()
    }

    fn setup(root: &Path) -> std::io::Result<()> {
        std::fs::create_dir(root.join("docs"))?;
        std::fs::write(root.join("Blog.html"), PAGE)
    }

    #[test]
    fn test_update_inserts_card() -> TestResult {
        let dir = tempfile::tempdir()?;
        setup(dir.path())?;
        std::fs::write(
            dir.path().join("docs").join("My Post.docx"),
            fixture::docx(r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>Warning</w:t></w:r></w:p>"#),
        )?;
        let config = config(dir.path(), "docx");

        let outcome = update_blog_on(&config, &options(), date())?;
        assert_eq!(
            outcome,
            Outcome::Updated {
                title: String::from("My Post"),
                document: dir.path().join("docs").join("My Post.docx"),
                published: None,
            }
        );

        let html = std::fs::read_to_string(&config.page_path)?;
        let card = Card::new(Path::new("My Post.docx"), date(), String::from("<b>Warning</b>"));
        assert_eq!(
            html,
            PAGE.replacen(ANCHOR, &format!("{}{}", ANCHOR, card.to_html()?), 1)
        );
        assert!(html.contains("<h5>Oct 05, 2024</h5>"));
        Ok(())
    }

    #[test]
    fn test_rerun_is_duplicate() -> TestResult {
        let dir = tempfile::tempdir()?;
        setup(dir.path())?;
        std::fs::write(dir.path().join("docs").join("note.txt"), "Hello")?;
        let config = config(dir.path(), "txt");

        update_blog_on(&config, &options(), date())?;
        let once = std::fs::read_to_string(&config.page_path)?;

        let later = NaiveDate::from_ymd_opt(2024, 10, 6).unwrap();
        let outcome = update_blog_on(&config, &options(), later)?;
        assert_eq!(
            outcome,
            Outcome::Duplicate {
                title: String::from("note"),
                document: dir.path().join("docs").join("note.txt"),
                published: None,
            }
        );
        assert_eq!(std::fs::read_to_string(&config.page_path)?, once);
        Ok(())
    }

    #[test]
    fn test_no_document() -> TestResult {
        let dir = tempfile::tempdir()?;
        setup(dir.path())?;
        std::fs::write(dir.path().join("docs").join("note.txt"), "Hello")?;
        let config = config(dir.path(), "docx");

        assert_eq!(update_blog_on(&config, &options(), date())?, Outcome::NoDocument);
        assert_eq!(std::fs::read_to_string(&config.page_path)?, PAGE);
        Ok(())
    }

    #[test]
    fn test_missing_anchor_leaves_page() -> TestResult {
        let dir = tempfile::tempdir()?;
        setup(dir.path())?;
        std::fs::write(dir.path().join("docs").join("note.txt"), "Hello")?;
        let mut config = config(dir.path(), "txt");
        config.anchor_marker = String::from("<main>");

        assert!(matches!(
            update_blog_on(&config, &options(), date()),
            Err(Error::Page(page::Error::AnchorNotFound(_)))
        ));
        assert_eq!(std::fs::read_to_string(&config.page_path)?, PAGE);
        Ok(())
    }

    #[test]
    fn test_dry_run_writes_nothing() -> TestResult {
        let dir = tempfile::tempdir()?;
        setup(dir.path())?;
        std::fs::write(dir.path().join("docs").join("note.txt"), "Hello")?;
        let config = config(dir.path(), "txt");
        let options = Options {
            dry_run: true,
            publish: true,
        };

        match update_blog_on(&config, &options, date())? {
            Outcome::DryRun { title, card } => {
                assert_eq!(title, "note");
                assert!(card.contains("<p>Hello</p>"));
            }
            other => panic!("expected dry run, got {:?}", other),
        }
        assert_eq!(std::fs::read_to_string(&config.page_path)?, PAGE);
        Ok(())
    }

    #[test]
    fn test_extract_failure_aborts() -> TestResult {
        let dir = tempfile::tempdir()?;
        setup(dir.path())?;
        std::fs::write(dir.path().join("docs").join("broken.docx"), "not a zip")?;
        let config = config(dir.path(), "docx");

        assert!(matches!(
            update_blog_on(&config, &options(), date()),
            Err(Error::Extract { .. })
        ));
        assert_eq!(std::fs::read_to_string(&config.page_path)?, PAGE);
        Ok(())
    }

    fn git_available() -> bool {
        std::process::Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn git(dir: &Path, args: &[&str]) -> std::result::Result<String, Box<dyn std::error::Error>> {
        let output = std::process::Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()?;
        if !output.status.success() {
            return Err(format!(
                "git {:?}: {}",
                args,
                String::from_utf8_lossy(&output.stderr)
            )
            .into());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Creates a bare remote and a working tree holding the committed page
    /// and an empty `docs` folder. Returns the working tree.
    fn setup_repo(root: &Path) -> std::result::Result<PathBuf, Box<dyn std::error::Error>> {
        let remote = root.join("remote.git");
        let work = root.join("work");
        std::fs::create_dir(&remote)?;
        std::fs::create_dir(&work)?;
        git(&remote, &["init", "--bare", "-q"])?;
        git(&work, &["init", "-q"])?;
        git(&work, &["config", "user.name", "Test"])?;
        git(&work, &["config", "user.email", "test@example.com"])?;
        git(&work, &["config", "commit.gpgsign", "false"])?;
        git(&work, &["remote", "add", "origin", &remote.to_string_lossy()])?;
        setup(&work)?;
        git(&work, &["add", "Blog.html"])?;
        git(&work, &["commit", "-q", "-m", "init"])?;
        git(&work, &["push", "-q", "origin", "HEAD"])?;
        Ok(work)
    }

    fn publishing_config(work: &Path, extension: &str) -> Config {
        let mut config = config(work, extension);
        config.publish.enabled = true;
        config.publish.branch = Some(String::from("HEAD"));
        config
    }

    #[test]
    fn test_update_publishes_page() -> TestResult {
        if !git_available() {
            return Ok(());
        }
        let dir = tempfile::tempdir()?;
        let work = setup_repo(dir.path())?;
        std::fs::write(work.join("docs").join("note.txt"), "Hello")?;
        let config = publishing_config(&work, "txt");

        assert_eq!(
            update_blog_on(&config, &options(), date())?,
            Outcome::Updated {
                title: String::from("note"),
                document: work.join("docs").join("note.txt"),
                published: Some(PublishOutcome::Pushed),
            }
        );
        assert_eq!(git(&work, &["log", "-1", "--format=%s"])?.trim(), "Update blog");
        assert_eq!(
            git(&work, &["rev-parse", "HEAD"])?,
            git(&dir.path().join("remote.git"), &["rev-parse", "HEAD"])?
        );
        assert!(git(&work, &["status", "--porcelain", "--", "Blog.html"])?.is_empty());
        Ok(())
    }

    #[test]
    fn test_no_document_runs_no_git() -> TestResult {
        if !git_available() {
            return Ok(());
        }
        let dir = tempfile::tempdir()?;
        let work = setup_repo(dir.path())?;
        std::fs::write(work.join("docs").join("note.txt"), "Hello")?;
        let config = publishing_config(&work, "docx");
        let head = git(&work, &["rev-parse", "HEAD"])?;

        assert_eq!(update_blog_on(&config, &options(), date())?, Outcome::NoDocument);
        assert_eq!(git(&work, &["rev-parse", "HEAD"])?, head);
        assert_eq!(std::fs::read_to_string(&config.page_path)?, PAGE);
        Ok(())
    }

    #[test]
    fn test_rerun_publishes_pending_page() -> TestResult {
        if !git_available() {
            return Ok(());
        }
        let dir = tempfile::tempdir()?;
        let work = setup_repo(dir.path())?;
        std::fs::write(work.join("docs").join("note.txt"), "Hello")?;

        // The first run writes the page but leaves it uncommitted.
        let offline = config(&work, "txt");
        assert!(matches!(
            update_blog_on(&offline, &options(), date())?,
            Outcome::Updated { published: None, .. }
        ));
        assert!(!git(&work, &["status", "--porcelain", "--", "Blog.html"])?.is_empty());
        let written = std::fs::read_to_string(&offline.page_path)?;

        let config = publishing_config(&work, "txt");
        assert_eq!(
            update_blog_on(&config, &options(), date())?,
            Outcome::Duplicate {
                title: String::from("note"),
                document: work.join("docs").join("note.txt"),
                published: Some(PublishOutcome::Pushed),
            }
        );
        assert_eq!(std::fs::read_to_string(&config.page_path)?, written);
        assert!(git(&work, &["status", "--porcelain", "--", "Blog.html"])?.is_empty());
        assert_eq!(
            git(&work, &["rev-parse", "HEAD"])?,
            git(&dir.path().join("remote.git"), &["rev-parse", "HEAD"])?
        );

        // Nothing is left to publish on the next run.
        assert_eq!(
            update_blog_on(&config, &options(), date())?,
            Outcome::Duplicate {
                title: String::from("note"),
                document: work.join("docs").join("note.txt"),
                published: Some(PublishOutcome::Clean),
            }
        );
        Ok(())
    }

    #[test]
    fn test_duplicate_dry_run_runs_no_git() -> TestResult {
        if !git_available() {
            return Ok(());
        }
        let dir = tempfile::tempdir()?;
        let work = setup_repo(dir.path())?;
        std::fs::write(work.join("docs").join("note.txt"), "Hello")?;
        update_blog_on(&config(&work, "txt"), &options(), date())?;
        let head = git(&work, &["rev-parse", "HEAD"])?;

        let options = Options {
            dry_run: true,
            publish: true,
        };
        assert!(matches!(
            update_blog_on(&publishing_config(&work, "txt"), &options, date())?,
            Outcome::Duplicate { published: None, .. }
        ));
        assert_eq!(git(&work, &["rev-parse", "HEAD"])?, head);
        Ok(())
    }

    #[test]
    fn test_split_page_path() {
        assert_eq!(
            split_page_path(Path::new("/site/Blog.html")),
            (PathBuf::from("/site"), PathBuf::from("Blog.html"))
        );
        assert_eq!(
            split_page_path(Path::new("Blog.html")),
            (PathBuf::from("."), PathBuf::from("Blog.html"))
        );
    }
}
