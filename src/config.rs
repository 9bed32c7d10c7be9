//! Loads the [`Config`] from a `blogsplice.yaml` project file. Every key is
//! optional; relative paths are resolved against the directory containing
//! the project file.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// The name of the project file searched for by [`Config::from_directory`].
pub const PROJECT_FILE: &str = "blogsplice.yaml";

const DEFAULT_ANCHOR: &str = r#"<div id="blog-content">"#;
const DEFAULT_COMMIT_MESSAGE: &str = "Update blog with new post";

#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Project {
    document_folder: PathBuf,
    page_path: PathBuf,
    anchor_marker: String,
    extension: String,
    publish: Publish,
}

impl Default for Project {
    fn default() -> Self {
        Project {
            document_folder: PathBuf::from("docx_files"),
            page_path: PathBuf::from("Blog.html"),
            anchor_marker: DEFAULT_ANCHOR.to_owned(),
            extension: String::from("docx"),
            publish: Publish::default(),
        }
    }
}

#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Publish {
    enabled: bool,
    remote: String,
    branch: Option<String>,
    commit_message: String,
}

impl Default for Publish {
    fn default() -> Self {
        Publish {
            enabled: true,
            remote: String::from("origin"),
            branch: None,
            commit_message: DEFAULT_COMMIT_MESSAGE.to_owned(),
        }
    }
}

/// The resolved configuration for a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// The folder scanned for the most recent document.
    pub document_folder: PathBuf,

    /// The HTML page cards are inserted into.
    pub page_path: PathBuf,

    /// The literal text after which cards are inserted.
    pub anchor_marker: String,

    /// The extension of candidate documents, without the leading `.`.
    pub extension_filter: String,

    pub publish: PublishConfig,
}

/// Where and how the updated page is committed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishConfig {
    pub enabled: bool,
    pub remote: String,
    pub branch: Option<String>,
    pub commit_message: String,
}

impl Config {
    /// Searches `dir` and its ancestors for a `blogsplice.yaml` and loads the
    /// first one found. Returns `Ok(None)` if there is none.
    pub fn from_directory(dir: &Path) -> Result<Option<Config>> {
        let path = dir.join(PROJECT_FILE);
        if path.is_file() {
            Config::from_project_file(&path).map(Some)
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent),
                None => Ok(None),
            }
        }
    }

    /// Loads the project file at `path`.
    pub fn from_project_file(path: &Path) -> Result<Config> {
        let file = std::fs::File::open(path).map_err(|err| Error::Open {
            path: path.to_owned(),
            err,
        })?;
        let project: Project = serde_yaml::from_reader(file).map_err(|err| Error::Parse {
            path: path.to_owned(),
            err,
        })?;
        let root = match path.parent() {
            Some(root) => root,
            None => return Err(Error::NoParent(path.to_owned())),
        };
        Ok(Config::from_project(project, root))
    }

    /// The default configuration, with paths resolved against `root`.
    pub fn with_defaults(root: &Path) -> Config {
        Config::from_project(Project::default(), root)
    }

    fn from_project(project: Project, root: &Path) -> Config {
        Config {
            document_folder: root.join(project.document_folder),
            page_path: root.join(project.page_path),
            anchor_marker: project.anchor_marker,
            extension_filter: project.extension.trim_start_matches('.').to_owned(),
            publish: PublishConfig {
                enabled: project.publish.enabled,
                remote: project.publish.remote,
                branch: project.publish.branch,
                commit_message: project.publish.commit_message,
            },
        }
    }
}

/// The result of loading configuration.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading the project file.
#[derive(Debug)]
pub enum Error {
    /// Returned when the project file can't be opened.
    Open { path: PathBuf, err: std::io::Error },

    /// Returned when the project file isn't valid YAML or has unknown keys.
    Parse {
        path: PathBuf,
        err: serde_yaml::Error,
    },

    /// Returned when the project file path has no parent directory.
    NoParent(PathBuf),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Open { path, err } => {
                write!(f, "Opening project file '{}': {}", path.display(), err)
            }
            Error::Parse { path, err } => {
                write!(f, "Loading configuration '{}': {}", path.display(), err)
            }
            Error::NoParent(path) => write!(
                f,
                "Can't get parent directory for provided project file path '{}'",
                path.display()
            ),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Open { path: _, err } => Some(err),
            Error::Parse { path: _, err } => Some(err),
            Error::NoParent(_) => None,
        }
    }
}
