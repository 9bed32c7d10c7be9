//! Publishes the page by shelling out to `git`: status, add, commit, push.
//! Nothing is retried and nothing is rolled back; a failed push leaves the
//! local commit in place.

use log::{debug, info};
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

/// A git working tree and where to push it.
#[derive(Clone, Debug)]
pub struct Git {
    /// The directory git commands run in.
    pub work_dir: PathBuf,

    /// The remote to push to, e.g. `origin`.
    pub remote: String,

    /// The branch to push. When `None`, git's configured default applies.
    pub branch: Option<String>,
}

/// The result of [`Git::publish`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The page had no uncommitted changes; nothing was run beyond `status`.
    Clean,

    /// The page was committed and pushed.
    Pushed,
}

impl Git {
    /// Commits `page` with `message` and pushes it, if and only if `page`
    /// has uncommitted changes.
    pub fn publish(&self, page: &Path, message: &str) -> Result<PublishOutcome> {
        let page = page.as_os_str();
        let status = self.run(&[OsStr::new("status"), OsStr::new("--porcelain"), OsStr::new("--"), page])?;
        if status.trim().is_empty() {
            info!("no changes to `{}`; nothing to publish", page.to_string_lossy());
            return Ok(PublishOutcome::Clean);
        }

        self.run(&[OsStr::new("add"), OsStr::new("--"), page])?;
        self.run(&[
            OsStr::new("commit"),
            OsStr::new("-m"),
            OsStr::new(message),
            OsStr::new("--"),
            page,
        ])?;

        let mut push = vec![OsStr::new("push"), OsStr::new(&self.remote)];
        if let Some(branch) = &self.branch {
            push.push(OsStr::new(branch));
        }
        self.run(&push)?;

        info!("pushed `{}` to {}", page.to_string_lossy(), self.remote);
        Ok(PublishOutcome::Pushed)
    }

    /// Runs `git` with `args` in the working directory, returning stdout.
    fn run(&self, args: &[&OsStr]) -> Result<String> {
        let command = args
            .iter()
            .map(|arg| arg.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ");
        debug!("running `git {}` in `{}`", command, self.work_dir.display());

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.work_dir)
            .output()
            .map_err(|err| Error::Spawn {
                command: command.clone(),
                err,
            })?;

        if !output.status.success() {
            let mut message = String::from_utf8_lossy(&output.stderr).into_owned();
            if message.trim().is_empty() {
                message = String::from_utf8_lossy(&output.stdout).into_owned();
            }
            return Err(Error::Command {
                command,
                status: output.status,
                output: message.trim_end().to_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// The result of a publish operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error running git.
#[derive(Debug)]
pub enum Error {
    /// Returned when `git` can't be started at all.
    Spawn { command: String, err: std::io::Error },

    /// Returned when a git command exits unsuccessfully.
    Command {
        command: String,
        status: ExitStatus,
        output: String,
    },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Spawn { command, err } => write!(f, "Running 'git {}': {}", command, err),
            Error::Command {
                command,
                status,
                output,
            } => write!(f, "'git {}' failed ({}): {}", command, status, output),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Spawn { command: _, err } => Some(err),
            Error::Command { .. } => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn git(dir: &Path, args: &[&str]) -> std::result::Result<String, Box<dyn std::error::Error>> {
        let output = Command::new("git").args(args).current_dir(dir).output()?;
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

    /// Creates a bare remote and a clone of it with one commit.
    fn setup(root: &Path) -> std::result::Result<PathBuf, Box<dyn std::error::Error>> {
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
        std::fs::write(work.join("Blog.html"), "<div id=\"blog-content\"></div>")?;
        git(&work, &["add", "Blog.html"])?;
        git(&work, &["commit", "-q", "-m", "init"])?;
        git(&work, &["push", "-q", "origin", "HEAD"])?;
        Ok(work)
    }

    #[test]
    fn test_publish_commits_and_pushes() -> TestResult {
        if !git_available() {
            return Ok(());
        }
        let dir = tempfile::tempdir()?;
        let work = setup(dir.path())?;
        let publisher = Git {
            work_dir: work.clone(),
            remote: String::from("origin"),
            branch: Some(String::from("HEAD")),
        };

        assert_eq!(
            publisher.publish(Path::new("Blog.html"), "Update blog")?,
            PublishOutcome::Clean
        );

        std::fs::write(work.join("Blog.html"), "<div id=\"blog-content\">new</div>")?;
        std::fs::write(work.join("unrelated.txt"), "untracked")?;
        assert_eq!(
            publisher.publish(Path::new("Blog.html"), "Update blog")?,
            PublishOutcome::Pushed
        );

        assert_eq!(git(&work, &["log", "-1", "--format=%s"])?.trim(), "Update blog");
        assert_eq!(
            git(&work, &["rev-parse", "HEAD"])?,
            git(&dir.path().join("remote.git"), &["rev-parse", "HEAD"])?
        );
        assert!(git(&work, &["status", "--porcelain"])?.contains("unrelated.txt"));
        Ok(())
    }

    #[test]
    fn test_push_failure_is_reported() -> TestResult {
        if !git_available() {
            return Ok(());
        }
        let dir = tempfile::tempdir()?;
        let work = setup(dir.path())?;
        let publisher = Git {
            work_dir: work.clone(),
            remote: String::from("nowhere"),
            branch: None,
        };

        std::fs::write(work.join("Blog.html"), "changed")?;
        match publisher.publish(Path::new("Blog.html"), "Update blog") {
            Err(Error::Command { command, .. }) => assert!(command.starts_with("push")),
            other => panic!("expected push failure, got {:?}", other),
        }
        // The local commit stays.
        assert_eq!(git(&work, &["log", "-1", "--format=%s"])?.trim(), "Update blog");
        Ok(())
    }
}
