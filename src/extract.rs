//! Converts a source file into an HTML fragment, dispatching on the file's
//! extension:
//!
//! * `.docx` is read with [`crate::docx`] and rendered with
//!   [`HtmlRenderer`].
//! * `.txt` is split into paragraphs with [`Document::from_text`] and
//!   rendered with [`HtmlRenderer`].
//! * `.md` and `.markdown` are converted with [`crate::markdown`].

use crate::document::Document;
use crate::htmlrenderer::{self, HtmlRenderer};
use crate::{docx, markdown};
use log::debug;
use std::fmt;
use std::path::{Path, PathBuf};

/// The source formats we know how to extract.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Docx,
    Text,
    Markdown,
}

impl Format {
    /// Determines the format from a path's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Format> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "docx" => Some(Format::Docx),
            "txt" => Some(Format::Text),
            "md" | "markdown" => Some(Format::Markdown),
            _ => None,
        }
    }
}

/// Reads the file at `path` and returns its content as an HTML fragment.
pub fn extract(path: &Path) -> Result<String> {
    let format = Format::from_path(path).ok_or_else(|| Error::UnsupportedFormat(path.to_owned()))?;
    debug!("extracting `{}` as {:?}", path.display(), format);

    match format {
        Format::Docx => Ok(HtmlRenderer::render(&docx::read(path)?)?),
        Format::Text => {
            let contents = std::fs::read_to_string(path)?;
            Ok(HtmlRenderer::render(&Document::from_text(&contents))?)
        }
        Format::Markdown => {
            let contents = std::fs::read_to_string(path)?;
            let mut html = String::new();
            markdown::to_html(&mut html, &contents);
            Ok(html.trim_end().to_owned())
        }
    }
}

/// The result of an extraction.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error extracting content from a source file.
#[derive(Debug)]
pub enum Error {
    /// Returned when the file's extension isn't one of the supported
    /// [`Format`]s.
    UnsupportedFormat(PathBuf),

    /// Returned for errors reading `.docx` files.
    Docx(docx::Error),

    /// Returned for errors rendering a document as HTML.
    Render(htmlrenderer::Error),

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnsupportedFormat(path) => {
                write!(f, "Unsupported document format '{}'", path.display())
            }
            Error::Docx(err) => err.fmt(f),
            Error::Render(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::UnsupportedFormat(_) => None,
            Error::Docx(err) => Some(err),
            Error::Render(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<docx::Error> for Error {
    fn from(err: docx::Error) -> Error {
        Error::Docx(err)
    }
}

impl From<htmlrenderer::Error> for Error {
    fn from(err: htmlrenderer::Error) -> Error {
        Error::Render(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
