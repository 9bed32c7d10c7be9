//! Defines the [`Card`] type: the HTML fragment for one blog post, holding a
//! title, a date, and the extracted content.

use crate::htmlrenderer::escape;
use chrono::NaiveDate;
use sha2::{Digest, Sha256};
use std::io;
use std::path::Path;

/// The format of the date shown on a card, e.g. `Oct 16, 2026`.
pub const DATE_FORMAT: &str = "%b %d, %Y";

/// One blog post ready to be spliced into the page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Card {
    pub title: String,
    pub date: NaiveDate,

    /// The post body as an HTML fragment. Inserted verbatim.
    pub content: String,
}

impl Card {
    /// Builds a card for the document at `path`. The title is derived from
    /// the file name (see [`title_from_path`]).
    pub fn new(path: &Path, date: NaiveDate, content: String) -> Card {
        Card {
            title: title_from_path(path),
            date,
            content,
        }
    }

    /// The card's idempotency key: the hex SHA-256 of the title and content.
    /// The date is not part of the key.
    pub fn key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.title.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.content.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Renders the card into its fixed HTML template. The result begins and
    /// ends with a newline so it can be dropped directly after an anchor.
    pub fn to_html(&self) -> io::Result<String> {
        Ok(format!(
            "\n<div class=\"card\" data-post-key=\"{key}\">\n    <h2>{title}</h2>\n    <h5>{date}</h5>\n    {content}\n</div>\n",
            key = self.key(),
            title = escape(&self.title)?,
            date = self.date.format(DATE_FORMAT),
            content = self.content,
        ))
    }
}

/// Returns the base name of `path` without its final extension, e.g.
/// `docs/My Post.docx` becomes `My Post`.
pub fn title_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
