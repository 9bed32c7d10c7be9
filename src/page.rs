//! Defines the [`Page`] type, the structured view of the blog page that
//! cards are inserted into. The page is split at the first occurrence of the
//! anchor marker into a head (including the anchor) and a tail; new cards
//! are kept in order between the two until the page is rendered.

use crate::card::Card;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;

/// Matches the idempotency key rendered on each card.
const POST_KEY_PATTERN: &str = r#"data-post-key="([0-9a-f]+)""#;

/// The blog page, split around its anchor marker.
#[derive(Debug)]
pub struct Page {
    /// Everything up to and including the anchor.
    head: String,

    /// Cards inserted since the page was parsed, newest first.
    cards: Vec<String>,

    /// Everything after the anchor.
    tail: String,

    /// Keys of every card on the page, existing or inserted.
    keys: HashSet<String>,
}

/// The result of [`Page::insert`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Insertion {
    /// The card was placed immediately after the anchor.
    Inserted,

    /// A card with the same key is already on the page; nothing changed.
    Duplicate,
}

impl Page {
    /// Splits `html` at the first occurrence of `anchor`. Fails with
    /// [`Error::AnchorNotFound`] if the anchor is empty or absent.
    pub fn parse(html: &str, anchor: &str) -> Result<Page> {
        let index = match anchor.is_empty() {
            true => None,
            false => html.find(anchor),
        }
        .ok_or_else(|| Error::AnchorNotFound(anchor.to_owned()))?;
        let split = index + anchor.len();

        let pattern = Regex::new(POST_KEY_PATTERN)?;
        let keys = pattern
            .captures_iter(html)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().to_owned())
            .collect();

        Ok(Page {
            head: html[..split].to_owned(),
            cards: Vec::new(),
            tail: html[split..].to_owned(),
            keys,
        })
    }

    /// Whether a card with `key` is already on the page.
    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Inserts `card` directly after the anchor unless a card with the same
    /// key is already present.
    pub fn insert(&mut self, card: &Card) -> Result<Insertion> {
        if !self.keys.insert(card.key()) {
            return Ok(Insertion::Duplicate);
        }
        self.cards.insert(0, card.to_html()?);
        Ok(Insertion::Inserted)
    }

    /// Whether any card has been inserted since the page was parsed.
    pub fn is_modified(&self) -> bool {
        !self.cards.is_empty()
    }

    /// Renders the page back into a single string.
    pub fn render(&self) -> String {
        let cards_len: usize = self.cards.iter().map(String::len).sum();
        let mut out = String::with_capacity(self.head.len() + cards_len + self.tail.len());
        out.push_str(&self.head);
        for card in &self.cards {
            out.push_str(card);
        }
        out.push_str(&self.tail);
        out
    }
}

/// The result of a page operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error patching the page.
#[derive(Debug)]
pub enum Error {
    /// Returned when the anchor marker isn't in the page.
    AnchorNotFound(String),

    /// Returned when the post key pattern fails to compile.
    Regex(regex::Error),

    /// Returned when rendering a card fails.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::AnchorNotFound(anchor) => {
                write!(f, "Anchor marker '{}' not found in page", anchor)
            }
            Error::Regex(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::AnchorNotFound(_) => None,
            Error::Regex(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Error {
        Error::Regex(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
