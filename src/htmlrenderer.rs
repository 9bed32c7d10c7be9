//! Renders a [`Document`] into an HTML fragment. Each paragraph is
//! classified by its style name and first run, and a small amount of state
//! tracks whether a `<ul>` or `<ol>` block is currently open so that runs of
//! list paragraphs share a single list element.
//!
//! Classification, first match wins:
//!
//! 1. `Heading*` style: `<hN>`, demoted one level (the card title is the
//!    page's `<h2>`).
//! 2. `List Bullet*` style: `<li>` inside a `<ul>`.
//! 3. `List Number*` style: `<li>` inside an `<ol>`.
//! 4. Text containing `N) ` markers: a self-contained `<ol>`.
//! 5. Bold first run: `<b>`.
//! 6. Italic first run: `<i>`.
//! 7. Anything else: `<p>`.

use crate::document::{Document, Paragraph};
use pulldown_cmark::escape::escape_html;
use regex::Regex;
use std::fmt;
use std::io;

const INLINE_LIST_PATTERN: &str = r"(\d+)\)\s+";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    fn open(self) -> &'static str {
        match self {
            ListKind::Unordered => "<ul>",
            ListKind::Ordered => "<ol>",
        }
    }

    fn close(self) -> &'static str {
        match self {
            ListKind::Unordered => "</ul>",
            ListKind::Ordered => "</ol>",
        }
    }
}

/// How a single paragraph is rendered.
#[derive(Debug, PartialEq, Eq)]
enum Block {
    Heading(u32),
    ListItem(ListKind),
    InlineList,
    Bold,
    Italic,
    Plain,
}

/// Renders [`Paragraph`]s into HTML fragments. See the module docs for the
/// classification rules.
pub struct HtmlRenderer {
    /// The list block currently open, if any.
    list: Option<ListKind>,

    /// Matches inline `N) ` list markers.
    inline_list: Regex,

    /// Rendered fragments, in document order.
    fragments: Vec<String>,
}

impl HtmlRenderer {
    pub fn new() -> Result<Self> {
        Ok(HtmlRenderer {
            list: None,
            inline_list: Regex::new(INLINE_LIST_PATTERN)?,
            fragments: Vec::new(),
        })
    }

    /// Renders a whole [`Document`], returning the fragments joined by
    /// newlines.
    pub fn render(document: &Document) -> Result<String> {
        let mut renderer = HtmlRenderer::new()?;
        for paragraph in &document.paragraphs {
            renderer.on_paragraph(paragraph)?;
        }
        Ok(renderer.finish())
    }

    /// Closes any list still open and joins the fragments.
    pub fn finish(mut self) -> String {
        self.close_list();
        self.fragments.join("\n")
    }

    pub fn on_paragraph(&mut self, paragraph: &Paragraph) -> Result<()> {
        let text = paragraph.text();
        if text.trim().is_empty() {
            return Ok(());
        }

        let block = self.classify(paragraph, &text);
        if let Block::ListItem(kind) = block {
            if self.list != Some(kind) {
                self.close_list();
                self.fragments.push(kind.open().to_owned());
                self.list = Some(kind);
            }
        } else {
            self.close_list();
        }

        match block {
            Block::ListItem(_) => self.fragments.push(format!("<li>{}</li>", escape(&text)?)),
            Block::Heading(level) => self
                .fragments
                .push(format!("<h{0}>{1}</h{0}>", level, escape(&text)?)),
            Block::InlineList => self.on_inline_list(&text)?,
            Block::Bold => self.fragments.push(format!("<b>{}</b>", escape(&text)?)),
            Block::Italic => self.fragments.push(format!("<i>{}</i>", escape(&text)?)),
            Block::Plain => self.fragments.push(format!("<p>{}</p>", escape(&text)?)),
        }
        Ok(())
    }

    fn classify(&self, paragraph: &Paragraph, text: &str) -> Block {
        let style = paragraph.style.as_str();
        if let Some(level) = style.strip_prefix("Heading") {
            // `Heading 1` => `<h2>`, kept within `<h2>`..`<h6>`.
            let level = level.trim().parse::<u32>().unwrap_or(1);
            return Block::Heading(level.saturating_add(1).clamp(2, 6));
        }
        if style.starts_with("List Bullet") {
            return Block::ListItem(ListKind::Unordered);
        }
        if style.starts_with("List Number") {
            return Block::ListItem(ListKind::Ordered);
        }
        if self.inline_list.is_match(text) {
            return Block::InlineList;
        }
        match paragraph.first_run() {
            Some(run) if run.bold => Block::Bold,
            Some(run) if run.italic => Block::Italic,
            _ => Block::Plain,
        }
    }

    /// Renders text like `Steps: 1) mix 2) bake` as a lead-in paragraph
    /// followed by an ordered list with one item per marker.
    fn on_inline_list(&mut self, text: &str) -> Result<()> {
        let markers: Vec<(usize, usize, &str)> = self
            .inline_list
            .captures_iter(text)
            .filter_map(|c| {
                let whole = c.get(0)?;
                Some((whole.start(), whole.end(), c.get(1)?.as_str()))
            })
            .collect();

        let (first_start, _, first_number) = match markers.first() {
            Some(first) => *first,
            None => return Ok(()),
        };

        let lead = text[..first_start].trim();
        if !lead.is_empty() {
            self.fragments.push(format!("<p>{}</p>", escape(lead)?));
        }

        let mut list = match first_number.parse::<u64>() {
            Ok(1) => String::from("<ol>"),
            _ => format!(r#"<ol start="{}">"#, first_number),
        };
        for (i, (_, end, _)) in markers.iter().enumerate() {
            let stop = markers.get(i + 1).map_or(text.len(), |next| next.0);
            list.push_str(&format!("<li>{}</li>", escape(text[*end..stop].trim())?));
        }
        list.push_str("</ol>");
        self.fragments.push(list);
        Ok(())
    }

    fn close_list(&mut self) {
        if let Some(kind) = self.list.take() {
            self.fragments.push(kind.close().to_owned());
        }
    }
}

/// Escapes HTML metacharacters and replaces every non-ASCII character with a
/// decimal character reference.
pub fn escape(text: &str) -> io::Result<String> {
    let mut escaped = String::with_capacity(text.len());
    escape_html(&mut escaped, text)?;
    if escaped.is_ascii() {
        return Ok(escaped);
    }

    let mut out = String::with_capacity(escaped.len() + 16);
    for c in escaped.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            out.push_str(&format!("&#{};", c as u32));
        }
    }
    Ok(out)
}

/// The result of a fallible rendering operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error rendering a [`Document`].
#[derive(Debug)]
pub enum Error {
    /// Returned when the inline list pattern fails to compile.
    Regex(regex::Error),

    /// Returned when escaping text fails.
    Io(io::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Regex(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
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

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}
