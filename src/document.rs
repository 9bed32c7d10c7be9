//! Defines the [`Document`], [`Paragraph`], and [`Run`] types, the in-memory
//! form of a source document once it has been read off disk. Documents are
//! read-only; they are built once by a reader ([`Document::from_text`] or
//! [`crate::docx::read`]) and consumed by [`crate::htmlrenderer`].

/// The style name given to paragraphs that carry no explicit style.
pub const NORMAL_STYLE: &str = "Normal";

/// A source document: an ordered sequence of [`Paragraph`]s.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Document {
    pub paragraphs: Vec<Paragraph>,
}

/// A single paragraph. The `style` is the paragraph's named style as the
/// author sees it (e.g., `Heading 1`, `List Bullet`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Paragraph {
    pub style: String,
    pub runs: Vec<Run>,
}

/// A contiguous span of text within a [`Paragraph`] sharing formatting.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
}

impl Run {
    /// Creates an unformatted run.
    pub fn plain(text: &str) -> Run {
        Run {
            text: text.to_owned(),
            ..Run::default()
        }
    }
}

impl Paragraph {
    /// Creates a paragraph with the given style name and runs.
    pub fn new(style: &str, runs: Vec<Run>) -> Paragraph {
        Paragraph {
            style: style.to_owned(),
            runs,
        }
    }

    /// The paragraph's full text, i.e., the concatenation of its runs.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// The first run of the paragraph, if any. Run-level formatting (bold,
    /// italic) is decided by this run alone.
    pub fn first_run(&self) -> Option<&Run> {
        self.runs.first()
    }
}

impl Document {
    /// Builds a document from plain text. Paragraphs are separated by one or
    /// more blank lines; the lines within a paragraph are joined with a
    /// single space. Every paragraph gets the [`NORMAL_STYLE`] and a single
    /// unformatted run.
    pub fn from_text(input: &str) -> Document {
        let mut paragraphs = Vec::new();
        let mut lines: Vec<&str> = Vec::new();

        let mut flush = |lines: &mut Vec<&str>| {
            if !lines.is_empty() {
                paragraphs.push(Paragraph::new(
                    NORMAL_STYLE,
                    vec![Run::plain(&lines.join(" "))],
                ));
                lines.clear();
            }
        };

        for line in input.lines() {
            let line = line.trim();
            if line.is_empty() {
                flush(&mut lines);
            } else {
                lines.push(line);
            }
        }
        flush(&mut lines);

        Document { paragraphs }
    }
}
