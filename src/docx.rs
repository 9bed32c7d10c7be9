//! Reads `.docx` files into [`Document`]s. A `.docx` file is a zip archive;
//! the paragraphs live in `word/document.xml` and the human-readable style
//! names live in `word/styles.xml`.

use crate::document::{Document, Paragraph, Run, NORMAL_STYLE};
use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

const DOCUMENT_PART: &str = "word/document.xml";
const STYLES_PART: &str = "word/styles.xml";

/// Opens the `.docx` file at `path` and reads its body paragraphs.
pub fn read(path: &Path) -> Result<Document> {
    from_reader(File::open(path)?)
}

/// Reads a `.docx` archive from any seekable reader.
pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Document> {
    let mut archive = zip::ZipArchive::new(reader)?;

    let styles = match read_part(&mut archive, STYLES_PART)? {
        Some(xml) => Styles::parse(&xml)?,
        None => {
            debug!("`{}` missing; using raw style ids", STYLES_PART);
            Styles::default()
        }
    };
    let document =
        read_part(&mut archive, DOCUMENT_PART)?.ok_or(Error::MissingPart(DOCUMENT_PART))?;

    parse_document(&document, &styles)
}

fn read_part<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    name: &str,
) -> Result<Option<String>> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    Ok(Some(contents))
}

/// Maps paragraph style ids (as referenced by `w:pStyle`) to the style names
/// shown to the author.
#[derive(Debug, Default)]
struct Styles {
    names: HashMap<String, String>,
    default_paragraph: Option<String>,
}

impl Styles {
    fn parse(xml: &str) -> Result<Styles> {
        let mut reader = Reader::from_str(xml);
        let mut styles = Styles::default();
        let mut buf = Vec::new();

        // (style id, is default paragraph style) of the `w:style` we're in.
        let mut current: Option<(String, bool)> = None;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) if e.local_name().as_ref() == b"style" => {
                    current = style_header(&e)?;
                }
                Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"name" => {
                    if let (Some((id, is_default)), Some(name)) = (&current, val(&e)?) {
                        let name = display_name(&name);
                        if *is_default {
                            styles.default_paragraph = Some(name.clone());
                        }
                        styles.names.insert(id.clone(), name);
                    }
                }
                Event::End(e) if e.local_name().as_ref() == b"style" => current = None,
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(styles)
    }

    /// Resolves a `w:pStyle` id, or the default paragraph style when the
    /// paragraph has none.
    fn resolve(&self, id: Option<&str>) -> String {
        match id {
            Some(id) => match self.names.get(id) {
                Some(name) => name.clone(),
                None => id.to_owned(),
            },
            None => self
                .default_paragraph
                .clone()
                .unwrap_or_else(|| NORMAL_STYLE.to_owned()),
        }
    }
}

/// Returns the id of a paragraph `w:style` element and whether it is the
/// default paragraph style. Character, table, and numbering styles are
/// ignored.
fn style_header(e: &BytesStart) -> Result<Option<(String, bool)>> {
    let mut kind = None;
    let mut id = None;
    let mut is_default = false;
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let value = attr.unescape_value()?;
        match attr.key.local_name().as_ref() {
            b"type" => kind = Some(value.into_owned()),
            b"styleId" => id = Some(value.into_owned()),
            b"default" => is_default = is_on(&value),
            _ => {}
        }
    }
    Ok(match (kind.as_deref(), id) {
        (Some("paragraph"), Some(id)) => Some((id, is_default)),
        _ => None,
    })
}

/// Returns the element's `w:val` attribute, if present.
fn val(e: &BytesStart) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.local_name().as_ref() == b"val" {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn is_on(value: &str) -> bool {
    !matches!(value, "0" | "false" | "off")
}

/// Word stores built-in style names in lower case (`heading 1`, `list
/// bullet`) but shows them title-cased. Custom names are kept as-is.
fn display_name(name: &str) -> String {
    match name.chars().next() {
        Some(c) if c.is_lowercase() => name
            .split(' ')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<String>>()
            .join(" "),
        _ => name.to_owned(),
    }
}

/// Walks `word/document.xml`, collecting body-level paragraphs. Paragraphs
/// nested in tables or text boxes are skipped.
fn parse_document(xml: &str, styles: &Styles) -> Result<Document> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut document = Document::default();

    let mut nested = 0usize;
    let mut paragraph: Option<(Option<String>, Vec<Run>)> = None;
    let mut in_ppr = false;
    let mut run: Option<Run> = None;
    let mut in_rpr = false;
    let mut in_text = false;

    loop {
        let event = reader.read_event_into(&mut buf)?;
        match &event {
            Event::Start(e) if matches!(e.local_name().as_ref(), b"tbl" | b"txbxContent") => {
                nested += 1;
            }
            Event::End(e) if matches!(e.local_name().as_ref(), b"tbl" | b"txbxContent") => {
                nested = nested.saturating_sub(1);
            }
            Event::Eof => break,
            _ if nested > 0 => {}

            Event::Start(e) => match e.local_name().as_ref() {
                b"p" => paragraph = Some((None, Vec::new())),
                b"pPr" => in_ppr = true,
                b"r" if paragraph.is_some() => run = Some(Run::default()),
                b"rPr" if run.is_some() => in_rpr = true,
                b"t" if run.is_some() => in_text = true,
                b"pStyle" | b"b" | b"i" => on_property(e, in_ppr, in_rpr, &mut paragraph, &mut run)?,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"p" => document.paragraphs.push(Paragraph::new(&styles.resolve(None), Vec::new())),
                b"tab" if !in_rpr => push_text(&mut run, "\t"),
                b"br" | b"cr" if !in_rpr => push_text(&mut run, "\n"),
                b"pStyle" | b"b" | b"i" => on_property(e, in_ppr, in_rpr, &mut paragraph, &mut run)?,
                _ => {}
            },
            Event::Text(e) if in_text => {
                let text = e.unescape()?;
                push_text(&mut run, &text);
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"p" => {
                    if let Some((style_id, runs)) = paragraph.take() {
                        let style = styles.resolve(style_id.as_deref());
                        debug!("paragraph style {:?} -> {:?}", style_id, style);
                        document.paragraphs.push(Paragraph::new(&style, runs));
                    }
                }
                b"pPr" => in_ppr = false,
                b"r" => {
                    if let (Some(r), Some((_, runs))) = (run.take(), paragraph.as_mut()) {
                        runs.push(r);
                    }
                }
                b"rPr" => in_rpr = false,
                b"t" => in_text = false,
                _ => {}
            },
            _ => {}
        }
        buf.clear();
    }

    Ok(document)
}

/// Handles the `w:pStyle`, `w:b`, and `w:i` property elements. `w:b` and
/// `w:i` count only inside a run's own properties; the paragraph mark's run
/// properties (`w:pPr/w:rPr`) are ignored.
fn on_property(
    e: &BytesStart,
    in_ppr: bool,
    in_rpr: bool,
    paragraph: &mut Option<(Option<String>, Vec<Run>)>,
    run: &mut Option<Run>,
) -> Result<()> {
    match e.local_name().as_ref() {
        b"pStyle" if in_ppr && !in_rpr => {
            if let Some((style, _)) = paragraph.as_mut() {
                *style = val(e)?;
            }
        }
        b"b" if in_rpr => {
            if let Some(r) = run.as_mut() {
                r.bold = val(e)?.map_or(true, |v| is_on(&v));
            }
        }
        b"i" if in_rpr => {
            if let Some(r) = run.as_mut() {
                r.italic = val(e)?.map_or(true, |v| is_on(&v));
            }
        }
        _ => {}
    }
    Ok(())
}

fn push_text(run: &mut Option<Run>, text: &str) {
    if let Some(r) = run.as_mut() {
        r.text.push_str(text);
    }
}

/// Represents the result of reading a `.docx` file.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error reading a `.docx` file.
#[derive(Debug)]
pub enum Error {
    /// Returned when the file isn't a readable zip archive.
    Zip(zip::result::ZipError),

    /// Returned when one of the archive's XML parts is malformed.
    Xml(quick_xml::Error),

    /// Returned when a required part is absent from the archive.
    MissingPart(&'static str),

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Zip(err) => write!(f, "Reading docx archive: {}", err),
            Error::Xml(err) => write!(f, "Parsing docx xml: {}", err),
            Error::MissingPart(part) => write!(f, "Docx archive has no '{}'", part),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Zip(err) => Some(err),
            Error::Xml(err) => Some(err),
            Error::MissingPart(_) => None,
            Error::Io(err) => Some(err),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Error {
        Error::Zip(err)
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Error {
        Error::Xml(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

/// Builds `.docx` archives in memory for tests.
#[cfg(test)]
pub(crate) mod fixture {
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    pub const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>
  <w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/></w:style>
  <w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/></w:style>
  <w:style w:type="paragraph" w:styleId="ListBullet"><w:name w:val="List Bullet"/></w:style>
  <w:style w:type="paragraph" w:styleId="ListNumber"><w:name w:val="list number"/></w:style>
  <w:style w:type="character" w:styleId="Strong"><w:name w:val="Strong"/></w:style>
</w:styles>"#;

    /// Wraps paragraph XML in a `w:document`/`w:body`.
    pub fn document_xml(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}<w:sectPr/></w:body></w:document>"#,
            body
        )
    }

    /// Zips up the given parts as a `.docx` archive.
    pub fn archive(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, contents) in parts {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(contents.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    /// A `.docx` archive with the standard test styles and the given body.
    pub fn docx(body: &str) -> Vec<u8> {
        archive(&[
            ("word/styles.xml", STYLES),
            ("word/document.xml", &document_xml(body)),
        ])
    }
}
