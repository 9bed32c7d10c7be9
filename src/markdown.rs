use pulldown_cmark::{html, Event, Options, Parser, Tag};

/// Converts markdown to HTML, appending the result to `out`.
pub fn to_html(out: &mut String, markdown: &str) {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);

    html::push_html(out, Parser::new_ext(markdown, options).map(demote_headings));
}

// Headings in the post need to be subordinate to the card title (h2), so `#`
// becomes h2 instead of h1. Both the start and end tags are rewritten so the
// closing tag matches.
fn demote_headings(ev: Event) -> Event {
    match ev {
        Event::Start(Tag::Heading(s)) => Event::Start(Tag::Heading((s + 1).min(6))),
        Event::End(Tag::Heading(s)) => Event::End(Tag::Heading((s + 1).min(6))),
        _ => ev,
    }
}
