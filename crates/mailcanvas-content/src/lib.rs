//! Plain-text extraction for provider message records.
//!
//! The HTML handling is a small set of rewrite rules aimed at the markup
//! mail clients actually produce (paragraphs, divs, line breaks, list items,
//! table rows). It is not an HTML parser: unbalanced or odd markup may give
//! imperfect line breaks, but visible text is never dropped.

use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use mailcanvas_core::{CanvasError, Message, MessageRecord, Thread, ThreadBundle};

static HIDDEN_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>|<script\b[^>]*>.*?</script\s*>")
        .expect("hidden block pattern")
});
static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("line break pattern"));
static PARAGRAPH_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</p\s*>\s*").expect("paragraph pattern"));
static BLOCK_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</(?:div|li|tr)\s*>\s*").expect("block pattern"));
static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag pattern"));
static BLANK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("blank run pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodySource {
    Clean,
    Html,
    Snippet,
    Empty,
}

/// Accepts `&str` or `Option<&str>`; `None` and `""` both give `""`.
pub fn html_to_text<'a>(html: impl Into<Option<&'a str>>) -> String {
    let Some(html) = html.into() else {
        return String::new();
    };
    if html.is_empty() {
        return String::new();
    }

    let text = normalize_line_endings(html);
    let text = HIDDEN_BLOCK.replace_all(&text, "");
    let text = LINE_BREAK.replace_all(&text, "\n");
    let text = PARAGRAPH_END.replace_all(&text, "\n\n");
    let text = BLOCK_END.replace_all(&text, "\n");
    let text = ANY_TAG.replace_all(&text, "");
    let text = html_escape::decode_html_entities(&text);
    let text: String = text.chars().filter(|ch| !is_invisible(*ch)).collect();

    let text = text
        .split('\n')
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n");
    BLANK_RUN.replace_all(&text, "\n\n").trim().to_string()
}

fn is_invisible(ch: char) -> bool {
    matches!(ch, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}')
}

fn normalize_line_endings(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\r' {
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            out.push('\n');
        } else {
            out.push(ch);
        }
    }
    out
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

/// Picks the cleaned text, then the HTML body, then the snippet.
pub fn select_body(record: &MessageRecord) -> (String, BodySource) {
    if let Some(clean) = non_blank(record.conversation.as_deref()) {
        return (normalize_line_endings(clean).trim().to_string(), BodySource::Clean);
    }
    if let Some(html) = non_blank(record.body.as_deref()) {
        let text = html_to_text(html);
        if !text.is_empty() {
            return (text, BodySource::Html);
        }
    }
    if let Some(snippet) = non_blank(record.snippet.as_deref()) {
        return (snippet.trim().to_string(), BodySource::Snippet);
    }
    (String::new(), BodySource::Empty)
}

pub fn message_body_text(record: &MessageRecord) -> String {
    select_body(record).0
}

pub fn message_from_record(record: &MessageRecord) -> Message {
    let (body_text, source) = select_body(record);
    debug!("message {:?} body from {:?}", record.id, source);
    Message {
        from: record.from.clone(),
        to: record.to.clone(),
        cc: record.cc.clone(),
        date: record.date.unwrap_or(0),
        subject: record.subject.clone().unwrap_or_default(),
        body_text,
    }
}

pub fn thread_from_bundle(bundle: &ThreadBundle) -> Result<Thread, CanvasError> {
    let messages: Vec<Message> = bundle.messages.iter().map(message_from_record).collect();
    debug!(
        "thread {} has {} resolved messages",
        bundle.thread.id,
        messages.len()
    );
    let mut thread = Thread::new(bundle.thread.id.clone(), String::new(), messages)?;
    thread.subject = match non_blank(bundle.thread.subject.as_deref()) {
        Some(subject) => subject.to_string(),
        None if !thread.latest().subject.trim().is_empty() => thread.latest().subject.clone(),
        None => "(no subject)".to_string(),
    };
    Ok(thread)
}
