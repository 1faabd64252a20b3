use unicode_width::UnicodeWidthChar as _;

const ELLIPSIS: &str = "...";

/// Columns a glyph takes in a terminal: 2 for East Asian wide/fullwidth and
/// emoji-range code points, 1 for everything else.
pub fn char_width(ch: char) -> usize {
    if ch as u32 >= 0x1F300 || ch.width() == Some(2) {
        2
    } else {
        1
    }
}

pub fn display_width(text: &str) -> usize {
    text.chars().map(char_width).sum()
}

/// Cuts `text` to at most `max_width` columns, ending in `...`. Wide glyphs
/// are kept whole or dropped.
pub fn truncate(text: &str, max_width: usize) -> String {
    if display_width(text) <= max_width {
        return text.to_string();
    }
    if max_width < ELLIPSIS.len() {
        return ".".repeat(max_width);
    }
    let budget = max_width - ELLIPSIS.len();
    let mut out = String::new();
    let mut used = 0usize;
    for ch in text.chars() {
        let w = char_width(ch);
        if used + w > budget {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push_str(ELLIPSIS);
    out
}

/// Paragraph-preserving fill to `width` columns.
///
/// Paragraphs are separated by blank lines and come back separated by
/// exactly the same number of newlines. Inside a paragraph single line
/// breaks are reflowed; extra blank lines (runs of three or more newlines
/// in the input) stay where they were.
pub fn wrap(text: &str, width: usize) -> String {
    let text = text.replace("\r\n", "\n");
    let text = text.trim();
    if text.is_empty() {
        return String::new();
    }
    text.split("\n\n")
        .map(|paragraph| wrap_paragraph(paragraph, width))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn wrap_paragraph(paragraph: &str, width: usize) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut words: Vec<&str> = Vec::new();
    for line in paragraph.split('\n') {
        if line.trim().is_empty() {
            fill(&words, width, &mut out);
            words.clear();
            out.push(String::new());
        } else {
            words.extend(line.split_whitespace());
        }
    }
    fill(&words, width, &mut out);
    out.join("\n")
}

fn fill(words: &[&str], width: usize, out: &mut Vec<String>) {
    let width = width.max(1);
    let mut line = String::new();
    let mut line_width = 0usize;
    for word in words {
        let w = display_width(word);
        if w > width {
            if !line.is_empty() {
                out.push(std::mem::take(&mut line));
            }
            let mut chunks = hard_break(word, width);
            let last = chunks.pop().unwrap_or_default();
            out.extend(chunks);
            line_width = display_width(&last);
            line = last;
            continue;
        }
        if line.is_empty() {
            line.push_str(word);
            line_width = w;
        } else if line_width + 1 + w <= width {
            line.push(' ');
            line.push_str(word);
            line_width += 1 + w;
        } else {
            out.push(std::mem::take(&mut line));
            line.push_str(word);
            line_width = w;
        }
    }
    if !line.is_empty() {
        out.push(line);
    }
}

fn hard_break(word: &str, width: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut chunk = String::new();
    let mut used = 0usize;
    for ch in word.chars() {
        let w = char_width(ch);
        if used > 0 && used + w > width {
            chunks.push(std::mem::take(&mut chunk));
            used = 0;
        }
        chunk.push(ch);
        used += w;
    }
    if !chunk.is_empty() {
        chunks.push(chunk);
    }
    chunks
}
