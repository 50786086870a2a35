//! Markdown to HTML for the subset the PRD model is asked to produce: `#`/`##`/`###`
//! headings, `* ` bullet lists, `**bold**`, `*italic*` and blank-line separated
//! paragraphs. Anything else passes through as literal text.

use regex::Regex;
use std::sync::LazyLock;

static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("bold pattern"));
static ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*(.*?)\*").expect("italic pattern"));

enum Line {
    /// Already rendered list or heading markup.
    Block(String),
    Text(String),
}

/// Renders without escaping: `<`, `&` and friends in the source reach the output as-is.
/// Use [`markdown_to_html_escaped`] when the result is inserted as live markup.
pub fn markdown_to_html(markdown: &str) -> String {
    let lines = wrap_lists(markdown);
    let lines = lines.into_iter().map(wrap_heading).collect::<Vec<_>>();
    let html = wrap_paragraphs(lines);
    render_inline(&html)
}

pub fn markdown_to_html_escaped(markdown: &str) -> String {
    markdown_to_html(&escape_html(markdown))
}

fn wrap_lists(markdown: &str) -> Vec<Line> {
    let mut out = Vec::new();
    let mut items: Vec<&str> = Vec::new();

    for line in markdown.lines() {
        if let Some(item) = line.strip_prefix("* ") {
            items.push(item.trim());
            continue;
        }
        flush_list(&mut items, &mut out);
        out.push(Line::Text(line.to_string()));
    }
    flush_list(&mut items, &mut out);
    out
}

fn flush_list(items: &mut Vec<&str>, out: &mut Vec<Line>) {
    if items.is_empty() {
        return;
    }
    let lis: String = items.drain(..).map(|i| format!("<li>{i}</li>")).collect();
    out.push(Line::Block(format!("<ul>{lis}</ul>")));
}

fn wrap_heading(line: Line) -> Line {
    let text = match line {
        Line::Text(text) => text,
        block => return block,
    };
    for (marker, tag) in [("### ", "h3"), ("## ", "h2"), ("# ", "h1")] {
        if let Some(rest) = text.strip_prefix(marker) {
            return Line::Block(format!("<{tag}>{}</{tag}>", rest.trim()));
        }
    }
    Line::Text(text)
}

/// Blank lines separate candidates. Block lines pass through; each run of text
/// lines becomes one paragraph with its inner newlines kept as `<br />`.
fn wrap_paragraphs(lines: Vec<Line>) -> String {
    let mut blocks: Vec<String> = Vec::new();
    let mut text: Vec<String> = Vec::new();

    for line in lines {
        match line {
            Line::Text(t) if t.trim().is_empty() => flush_paragraph(&mut text, &mut blocks),
            Line::Text(t) => text.push(t),
            Line::Block(b) => {
                flush_paragraph(&mut text, &mut blocks);
                blocks.push(b);
            }
        }
    }
    flush_paragraph(&mut text, &mut blocks);
    blocks.join("\n")
}

fn flush_paragraph(text: &mut Vec<String>, blocks: &mut Vec<String>) {
    if text.is_empty() {
        return;
    }
    blocks.push(format!("<p>{}</p>", text.join("<br />")));
    text.clear();
}

/// Bold first, so `**` is never read as two empty italics.
fn render_inline(html: &str) -> String {
    let html = BOLD.replace_all(html, "<strong>$1</strong>");
    ITALIC.replace_all(&html, "<em>$1</em>").into_owned()
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
