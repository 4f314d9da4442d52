//! Rich text to HTML
//!
//! Converts CMS structured-text blocks into markup. Span offsets count
//! UTF-16 code units, as produced by the CMS editor.

use serde_json::Value;

use crate::content::RichTextBlock;

/// An inline span (bold, link, ...) over a block's text
#[derive(Debug)]
struct Span<'a> {
    start: usize,
    end: usize,
    kind: &'a str,
    data: Option<&'a Value>,
}

/// List kind of a block, when it is a list item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    fn of(block_type: &str) -> Option<Self> {
        match block_type {
            "list-item" => Some(ListKind::Unordered),
            "o-list-item" => Some(ListKind::Ordered),
            _ => None,
        }
    }

    fn tag(self) -> &'static str {
        match self {
            ListKind::Unordered => "ul",
            ListKind::Ordered => "ol",
        }
    }
}

/// Render a sequence of blocks, grouping consecutive list items
pub fn as_html(blocks: &[RichTextBlock]) -> String {
    let mut html = String::new();
    let mut open_list: Option<ListKind> = None;

    for block in blocks {
        let raw = block.raw();
        let block_type = raw.get("type").and_then(Value::as_str).unwrap_or("");
        let list = ListKind::of(block_type);

        if open_list != list {
            if let Some(kind) = open_list {
                html.push_str(&format!("</{}>", kind.tag()));
            }
            if let Some(kind) = list {
                html.push_str(&format!("<{}>", kind.tag()));
            }
            open_list = list;
        }

        html.push_str(&render_block(block_type, raw));
    }

    if let Some(kind) = open_list {
        html.push_str(&format!("</{}>", kind.tag()));
    }

    html
}

fn render_block(block_type: &str, raw: &Value) -> String {
    match block_type {
        "paragraph" => format!("<p>{}</p>", render_text(raw)),
        "preformatted" => format!("<pre>{}</pre>", render_text(raw)),
        "heading1" | "heading2" | "heading3" | "heading4" | "heading5" | "heading6" => {
            let level = &block_type["heading".len()..];
            format!("<h{level}>{}</h{level}>", render_text(raw))
        }
        "list-item" | "o-list-item" => format!("<li>{}</li>", render_text(raw)),
        "image" => {
            let url = raw.get("url").and_then(Value::as_str).unwrap_or("");
            let alt = raw.get("alt").and_then(Value::as_str).unwrap_or("");
            format!(
                r#"<p class="block-img"><img src="{}" alt="{}"></p>"#,
                escape_html(url),
                escape_html(alt)
            )
        }
        "embed" => {
            let oembed = raw.get("oembed");
            let url = oembed
                .and_then(|o| o.get("embed_url"))
                .and_then(Value::as_str)
                .unwrap_or("");
            let markup = oembed
                .and_then(|o| o.get("html"))
                .and_then(Value::as_str)
                .unwrap_or("");
            format!(r#"<div data-oembed="{}">{}</div>"#, escape_html(url), markup)
        }
        other => {
            tracing::debug!("Skipping unsupported rich text block {:?}", other);
            String::new()
        }
    }
}

/// Render a block's text with its spans applied
fn render_text(raw: &Value) -> String {
    let text = raw.get("text").and_then(Value::as_str).unwrap_or("");
    let mut spans = parse_spans(raw);
    // Outer spans open first
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut html = String::with_capacity(text.len());
    let mut open: Vec<&Span> = Vec::new();
    let mut next_span = 0;
    let mut pos = 0;

    for ch in text.chars() {
        close_spans_at(pos, &mut open, &mut html);

        while next_span < spans.len() && spans[next_span].start <= pos {
            let span = &spans[next_span];
            if span.end > pos {
                html.push_str(&open_tag(span));
                open.push(span);
            }
            next_span += 1;
        }

        match ch {
            '\n' => html.push_str("<br />"),
            _ => push_escaped(&mut html, ch),
        }
        pos += ch.len_utf16();
    }

    close_spans_at(pos, &mut open, &mut html);
    while let Some(span) = open.pop() {
        html.push_str(close_tag(span));
    }

    html
}

/// Close every span ending at `pos`, reopening inner spans that continue
fn close_spans_at<'s, 'r>(pos: usize, open: &mut Vec<&'s Span<'r>>, html: &mut String) {
    let Some(lowest) = open.iter().position(|s| s.end <= pos) else {
        return;
    };

    let closed: Vec<&'s Span<'r>> = open.drain(lowest..).collect();
    for span in closed.iter().rev() {
        html.push_str(close_tag(span));
    }
    for span in closed {
        if span.end > pos {
            html.push_str(&open_tag(span));
            open.push(span);
        }
    }
}

fn parse_spans(raw: &Value) -> Vec<Span<'_>> {
    raw.get("spans")
        .and_then(Value::as_array)
        .map(|spans| {
            spans
                .iter()
                .filter_map(|s| {
                    Some(Span {
                        start: s.get("start")?.as_u64()? as usize,
                        end: s.get("end")?.as_u64()? as usize,
                        kind: s.get("type")?.as_str()?,
                        data: s.get("data"),
                    })
                })
                .filter(|s| s.end > s.start)
                .collect()
        })
        .unwrap_or_default()
}

fn open_tag(span: &Span) -> String {
    match span.kind {
        "strong" => "<strong>".to_string(),
        "em" => "<em>".to_string(),
        "hyperlink" => {
            let data = span.data;
            let url = data
                .and_then(|d| d.get("url"))
                .and_then(Value::as_str)
                .unwrap_or("#");
            let blank = data
                .and_then(|d| d.get("target"))
                .and_then(Value::as_str)
                == Some("_blank");
            if blank {
                format!(
                    r#"<a href="{}" target="_blank" rel="noopener">"#,
                    escape_html(url)
                )
            } else {
                format!(r#"<a href="{}">"#, escape_html(url))
            }
        }
        "label" => {
            let label = span
                .data
                .and_then(|d| d.get("label"))
                .and_then(Value::as_str)
                .unwrap_or("");
            format!(r#"<span class="{}">"#, escape_html(label))
        }
        _ => "<span>".to_string(),
    }
}

fn close_tag(span: &Span) -> &'static str {
    match span.kind {
        "strong" => "</strong>",
        "em" => "</em>",
        "hyperlink" => "</a>",
        _ => "</span>",
    }
}

fn push_escaped(out: &mut String, ch: char) {
    match ch {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&#39;"),
        _ => out.push(ch),
    }
}

/// Escape text for HTML content and attribute values
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        push_escaped(&mut out, ch);
    }
    out
}
