//! Heading detection over the tree-sitter Markdown grammars.
//!
//! The block grammar finds headings; the inline grammar reduces each heading's
//! source to its plain text so titles carry no emphasis, code or link markup.

use mdatlas_core::{AppError, AppResult};
use tree_sitter::{Language, Node, Parser, Tree};

use crate::types::HeadingOccurrence;

const ATX_HEADING: &str = "atx_heading";
const SETEXT_HEADING: &str = "setext_heading";

/// Inline nodes that contribute nothing to the visible text.
const MARKUP_NODES: &[&str] = &[
    "emphasis_delimiter",
    "code_span_delimiter",
    "html_tag",
    "link_destination",
    "link_title",
    "link_label",
];

/// Inline nodes whose visible text is only their `link_text` or
/// `image_description` child.
const LINK_NODES: &[&str] = &[
    "inline_link",
    "full_reference_link",
    "collapsed_reference_link",
    "shortcut_link",
    "image",
];

fn new_parser(language: Language, name: &str) -> AppResult<Parser> {
    let mut parser = Parser::new();
    parser
        .set_language(&language)
        .map_err(|e| AppError::Parse(format!("Failed to load Markdown {} grammar: {}", name, e)))?;
    Ok(parser)
}

/// Parse `content` and return its block syntax tree.
///
/// Returns `Ok(None)` when the parser gives up on the input; the grammar
/// failing to load is the only error.
pub fn parse(content: &[u8]) -> AppResult<Option<Tree>> {
    let mut parser = new_parser(tree_sitter_md::LANGUAGE.into(), "block")?;
    Ok(parser.parse(content, None))
}

/// Collect every heading of `content` in document order.
pub fn collect_headings(content: &[u8]) -> AppResult<Vec<HeadingOccurrence>> {
    let Some(tree) = parse(content)? else {
        tracing::warn!("Markdown parser returned no tree for {} bytes", content.len());
        return Ok(Vec::new());
    };

    let mut titles = TitleText::new()?;
    let mut headings = Vec::new();
    let mut cursor = tree.walk();

    // Pre-order walk; heading nodes are leaves for our purposes.
    loop {
        let node = cursor.node();
        let is_heading = matches!(node.kind(), ATX_HEADING | SETEXT_HEADING);
        if is_heading {
            if let Some(heading) = heading_from_node(node, content, &mut titles) {
                headings.push(heading);
            }
        }

        if !is_heading && cursor.goto_first_child() {
            continue;
        }

        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                tracing::trace!("Collected {} headings", headings.len());
                return Ok(headings);
            }
        }
    }
}

fn heading_from_node(
    node: Node<'_>,
    content: &[u8],
    titles: &mut TitleText,
) -> Option<HeadingOccurrence> {
    let mut level = None;
    let mut title = String::new();

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "setext_h1_underline" => level = Some(1),
            "setext_h2_underline" => level = Some(2),
            "inline" if node.kind() == ATX_HEADING => {
                let raw = node_text(child, content);
                title = titles.plain(strip_closing_sequence(&raw));
            }
            "paragraph" if node.kind() == SETEXT_HEADING => {
                title = titles.plain(&node_text(child, content));
            }
            kind => {
                if let Some(n) = atx_marker_level(kind) {
                    level = Some(n);
                }
            }
        }
    }

    let Some(level) = level else {
        tracing::debug!(
            kind = node.kind(),
            row = node.start_position().row,
            "Heading node without a level marker"
        );
        return None;
    };

    Some(HeadingOccurrence {
        level,
        title: normalize_title(&title),
        start_line: node.start_position().row + 1,
        byte_range: node.byte_range(),
    })
}

fn node_text(node: Node<'_>, content: &[u8]) -> String {
    String::from_utf8_lossy(&content[node.byte_range()]).into_owned()
}

/// Reduces heading source to its visible text with the inline grammar.
struct TitleText {
    parser: Parser,
}

impl TitleText {
    fn new() -> AppResult<Self> {
        Ok(Self {
            parser: new_parser(tree_sitter_md::INLINE_LANGUAGE.into(), "inline")?,
        })
    }

    /// Visible text of `source`; the source itself if the parser gives up.
    fn plain(&mut self, source: &str) -> String {
        let bytes = source.as_bytes();
        match self.parser.parse(bytes, None) {
            Some(tree) => {
                let root = tree.root_node();
                let mut out = Vec::with_capacity(bytes.len());
                push_visible(root, bytes, root.start_byte(), root.end_byte(), &mut out);
                String::from_utf8_lossy(&out).into_owned()
            }
            None => source.to_string(),
        }
    }
}

/// Append the visible text of `node` within `start..end` to `out`.
///
/// Source between child nodes is plain text and is kept as-is.
fn push_visible(node: Node<'_>, source: &[u8], start: usize, end: usize, out: &mut Vec<u8>) {
    let kind = node.kind();

    if MARKUP_NODES.contains(&kind) {
        return;
    }
    if LINK_NODES.contains(&kind) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if matches!(child.kind(), "link_text" | "image_description") {
                push_visible(child, source, child.start_byte(), child.end_byte(), out);
            }
        }
        return;
    }
    if matches!(kind, "link_text" | "image_description") {
        let (start, end) = inside_brackets(source, start, end);
        push_children(node, source, start, end, out);
        return;
    }
    if kind == "backslash_escape" {
        out.extend_from_slice(&source[(start + 1).min(end)..end]);
        return;
    }
    if matches!(kind, "uri_autolink" | "email_autolink") {
        let text = &source[start..end];
        let text = text.strip_prefix(b"<").unwrap_or(text);
        out.extend_from_slice(text.strip_suffix(b">").unwrap_or(text));
        return;
    }

    push_children(node, source, start, end, out);
}

fn push_children(node: Node<'_>, source: &[u8], start: usize, end: usize, out: &mut Vec<u8>) {
    let mut pos = start;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        // Bracket tokens trimmed off by the caller fall outside the window.
        if child.start_byte() < start || child.end_byte() > end {
            continue;
        }
        out.extend_from_slice(&source[pos..child.start_byte()]);
        push_visible(child, source, child.start_byte(), child.end_byte(), out);
        pos = child.end_byte();
    }
    out.extend_from_slice(&source[pos..end]);
}

/// Narrow `start..end` to the text between `[` (or `![`) and `]`.
fn inside_brackets(source: &[u8], mut start: usize, mut end: usize) -> (usize, usize) {
    if source.get(start) == Some(&b'!') {
        start += 1;
    }
    if source.get(start) == Some(&b'[') {
        start += 1;
    }
    if end > start && source.get(end - 1) == Some(&b']') {
        end -= 1;
    }
    (start, end.max(start))
}

/// `atx_h3_marker` -> 3
fn atx_marker_level(kind: &str) -> Option<u8> {
    let digit = kind.strip_prefix("atx_h")?.strip_suffix("_marker")?;
    match digit.parse::<u8>() {
        Ok(n @ 1..=6) => Some(n),
        _ => None,
    }
}

/// Trim every line and join the non-empty ones with a single space.
fn normalize_title(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Remove an ATX closing sequence (`## Title ##` -> `Title`).
///
/// The run of `#` only counts as a closing sequence when it is the whole text
/// or is preceded by whitespace, so `C#` keeps its suffix.
pub(crate) fn strip_closing_sequence(title: &str) -> &str {
    let trimmed = title.trim_end();
    let without = trimmed.trim_end_matches('#');

    if without.len() == trimmed.len() {
        trimmed
    } else if without.is_empty() {
        ""
    } else if without.ends_with(|c: char| c == ' ' || c == '\t') {
        without.trim_end()
    } else {
        trimmed
    }
}
