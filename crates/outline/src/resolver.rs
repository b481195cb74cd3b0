//! Section lookup and content slicing.

use mdatlas_core::{AppError, AppResult};

use crate::parser::strip_closing_sequence;
use crate::types::{ContentFormat, DocumentStructure, Section, SectionContent};

/// Depth-first search for the section with `id`.
pub fn find_section<'a>(sections: &'a [Section], id: &str) -> Option<&'a Section> {
    for section in sections {
        if section.id == id {
            return Some(section);
        }
        if let Some(found) = find_section(&section.children, id) {
            return Some(found);
        }
    }
    None
}

/// Slice the text of section `id` out of `content`.
///
/// With `include_children` the whole recorded span is returned; without it
/// the text stops before the first child heading.
pub fn resolve(
    content: &str,
    tree: &DocumentStructure,
    id: &str,
    include_children: bool,
) -> AppResult<SectionContent> {
    let section = find_section(&tree.structure, id).ok_or_else(|| AppError::SectionNotFound {
        id: id.to_string(),
    })?;

    let end_line = match section.children.first() {
        Some(first_child) if !include_children => first_child.start_line.saturating_sub(1),
        _ => section.end_line,
    };

    Ok(SectionContent {
        id: section.id.clone(),
        title: section.title.clone(),
        content: slice_lines(content, section.start_line, end_line),
        format: ContentFormat::Markdown,
        include_children,
    })
}

/// Lines `start..=end` (1-based) joined with `'\n'`.
fn slice_lines(content: &str, start: usize, end: usize) -> String {
    if start == 0 || end < start {
        return String::new();
    }
    content
        .split('\n')
        .skip(start - 1)
        .take(end - start + 1)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Convert resolved markdown into `format`.
pub fn apply_format(mut section: SectionContent, format: ContentFormat) -> SectionContent {
    if format == ContentFormat::Plain {
        section.content = strip_heading_markers(&section.content);
    }
    section.format = format;
    section
}

/// Text to hand to a consumer: the content itself, or for `json` the whole
/// section object.
pub fn render(section: &SectionContent) -> AppResult<String> {
    match section.format {
        ContentFormat::Markdown | ContentFormat::Plain => Ok(section.content.clone()),
        ContentFormat::Json => Ok(serde_json::to_string_pretty(section)?),
    }
}

/// Drop ATX markers from heading lines, leaving fenced code untouched.
fn strip_heading_markers(markdown: &str) -> String {
    let mut fence: Option<&str> = None;

    markdown
        .split('\n')
        .map(|line| {
            let trimmed = line.trim_start();

            if let Some(marker) = fence {
                if trimmed.starts_with(marker) {
                    fence = None;
                }
                return line.to_string();
            }
            if trimmed.starts_with("```") {
                fence = Some("```");
                return line.to_string();
            }
            if trimmed.starts_with("~~~") {
                fence = Some("~~~");
                return line.to_string();
            }

            match atx_heading_text(trimmed) {
                Some(text) => text.to_string(),
                None => line.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn atx_heading_text(line: &str) -> Option<&str> {
    let hashes = line.bytes().take_while(|&b| b == b'#').count();
    if !(1..=6).contains(&hashes) {
        return None;
    }

    let rest = &line[hashes..];
    if !rest.is_empty() && !rest.starts_with(|c: char| c == ' ' || c == '\t') {
        return None;
    }
    Some(strip_closing_sequence(rest.trim_start()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::extract;

    const DOC: &str = "# A\nintro\n## B\nbee\n## C\nsee\n";

    fn id_of(tree: &DocumentStructure, title: &str) -> String {
        tree.sections()
            .find(|s| s.title == title)
            .map(|s| s.id.clone())
            .unwrap()
    }

    #[test]
    fn test_include_children() {
        let tree = extract(DOC.as_bytes()).unwrap();
        let a = id_of(&tree, "A");

        let full = resolve(DOC, &tree, &a, true).unwrap();
        assert_eq!(full.content, "# A\nintro\n## B\nbee\n## C\nsee");
        assert!(full.include_children);
        assert_eq!(full.format, ContentFormat::Markdown);

        let own = resolve(DOC, &tree, &a, false).unwrap();
        assert_eq!(own.content, "# A\nintro");
    }

    #[test]
    fn test_leaf_section_ignores_flag() {
        let tree = extract(DOC.as_bytes()).unwrap();
        let b = id_of(&tree, "B");

        let with = resolve(DOC, &tree, &b, true).unwrap();
        let without = resolve(DOC, &tree, &b, false).unwrap();
        assert_eq!(with.content, "## B\nbee");
        assert_eq!(with.content, without.content);
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let tree = extract(DOC.as_bytes()).unwrap();
        let err = resolve(DOC, &tree, "section_0000000000000000", true).unwrap_err();
        assert!(matches!(err, AppError::SectionNotFound { ref id } if id == "section_0000000000000000"));
    }

    #[test]
    fn test_plain_strips_markers_outside_fences() {
        let section = SectionContent {
            id: "x".to_string(),
            title: "Title".to_string(),
            content: "## Title ##\ntext\n```\n# comment\n```\n### Sub".to_string(),
            format: ContentFormat::Markdown,
            include_children: true,
        };

        let plain = apply_format(section, ContentFormat::Plain);
        assert_eq!(plain.content, "Title\ntext\n```\n# comment\n```\nSub");
        assert_eq!(plain.format, ContentFormat::Plain);
    }

    #[test]
    fn test_render_json_emits_whole_object() {
        let tree = extract(DOC.as_bytes()).unwrap();
        let b = id_of(&tree, "B");
        let section = apply_format(resolve(DOC, &tree, &b, true).unwrap(), ContentFormat::Json);

        let rendered = render(&section).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["id"], b.as_str());
        assert_eq!(value["format"], "json");
        assert_eq!(value["content"], "## B\nbee");
    }

    #[test]
    fn test_atx_heading_text() {
        assert_eq!(atx_heading_text("# Hi"), Some("Hi"));
        assert_eq!(atx_heading_text("#hashtag"), None);
        assert_eq!(atx_heading_text("####### seven"), None);
        assert_eq!(atx_heading_text("#"), Some(""));
    }
}
