//! Extraction and resolution over whole documents.

use crate::extractor::extract;
use crate::query;
use crate::resolver::resolve;
use crate::section_id::section_id;
use crate::types::{DocumentStructure, Section};
use mdatlas_core::AppError;

#[cfg(test)]
mod tests {
    use super::*;

    fn by_title<'a>(doc: &'a DocumentStructure, title: &str) -> &'a Section {
        doc.sections()
            .find(|s| s.title == title)
            .unwrap_or_else(|| panic!("no section titled {}", title))
    }

    #[test]
    fn test_two_children_under_one_parent() {
        let content = "# A\n\n## B\n\ntext\n\n## C\n";
        let doc = extract(content.as_bytes()).unwrap();

        assert_eq!(doc.total_lines, 8);
        assert_eq!(doc.structure.len(), 1);

        let a = &doc.structure[0];
        let titles: Vec<&str> = a.children.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "C"]);

        let b = &a.children[0];
        let c = &a.children[1];
        assert_eq!((a.start_line, a.end_line), (1, 7));
        assert_eq!((b.start_line, b.end_line), (3, 6));
        assert_eq!((c.start_line, c.end_line), (7, 7));
        assert_eq!(a.line_count, 7);
        assert_eq!(a.char_count, content.len());
        assert_eq!(a.id, section_id(1, "A"));
    }

    #[test]
    fn test_six_level_chain() {
        let content = "# 1\n## 2\n### 3\n#### 4\n##### 5\n###### 6\n";
        let doc = extract(content.as_bytes()).unwrap();

        assert_eq!(doc.structure.len(), 1);
        let mut node = &doc.structure[0];
        for level in 1..=6u8 {
            assert_eq!(node.level, level);
            assert_eq!(node.end_line, 6);
            if level < 6 {
                assert_eq!(node.children.len(), 1);
                node = &node.children[0];
            } else {
                assert!(node.children.is_empty());
            }
        }
    }

    #[test]
    fn test_headingless_documents() {
        for content in ["", "\n\n", "plain text\nwith lines\n", "- a\n- b"] {
            let doc = extract(content.as_bytes()).unwrap();
            assert!(doc.structure.is_empty(), "{:?}", content);
            assert_eq!(doc.total_lines, content.matches('\n').count() + 1);
            assert_eq!(doc.total_chars, content.len());
        }
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let content = "# Intro\ntext\n## Part\n### Detail\n## Part\n# Outro\n";
        let first = extract(content.as_bytes()).unwrap();
        let second = extract(content.as_bytes()).unwrap();
        assert_eq!(first.structure, second.structure);

        let ids: Vec<&str> = first.sections().map(|s| s.id.as_str()).collect();
        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(ids.len(), unique.len());
    }

    #[test]
    fn test_parents_contain_descendants() {
        let content = "# A\n## B\n### C\ntext\n## D\n# E\n### F\n## G\n";
        let doc = extract(content.as_bytes()).unwrap();
        assert!(query::validate(&doc).is_ok());

        for section in doc.sections() {
            assert!(section.end_line >= section.start_line);
            for child in &section.children {
                assert!(child.level > section.level);
                assert!(child.start_line > section.start_line);
                assert!(child.end_line <= section.end_line);
            }
        }
    }

    #[test]
    fn test_deep_heading_before_any_top_level() {
        let doc = extract(b"### Early\n# Top\n## Sub\n").unwrap();
        let titles: Vec<&str> = doc.structure.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Early", "Top"]);
        assert_eq!(by_title(&doc, "Early").end_line, 1);
    }

    #[test]
    fn test_unterminated_fence_does_not_abort() {
        let doc = extract(b"# A\n```\n# not a heading\n").unwrap();
        assert_eq!(doc.sections().count(), 1);
        assert_eq!(doc.structure[0].end_line, 3);
    }

    #[test]
    fn test_mixed_heading_styles() {
        let content = "Title\n=====\n\n## Atx child\n\nSub\n---\n";
        let doc = extract(content.as_bytes()).unwrap();
        let title = by_title(&doc, "Title");
        let children: Vec<&str> = title.children.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(children, vec!["Atx child", "Sub"]);
    }

    #[test]
    fn test_counts_are_bytes() {
        let content = "# Café\n";
        let doc = extract(content.as_bytes()).unwrap();
        assert_eq!(doc.total_chars, content.len());
        assert_eq!(doc.structure[0].char_count, "# Café".len() + 1);
        assert_eq!(doc.structure[0].title, "Café");
    }

    #[test]
    fn test_without_children_stops_before_first_child() {
        let content = "# A\n\n## B\n\ntext\n\n## C\n";
        let doc = extract(content.as_bytes()).unwrap();
        let a = &doc.structure[0];
        let first_child_start = a.children[0].start_line;

        let own = resolve(content, &doc, &a.id, false).unwrap();
        let own_lines = own.content.split('\n').count();
        assert!(a.start_line + own_lines - 1 < first_child_start);
        assert_eq!(own.content, "# A\n");

        let full = resolve(content, &doc, &a.id, true).unwrap();
        assert_eq!(full.content.split('\n').count(), a.line_count);
        assert_eq!(full.content, "# A\n\n## B\n\ntext\n\n## C");
    }

    #[test]
    fn test_missing_id_is_not_found() {
        let content = "# A\n";
        let doc = extract(content.as_bytes()).unwrap();
        let err = resolve(content, &doc, "section_ffffffffffffffff", false).unwrap_err();
        assert!(matches!(err, AppError::SectionNotFound { .. }));
        assert!(err.is_input_error());
    }

    #[test]
    fn test_markup_free_titles_drive_ids_and_search() {
        let doc = extract(b"# Guide\n## **Bold** and [link](http://x) title\n").unwrap();
        let section = by_title(&doc, "Bold and link title");
        assert_eq!(section.id, section_id(2, "Bold and link title"));

        let hits = query::search(&doc, "Bold and link", false);
        assert_eq!(hits.len(), 1);
        assert_eq!(query::toc(&doc, 0)[1].title, "Bold and link title");
    }
}
