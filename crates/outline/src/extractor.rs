//! Structure extraction: headings, then boundaries, then hierarchy.

use chrono::Utc;
use mdatlas_core::AppResult;

use crate::boundary::{compute_boundaries, LineIndex};
use crate::hierarchy::build_hierarchy;
use crate::parser::collect_headings;
use crate::section_id::IdAllocator;
use crate::types::{DocumentStructure, Section};

/// Build the outline of `content`.
///
/// Empty and headingless input yields an empty `structure`. `file_path` is
/// left empty and `last_modified` is the extraction time; callers that know
/// the source file stamp both.
pub fn extract(content: &[u8]) -> AppResult<DocumentStructure> {
    let lines = LineIndex::new(content);
    let headings = collect_headings(content)?;
    let bounds = compute_boundaries(&headings, &lines);

    let mut ids = IdAllocator::new();
    let flat: Vec<Section> = headings
        .into_iter()
        .zip(bounds)
        .map(|(heading, span)| Section {
            id: ids.allocate(heading.level, &heading.title),
            level: heading.level,
            title: heading.title,
            char_count: span.char_count,
            line_count: span.line_count,
            start_line: span.start_line,
            end_line: span.end_line,
            children: Vec::new(),
        })
        .collect();

    let section_count = flat.len();
    let structure = build_hierarchy(flat);

    tracing::debug!(
        bytes = content.len(),
        lines = lines.total_lines(),
        sections = section_count,
        top_level = structure.len(),
        "Extracted document structure"
    );

    Ok(DocumentStructure {
        file_path: String::new(),
        total_chars: content.len(),
        total_lines: lines.total_lines(),
        structure,
        last_modified: Utc::now(),
    })
}
