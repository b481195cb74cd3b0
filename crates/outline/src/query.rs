//! Read-only queries over an extracted outline.

use mdatlas_core::{AppError, AppResult};
use std::collections::BTreeMap;

use crate::types::{DocumentStats, DocumentStructure, Section, TocEntry};

/// Copy of `sections` without headings deeper than level `max_depth`.
///
/// `0` means unlimited.
pub fn filter_by_depth(sections: &[Section], max_depth: u8) -> Vec<Section> {
    if max_depth == 0 {
        return sections.to_vec();
    }
    sections
        .iter()
        .filter(|section| section.level <= max_depth)
        .map(|section| Section {
            children: filter_by_depth(&section.children, max_depth),
            ..section.clone()
        })
        .collect()
}

/// Sections whose title contains `query`, depth-first, each with its subtree.
pub fn search(doc: &DocumentStructure, query: &str, case_sensitive: bool) -> Vec<Section> {
    if case_sensitive {
        doc.sections()
            .filter(|s| s.title.contains(query))
            .cloned()
            .collect()
    } else {
        let needle = query.to_lowercase();
        doc.sections()
            .filter(|s| s.title.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }
}

/// Every section at heading `level`, depth-first.
pub fn by_level(doc: &DocumentStructure, level: u8) -> Vec<Section> {
    doc.sections().filter(|s| s.level == level).cloned().collect()
}

/// Table of contents down to heading level `max_level` (`0` = every level).
pub fn toc(doc: &DocumentStructure, max_level: u8) -> Vec<TocEntry> {
    let mut entries = Vec::new();
    collect_toc(&doc.structure, max_level, &mut entries);
    entries
}

fn collect_toc(sections: &[Section], max_level: u8, entries: &mut Vec<TocEntry>) {
    for section in sections {
        if max_level > 0 && section.level > max_level {
            continue;
        }
        entries.push(TocEntry {
            id: section.id.clone(),
            level: section.level,
            title: section.title.clone(),
            line: section.start_line,
        });
        if max_level == 0 || section.level < max_level {
            collect_toc(&section.children, max_level, entries);
        }
    }
}

pub fn stats(doc: &DocumentStructure) -> DocumentStats {
    let mut level_counts = BTreeMap::new();
    let mut section_count = 0;
    for section in doc.sections() {
        *level_counts.entry(section.level).or_insert(0) += 1;
        section_count += 1;
    }

    DocumentStats {
        file_path: doc.file_path.clone(),
        total_chars: doc.total_chars,
        total_lines: doc.total_lines,
        section_count,
        level_counts,
        last_modified: doc.last_modified,
    }
}

/// Check the structural invariants of an outline.
pub fn validate(doc: &DocumentStructure) -> AppResult<()> {
    validate_sections(&doc.structure, None)
}

fn validate_sections(sections: &[Section], parent: Option<&Section>) -> AppResult<()> {
    for section in sections {
        if section.id.is_empty() {
            return Err(invalid(section, "missing ID"));
        }
        if !(1..=6).contains(&section.level) {
            return Err(invalid(section, &format!("level {} out of range", section.level)));
        }
        if section.start_line == 0 || section.end_line < section.start_line {
            return Err(invalid(
                section,
                &format!("bad line span {}..={}", section.start_line, section.end_line),
            ));
        }
        if let Some(parent) = parent {
            if section.level <= parent.level {
                return Err(invalid(section, "child is not deeper than its parent"));
            }
            if section.start_line < parent.start_line || section.end_line > parent.end_line {
                return Err(invalid(section, "child extends beyond its parent"));
            }
        }
        validate_sections(&section.children, Some(section))?;
    }
    Ok(())
}

fn invalid(section: &Section, reason: &str) -> AppError {
    AppError::InvalidStructure(format!("section {} ({}): {}", section.id, section.title, reason))
}
