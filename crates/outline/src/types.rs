//! Outline type definitions.

use chrono::{DateTime, Utc};
use mdatlas_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// A heading detected by the syntax tree walk, before boundaries and nesting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingOccurrence {
    /// Heading level (1-6)
    pub level: u8,

    /// Heading text with surrounding whitespace and markup markers removed
    pub title: String,

    /// First line of the heading (1-based)
    pub start_line: usize,

    /// Byte span of the heading node in the source
    pub byte_range: Range<usize>,
}

/// One heading-delimited branch of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Stable identifier, see [`crate::section_id`]
    pub id: String,

    /// Heading level (1-6)
    pub level: u8,

    /// Heading text
    pub title: String,

    /// Bytes covered by the section, heading line and descendants included
    pub char_count: usize,

    /// Lines covered by the section
    pub line_count: usize,

    /// Line of the heading (1-based)
    pub start_line: usize,

    /// Last line of the section (inclusive)
    pub end_line: usize,

    /// Directly nested subsections, in document order
    #[serde(default)]
    pub children: Vec<Section>,
}

impl Section {
    /// Iterate over this section and all of its descendants, depth-first.
    pub fn iter(&self) -> SectionIter<'_> {
        SectionIter { stack: vec![self] }
    }
}

/// Depth-first, pre-order iterator over a section tree.
pub struct SectionIter<'a> {
    stack: Vec<&'a Section>,
}

impl<'a> SectionIter<'a> {
    /// Iterate over every section of a forest, depth-first.
    pub fn over(sections: &'a [Section]) -> Self {
        Self {
            stack: sections.iter().rev().collect(),
        }
    }
}

impl<'a> Iterator for SectionIter<'a> {
    type Item = &'a Section;

    fn next(&mut self) -> Option<Self::Item> {
        let section = self.stack.pop()?;
        self.stack.extend(section.children.iter().rev());
        Some(section)
    }
}

/// Hierarchical outline of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStructure {
    /// Path of the source document (empty when extracted from raw bytes)
    pub file_path: String,

    /// Document length in bytes
    pub total_chars: usize,

    /// Number of line terminators plus one
    pub total_lines: usize,

    /// Top-level sections
    pub structure: Vec<Section>,

    /// Modification time of the source file
    pub last_modified: DateTime<Utc>,
}

impl DocumentStructure {
    /// Iterate over every section, depth-first.
    pub fn sections(&self) -> SectionIter<'_> {
        SectionIter::over(&self.structure)
    }
}

/// Output format for section content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    /// Source text, verbatim
    #[default]
    Markdown,
    /// Source text with heading markers removed
    Plain,
    /// The whole [`SectionContent`] object as JSON
    Json,
}

impl ContentFormat {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Plain => "plain",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for ContentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentFormat {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "plain" | "text" => Ok(Self::Plain),
            "json" => Ok(Self::Json),
            other => Err(AppError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Text of one section, resolved on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionContent {
    pub id: String,
    pub title: String,
    pub content: String,
    pub format: ContentFormat,
    pub include_children: bool,
}

/// Aggregate statistics about a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStats {
    pub file_path: String,
    pub total_chars: usize,
    pub total_lines: usize,
    pub section_count: usize,
    /// Number of sections per heading level
    pub level_counts: BTreeMap<u8, usize>,
    pub last_modified: DateTime<Utc>,
}

/// One line of a table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    pub id: String,
    pub level: u8,
    pub title: String,
    pub line: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(id: &str, level: u8) -> Section {
        Section {
            id: id.to_string(),
            level,
            title: id.to_string(),
            char_count: 0,
            line_count: 1,
            start_line: 1,
            end_line: 1,
            children: Vec::new(),
        }
    }

    #[test]
    fn test_section_iter_is_pre_order() {
        let mut a = leaf("a", 1);
        let mut b = leaf("b", 2);
        b.children.push(leaf("c", 3));
        a.children.push(b);
        a.children.push(leaf("d", 2));
        let forest = vec![a, leaf("e", 1)];

        let ids: Vec<&str> = SectionIter::over(&forest).map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_content_format_parsing() {
        assert_eq!("markdown".parse::<ContentFormat>().unwrap(), ContentFormat::Markdown);
        assert_eq!("PLAIN".parse::<ContentFormat>().unwrap(), ContentFormat::Plain);
        assert_eq!("json".parse::<ContentFormat>().unwrap(), ContentFormat::Json);

        let err = "html".parse::<ContentFormat>().unwrap_err();
        assert!(matches!(err, AppError::UnsupportedFormat(ref f) if f == "html"));
    }

    #[test]
    fn test_section_serializes_expected_fields() {
        let value = serde_json::to_value(leaf("section_x", 2)).unwrap();
        for field in [
            "id", "level", "title", "char_count", "line_count", "start_line", "end_line", "children",
        ] {
            assert!(value.get(field).is_some(), "missing field {}", field);
        }
        assert_eq!(value["children"], serde_json::json!([]));
    }

    #[test]
    fn test_section_content_serializes_format_tag() {
        let content = SectionContent {
            id: "section_x".to_string(),
            title: "X".to_string(),
            content: "# X".to_string(),
            format: ContentFormat::Markdown,
            include_children: false,
        };
        let value = serde_json::to_value(&content).unwrap();
        assert_eq!(value["format"], "markdown");
        assert_eq!(value["include_children"], false);
    }
}
