//! Markdown outline extraction and section access.
//!
//! Turns a heading-annotated document into a tree of sections with exact line
//! boundaries and stable IDs, slices individual sections back out of the
//! source, and caches outlines per file until the file changes.

pub mod access;
pub mod boundary;
pub mod cache;
pub mod extractor;
pub mod hierarchy;
pub mod manager;
pub mod parser;
pub mod query;
pub mod resolver;
pub mod section_id;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use access::{AccessControl, FileInfo};
pub use cache::{CacheStats, Fingerprint, StructureCache, SweepHandle};
pub use extractor::extract;
pub use manager::StructureManager;
pub use resolver::{apply_format, find_section, render, resolve};
pub use section_id::section_id;
pub use types::{
    ContentFormat, DocumentStats, DocumentStructure, Section, SectionContent, TocEntry,
};
