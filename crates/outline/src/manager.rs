//! Structure manager: extraction, caching and queries for files on disk.
//!
//! Paths handed to the manager are expected to have passed the access gate
//! already; the manager reads them as-is.

use chrono::{DateTime, Utc};
use mdatlas_core::{AppError, AppResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::{modified_time, Fingerprint, StructureCache};
use crate::extractor::extract;
use crate::query;
use crate::resolver::resolve;
use crate::types::{DocumentStats, DocumentStructure, Section, SectionContent, TocEntry};

/// A file's bytes together with the fingerprint they were read under.
struct Snapshot {
    bytes: Vec<u8>,
    fingerprint: Fingerprint,
}

impl Snapshot {
    fn read(path: &Path) -> AppResult<Self> {
        // mtime first: a write landing between the two calls then looks stale
        // on the next freshness check instead of fresh.
        let modified = modified_time(path)?;
        let bytes = std::fs::read(path).map_err(|e| AppError::file_read(path, e))?;
        let fingerprint = Fingerprint::new(modified, &bytes);
        Ok(Self { bytes, fingerprint })
    }
}

#[derive(Debug, Clone, Default)]
pub struct StructureManager {
    cache: Option<Arc<StructureCache>>,
}

impl StructureManager {
    pub fn new(cache: Option<Arc<StructureCache>>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> Option<&Arc<StructureCache>> {
        self.cache.as_ref()
    }

    /// Outline of the file at `path`, from cache when fresh.
    pub fn document_structure(&self, path: &Path) -> AppResult<Arc<DocumentStructure>> {
        if let Some(hit) = self.cache.as_ref().and_then(|cache| cache.get(path)) {
            return Ok(hit);
        }

        let snapshot = Snapshot::read(path)?;
        self.extract_and_cache(path, &snapshot)
    }

    fn extract_and_cache(&self, path: &Path, snapshot: &Snapshot) -> AppResult<Arc<DocumentStructure>> {
        let mut structure = extract(&snapshot.bytes)?;
        structure.file_path = path.display().to_string();
        structure.last_modified = DateTime::<Utc>::from(snapshot.fingerprint.modified);
        let structure = Arc::new(structure);

        if let Some(cache) = &self.cache {
            cache.insert(path, Arc::clone(&structure), snapshot.fingerprint.clone());
        }

        tracing::info!(
            "Extracted {} ({} lines, {} top-level sections)",
            path.display(),
            structure.total_lines,
            structure.structure.len()
        );
        Ok(structure)
    }

    /// Outline without headings deeper than `max_depth` (`0` = unlimited).
    pub fn structure_with_depth(&self, path: &Path, max_depth: u8) -> AppResult<DocumentStructure> {
        let structure = self.document_structure(path)?;
        Ok(DocumentStructure {
            structure: query::filter_by_depth(&structure.structure, max_depth),
            ..(*structure).clone()
        })
    }

    /// Text of section `id`, resolved against the file's current bytes.
    pub fn section_content(
        &self,
        path: &Path,
        id: &str,
        include_children: bool,
    ) -> AppResult<SectionContent> {
        let snapshot = Snapshot::read(path)?;
        let cached = self
            .cache
            .as_ref()
            .and_then(|cache| cache.get_matching(path, &snapshot.fingerprint));
        let structure = match cached {
            Some(structure) => structure,
            None => self.extract_and_cache(path, &snapshot)?,
        };

        let text = String::from_utf8_lossy(&snapshot.bytes);
        resolve(&text, &structure, id, include_children)
    }

    pub fn search_sections(&self, path: &Path, query: &str, case_sensitive: bool) -> AppResult<Vec<Section>> {
        let structure = self.document_structure(path)?;
        Ok(query::search(&structure, query, case_sensitive))
    }

    pub fn sections_by_level(&self, path: &Path, level: u8) -> AppResult<Vec<Section>> {
        let structure = self.document_structure(path)?;
        Ok(query::by_level(&structure, level))
    }

    pub fn document_stats(&self, path: &Path) -> AppResult<DocumentStats> {
        let structure = self.document_structure(path)?;
        Ok(query::stats(&structure))
    }

    pub fn table_of_contents(&self, path: &Path, max_depth: u8) -> AppResult<Vec<TocEntry>> {
        let structure = self.document_structure(path)?;
        Ok(query::toc(&structure, max_depth))
    }

    pub fn validate_structure(&self, path: &Path) -> AppResult<()> {
        let structure = self.document_structure(path)?;
        query::validate(&structure)
    }

    /// Drop any cached outline for `path` and extract it again.
    pub fn refresh(&self, path: &Path) -> AppResult<Arc<DocumentStructure>> {
        if let Some(cache) = &self.cache {
            cache.invalidate(path);
        }
        self.document_structure(path)
    }

    /// Refresh every path, stopping at the first failure.
    pub fn warm_up(&self, paths: &[PathBuf]) -> AppResult<()> {
        for path in paths {
            self.refresh(path)?;
        }
        tracing::debug!("Warmed cache with {} documents", paths.len());
        Ok(())
    }
}
