//! Command handlers for the mdatlas CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod search;
pub mod section;
pub mod serve;
pub mod stats;
pub mod structure;
pub mod toc;

// Re-export command types for convenience
pub use search::SearchCommand;
pub use section::SectionCommand;
pub use serve::ServeCommand;
pub use stats::StatsCommand;
pub use structure::StructureCommand;
pub use toc::TocCommand;

use mdatlas_core::{config::AppConfig, AppResult};
use mdatlas_outline::{AccessControl, StructureManager};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A document argument that passed the access gate.
pub(crate) struct Document {
    pub path: PathBuf,
    pub manager: StructureManager,
}

impl Document {
    /// Validate `file` against the configured base directory.
    ///
    /// One-shot commands read each file once, so no cache is attached.
    pub fn open(config: &AppConfig, file: &Path) -> AppResult<Self> {
        let access = AccessControl::new(&config.base_dir, &config.access)?;
        let path = access.validate_path(file)?;
        tracing::debug!("Resolved {} to {}", file.display(), path.display());

        Ok(Self {
            path,
            manager: StructureManager::new(None),
        })
    }
}

/// Serialize `value` as compact or indented JSON.
pub(crate) fn to_json<T: Serialize>(value: &T, pretty: bool) -> AppResult<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}
