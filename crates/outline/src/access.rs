//! File access gate.
//!
//! Every document is resolved against a base directory before it is read.
//! Paths that leave the base (through `..` or a symlink), carry an extension
//! outside the allow-list, or exceed the size limit are rejected with
//! [`AppError::AccessDenied`].

use chrono::{DateTime, Utc};
use mdatlas_core::{AccessConfig, AppError, AppResult};
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Metadata about an accessible file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    pub path: String,
    pub relative_path: String,
    pub size: u64,
    pub mod_time: DateTime<Utc>,
    pub is_dir: bool,
    pub extension: String,
}

#[derive(Debug, Clone)]
pub struct AccessControl {
    base_dir: PathBuf,
    allowed_extensions: Vec<String>,
    max_file_size: u64,
}

impl AccessControl {
    /// Create a gate rooted at `base_dir`, which must exist.
    pub fn new(base_dir: impl AsRef<Path>, config: &AccessConfig) -> AppResult<Self> {
        let base_dir = base_dir.as_ref();
        let base_dir = base_dir.canonicalize().map_err(|e| {
            AppError::Config(format!("Invalid base directory {}: {}", base_dir.display(), e))
        })?;
        if !base_dir.is_dir() {
            return Err(AppError::Config(format!(
                "Base directory is not a directory: {}",
                base_dir.display()
            )));
        }

        let allowed_extensions = config
            .allowed_extensions
            .iter()
            .map(|ext| {
                let ext = ext.trim().to_ascii_lowercase();
                if ext.starts_with('.') {
                    ext
                } else {
                    format!(".{}", ext)
                }
            })
            .collect();

        tracing::debug!("Access control rooted at {}", base_dir.display());

        Ok(Self {
            base_dir,
            allowed_extensions,
            max_file_size: config.max_file_size,
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolve `path` (absolute, or relative to the base) to a canonical path
    /// that is safe to read.
    pub fn validate_path(&self, path: impl AsRef<Path>) -> AppResult<PathBuf> {
        let path = path.as_ref();
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        };

        let normalized = normalize_lexically(&joined);
        if !normalized.starts_with(&self.base_dir) {
            return Err(denied(path, "outside the base directory"));
        }
        if !self.has_allowed_extension(&normalized) {
            return Err(denied(path, "file extension not allowed"));
        }

        let canonical = normalized.canonicalize().map_err(|e| match e.kind() {
            ErrorKind::NotFound => denied(path, "file does not exist"),
            _ => AppError::file_read(&normalized, e),
        })?;
        // Symlinks can point anywhere.
        if !canonical.starts_with(&self.base_dir) {
            return Err(denied(path, "resolves outside the base directory"));
        }

        let metadata = std::fs::metadata(&canonical).map_err(|e| AppError::file_read(&canonical, e))?;
        if !metadata.is_file() {
            return Err(denied(path, "not a regular file"));
        }
        if metadata.len() > self.max_file_size {
            return Err(denied(
                path,
                &format!("file size {} exceeds limit {}", metadata.len(), self.max_file_size),
            ));
        }

        Ok(canonical)
    }

    pub fn is_allowed(&self, path: impl AsRef<Path>) -> bool {
        self.validate_path(path).is_ok()
    }

    fn has_allowed_extension(&self, path: &Path) -> bool {
        let Some(name) = path.file_name() else {
            return false;
        };
        let name = name.to_string_lossy().to_ascii_lowercase();
        self.allowed_extensions.iter().any(|ext| name.ends_with(ext.as_str()))
    }

    /// Every readable document under the base, relative to it, sorted.
    ///
    /// Hidden directories are skipped.
    pub fn list_allowed_files(&self) -> AppResult<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(&self.base_dir)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() || !self.has_allowed_extension(entry.path()) {
                continue;
            }
            let within_limit = entry
                .metadata()
                .map(|meta| meta.len() <= self.max_file_size)
                .unwrap_or(false);
            if !within_limit {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(&self.base_dir) {
                files.push(relative.to_path_buf());
            }
        }

        files.sort();
        Ok(files)
    }

    /// `path` relative to the base directory, `/`-separated.
    pub fn relative_path(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.base_dir).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    pub fn file_info(&self, path: impl AsRef<Path>) -> AppResult<FileInfo> {
        let canonical = self.validate_path(path)?;
        let metadata = std::fs::metadata(&canonical).map_err(|e| AppError::file_read(&canonical, e))?;
        let modified = metadata.modified().map_err(|e| AppError::file_read(&canonical, e))?;

        Ok(FileInfo {
            path: canonical.display().to_string(),
            relative_path: self.relative_path(&canonical),
            size: metadata.len(),
            mod_time: DateTime::<Utc>::from(modified),
            is_dir: metadata.is_dir(),
            extension: canonical
                .extension()
                .map(|ext| format!(".{}", ext.to_string_lossy()))
                .unwrap_or_default(),
        })
    }

    /// Validate `path` and read it.
    pub fn read_file(&self, path: impl AsRef<Path>) -> AppResult<Vec<u8>> {
        let canonical = self.validate_path(path)?;
        std::fs::read(&canonical).map_err(|e| AppError::file_read(&canonical, e))
    }
}

fn denied(path: &Path, reason: &str) -> AppError {
    AppError::AccessDenied(format!("{}: {}", path.display(), reason))
}

/// Resolve `.` and `..` without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
