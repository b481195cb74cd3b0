//! MCP resources: every allowed document exposed as a structure and a
//! content resource under `markdown://file/<relative path>/<kind>`.

use mdatlas_core::{AppError, AppResult};
use mdatlas_outline::{AccessControl, StructureManager};
use std::path::Path;
use std::sync::Arc;

use crate::protocol::{Resource, ResourceContents};

const URI_PREFIX: &str = "markdown://file/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Structure,
    Content,
}

impl ResourceKind {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Structure => "structure",
            Self::Content => "content",
        }
    }

    fn mime_type(&self) -> &'static str {
        match self {
            Self::Structure => "application/json",
            Self::Content => "text/markdown",
        }
    }
}

/// Split a resource URI into the document path and resource kind.
///
/// Malformed URIs and unknown kinds are protocol errors.
pub fn parse_uri(uri: &str) -> AppResult<(String, ResourceKind)> {
    let rest = uri
        .strip_prefix(URI_PREFIX)
        .ok_or_else(|| AppError::Protocol(format!("Invalid resource URI: {}", uri)))?;
    let (file, kind) = rest
        .rsplit_once('/')
        .filter(|(file, _)| !file.is_empty())
        .ok_or_else(|| AppError::Protocol(format!("Invalid resource URI: {}", uri)))?;

    let kind = match kind {
        "structure" => ResourceKind::Structure,
        "content" => ResourceKind::Content,
        other => {
            return Err(AppError::Protocol(format!("Unknown resource type: {}", other)));
        }
    };
    Ok((file.to_string(), kind))
}

fn resource_uri(relative: &str, kind: ResourceKind) -> String {
    format!("{}{}/{}", URI_PREFIX, relative, kind.as_str())
}

#[derive(Debug, Clone)]
pub struct ResourceHandler {
    access: Arc<AccessControl>,
    manager: StructureManager,
}

impl ResourceHandler {
    pub fn new(access: Arc<AccessControl>, manager: StructureManager) -> Self {
        Self { access, manager }
    }

    pub fn list(&self) -> AppResult<Vec<Resource>> {
        let files = self.access.list_allowed_files()?;
        let mut resources = Vec::with_capacity(files.len() * 2);

        for file in files {
            let relative = self.access.relative_path(&self.access.base_dir().join(&file));
            let name = Path::new(&relative)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| relative.clone());

            resources.push(Resource {
                uri: resource_uri(&relative, ResourceKind::Structure),
                name: format!("Structure of {}", name),
                description: format!("Hierarchical structure of {}", relative),
                mime_type: ResourceKind::Structure.mime_type().to_string(),
            });
            resources.push(Resource {
                uri: resource_uri(&relative, ResourceKind::Content),
                name: format!("Content of {}", name),
                description: format!("Full content of {}", relative),
                mime_type: ResourceKind::Content.mime_type().to_string(),
            });
        }

        Ok(resources)
    }

    pub fn read(&self, uri: &str) -> AppResult<ResourceContents> {
        let (file, kind) = parse_uri(uri)?;
        let path = self.access.validate_path(&file)?;

        let text = match kind {
            ResourceKind::Structure => {
                let structure = self.manager.document_structure(&path)?;
                serde_json::to_string_pretty(&*structure)?
            }
            ResourceKind::Content => {
                let bytes = self.access.read_file(&path)?;
                String::from_utf8_lossy(&bytes).into_owned()
            }
        };

        Ok(ResourceContents {
            uri: uri.to_string(),
            mime_type: kind.mime_type().to_string(),
            text,
        })
    }
}
