//! MCP tool definitions and handlers.

use mdatlas_core::{AppError, AppResult};
use mdatlas_outline::{apply_format, render, AccessControl, ContentFormat, StructureManager};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::protocol::ToolResult;

const FILE_PATH_DESCRIPTION: &str = "Path to the Markdown file (relative to base directory)";

/// List all available tools with their schemas.
pub fn list_tools() -> Vec<Value> {
    vec![
        json!({
            "name": "get_markdown_structure",
            "description": "Get the hierarchical heading structure of a Markdown file",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "file_path": { "type": "string", "description": FILE_PATH_DESCRIPTION },
                    "max_depth": {
                        "type": "integer",
                        "description": "Deepest heading level to include (optional)",
                        "minimum": 1,
                        "maximum": 6
                    }
                },
                "required": ["file_path"]
            }
        }),
        json!({
            "name": "get_markdown_section",
            "description": "Get the content of one section by its ID",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "file_path": { "type": "string", "description": FILE_PATH_DESCRIPTION },
                    "section_id": { "type": "string", "description": "ID of the section to retrieve" },
                    "include_children": {
                        "type": "boolean",
                        "description": "Include nested subsections in the content",
                        "default": false
                    },
                    "format": {
                        "type": "string",
                        "description": "Output format for the content",
                        "enum": ["markdown", "plain", "json"],
                        "default": "markdown"
                    }
                },
                "required": ["file_path", "section_id"]
            }
        }),
        json!({
            "name": "search_markdown_content",
            "description": "Find sections whose title contains a query",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "file_path": { "type": "string", "description": FILE_PATH_DESCRIPTION },
                    "query": { "type": "string", "description": "Text to look for in section titles" },
                    "case_sensitive": {
                        "type": "boolean",
                        "description": "Match case exactly",
                        "default": false
                    }
                },
                "required": ["file_path", "query"]
            }
        }),
        json!({
            "name": "get_markdown_stats",
            "description": "Get size and heading statistics for a Markdown file",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "file_path": { "type": "string", "description": FILE_PATH_DESCRIPTION }
                },
                "required": ["file_path"]
            }
        }),
        json!({
            "name": "get_markdown_toc",
            "description": "Get a flat table of contents for a Markdown file",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "file_path": { "type": "string", "description": FILE_PATH_DESCRIPTION },
                    "max_depth": {
                        "type": "integer",
                        "description": "Deepest heading level to include",
                        "minimum": 1,
                        "maximum": 6
                    }
                },
                "required": ["file_path"]
            }
        }),
    ]
}

#[derive(Debug, Deserialize)]
struct StructureArgs {
    file_path: String,
    #[serde(default)]
    max_depth: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct SectionArgs {
    file_path: String,
    section_id: String,
    #[serde(default)]
    include_children: bool,
    #[serde(default)]
    format: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    file_path: String,
    query: String,
    #[serde(default)]
    case_sensitive: bool,
}

#[derive(Debug, Deserialize)]
struct FileArgs {
    file_path: String,
}

/// Runs tool calls against the access gate and structure manager.
#[derive(Debug, Clone)]
pub struct ToolHandler {
    access: Arc<AccessControl>,
    manager: StructureManager,
}

impl ToolHandler {
    pub fn new(access: Arc<AccessControl>, manager: StructureManager) -> Self {
        Self { access, manager }
    }

    /// Execute `name`. Failures are reported in the result, never as an
    /// RPC error.
    pub fn call(&self, name: &str, arguments: Value) -> ToolResult {
        tracing::info!("Calling tool: {}", name);

        let outcome = match name {
            "get_markdown_structure" => parse_args(name, arguments).and_then(|a| self.structure(a)),
            "get_markdown_section" => parse_args(name, arguments).and_then(|a| self.section(a)),
            "search_markdown_content" => parse_args(name, arguments).and_then(|a| self.search(a)),
            "get_markdown_stats" => parse_args(name, arguments).and_then(|a| self.stats(a)),
            "get_markdown_toc" => parse_args(name, arguments).and_then(|a| self.toc(a)),
            _ => Err(AppError::Other(format!("Unknown tool: {}", name))),
        };

        match outcome {
            Ok(text) => ToolResult::text(text),
            Err(e) => {
                tracing::warn!("Tool {} failed: {}", name, e);
                ToolResult::failure(e.to_string())
            }
        }
    }

    fn structure(&self, args: StructureArgs) -> AppResult<String> {
        let path = self.access.validate_path(&args.file_path)?;
        let structure = self
            .manager
            .structure_with_depth(&path, args.max_depth.unwrap_or(0))?;
        Ok(serde_json::to_string_pretty(&structure)?)
    }

    fn section(&self, args: SectionArgs) -> AppResult<String> {
        let format = match args.format.as_deref() {
            Some(format) => format.parse::<ContentFormat>()?,
            None => ContentFormat::default(),
        };
        let path = self.access.validate_path(&args.file_path)?;
        let section = self
            .manager
            .section_content(&path, &args.section_id, args.include_children)?;
        render(&apply_format(section, format))
    }

    fn search(&self, args: SearchArgs) -> AppResult<String> {
        let path = self.access.validate_path(&args.file_path)?;
        let results = self
            .manager
            .search_sections(&path, &args.query, args.case_sensitive)?;
        Ok(serde_json::to_string_pretty(&json!({
            "file_path": args.file_path,
            "query": args.query,
            "count": results.len(),
            "results": results,
        }))?)
    }

    fn stats(&self, args: FileArgs) -> AppResult<String> {
        let path = self.access.validate_path(&args.file_path)?;
        let stats = self.manager.document_stats(&path)?;
        Ok(serde_json::to_string_pretty(&stats)?)
    }

    fn toc(&self, args: StructureArgs) -> AppResult<String> {
        let path = self.access.validate_path(&args.file_path)?;
        let toc = self
            .manager
            .table_of_contents(&path, args.max_depth.unwrap_or(0))?;
        Ok(serde_json::to_string_pretty(&json!({
            "file_path": args.file_path,
            "count": toc.len(),
            "toc": toc,
        }))?)
    }
}

fn parse_args<T: DeserializeOwned>(tool: &str, arguments: Value) -> AppResult<T> {
    let arguments = if arguments.is_null() { json!({}) } else { arguments };
    serde_json::from_value(arguments)
        .map_err(|e| AppError::Protocol(format!("Invalid arguments for {}: {}", tool, e)))
}
