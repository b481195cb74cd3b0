//! Search command handler.

use clap::Args;
use mdatlas_core::{config::AppConfig, AppResult};
use serde_json::json;
use std::path::PathBuf;

use super::{to_json, Document};

/// Find sections whose title contains a query
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Markdown file (relative to the base directory)
    pub file: PathBuf,

    /// Text to look for in section titles
    pub query: String,

    /// Match case exactly
    #[arg(long)]
    pub case_sensitive: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

impl SearchCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing search command");
        tracing::debug!("Search options: {:?}", self);

        println!("{}", self.output(config)?);
        Ok(())
    }

    fn output(&self, config: &AppConfig) -> AppResult<String> {
        let doc = Document::open(config, &self.file)?;
        let results = doc
            .manager
            .search_sections(&doc.path, &self.query, self.case_sensitive)?;

        to_json(
            &json!({
                "file_path": self.file.display().to_string(),
                "query": self.query,
                "count": results.len(),
                "results": results,
            }),
            self.pretty,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::workspace;

    #[test]
    fn test_search_output() {
        let (_dir, config) = workspace();
        let cmd = SearchCommand {
            file: PathBuf::from("guide.md"),
            query: "LINUX".to_string(),
            case_sensitive: false,
            pretty: true,
        };

        let value: serde_json::Value = serde_json::from_str(&cmd.output(&config).unwrap()).unwrap();
        assert_eq!(value["count"], 1);
        assert_eq!(value["results"][0]["level"], 3);
    }
}
