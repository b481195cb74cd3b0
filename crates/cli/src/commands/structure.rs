//! Structure command handler.
//!
//! Prints the hierarchical heading outline of a document as JSON.

use clap::Args;
use mdatlas_core::{config::AppConfig, AppResult};
use std::path::PathBuf;

use super::{to_json, Document};

/// Show the heading structure of a Markdown file
#[derive(Args, Debug)]
pub struct StructureCommand {
    /// Markdown file (relative to the base directory)
    pub file: PathBuf,

    /// Deepest heading level to include (0 = all)
    #[arg(long, default_value_t = 0)]
    pub max_depth: u8,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

impl StructureCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing structure command");
        tracing::debug!("Structure options: {:?}", self);

        println!("{}", self.output(config)?);
        Ok(())
    }

    fn output(&self, config: &AppConfig) -> AppResult<String> {
        let doc = Document::open(config, &self.file)?;
        let structure = doc.manager.structure_with_depth(&doc.path, self.max_depth)?;
        to_json(&structure, self.pretty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::workspace;

    #[test]
    fn test_structure_output() {
        let (_dir, config) = workspace();
        let cmd = StructureCommand {
            file: PathBuf::from("guide.md"),
            max_depth: 2,
            pretty: false,
        };

        let value: serde_json::Value = serde_json::from_str(&cmd.output(&config).unwrap()).unwrap();
        assert_eq!(value["structure"][0]["title"], "Guide");
        assert_eq!(value["structure"][0]["children"][0]["children"], serde_json::json!([]));
    }
}
