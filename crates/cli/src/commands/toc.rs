//! Table of contents command handler.

use clap::Args;
use mdatlas_core::{config::AppConfig, AppResult};
use serde_json::json;
use std::path::PathBuf;

use super::{to_json, Document};

/// Show a flat table of contents
#[derive(Args, Debug)]
pub struct TocCommand {
    /// Markdown file (relative to the base directory)
    pub file: PathBuf,

    /// Deepest heading level to include (0 = all)
    #[arg(long, default_value_t = 0)]
    pub max_depth: u8,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

impl TocCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing toc command");
        tracing::debug!("Toc options: {:?}", self);

        println!("{}", self.output(config)?);
        Ok(())
    }

    fn output(&self, config: &AppConfig) -> AppResult<String> {
        let doc = Document::open(config, &self.file)?;
        let toc = doc.manager.table_of_contents(&doc.path, self.max_depth)?;

        to_json(
            &json!({
                "file_path": self.file.display().to_string(),
                "count": toc.len(),
                "toc": toc,
            }),
            self.pretty,
        )
    }
}
