//! Stats command handler.
//!
//! Handles document statistics display.

use clap::Args;
use mdatlas_core::{config::AppConfig, AppResult};
use std::path::PathBuf;

use super::{to_json, Document};

/// Show size and heading statistics for a Markdown file
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Markdown file (relative to the base directory)
    pub file: PathBuf,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");
        tracing::debug!("Stats options: {:?}", self);

        println!("{}", self.output(config)?);
        Ok(())
    }

    fn output(&self, config: &AppConfig) -> AppResult<String> {
        let doc = Document::open(config, &self.file)?;
        let stats = doc.manager.document_stats(&doc.path)?;
        to_json(&stats, self.pretty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{workspace, GUIDE};

    #[test]
    fn test_stats_output() {
        let (_dir, config) = workspace();
        let cmd = StatsCommand {
            file: PathBuf::from("guide.md"),
            pretty: false,
        };

        let value: serde_json::Value = serde_json::from_str(&cmd.output(&config).unwrap()).unwrap();
        assert_eq!(value["section_count"], 4);
        assert_eq!(value["total_chars"], GUIDE.len());
        assert_eq!(value["level_counts"]["2"], 2);
    }
}
