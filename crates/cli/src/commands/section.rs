//! Section command handler.
//!
//! Prints the content of one section, selected by ID.

use clap::Args;
use mdatlas_core::{config::AppConfig, AppResult};
use mdatlas_outline::{apply_format, ContentFormat};
use std::path::PathBuf;

use super::{to_json, Document};

/// Show the content of one section
#[derive(Args, Debug)]
pub struct SectionCommand {
    /// Markdown file (relative to the base directory)
    pub file: PathBuf,

    /// Section ID, as reported by `structure` or `toc`
    #[arg(long)]
    pub section_id: String,

    /// Include nested subsections
    #[arg(long)]
    pub include_children: bool,

    /// Output format (markdown, plain, json)
    #[arg(short = 'o', long, default_value = "markdown")]
    pub format: String,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

impl SectionCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing section command");
        tracing::debug!("Section options: {:?}", self);

        println!("{}", self.output(config)?);
        Ok(())
    }

    fn output(&self, config: &AppConfig) -> AppResult<String> {
        let format: ContentFormat = self.format.parse()?;
        let doc = Document::open(config, &self.file)?;
        let section = doc
            .manager
            .section_content(&doc.path, &self.section_id, self.include_children)?;

        let section = apply_format(section, format);
        match format {
            ContentFormat::Json => to_json(&section, self.pretty),
            ContentFormat::Markdown | ContentFormat::Plain => Ok(section.content),
        }
    }
}
