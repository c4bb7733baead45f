pub mod diff;
pub mod generate;
pub mod redis;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use data_update_quest::TemplateGenerator;

use crate::context::CliContext;

/// The two documents and models being compared
#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// Source API description (OpenAPI 3.x or Swagger 2.x, YAML or JSON)
    pub source: PathBuf,

    /// Target API description
    pub target: PathBuf,

    /// Model name in the source document
    pub source_model: String,

    /// Model name in the target document
    pub target_model: String,

    /// Treat a removed and an added field of the same type as a rename
    #[arg(long)]
    pub detect_renames: bool,
}

impl ModelArgs {
    /// Load both documents and extract the models
    pub fn generator(&self, ctx: &CliContext) -> Result<TemplateGenerator> {
        let generator = TemplateGenerator::from_files(&self.source, &self.source_model, &self.target, &self.target_model)
            .with_context(|| {
                format!(
                    "Failed to load '{}' from {} and '{}' from {}",
                    self.source_model,
                    self.source.display(),
                    self.target_model,
                    self.target.display()
                )
            })?;

        Ok(generator.with_rename_detection(self.detect_renames || ctx.config.generate.detect_renames))
    }
}
