use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use comfy_table::{Cell, Table};
use serde::Serialize;

use data_update_quest::ChangeSet;
use data_update_quest::generator::save_templates;

use super::ModelArgs;
use crate::context::CliContext;
use crate::examples::ExampleGroup;
use crate::output::{GlobalOptions, OutputManager, TableDisplay, table_with_header};
use crate::theme::Glyph;

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Generate Templates",
        commands: &[
            "duq generate api-v1.yaml api-v2.yaml Organization Organization            # Write ./transform.jq and ./README.md",
            "duq generate v1.json v2.json Dataset Dataset -o migrations/dataset-v2     # Choose the output directory",
        ],
    },
    ExampleGroup {
        title: "Renames",
        commands: &["duq generate v1.yaml v2.yaml Solution Solution --detect-renames   # Copy renamed fields instead of resetting them"],
    },
];

#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub models: ModelArgs,

    /// Directory receiving transform.jq and README.md (default: config, then current directory)
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,
}

/// What `generate` produced
#[derive(Debug, Serialize)]
pub struct GenerateSummary {
    pub output_dir: PathBuf,
    pub files: Vec<PathBuf>,
    pub script: String,
    pub changes: ChangeSet,
}

impl TableDisplay for GenerateSummary {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = table_with_header(options, &["Removals", "Additions", "Renames", "Type Changes (manual)"]);
        table.add_row(vec![
            Cell::new(self.changes.removals.len()),
            Cell::new(self.changes.additions.len()),
            Cell::new(self.changes.renames.len()),
            Cell::new(self.changes.type_changes.len()),
        ]);
        table
    }

    fn to_compact(&self) -> String {
        self.script.clone()
    }
}

pub fn handle_generate(args: GenerateArgs, ctx: &CliContext, output: &OutputManager) -> Result<()> {
    output.heading("Generate Migration Templates");
    output.key_value("Source", &format!("{} ({})", args.models.source_model, args.models.source.display()));
    output.key_value("Target", &format!("{} ({})", args.models.target_model, args.models.target.display()));

    output.progress("Comparing schemas");
    let generator = args.models.generator(ctx)?;
    let changes = generator.analyze_changes()?;
    output.end_progress();

    for issue in &changes.issues {
        output.warning(&format!("Skipped {}: {}", issue.path, issue.reason));
    }
    output.verbose(&format!("{} field change(s) detected", changes.len()));

    let templates = data_update_quest::MigrationTemplates::render(&changes, generator.subject(), Utc::now());
    let output_dir = args.output_dir.unwrap_or_else(|| ctx.output_dir());
    let files = save_templates(&templates, &output_dir)
        .with_context(|| format!("Failed to write templates to {}", output_dir.display()))?;

    output.success(&format!("Templates written to {}", output_dir.display()));
    for file in &files {
        output.item(Glyph::File, &file.display().to_string());
    }

    if changes.is_empty() {
        output.info("No field changes detected; transform.jq is the identity filter");
    }
    if !changes.type_changes.is_empty() {
        output.warning("Type changes need manual conversion, see README.md");
        for change in &changes.type_changes {
            output.item(Glyph::Bullet, &format!("{}: {} → {}", change.field, change.old_type, change.new_type));
        }
    }

    output.display(&GenerateSummary {
        output_dir,
        files,
        script: templates.script,
        changes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_update_quest::{FieldPath, Removal};

    #[test]
    fn test_summary_compact_is_script() {
        let summary = GenerateSummary {
            output_dir: PathBuf::from("out"),
            files: vec![PathBuf::from("out/transform.jq"), PathBuf::from("out/README.md")],
            script: "del(.id)".to_string(),
            changes: ChangeSet {
                removals: vec![Removal {
                    field: FieldPath::new(["id"]),
                }],
                ..Default::default()
            },
        };

        assert_eq!(summary.to_compact(), "del(.id)");
        let rendered = summary.to_table(&GlobalOptions::default()).to_string();
        assert!(rendered.contains("Removals"));
    }
}
