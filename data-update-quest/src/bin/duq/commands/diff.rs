use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Table};

use data_update_quest::ChangeSet;

use super::ModelArgs;
use crate::context::CliContext;
use crate::examples::ExampleGroup;
use crate::output::{GlobalOptions, OutputFormat, OutputManager, TableDisplay, table_with_header};
use crate::theme::change_tone;

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Inspect Changes",
        commands: &[
            "duq diff api-v1.yaml api-v2.yaml Organization Organization     # Table of field changes",
            "duq --output json diff v1.json v2.json Dataset Dataset          # Machine-readable change set",
        ],
    },
    ExampleGroup {
        title: "Renames",
        commands: &["duq diff v1.yaml v2.yaml Solution Solution --detect-renames   # Pair same-typed fields"],
    },
];

#[derive(Args, Debug)]
pub struct DiffArgs {
    #[command(flatten)]
    pub models: ModelArgs,
}

pub fn handle_diff(args: DiffArgs, ctx: &CliContext, output: &OutputManager) -> Result<()> {
    output.heading("Schema Diff");
    output.key_value("Source", &format!("{} ({})", args.models.source_model, args.models.source.display()));
    output.key_value("Target", &format!("{} ({})", args.models.target_model, args.models.target.display()));

    output.progress("Comparing schemas");
    let generator = args.models.generator(ctx)?;
    let changes = generator.analyze_changes()?;
    output.end_progress();

    for issue in &changes.issues {
        output.warning(&format!("Skipped {}: {}", issue.path, issue.reason));
    }

    if changes.is_empty() {
        output.success("No field changes detected");
    }
    if !changes.is_empty() || output.options.output_format == OutputFormat::Json {
        output.display(&changes)?;
    }

    if !changes.type_changes.is_empty() {
        output.warning("Type changes are not handled by the generated script and need manual conversion");
    }

    Ok(())
}

impl TableDisplay for ChangeSet {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = table_with_header(options, &["", "Field", "Change"]);

        for (kind, field, detail) in self.entries() {
            let marker = Cell::new(kind.to_string());
            let marker = if options.no_color { marker } else { marker.fg(change_tone(kind).cell_color()) };
            table.add_row(vec![marker, Cell::new(field), Cell::new(detail)]);
        }

        table
    }

    fn to_compact(&self) -> String {
        self.entries()
            .into_iter()
            .map(|(kind, field, _)| format!("{kind}{field}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
