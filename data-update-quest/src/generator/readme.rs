//! Markdown report accompanying a generated script.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use super::MigrationSubject;
use crate::differ::ChangeSet;

/// Render the README describing the detected changes and how to apply `transform.jq`.
pub fn render_readme(changes: &ChangeSet, subject: &MigrationSubject, generated_at: DateTime<Utc>) -> String {
    let mut content = String::new();

    let _ = writeln!(content, "# Data Migration Templates");
    let _ = writeln!(content);
    let _ = writeln!(
        content,
        "These templates were generated from the schema differences between two API description versions."
    );
    let _ = writeln!(content);
    let _ = writeln!(content, "- Generated: {}", generated_at.format("%Y-%m-%dT%H:%M:%SZ"));
    let _ = writeln!(
        content,
        "- Source: `{}` in `{}`",
        subject.source_model, subject.source_document
    );
    let _ = writeln!(
        content,
        "- Target: `{}` in `{}`",
        subject.target_model, subject.target_document
    );
    let _ = writeln!(content);

    let _ = writeln!(content, "## Changes Detected");
    let _ = writeln!(content);

    if changes.is_empty() {
        let _ = writeln!(content, "No changes detected. `transform.jq` is the identity filter.");
        let _ = writeln!(content);
    }

    if !changes.renames.is_empty() {
        let _ = writeln!(content, "### Field Renames");
        for rename in &changes.renames {
            let _ = writeln!(content, "- `{}` → `{}`", rename.from, rename.to);
        }
        let _ = writeln!(content);
    }

    if !changes.removals.is_empty() {
        let _ = writeln!(content, "### Field Removals");
        for removal in &changes.removals {
            let _ = writeln!(content, "- `{}`", removal.field);
        }
        let _ = writeln!(content);
    }

    if !changes.additions.is_empty() {
        let _ = writeln!(content, "### Field Additions");
        for addition in &changes.additions {
            match &addition.default {
                Some(default) => {
                    let _ = writeln!(content, "- `{}` (default: `{default}`)", addition.field);
                }
                None => {
                    let _ = writeln!(content, "- `{}`", addition.field);
                }
            }
        }
        let _ = writeln!(content);
    }

    if !changes.type_changes.is_empty() {
        let _ = writeln!(content, "### Type Changes");
        let _ = writeln!(
            content,
            "⚠ Not handled by `transform.jq`. Convert these values manually."
        );
        let _ = writeln!(content);
        for change in &changes.type_changes {
            let _ = writeln!(
                content,
                "- `{}`: {} → {}",
                change.field, change.old_type, change.new_type
            );
        }
        let _ = writeln!(content);
    }

    write_usage(&mut content);
    content
}

fn write_usage(content: &mut String) {
    let _ = writeln!(content, "## Usage Instructions");
    let _ = writeln!(content);
    let _ = writeln!(content, "### jq Script (Command Line)");
    let _ = writeln!(content, "```bash");
    let _ = writeln!(content, "#!/bin/bash");
    let _ = writeln!(content, "# Iterate through Redis keys and apply transformation");
    let _ = writeln!(content, "redis-cli --scan --pattern \"your-pattern:*\" | while read key; do");
    let _ = writeln!(
        content,
        "  redis-cli JSON.GET \"$key\" | jq -c -f transform.jq | redis-cli -x JSON.SET \"$key\" '$'"
    );
    let _ = writeln!(content, "done");
    let _ = writeln!(content, "```");
    let _ = writeln!(content);
    let _ = writeln!(content, "### Offline Round Trip");
    let _ = writeln!(content, "```bash");
    let _ = writeln!(content, "duq redis dump ./dump");
    let _ = writeln!(content, "for file in ./dump/*/*.json; do");
    let _ = writeln!(content, "  jq -f transform.jq \"$file\" > \"$file.tmp\" && mv \"$file.tmp\" \"$file\"");
    let _ = writeln!(content, "done");
    let _ = writeln!(content, "duq redis upload ./dump");
    let _ = writeln!(content, "```");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::differ::{Addition, FieldPath, Removal, TypeChange};
    use chrono::TimeZone;
    use serde_json::json;

    fn subject() -> MigrationSubject {
        MigrationSubject {
            source_document: "api-v1.yaml".to_string(),
            source_model: "Organization".to_string(),
            target_document: "api-v2.yaml".to_string(),
            target_model: "Organization".to_string(),
        }
    }

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap()
    }

    #[test]
    fn test_empty_changes_readme() {
        let readme = render_readme(&ChangeSet::default(), &subject(), timestamp());

        assert!(readme.starts_with("# Data Migration Templates\n"));
        assert!(readme.contains("- Generated: 2025-03-14T09:26:53Z"));
        assert!(readme.contains("- Source: `Organization` in `api-v1.yaml`"));
        assert!(readme.contains("No changes detected."));
        assert!(!readme.contains("### Field Removals"));
        assert!(readme.contains("## Usage Instructions"));
    }

    #[test]
    fn test_sections_listed() {
        let changes = ChangeSet {
            removals: vec![Removal {
                field: FieldPath::new(["id"]),
            }],
            additions: vec![
                Addition {
                    field: FieldPath::new(["age"]),
                    default: Some(json!(0)),
                },
                Addition {
                    field: FieldPath::new(["nickname"]),
                    default: None,
                },
            ],
            type_changes: vec![TypeChange {
                field: FieldPath::new(["size"]),
                old_type: "string".to_string(),
                new_type: "integer".to_string(),
            }],
            ..Default::default()
        };

        let readme = render_readme(&changes, &subject(), timestamp());
        assert!(readme.contains("### Field Removals\n- `id`\n"));
        assert!(readme.contains("- `age` (default: `0`)\n- `nickname`\n"));
        assert!(readme.contains("- `size`: string → integer"));
        assert!(readme.contains("Convert these values manually"));
        assert!(!readme.contains("No changes detected"));
        assert!(!readme.contains("### Field Renames"));
    }

    #[test]
    fn test_usage_mentions_script() {
        let readme = render_readme(&ChangeSet::default(), &subject(), timestamp());
        assert!(readme.contains("jq -c -f transform.jq"));
        assert!(readme.contains("duq redis upload ./dump"));
    }
}
