//! Text rendering of a [`DiffResult`].
//!
//! Output is a pure function of the diff: identical diffs render to
//! byte-identical reports. Empty sections are omitted.

use std::fmt::Write as _;

use crate::diff::{ConstraintFinding, DiffResult, FindingKind, TableFindings};

const WIDTH: usize = 80;

#[derive(Debug, Default, Clone, Copy)]
pub struct ReportRenderer;

impl ReportRenderer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn render(&self, diff: &DiffResult) -> String {
        let mut out = String::new();

        let total = diff.total();
        rule(&mut out);
        boxed(&mut out, "SCHEMA COMPARISON REPORT");
        boxed(&mut out, &difference_count(total));
        rule(&mut out);

        if total == 0 {
            return out;
        }

        if !diff.missing_tables.is_empty() {
            section(&mut out, "MISSING TABLES (in reference, absent from target)");
            for table in &diff.missing_tables {
                let _ = writeln!(out, "  - {table}");
            }
        }

        if !diff.extra_tables.is_empty() {
            section(&mut out, "EXTRA TABLES (absent from reference, in target)");
            for table in &diff.extra_tables {
                let _ = writeln!(out, "  + {table}");
            }
        }

        if !diff.column_diffs.is_empty() {
            section(&mut out, "COLUMN DIFFERENCES");
            for table in &diff.column_diffs {
                let _ = writeln!(out, "  {}", table.table);
                for finding in &table.findings {
                    let _ = writeln!(
                        out,
                        "    {} {} {}",
                        finding.kind.marker(),
                        finding.kind,
                        finding.column
                    );
                    for change in &finding.changes {
                        let _ = writeln!(out, "        {change}");
                    }
                }
            }
        }

        if !diff.constraint_diffs.is_empty() {
            section(&mut out, "CONSTRAINT DIFFERENCES");
            for table in &diff.constraint_diffs {
                let _ = writeln!(out, "  {}", table.table);
                render_constraint_findings(&mut out, table);
            }
        }

        if !diff.index_diffs.is_empty() {
            section(&mut out, "INDEX DIFFERENCES");
            for table in &diff.index_diffs {
                let _ = writeln!(out, "  {}", table.table);
                for finding in &table.findings {
                    let _ = writeln!(
                        out,
                        "    {} {} {}",
                        finding.kind.marker(),
                        finding.kind,
                        finding.index
                    );
                    for change in &finding.changes {
                        let _ = writeln!(out, "        {change}");
                    }
                }
            }
        }

        out.push('\n');
        out.push_str("LEGEND\n");
        out.push_str("  - MISSING   present in reference, absent from target\n");
        out.push_str("  + EXTRA     absent from reference, present in target\n");
        out.push_str("  ~ MODIFIED  present in both with differing attributes\n");

        out
    }
}

fn render_constraint_findings(out: &mut String, table: &TableFindings<ConstraintFinding>) {
    for finding in &table.findings {
        let _ = writeln!(
            out,
            "    {} {} {}",
            finding.kind.marker(),
            finding.kind,
            finding.label
        );
        match finding.kind {
            FindingKind::Modified => {
                if let Some(reference) = &finding.reference {
                    let _ = writeln!(
                        out,
                        "        reference: {}",
                        crate::signature::constraint_signature(reference)
                    );
                }
                if let Some(target) = &finding.target {
                    let _ = writeln!(
                        out,
                        "        target:    {}",
                        crate::signature::constraint_signature(target)
                    );
                }
            }
            FindingKind::Missing | FindingKind::Extra => {
                if finding.label != finding.signature {
                    let _ = writeln!(out, "        {}", finding.signature);
                }
            }
        }
    }
}

fn difference_count(total: usize) -> String {
    if total == 1 {
        "1 Difference Found".to_string()
    } else {
        format!("{total} Differences Found")
    }
}

fn rule(out: &mut String) {
    out.push('+');
    out.push_str(&"-".repeat(WIDTH - 2));
    out.push_str("+\n");
}

fn boxed(out: &mut String, text: &str) {
    let inner = WIDTH - 4;
    let _ = writeln!(out, "| {text:<inner$} |");
}

fn section(out: &mut String, title: &str) {
    out.push('\n');
    out.push_str(title);
    out.push('\n');
}
