//! YAML-driven diff scenarios.
//!
//! A scenario file declares two schemas and the findings the comparison is
//! expected to produce. Tests deserialize the file, build both metadata
//! values, run the comparison engine, and verify the expectation block.

use std::fmt;

use schemadiff_core::{
    CheckConstraint, Column, ComparisonEngine, Constraint, DatabaseMetadata, DiffResult,
    ForeignKeyConstraint, Index, IndexType, KeyConstraint, ReferentialRule, ReportRenderer, Table,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub name: String,
    pub reference: SchemaSpec,
    pub target: SchemaSpec,
    pub expect: Expectation,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaSpec {
    #[serde(default)]
    pub tables: Vec<TableSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableSpec {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
    #[serde(default)]
    pub primary_key: Option<KeySpec>,
    #[serde(default)]
    pub unique: Vec<KeySpec>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeySpec>,
    #[serde(default)]
    pub checks: Vec<CheckSpec>,
    #[serde(default)]
    pub indexes: Vec<IndexSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default)]
    pub not_null: bool,
    #[serde(default)]
    pub auto_increment: bool,
    #[serde(default)]
    pub unsigned: bool,
    #[serde(default)]
    pub default: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeySpec {
    #[serde(default)]
    pub name: Option<String>,
    pub columns: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForeignKeySpec {
    #[serde(default)]
    pub name: Option<String>,
    pub columns: Vec<String>,
    pub references: String,
    pub ref_columns: Vec<String>,
    #[serde(default)]
    pub on_delete: Option<String>,
    #[serde(default)]
    pub on_update: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub columns: Vec<String>,
    pub clause: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexSpec {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub index_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Expectation {
    #[serde(default)]
    pub missing_tables: Vec<String>,
    #[serde(default)]
    pub extra_tables: Vec<String>,
    #[serde(default)]
    pub column_findings: usize,
    #[serde(default)]
    pub constraint_findings: usize,
    #[serde(default)]
    pub index_findings: usize,
    #[serde(default)]
    pub total: Option<usize>,
    #[serde(default)]
    pub report_contains: Vec<String>,
}

#[derive(Debug)]
pub struct ScenarioError(pub String);

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ScenarioError {}

impl Scenario {
    pub fn from_yaml(source: &str) -> Result<Self, ScenarioError> {
        serde_yaml::from_str(source).map_err(|error| ScenarioError(error.to_string()))
    }

    /// Builds both sides, runs the comparison, and verifies every
    /// expectation. The error lists all mismatches at once.
    pub fn check(&self) -> Result<(), ScenarioError> {
        let reference = build_metadata(&self.reference)?;
        let target = build_metadata(&self.target)?;
        let diff = ComparisonEngine::new().compare(&reference, &target);

        let mut problems = Vec::new();
        self.verify(&diff, &mut problems);

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ScenarioError(format!(
                "scenario `{}`:\n  {}",
                self.name,
                problems.join("\n  ")
            )))
        }
    }

    fn verify(&self, diff: &DiffResult, problems: &mut Vec<String>) {
        if diff.missing_tables != self.expect.missing_tables {
            problems.push(format!(
                "missing tables: expected {:?}, got {:?}",
                self.expect.missing_tables, diff.missing_tables
            ));
        }
        if diff.extra_tables != self.expect.extra_tables {
            problems.push(format!(
                "extra tables: expected {:?}, got {:?}",
                self.expect.extra_tables, diff.extra_tables
            ));
        }

        let column_findings: usize = diff.column_diffs.iter().map(|t| t.findings.len()).sum();
        if column_findings != self.expect.column_findings {
            problems.push(format!(
                "column findings: expected {}, got {column_findings}",
                self.expect.column_findings
            ));
        }
        let constraint_findings: usize =
            diff.constraint_diffs.iter().map(|t| t.findings.len()).sum();
        if constraint_findings != self.expect.constraint_findings {
            problems.push(format!(
                "constraint findings: expected {}, got {constraint_findings}",
                self.expect.constraint_findings
            ));
        }
        let index_findings: usize = diff.index_diffs.iter().map(|t| t.findings.len()).sum();
        if index_findings != self.expect.index_findings {
            problems.push(format!(
                "index findings: expected {}, got {index_findings}",
                self.expect.index_findings
            ));
        }

        if let Some(total) = self.expect.total
            && diff.total() != total
        {
            problems.push(format!("total: expected {total}, got {}", diff.total()));
        }

        if !self.expect.report_contains.is_empty() {
            let report = ReportRenderer::new().render(diff);
            for needle in &self.expect.report_contains {
                if !report.contains(needle) {
                    problems.push(format!("report does not contain `{needle}`"));
                }
            }
        }
    }
}

fn build_metadata(spec: &SchemaSpec) -> Result<DatabaseMetadata, ScenarioError> {
    let mut meta = DatabaseMetadata::new("scenario");
    for table_spec in &spec.tables {
        let table = build_table(table_spec)?;
        meta.tables
            .insert(&table_spec.name, table)
            .map_err(|dup| ScenarioError(dup.to_string()))?;
    }
    Ok(meta)
}

fn build_table(spec: &TableSpec) -> Result<Table, ScenarioError> {
    let mut table = Table::named(&spec.name);

    for (position, column_spec) in spec.columns.iter().enumerate() {
        let mut column = Column::new(
            &column_spec.name,
            &column_spec.data_type,
            (position + 1) as u32,
        );
        column.not_null = column_spec.not_null;
        column.auto_increment = column_spec.auto_increment;
        column.unsigned = column_spec.unsigned;
        column.default_value = column_spec.default.clone();
        table.columns.push(column);
    }

    if let Some(key) = &spec.primary_key {
        push(
            &mut table,
            Constraint::PrimaryKey(KeyConstraint {
                name: key.name.clone(),
                columns: key.columns.clone(),
            }),
        )?;
    }
    for key in &spec.unique {
        push(
            &mut table,
            Constraint::Unique(KeyConstraint {
                name: key.name.clone(),
                columns: key.columns.clone(),
            }),
        )?;
    }
    for fk in &spec.foreign_keys {
        push(
            &mut table,
            Constraint::ForeignKey(ForeignKeyConstraint {
                name: fk.name.clone(),
                columns: fk.columns.clone(),
                referenced_table: fk.references.clone(),
                referenced_columns: fk.ref_columns.clone(),
                on_delete: rule(fk.on_delete.as_deref())?,
                on_update: rule(fk.on_update.as_deref())?,
            }),
        )?;
    }
    for check in &spec.checks {
        push(
            &mut table,
            Constraint::Check(CheckConstraint {
                name: check.name.clone(),
                columns: check.columns.clone(),
                clause: check.clause.clone(),
            }),
        )?;
    }
    for index_spec in &spec.indexes {
        let mut index = Index::new(&index_spec.name);
        index.columns = index_spec.columns.clone();
        index.unique = index_spec.unique;
        index.index_type = index_spec
            .index_type
            .as_deref()
            .map_or(IndexType::Normal, IndexType::from_catalog);
        table.indexes.push(index);
    }

    Ok(table)
}

fn push(table: &mut Table, constraint: Constraint) -> Result<(), ScenarioError> {
    table.add_constraint(constraint).map_err(ScenarioError)
}

fn rule(raw: Option<&str>) -> Result<ReferentialRule, ScenarioError> {
    match raw {
        None => Ok(ReferentialRule::NoAction),
        Some(raw) => ReferentialRule::parse(raw)
            .ok_or_else(|| ScenarioError(format!("unknown referential rule `{raw}`"))),
    }
}
