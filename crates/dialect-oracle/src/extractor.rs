//! Row-to-entity assembly for the Oracle data dictionary.
//!
//! Auto-increment is not a column attribute in Oracle: the classic idiom is
//! a BEFORE EACH ROW insert trigger assigning `sequence.NEXTVAL` into the
//! key column. The trigger bodies are scanned here, in memory, to recover
//! that derivation.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use schemadiff_core::{
    CheckConstraint, Column, Constraint, DatabaseMetadata, DialectKind, ExtractError,
    ForeignKeyConstraint, Index, IndexType, KeyConstraint, PhaseReporter, ReferentialRule, Table,
    normalize_default,
};

use crate::types::assemble_datatype;

/// First `INTO :NEW.<identifier>` in a trigger body names the populated
/// column.
static INTO_NEW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)INTO\s+:NEW\.([A-Za-z0-9_#$]+)").expect("valid pattern"));

#[derive(Debug, Clone)]
pub(crate) struct TableRow {
    pub name: String,
    pub comment: Option<String>,
    pub row_estimate: Option<i64>,
}

#[derive(Debug, Clone)]
pub(crate) struct ColumnRow {
    pub table: String,
    pub name: String,
    pub ordinal: u32,
    pub data_type: String,
    pub precision: Option<i64>,
    pub scale: Option<i64>,
    pub char_length: Option<i64>,
    pub nullable: String,
    pub data_default: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct KeyColumnRow {
    pub table: String,
    pub constraint: String,
    pub column: String,
    pub position: i64,
}

#[derive(Debug, Clone)]
pub(crate) struct ForeignKeyRow {
    pub table: String,
    pub constraint: String,
    pub column: String,
    pub position: i64,
    pub referenced_table: String,
    pub referenced_column: String,
    pub delete_rule: String,
}

#[derive(Debug, Clone)]
pub(crate) struct CheckRow {
    pub table: String,
    pub constraint: String,
    pub condition: Option<String>,
    pub column: Option<String>,
    pub position: Option<i64>,
}

#[derive(Debug, Clone)]
pub(crate) struct IndexRow {
    pub table: String,
    pub index: String,
    pub column: String,
    pub position: i64,
    pub uniqueness: String,
    pub index_type: String,
}

#[derive(Debug, Clone)]
pub(crate) struct TriggerRow {
    pub name: String,
    pub table: String,
    pub trigger_type: String,
    pub triggering_event: String,
    pub body: Option<String>,
}

pub(crate) fn apply_tables(
    meta: &mut DatabaseMetadata,
    rows: Vec<TableRow>,
) -> Result<usize, ExtractError> {
    let count = rows.len();
    for row in rows {
        let mut table = Table::named(row.name.clone());
        table.comment = row.comment;
        table.row_estimate = row.row_estimate.and_then(|n| u64::try_from(n).ok());
        meta.tables
            .insert(&row.name, table)
            .map_err(|dup| ExtractError::Invariant(dup.to_string()))?;
    }
    Ok(count)
}

pub(crate) fn apply_columns(
    meta: &mut DatabaseMetadata,
    rows: Vec<ColumnRow>,
    reporter: &PhaseReporter<'_>,
) -> usize {
    let mut count = 0;
    for row in rows {
        let Some(table) = meta.tables.get_mut(&row.table) else {
            reporter.warn(format!(
                "column row for unknown table `{}` dropped",
                row.table
            ));
            continue;
        };

        let mut column = Column::new(
            row.name,
            assemble_datatype(&row.data_type, row.precision, row.scale, row.char_length),
            row.ordinal,
        );
        column.not_null = row.nullable.eq_ignore_ascii_case("N");
        column.default_value = row
            .data_default
            .as_deref()
            .and_then(|raw| normalize_default(DialectKind::Oracle, raw));
        column.comment = row.comment;

        table.columns.push(column);
        count += 1;
    }
    count
}

pub(crate) fn apply_key_constraints(
    meta: &mut DatabaseMetadata,
    rows: Vec<KeyColumnRow>,
    reporter: &PhaseReporter<'_>,
    primary: bool,
) -> Result<usize, ExtractError> {
    let mut grouped: BTreeMap<(String, String), Vec<(i64, String)>> = BTreeMap::new();
    for row in rows {
        grouped
            .entry((row.table, row.constraint))
            .or_default()
            .push((row.position, row.column));
    }

    let mut count = 0;
    for ((table_name, constraint_name), mut columns) in grouped {
        let Some(table) = meta.tables.get_mut(&table_name) else {
            reporter.warn(format!(
                "constraint `{constraint_name}` for unknown table `{table_name}` dropped"
            ));
            continue;
        };
        columns.sort_by_key(|(position, _)| *position);
        let key = KeyConstraint {
            name: Some(constraint_name),
            columns: columns.into_iter().map(|(_, column)| column).collect(),
        };
        table
            .add_constraint(if primary {
                Constraint::PrimaryKey(key)
            } else {
                Constraint::Unique(key)
            })
            .map_err(ExtractError::Invariant)?;
        count += 1;
    }
    Ok(count)
}

pub(crate) fn apply_foreign_keys(
    meta: &mut DatabaseMetadata,
    rows: Vec<ForeignKeyRow>,
    reporter: &PhaseReporter<'_>,
) -> Result<usize, ExtractError> {
    struct Pending {
        columns: Vec<(i64, String, String)>,
        referenced_table: String,
        delete_rule: String,
    }

    let mut grouped: BTreeMap<(String, String), Pending> = BTreeMap::new();
    for row in rows {
        let entry = grouped
            .entry((row.table.clone(), row.constraint.clone()))
            .or_insert_with(|| Pending {
                columns: Vec::new(),
                referenced_table: row.referenced_table.clone(),
                delete_rule: row.delete_rule.clone(),
            });
        entry
            .columns
            .push((row.position, row.column, row.referenced_column));
    }

    let mut count = 0;
    for ((table_name, constraint_name), mut pending) in grouped {
        let Some(table) = meta.tables.get_mut(&table_name) else {
            reporter.warn(format!(
                "foreign key `{constraint_name}` for unknown table `{table_name}` dropped"
            ));
            continue;
        };

        pending.columns.sort_by_key(|(position, _, _)| *position);
        let (columns, referenced_columns) = pending
            .columns
            .into_iter()
            .map(|(_, column, referenced)| (column, referenced))
            .unzip();

        table
            .add_constraint(Constraint::ForeignKey(ForeignKeyConstraint {
                name: Some(constraint_name),
                columns,
                referenced_table: pending.referenced_table,
                referenced_columns,
                on_delete: ReferentialRule::parse(&pending.delete_rule)
                    .unwrap_or(ReferentialRule::NoAction),
                // The dictionary carries no update rule.
                on_update: ReferentialRule::NoAction,
            }))
            .map_err(ExtractError::Invariant)?;
        count += 1;
    }
    Ok(count)
}

/// Conditions ending `IS NOT NULL` encode column nullability, which the
/// Column flag already represents; they are filtered out.
pub(crate) fn apply_checks(
    meta: &mut DatabaseMetadata,
    rows: Vec<CheckRow>,
    reporter: &PhaseReporter<'_>,
) -> Result<usize, ExtractError> {
    struct Pending {
        condition: String,
        columns: Vec<(i64, String)>,
    }

    let mut grouped: BTreeMap<(String, String), Pending> = BTreeMap::new();
    for row in rows {
        let entry = grouped
            .entry((row.table.clone(), row.constraint.clone()))
            .or_insert_with(|| Pending {
                condition: row.condition.clone().unwrap_or_default(),
                columns: Vec::new(),
            });
        if let (Some(column), Some(position)) = (row.column, row.position) {
            entry.columns.push((position, column));
        }
    }

    let mut count = 0;
    for ((table_name, constraint_name), mut pending) in grouped {
        if is_nullability_condition(&pending.condition) {
            continue;
        }
        let Some(table) = meta.tables.get_mut(&table_name) else {
            reporter.warn(format!(
                "check constraint `{constraint_name}` for unknown table `{table_name}` dropped"
            ));
            continue;
        };
        pending.columns.sort_by_key(|(position, _)| *position);
        table
            .add_constraint(Constraint::Check(CheckConstraint {
                name: Some(constraint_name),
                columns: pending
                    .columns
                    .into_iter()
                    .map(|(_, column)| column)
                    .collect(),
                clause: pending.condition,
            }))
            .map_err(ExtractError::Invariant)?;
        count += 1;
    }
    Ok(count)
}

pub(crate) fn is_nullability_condition(condition: &str) -> bool {
    condition
        .trim()
        .trim_end_matches(['"', ')'])
        .trim()
        .to_uppercase()
        .ends_with("IS NOT NULL")
}

pub(crate) fn apply_indexes(
    meta: &mut DatabaseMetadata,
    rows: Vec<IndexRow>,
    reporter: &PhaseReporter<'_>,
) -> usize {
    struct Pending {
        columns: Vec<(i64, String)>,
        uniqueness: String,
        index_type: String,
    }

    let mut grouped: BTreeMap<(String, String), Pending> = BTreeMap::new();
    for row in rows {
        let entry = grouped
            .entry((row.table.clone(), row.index.clone()))
            .or_insert_with(|| Pending {
                columns: Vec::new(),
                uniqueness: row.uniqueness.clone(),
                index_type: row.index_type.clone(),
            });
        entry.columns.push((row.position, row.column));
    }

    let mut count = 0;
    for ((table_name, index_name), mut pending) in grouped {
        let Some(table) = meta.tables.get_mut(&table_name) else {
            reporter.warn(format!(
                "index `{index_name}` for unknown table `{table_name}` dropped"
            ));
            continue;
        };
        pending.columns.sort_by_key(|(position, _)| *position);
        let mut index = Index::new(index_name);
        index.columns = pending
            .columns
            .into_iter()
            .map(|(_, column)| column)
            .collect();
        index.unique = pending.uniqueness.eq_ignore_ascii_case("UNIQUE");
        index.index_type = IndexType::from_catalog(&pending.index_type);
        table.indexes.push(index);
        count += 1;
    }
    count
}

/// Scans BEFORE-EACH-ROW insert triggers for the sequence-assignment idiom
/// and flags the assigned column as auto-increment.
pub(crate) fn derive_auto_increment(
    meta: &mut DatabaseMetadata,
    rows: &[TriggerRow],
    reporter: &PhaseReporter<'_>,
) -> usize {
    let mut derived = 0;
    for row in rows {
        if !row.trigger_type.eq_ignore_ascii_case("BEFORE EACH ROW") {
            continue;
        }
        if !row.triggering_event.to_uppercase().contains("INSERT") {
            continue;
        }
        let Some(body) = row.body.as_deref() else {
            continue;
        };
        if !body.to_uppercase().contains("NEXTVAL") {
            continue;
        }
        let Some(captures) = INTO_NEW.captures(body) else {
            continue;
        };
        let column_name = &captures[1];

        let Some(table) = meta.tables.get_mut(&row.table) else {
            reporter.warn(format!(
                "trigger `{}` names unknown table `{}`",
                row.name, row.table
            ));
            continue;
        };
        match table.column_mut(column_name) {
            Some(column) => {
                column.auto_increment = true;
                derived += 1;
            }
            None => reporter.warn(format!(
                "trigger `{}` assigns unknown column `{}` on `{}`",
                row.name, column_name, row.table
            )),
        }
    }
    derived
}
