//! Row parsing and entity assembly for the SQL Server catalog.
//!
//! The driver drains every query into `Vec<Option<String>>` rows (all
//! non-character columns are CAST in SQL), so parsing here is plain string
//! work and runs without a server in tests.

use std::collections::BTreeMap;

use schemadiff_core::{
    CheckConstraint, Column, Constraint, DatabaseMetadata, DialectKind, ExtractError,
    ForeignKeyConstraint, Index, IndexType, KeyConstraint, Phase, PhaseReporter, ReferentialRule,
    Table, Trigger, TriggerEvent, TriggerLevel, TriggerTiming, normalize_default,
};

use crate::types::assemble_datatype;

pub(crate) type RawRow = Vec<Option<String>>;

pub(crate) fn apply_tables(
    meta: &mut DatabaseMetadata,
    rows: &[RawRow],
) -> Result<usize, ExtractError> {
    for row in rows {
        let name = require(row, 0, Phase::Tables, "table name")?;
        let mut table = Table::named(name.clone());
        table.comment = field(row, 1);
        table.created = field(row, 2);
        table.updated = field(row, 3);
        meta.tables
            .insert(&name, table)
            .map_err(|dup| ExtractError::Invariant(dup.to_string()))?;
    }
    Ok(rows.len())
}

pub(crate) fn apply_columns(
    meta: &mut DatabaseMetadata,
    rows: &[RawRow],
    reporter: &PhaseReporter<'_>,
) -> Result<usize, ExtractError> {
    let mut count = 0;
    for row in rows {
        let table_name = require(row, 0, Phase::Columns, "table name")?;
        let Some(table) = meta.tables.get_mut(&table_name) else {
            reporter.warn(format!(
                "column row for unknown table `{table_name}` dropped"
            ));
            continue;
        };

        let name = require(row, 1, Phase::Columns, "column name")?;
        let ordinal = require_u32(row, 2, Phase::Columns, "column_id")?;
        let base_type = require(row, 3, Phase::Columns, "type name")?;
        let max_length = field_i32(row, 4);
        let precision = field_i32(row, 5);
        let scale = field_i32(row, 6);

        let mut column = Column::new(
            name,
            assemble_datatype(&base_type, max_length, precision, scale),
            ordinal,
        );
        column.not_null = !field_bool(row, 7);
        column.auto_increment = field_bool(row, 8);
        column.default_value = row
            .get(9)
            .and_then(|value| value.as_deref())
            .and_then(|raw| normalize_default(DialectKind::Mssql, raw));
        column.comment = field(row, 10);
        column.collation = field(row, 11);

        table.columns.push(column);
        count += 1;
    }
    Ok(count)
}

pub(crate) fn apply_key_constraints(
    meta: &mut DatabaseMetadata,
    rows: &[RawRow],
    reporter: &PhaseReporter<'_>,
    primary: bool,
) -> Result<usize, ExtractError> {
    let mut grouped: BTreeMap<(String, String), Vec<(u32, String)>> = BTreeMap::new();
    for row in rows {
        let table = require(row, 0, Phase::Constraints, "table name")?;
        let constraint = require(row, 1, Phase::Constraints, "constraint name")?;
        let column = require(row, 2, Phase::Constraints, "column name")?;
        let position = require_u32(row, 3, Phase::Constraints, "key_ordinal")?;
        grouped
            .entry((table, constraint))
            .or_default()
            .push((position, column));
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
    rows: &[RawRow],
    reporter: &PhaseReporter<'_>,
) -> Result<usize, ExtractError> {
    struct Pending {
        columns: Vec<(u32, String, String)>,
        referenced_table: String,
        update_rule: String,
        delete_rule: String,
    }

    let mut grouped: BTreeMap<(String, String), Pending> = BTreeMap::new();
    for row in rows {
        let table = require(row, 0, Phase::Constraints, "table name")?;
        let constraint = require(row, 1, Phase::Constraints, "constraint name")?;
        let column = require(row, 2, Phase::Constraints, "column name")?;
        let position = require_u32(row, 3, Phase::Constraints, "constraint_column_id")?;
        let referenced_table = require(row, 4, Phase::Constraints, "referenced table")?;
        let referenced_column = require(row, 5, Phase::Constraints, "referenced column")?;

        let entry = grouped
            .entry((table, constraint))
            .or_insert_with(|| Pending {
                columns: Vec::new(),
                referenced_table,
                update_rule: field(row, 6).unwrap_or_default(),
                delete_rule: field(row, 7).unwrap_or_default(),
            });
        entry.columns.push((position, column, referenced_column));
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
                on_delete: parse_rule(&pending.delete_rule, reporter),
                on_update: parse_rule(&pending.update_rule, reporter),
            }))
            .map_err(ExtractError::Invariant)?;
        count += 1;
    }
    Ok(count)
}

/// `NO_ACTION` / `SET_NULL` and friends come underscore-separated.
fn parse_rule(raw: &str, reporter: &PhaseReporter<'_>) -> ReferentialRule {
    ReferentialRule::parse(raw).unwrap_or_else(|| {
        reporter.warn(format!(
            "unrecognised referential rule `{raw}`, treated as NO ACTION"
        ));
        ReferentialRule::NoAction
    })
}

pub(crate) fn apply_checks(
    meta: &mut DatabaseMetadata,
    rows: &[RawRow],
    reporter: &PhaseReporter<'_>,
) -> Result<usize, ExtractError> {
    let mut count = 0;
    for row in rows {
        let table_name = require(row, 0, Phase::Constraints, "table name")?;
        let Some(table) = meta.tables.get_mut(&table_name) else {
            reporter.warn(format!(
                "check constraint row for unknown table `{table_name}` dropped"
            ));
            continue;
        };
        table
            .add_constraint(Constraint::Check(CheckConstraint {
                name: field(row, 1),
                columns: Vec::new(),
                clause: field(row, 2).unwrap_or_default(),
            }))
            .map_err(ExtractError::Invariant)?;
        count += 1;
    }
    Ok(count)
}

pub(crate) fn apply_indexes(
    meta: &mut DatabaseMetadata,
    rows: &[RawRow],
    reporter: &PhaseReporter<'_>,
) -> Result<usize, ExtractError> {
    struct Pending {
        columns: Vec<(u32, String)>,
        unique: bool,
        type_desc: String,
    }

    let mut grouped: BTreeMap<(String, String), Pending> = BTreeMap::new();
    for row in rows {
        let table = require(row, 0, Phase::Indexes, "table name")?;
        let index = require(row, 1, Phase::Indexes, "index name")?;
        let column = require(row, 2, Phase::Indexes, "column name")?;
        let position = require_u32(row, 3, Phase::Indexes, "key_ordinal")?;
        let entry = grouped
            .entry((table, index))
            .or_insert_with(|| Pending {
                columns: Vec::new(),
                unique: field_bool(row, 4),
                type_desc: field(row, 5).unwrap_or_default(),
            });
        entry.columns.push((position, column));
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
        index.unique = pending.unique;
        index.index_type = IndexType::from_catalog(&pending.type_desc);
        table.indexes.push(index);
        count += 1;
    }
    Ok(count)
}

pub(crate) fn apply_triggers(
    meta: &mut DatabaseMetadata,
    rows: &[RawRow],
    reporter: &PhaseReporter<'_>,
) -> Result<usize, ExtractError> {
    struct Pending {
        table: String,
        timing: TriggerTiming,
        events: Vec<TriggerEvent>,
    }

    let mut grouped: BTreeMap<String, Pending> = BTreeMap::new();
    for row in rows {
        let name = require(row, 0, Phase::Triggers, "trigger name")?;
        let table = require(row, 1, Phase::Triggers, "table name")?;
        let timing = match field(row, 2).unwrap_or_default().to_uppercase().as_str() {
            "INSTEAD OF" => TriggerTiming::InsteadOf,
            _ => TriggerTiming::After,
        };
        let event = match field(row, 3).unwrap_or_default().to_uppercase().as_str() {
            "INSERT" => Some(TriggerEvent::Insert),
            "UPDATE" => Some(TriggerEvent::Update),
            "DELETE" => Some(TriggerEvent::Delete),
            other => {
                reporter.warn(format!(
                    "trigger `{name}` has unsupported event `{other}`, skipped"
                ));
                None
            }
        };

        let entry = grouped.entry(name).or_insert_with(|| Pending {
            table,
            timing,
            events: Vec::new(),
        });
        if let Some(event) = event {
            entry.events.push(event);
        }
    }

    let count = grouped.len();
    for (name, pending) in grouped {
        let trigger = Trigger {
            name: name.clone(),
            table: pending.table,
            timing: pending.timing,
            events: pending.events,
            // T-SQL DML triggers always fire per statement.
            level: TriggerLevel::Statement,
            function_name: None,
            when_clause: None,
        };
        meta.triggers
            .insert(&name, trigger)
            .map_err(|dup| ExtractError::Invariant(dup.to_string()))?;
    }
    Ok(count)
}

fn field(row: &RawRow, index: usize) -> Option<String> {
    row.get(index)
        .and_then(|value| value.clone())
        .filter(|value| !value.is_empty())
}

fn field_i32(row: &RawRow, index: usize) -> i32 {
    row.get(index)
        .and_then(|value| value.as_deref())
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or_default()
}

fn field_bool(row: &RawRow, index: usize) -> bool {
    row.get(index)
        .and_then(|value| value.as_deref())
        .is_some_and(|value| value.trim() == "1")
}

fn require(row: &RawRow, index: usize, phase: Phase, label: &str) -> Result<String, ExtractError> {
    field(row, index).ok_or_else(|| ExtractError::Assembly {
        phase,
        detail: format!("missing {label} in catalog row"),
    })
}

fn require_u32(
    row: &RawRow,
    index: usize,
    phase: Phase,
    label: &str,
) -> Result<u32, ExtractError> {
    require(row, index, phase, label)?
        .trim()
        .parse()
        .map_err(|_| ExtractError::Assembly {
            phase,
            detail: format!("non-numeric {label} in catalog row"),
        })
}
