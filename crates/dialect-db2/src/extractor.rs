//! Row-to-entity assembly for the DB2 system catalog.
//!
//! The ODBC driver drains every query into `Vec<Option<String>>` rows, so
//! assembly is string work over plain values.

use std::collections::BTreeMap;

use schemadiff_core::{
    CheckConstraint, Column, Constraint, DatabaseMetadata, DialectKind, ExtractError,
    ForeignKeyConstraint, Index, IndexType, KeyConstraint, Phase, PhaseReporter, ReferentialRule,
    Table, normalize_default,
};

pub(crate) type RawRow = Vec<Option<String>>;

pub(crate) fn apply_tables(
    meta: &mut DatabaseMetadata,
    rows: &[RawRow],
) -> Result<usize, ExtractError> {
    for row in rows {
        let name = require(row, 0, Phase::Tables, "table name")?;
        let mut table = Table::named(name.clone());
        table.comment = field(row, 1);
        table.row_estimate = field(row, 2)
            .and_then(|card| card.trim().parse::<i64>().ok())
            .filter(|card| *card >= 0)
            .map(|card| card as u64);
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
        let colno = require_i64(row, 2, Phase::Columns, "COLNO")?;
        let type_name = require(row, 3, Phase::Columns, "TYPENAME")?;
        let length = field_i64(row, 4);
        let scale = field_i64(row, 5);

        let mut column = Column::new(
            name,
            assemble_datatype(&type_name, length, scale),
            u32::try_from(colno + 1).map_err(|_| ExtractError::Assembly {
                phase: Phase::Columns,
                detail: format!("invalid COLNO {colno}"),
            })?,
        );
        // SYSCAT.COLUMNS.NULLS is 'N' for not-null.
        column.not_null = field(row, 6).as_deref() == Some("N");
        column.default_value = row
            .get(7)
            .and_then(|value| value.as_deref())
            .and_then(|raw| normalize_default(DialectKind::Db2, raw));
        column.auto_increment = field(row, 8).as_deref() == Some("Y");
        column.comment = field(row, 9);

        table.columns.push(column);
        count += 1;
    }
    Ok(count)
}

/// DB2 reports fragmented types: character types carry LENGTH, decimals
/// carry LENGTH as precision plus SCALE.
pub(crate) fn assemble_datatype(type_name: &str, length: i64, scale: i64) -> String {
    let base = type_name.trim().to_lowercase();
    match base.as_str() {
        "varchar" | "character" | "char" | "vargraphic" | "graphic" | "binary" | "varbinary" => {
            format!("{base}({length})")
        }
        "decimal" | "numeric" => {
            if scale > 0 {
                format!("{base}({length},{scale})")
            } else {
                format!("{base}({length})")
            }
        }
        _ => base,
    }
}

pub(crate) fn apply_key_constraints(
    meta: &mut DatabaseMetadata,
    rows: &[RawRow],
    reporter: &PhaseReporter<'_>,
    primary: bool,
) -> Result<usize, ExtractError> {
    let mut grouped: BTreeMap<(String, String), Vec<(i64, String)>> = BTreeMap::new();
    for row in rows {
        let table = require(row, 0, Phase::Constraints, "table name")?;
        let constraint = require(row, 1, Phase::Constraints, "constraint name")?;
        let column = require(row, 2, Phase::Constraints, "column name")?;
        let position = require_i64(row, 3, Phase::Constraints, "COLSEQ")?;
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

pub(crate) fn rule_from_letter(letter: &str) -> ReferentialRule {
    match letter.trim() {
        "C" => ReferentialRule::Cascade,
        "N" => ReferentialRule::SetNull,
        "R" => ReferentialRule::Restrict,
        _ => ReferentialRule::NoAction,
    }
}

pub(crate) fn apply_foreign_keys(
    meta: &mut DatabaseMetadata,
    rows: &[RawRow],
    reporter: &PhaseReporter<'_>,
) -> Result<usize, ExtractError> {
    struct Pending {
        columns: Vec<(i64, String, String)>,
        referenced_table: String,
        delete_rule: String,
        update_rule: String,
    }

    let mut grouped: BTreeMap<(String, String), Pending> = BTreeMap::new();
    for row in rows {
        let table = require(row, 0, Phase::Constraints, "table name")?;
        let constraint = require(row, 1, Phase::Constraints, "constraint name")?;
        let column = require(row, 2, Phase::Constraints, "column name")?;
        let position = require_i64(row, 3, Phase::Constraints, "COLSEQ")?;
        let referenced_table = require(row, 4, Phase::Constraints, "referenced table")?;
        let referenced_column = require(row, 5, Phase::Constraints, "referenced column")?;

        let entry = grouped
            .entry((table, constraint))
            .or_insert_with(|| Pending {
                columns: Vec::new(),
                referenced_table,
                delete_rule: field(row, 6).unwrap_or_default(),
                update_rule: field(row, 7).unwrap_or_default(),
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
                on_delete: rule_from_letter(&pending.delete_rule),
                on_update: rule_from_letter(&pending.update_rule),
            }))
            .map_err(ExtractError::Invariant)?;
        count += 1;
    }
    Ok(count)
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
        columns: Vec<(i64, String)>,
        unique: bool,
        index_type: String,
    }

    let mut grouped: BTreeMap<(String, String), Pending> = BTreeMap::new();
    for row in rows {
        let table = require(row, 0, Phase::Indexes, "table name")?;
        let index = require(row, 1, Phase::Indexes, "index name")?;
        let column = require(row, 2, Phase::Indexes, "column name")?;
        let position = require_i64(row, 3, Phase::Indexes, "COLSEQ")?;
        let entry = grouped
            .entry((table, index))
            .or_insert_with(|| Pending {
                columns: Vec::new(),
                unique: field(row, 4).as_deref() == Some("U"),
                index_type: field(row, 5).unwrap_or_default(),
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
        index.index_type = IndexType::from_catalog(&pending.index_type);
        table.indexes.push(index);
        count += 1;
    }
    Ok(count)
}

fn field(row: &RawRow, index: usize) -> Option<String> {
    row.get(index)
        .and_then(|value| value.clone())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn field_i64(row: &RawRow, index: usize) -> i64 {
    field(row, index)
        .and_then(|value| value.parse().ok())
        .unwrap_or_default()
}

fn require(row: &RawRow, index: usize, phase: Phase, label: &str) -> Result<String, ExtractError> {
    field(row, index).ok_or_else(|| ExtractError::Assembly {
        phase,
        detail: format!("missing {label} in catalog row"),
    })
}

fn require_i64(
    row: &RawRow,
    index: usize,
    phase: Phase,
    label: &str,
) -> Result<i64, ExtractError> {
    require(row, index, phase, label)?
        .parse()
        .map_err(|_| ExtractError::Assembly {
            phase,
            detail: format!("non-numeric {label} in catalog row"),
        })
}
