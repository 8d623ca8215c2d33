//! Row-to-entity assembly for the MySQL catalog.
//!
//! The driver drains each catalog query into plain row structs; everything
//! here is pure so the assembly rules are testable without a server.

use std::collections::BTreeMap;

use schemadiff_core::{
    CheckConstraint, Column, Constraint, DatabaseMetadata, DialectKind, ExtractError,
    ForeignKeyConstraint, Index, IndexType, KeyConstraint, Phase, PhaseReporter, ReferentialRule,
    Table, normalize_default,
};

use crate::types::{assemble_datatype, is_auto_increment, is_unsigned};

#[derive(Debug, Clone)]
pub(crate) struct TableRow {
    pub name: String,
    pub engine: Option<String>,
    pub collation: Option<String>,
    pub comment: Option<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub row_estimate: Option<u64>,
}

#[derive(Debug, Clone)]
pub(crate) struct ColumnRow {
    pub table: String,
    pub name: String,
    pub ordinal: u32,
    pub default_value: Option<String>,
    pub nullable: String,
    pub data_type: String,
    pub char_length: Option<u64>,
    pub numeric_precision: Option<u64>,
    pub numeric_scale: Option<u64>,
    pub column_type: String,
    pub extra: String,
    pub comment: Option<String>,
    pub character_set: Option<String>,
    pub collation: Option<String>,
}

/// One (constraint, column) pair for PRIMARY KEY / UNIQUE aggregation.
#[derive(Debug, Clone)]
pub(crate) struct KeyColumnRow {
    pub table: String,
    pub constraint: String,
    pub column: String,
    pub position: u32,
}

#[derive(Debug, Clone)]
pub(crate) struct ForeignKeyRow {
    pub table: String,
    pub constraint: String,
    pub column: String,
    pub position: u32,
    pub referenced_table: String,
    pub referenced_column: String,
    pub update_rule: String,
    pub delete_rule: String,
}

#[derive(Debug, Clone)]
pub(crate) struct CheckRow {
    pub table: String,
    pub constraint: String,
    pub clause: String,
}

#[derive(Debug, Clone)]
pub(crate) struct IndexRow {
    pub table: String,
    pub index: String,
    pub column: String,
    pub position: u32,
    pub non_unique: bool,
    pub index_type: String,
    pub comment: Option<String>,
}

pub(crate) fn apply_tables(meta: &mut DatabaseMetadata, rows: Vec<TableRow>) -> Result<usize, ExtractError> {
    let count = rows.len();
    for row in rows {
        let mut table = Table::named(row.name.clone());
        table.engine = row.engine;
        table.collation = row.collation;
        table.comment = row.comment.filter(|c| !c.is_empty());
        table.created = row.created;
        table.updated = row.updated;
        table.row_estimate = row.row_estimate;
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
            assemble_datatype(
                &row.data_type,
                row.char_length,
                row.numeric_precision,
                row.numeric_scale,
            ),
            row.ordinal,
        );
        column.not_null = row.nullable.eq_ignore_ascii_case("NO");
        column.default_value = row
            .default_value
            .as_deref()
            .and_then(|raw| normalize_default(DialectKind::Mysql, raw));
        column.auto_increment = is_auto_increment(&row.extra);
        column.unsigned = is_unsigned(&row.column_type);
        column.comment = row.comment.filter(|c| !c.is_empty());
        column.character_set = row.character_set;
        column.collation = row.collation;

        table.columns.push(column);
        count += 1;
    }
    count
}

/// Aggregates key-column rows into one constraint per name, column order
/// taken from the explicit position column.
fn group_key_columns(rows: Vec<KeyColumnRow>) -> BTreeMap<(String, String), Vec<(u32, String)>> {
    let mut grouped: BTreeMap<(String, String), Vec<(u32, String)>> = BTreeMap::new();
    for row in rows {
        grouped
            .entry((row.table, row.constraint))
            .or_default()
            .push((row.position, row.column));
    }
    for columns in grouped.values_mut() {
        columns.sort_by_key(|(position, _)| *position);
    }
    grouped
}

pub(crate) fn apply_primary_keys(
    meta: &mut DatabaseMetadata,
    rows: Vec<KeyColumnRow>,
    reporter: &PhaseReporter<'_>,
) -> Result<usize, ExtractError> {
    apply_key_constraints(meta, rows, reporter, true)
}

pub(crate) fn apply_unique_constraints(
    meta: &mut DatabaseMetadata,
    rows: Vec<KeyColumnRow>,
    reporter: &PhaseReporter<'_>,
) -> Result<usize, ExtractError> {
    apply_key_constraints(meta, rows, reporter, false)
}

fn apply_key_constraints(
    meta: &mut DatabaseMetadata,
    rows: Vec<KeyColumnRow>,
    reporter: &PhaseReporter<'_>,
    primary: bool,
) -> Result<usize, ExtractError> {
    let mut count = 0;
    for ((table_name, constraint_name), columns) in group_key_columns(rows) {
        let Some(table) = meta.tables.get_mut(&table_name) else {
            reporter.warn(format!(
                "constraint `{constraint_name}` for unknown table `{table_name}` dropped"
            ));
            continue;
        };

        let key = KeyConstraint {
            name: Some(constraint_name),
            columns: columns.into_iter().map(|(_, column)| column).collect(),
        };
        let constraint = if primary {
            Constraint::PrimaryKey(key)
        } else {
            Constraint::Unique(key)
        };
        table
            .add_constraint(constraint)
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
        columns: Vec<(u32, String, String)>,
        referenced_table: String,
        update_rule: String,
        delete_rule: String,
    }

    let mut grouped: BTreeMap<(String, String), Pending> = BTreeMap::new();
    for row in rows {
        let entry = grouped
            .entry((row.table.clone(), row.constraint.clone()))
            .or_insert_with(|| Pending {
                columns: Vec::new(),
                referenced_table: row.referenced_table.clone(),
                update_rule: row.update_rule.clone(),
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
                on_delete: parse_rule(&pending.delete_rule, reporter),
                on_update: parse_rule(&pending.update_rule, reporter),
            }))
            .map_err(ExtractError::Invariant)?;
        count += 1;
    }
    Ok(count)
}

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
    rows: Vec<CheckRow>,
    reporter: &PhaseReporter<'_>,
) -> Result<usize, ExtractError> {
    let mut count = 0;
    for row in rows {
        let Some(table) = meta.tables.get_mut(&row.table) else {
            reporter.warn(format!(
                "check constraint `{}` for unknown table `{}` dropped",
                row.constraint, row.table
            ));
            continue;
        };
        table
            .add_constraint(Constraint::Check(CheckConstraint {
                name: Some(row.constraint),
                columns: Vec::new(),
                clause: row.clause,
            }))
            .map_err(ExtractError::Invariant)?;
        count += 1;
    }
    Ok(count)
}

/// Unique indexes that back a UNIQUE constraint are not secondary indexes;
/// they are dropped here by constraint-name match.
pub(crate) fn apply_indexes(
    meta: &mut DatabaseMetadata,
    rows: Vec<IndexRow>,
    reporter: &PhaseReporter<'_>,
) -> usize {
    struct Pending {
        columns: Vec<(u32, String)>,
        unique: bool,
        index_type: String,
        comment: Option<String>,
    }

    let mut grouped: BTreeMap<(String, String), Pending> = BTreeMap::new();
    for row in rows {
        let entry = grouped
            .entry((row.table.clone(), row.index.clone()))
            .or_insert_with(|| Pending {
                columns: Vec::new(),
                unique: !row.non_unique,
                index_type: row.index_type.clone(),
                comment: row.comment.clone().filter(|c| !c.is_empty()),
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

        let backs_unique_constraint = table.constraints.iter().any(|constraint| {
            matches!(constraint, Constraint::Unique(_))
                && constraint
                    .name()
                    .is_some_and(|name| name.eq_ignore_ascii_case(&index_name))
        });
        if backs_unique_constraint {
            continue;
        }

        pending.columns.sort_by_key(|(position, _)| *position);
        let mut index = Index::new(index_name);
        index.columns = pending
            .columns
            .into_iter()
            .map(|(_, column)| column)
            .collect();
        index.unique = pending.unique;
        index.index_type = IndexType::from_catalog(&pending.index_type);
        index.comment = pending.comment;
        table.indexes.push(index);
        count += 1;
    }
    count
}

/// Error 1146: INFORMATION_SCHEMA.CHECK_CONSTRAINTS is absent before MySQL
/// 8.0.16. The whole CHECK sub-phase degrades to empty.
pub(crate) fn is_missing_check_catalog(error: &schemadiff_core::CatalogError) -> bool {
    error.code == Some(1146)
}

pub(crate) fn assembly_error(phase: Phase, detail: impl Into<String>) -> ExtractError {
    ExtractError::Assembly {
        phase,
        detail: detail.into(),
    }
}

#[cfg(test)]
mod tests {
    use schemadiff_core::{ExtractorOptions, constraint_signature};

    use super::*;

    fn reporter_options() -> ExtractorOptions {
        ExtractorOptions::default()
    }

    fn meta_with_tables(names: &[&str]) -> DatabaseMetadata {
        let mut meta = DatabaseMetadata::new("app");
        let rows = names
            .iter()
            .map(|name| TableRow {
                name: (*name).to_string(),
                engine: Some("InnoDB".to_string()),
                collation: None,
                comment: None,
                created: None,
                updated: None,
                row_estimate: None,
            })
            .collect();
        apply_tables(&mut meta, rows).unwrap();
        meta
    }

    fn column_row(table: &str, name: &str, ordinal: u32) -> ColumnRow {
        ColumnRow {
            table: table.to_string(),
            name: name.to_string(),
            ordinal,
            default_value: None,
            nullable: "YES".to_string(),
            data_type: "int".to_string(),
            char_length: None,
            numeric_precision: Some(10),
            numeric_scale: Some(0),
            column_type: "int".to_string(),
            extra: String::new(),
            comment: None,
            character_set: None,
            collation: None,
        }
    }

    #[test]
    fn duplicate_table_names_violate_the_metadata_invariant() {
        let mut meta = DatabaseMetadata::new("app");
        let rows = vec![
            TableRow {
                name: "users".to_string(),
                engine: None,
                collation: None,
                comment: None,
                created: None,
                updated: None,
                row_estimate: None,
            },
            TableRow {
                name: "USERS".to_string(),
                engine: None,
                collation: None,
                comment: None,
                created: None,
                updated: None,
                row_estimate: None,
            },
        ];
        assert!(matches!(
            apply_tables(&mut meta, rows),
            Err(ExtractError::Invariant(_))
        ));
    }

    #[test]
    fn column_rows_for_unknown_tables_are_dropped_with_a_warning() {
        let options = reporter_options();
        let reporter = PhaseReporter::new(&options);
        let mut meta = meta_with_tables(&["users"]);

        let applied = apply_columns(
            &mut meta,
            vec![column_row("users", "id", 1), column_row("ghost", "id", 1)],
            &reporter,
        );

        assert_eq!(applied, 1);
        assert_eq!(meta.tables.get("users").unwrap().columns.len(), 1);
    }

    #[test]
    fn auto_increment_and_unsigned_flags_come_from_extra_and_column_type() {
        let options = reporter_options();
        let reporter = PhaseReporter::new(&options);
        let mut meta = meta_with_tables(&["users"]);

        let mut row = column_row("users", "id", 1);
        row.nullable = "NO".to_string();
        row.extra = "auto_increment".to_string();
        row.column_type = "int unsigned".to_string();
        apply_columns(&mut meta, vec![row], &reporter);

        let column = &meta.tables.get("users").unwrap().columns[0];
        assert!(column.not_null);
        assert!(column.auto_increment);
        assert!(column.unsigned);
    }

    #[test]
    fn quoted_default_is_normalised() {
        let options = reporter_options();
        let reporter = PhaseReporter::new(&options);
        let mut meta = meta_with_tables(&["users"]);

        let mut row = column_row("users", "status", 1);
        row.default_value = Some("'active'".to_string());
        apply_columns(&mut meta, vec![row], &reporter);

        let column = &meta.tables.get("users").unwrap().columns[0];
        assert_eq!(column.default_value.as_deref(), Some("active"));
    }

    #[test]
    fn composite_key_columns_are_ordered_by_position_not_row_order() {
        let options = reporter_options();
        let reporter = PhaseReporter::new(&options);
        let mut meta = meta_with_tables(&["t"]);

        let rows = vec![
            KeyColumnRow {
                table: "t".to_string(),
                constraint: "PRIMARY".to_string(),
                column: "b".to_string(),
                position: 2,
            },
            KeyColumnRow {
                table: "t".to_string(),
                constraint: "PRIMARY".to_string(),
                column: "a".to_string(),
                position: 1,
            },
        ];
        apply_primary_keys(&mut meta, rows, &reporter).unwrap();

        let table = meta.tables.get("t").unwrap();
        assert_eq!(table.constraints.len(), 1);
        assert_eq!(table.primary_key().unwrap().columns(), ["a", "b"]);
    }

    #[test]
    fn foreign_key_rows_aggregate_with_aligned_reference_columns() {
        let options = reporter_options();
        let reporter = PhaseReporter::new(&options);
        let mut meta = meta_with_tables(&["child"]);

        let rows = vec![
            ForeignKeyRow {
                table: "child".to_string(),
                constraint: "fk_child".to_string(),
                column: "tenant_id".to_string(),
                position: 2,
                referenced_table: "parent".to_string(),
                referenced_column: "tenant".to_string(),
                update_rule: "NO ACTION".to_string(),
                delete_rule: "CASCADE".to_string(),
            },
            ForeignKeyRow {
                table: "child".to_string(),
                constraint: "fk_child".to_string(),
                column: "parent_id".to_string(),
                position: 1,
                referenced_table: "parent".to_string(),
                referenced_column: "id".to_string(),
                update_rule: "NO ACTION".to_string(),
                delete_rule: "CASCADE".to_string(),
            },
        ];
        apply_foreign_keys(&mut meta, rows, &reporter).unwrap();

        let table = meta.tables.get("child").unwrap();
        let Constraint::ForeignKey(fk) = &table.constraints[0] else {
            panic!("expected a foreign key");
        };
        assert_eq!(fk.columns, ["parent_id", "tenant_id"]);
        assert_eq!(fk.referenced_columns, ["id", "tenant"]);
        assert_eq!(fk.on_delete, ReferentialRule::Cascade);
        assert!(
            constraint_signature(&table.constraints[0]).contains("ON DELETE CASCADE")
        );
    }

    #[test]
    fn unique_backing_index_is_excluded() {
        let options = reporter_options();
        let reporter = PhaseReporter::new(&options);
        let mut meta = meta_with_tables(&["users"]);
        apply_unique_constraints(
            &mut meta,
            vec![KeyColumnRow {
                table: "users".to_string(),
                constraint: "uq_email".to_string(),
                column: "email".to_string(),
                position: 1,
            }],
            &reporter,
        )
        .unwrap();

        let rows = vec![
            IndexRow {
                table: "users".to_string(),
                index: "uq_email".to_string(),
                column: "email".to_string(),
                position: 1,
                non_unique: false,
                index_type: "BTREE".to_string(),
                comment: None,
            },
            IndexRow {
                table: "users".to_string(),
                index: "idx_name".to_string(),
                column: "name".to_string(),
                position: 1,
                non_unique: true,
                index_type: "BTREE".to_string(),
                comment: None,
            },
        ];
        let applied = apply_indexes(&mut meta, rows, &reporter);

        assert_eq!(applied, 1);
        let table = meta.tables.get("users").unwrap();
        assert_eq!(table.indexes.len(), 1);
        assert_eq!(table.indexes[0].name, "idx_name");
        assert_eq!(table.indexes[0].index_type, IndexType::BTree);
    }

    #[test]
    fn missing_check_catalog_error_is_recognised() {
        let error = schemadiff_core::CatalogError::new("no such table").with_code(1146);
        assert!(is_missing_check_catalog(&error));
    }
}
