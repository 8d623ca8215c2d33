//! Row-to-entity assembly for the PostgreSQL catalog.

use std::collections::BTreeMap;

use schemadiff_core::{
    CheckConstraint, Column, Constraint, DatabaseMetadata, DialectKind, ExtractError,
    ForeignKeyConstraint, Function, FunctionSecurity, Index, IndexType, KeyConstraint,
    PhaseReporter, ReferentialRule, Sequence, Table, Trigger, TriggerEvent, TriggerLevel,
    TriggerTiming, Volatility, normalize_default,
};

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
    pub not_null: bool,
    pub default_expr: Option<String>,
    pub identity: Option<String>,
    pub comment: Option<String>,
    pub collation: Option<String>,
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
    pub update_action: String,
    pub delete_action: String,
}

#[derive(Debug, Clone)]
pub(crate) struct CheckRow {
    pub table: String,
    pub constraint: String,
    pub clause: String,
    pub column: Option<String>,
    pub position: Option<i64>,
}

#[derive(Debug, Clone)]
pub(crate) struct IndexRow {
    pub table: String,
    pub index: String,
    pub column: String,
    pub position: i64,
    pub unique: bool,
    pub access_method: String,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct SequenceRow {
    pub name: String,
    pub start: Option<i64>,
    pub increment: Option<i64>,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
    pub cache: Option<i64>,
    pub cycle: bool,
    pub owner: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct FunctionRow {
    pub name: String,
    pub schema: String,
    pub return_type: String,
    pub language: String,
    pub body: String,
    pub argument_signature: String,
    pub volatility: String,
    pub strict: bool,
    pub security_definer: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct TriggerRow {
    pub name: String,
    pub table: String,
    pub timing: String,
    pub event: String,
    pub orientation: String,
    pub action_statement: String,
    pub when_clause: Option<String>,
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

        let mut column = Column::new(row.name, row.data_type, row.ordinal);
        column.not_null = row.not_null;
        // Serial columns materialise as a nextval() default; identity columns
        // carry the attidentity marker instead.
        let is_nextval = row
            .default_expr
            .as_deref()
            .is_some_and(|expr| expr.trim_start().starts_with("nextval("));
        let is_identity = row
            .identity
            .as_deref()
            .is_some_and(|marker| marker == "a" || marker == "d");
        column.auto_increment = is_nextval || is_identity;
        column.default_value = row
            .default_expr
            .as_deref()
            .and_then(|raw| normalize_default(DialectKind::Postgres, raw));
        column.comment = row.comment;
        column.collation = row.collation;

        table.columns.push(column);
        count += 1;
    }
    count
}

fn group_key_columns(
    rows: Vec<KeyColumnRow>,
) -> BTreeMap<(String, String), Vec<(i64, String)>> {
    let mut grouped: BTreeMap<(String, String), Vec<(i64, String)>> = BTreeMap::new();
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

pub(crate) fn apply_key_constraints(
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

/// pg_constraint encodes referential actions as single letters.
pub(crate) fn action_from_letter(letter: &str) -> ReferentialRule {
    match letter {
        "r" => ReferentialRule::Restrict,
        "c" => ReferentialRule::Cascade,
        "n" => ReferentialRule::SetNull,
        "d" => ReferentialRule::SetDefault,
        _ => ReferentialRule::NoAction,
    }
}

pub(crate) fn apply_foreign_keys(
    meta: &mut DatabaseMetadata,
    rows: Vec<ForeignKeyRow>,
    reporter: &PhaseReporter<'_>,
) -> Result<usize, ExtractError> {
    struct Pending {
        columns: Vec<(i64, String, String)>,
        referenced_table: String,
        update_action: String,
        delete_action: String,
    }

    let mut grouped: BTreeMap<(String, String), Pending> = BTreeMap::new();
    for row in rows {
        let entry = grouped
            .entry((row.table.clone(), row.constraint.clone()))
            .or_insert_with(|| Pending {
                columns: Vec::new(),
                referenced_table: row.referenced_table.clone(),
                update_action: row.update_action.clone(),
                delete_action: row.delete_action.clone(),
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
                on_delete: action_from_letter(&pending.delete_action),
                on_update: action_from_letter(&pending.update_action),
            }))
            .map_err(ExtractError::Invariant)?;
        count += 1;
    }
    Ok(count)
}

pub(crate) fn apply_checks(
    meta: &mut DatabaseMetadata,
    rows: Vec<CheckRow>,
    reporter: &PhaseReporter<'_>,
) -> Result<usize, ExtractError> {
    struct Pending {
        clause: String,
        columns: Vec<(i64, String)>,
    }

    let mut grouped: BTreeMap<(String, String), Pending> = BTreeMap::new();
    for row in rows {
        let entry = grouped
            .entry((row.table.clone(), row.constraint.clone()))
            .or_insert_with(|| Pending {
                clause: row.clause.clone(),
                columns: Vec::new(),
            });
        if let (Some(column), Some(position)) = (row.column, row.position) {
            entry.columns.push((position, column));
        }
    }

    let mut count = 0;
    for ((table_name, constraint_name), mut pending) in grouped {
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
                clause: pending.clause,
            }))
            .map_err(ExtractError::Invariant)?;
        count += 1;
    }
    Ok(count)
}

pub(crate) fn apply_indexes(
    meta: &mut DatabaseMetadata,
    rows: Vec<IndexRow>,
    reporter: &PhaseReporter<'_>,
) -> usize {
    struct Pending {
        columns: Vec<(i64, String)>,
        unique: bool,
        access_method: String,
        comment: Option<String>,
    }

    let mut grouped: BTreeMap<(String, String), Pending> = BTreeMap::new();
    for row in rows {
        let entry = grouped
            .entry((row.table.clone(), row.index.clone()))
            .or_insert_with(|| Pending {
                columns: Vec::new(),
                unique: row.unique,
                access_method: row.access_method.clone(),
                comment: row.comment.clone(),
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
        index.unique = pending.unique;
        index.index_type = IndexType::from_catalog(&pending.access_method);
        index.comment = pending.comment;
        table.indexes.push(index);
        count += 1;
    }
    count
}

pub(crate) fn apply_sequences(
    meta: &mut DatabaseMetadata,
    rows: Vec<SequenceRow>,
) -> Result<usize, ExtractError> {
    let count = rows.len();
    for row in rows {
        let mut sequence = Sequence::named(row.name.clone());
        sequence.start = row.start;
        sequence.increment = row.increment;
        sequence.min_value = row.min_value;
        sequence.max_value = row.max_value;
        sequence.cache = row.cache;
        sequence.cycle = row.cycle;
        sequence.owner = row.owner;
        meta.sequences
            .insert(&row.name, sequence)
            .map_err(|dup| ExtractError::Invariant(dup.to_string()))?;
    }
    Ok(count)
}

pub(crate) fn apply_functions(
    meta: &mut DatabaseMetadata,
    rows: Vec<FunctionRow>,
) -> Result<usize, ExtractError> {
    let count = rows.len();
    for row in rows {
        let function = Function {
            name: row.name,
            schema: row.schema,
            return_type: row.return_type,
            language: row.language,
            body: row.body,
            argument_signature: row.argument_signature,
            volatility: match row.volatility.as_str() {
                "i" => Some(Volatility::Immutable),
                "s" => Some(Volatility::Stable),
                "v" => Some(Volatility::Volatile),
                _ => None,
            },
            strict: row.strict,
            security: Some(if row.security_definer {
                FunctionSecurity::Definer
            } else {
                FunctionSecurity::Invoker
            }),
        };
        let key = function.key();
        meta.functions
            .insert(&key, function)
            .map_err(|dup| ExtractError::Invariant(dup.to_string()))?;
    }
    Ok(count)
}

pub(crate) fn apply_triggers(
    meta: &mut DatabaseMetadata,
    rows: Vec<TriggerRow>,
    reporter: &PhaseReporter<'_>,
) -> Result<usize, ExtractError> {
    struct Pending {
        table: String,
        timing: String,
        events: Vec<TriggerEvent>,
        orientation: String,
        action_statement: String,
        when_clause: Option<String>,
    }

    let mut grouped: BTreeMap<String, Pending> = BTreeMap::new();
    for row in rows {
        let event = match row.event.to_uppercase().as_str() {
            "INSERT" => Some(TriggerEvent::Insert),
            "UPDATE" => Some(TriggerEvent::Update),
            "DELETE" => Some(TriggerEvent::Delete),
            other => {
                reporter.warn(format!(
                    "trigger `{}` has unsupported event `{other}`, skipped",
                    row.name
                ));
                None
            }
        };
        let entry = grouped.entry(row.name.clone()).or_insert_with(|| Pending {
            table: row.table.clone(),
            timing: row.timing.clone(),
            events: Vec::new(),
            orientation: row.orientation.clone(),
            action_statement: row.action_statement.clone(),
            when_clause: row.when_clause.clone(),
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
            timing: parse_timing(&pending.timing),
            events: pending.events,
            level: if pending.orientation.eq_ignore_ascii_case("ROW") {
                TriggerLevel::Row
            } else {
                TriggerLevel::Statement
            },
            function_name: function_from_action(&pending.action_statement),
            when_clause: pending.when_clause,
        };
        meta.triggers
            .insert(&name, trigger)
            .map_err(|dup| ExtractError::Invariant(dup.to_string()))?;
    }
    Ok(count)
}

fn parse_timing(raw: &str) -> TriggerTiming {
    match raw.to_uppercase().as_str() {
        "AFTER" => TriggerTiming::After,
        "INSTEAD OF" => TriggerTiming::InsteadOf,
        _ => TriggerTiming::Before,
    }
}

/// `EXECUTE FUNCTION set_updated_at()` -> `set_updated_at`.
pub(crate) fn function_from_action(action: &str) -> Option<String> {
    let trimmed = action.trim();
    let rest = trimmed
        .strip_prefix("EXECUTE FUNCTION ")
        .or_else(|| trimmed.strip_prefix("EXECUTE PROCEDURE "))?;
    let name = rest.split('(').next()?.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use schemadiff_core::ExtractorOptions;

    use super::*;

    fn meta_with_table(name: &str) -> DatabaseMetadata {
        let mut meta = DatabaseMetadata::new("public");
        apply_tables(
            &mut meta,
            vec![TableRow {
                name: name.to_string(),
                comment: None,
                row_estimate: None,
            }],
        )
        .unwrap();
        meta
    }

    fn column_row(table: &str, name: &str, ordinal: u32) -> ColumnRow {
        ColumnRow {
            table: table.to_string(),
            name: name.to_string(),
            ordinal,
            data_type: "integer".to_string(),
            not_null: false,
            default_expr: None,
            identity: None,
            comment: None,
            collation: None,
        }
    }

    #[test]
    fn nextval_default_marks_the_column_auto_increment() {
        let options = ExtractorOptions::default();
        let reporter = PhaseReporter::new(&options);
        let mut meta = meta_with_table("users");

        let mut row = column_row("users", "id", 1);
        row.default_expr = Some("nextval('users_id_seq'::regclass)".to_string());
        apply_columns(&mut meta, vec![row], &reporter);

        let column = &meta.tables.get("users").unwrap().columns[0];
        assert!(column.auto_increment);
        assert_eq!(
            column.default_value.as_deref(),
            Some("nextval('users_id_seq')")
        );
    }

    #[test]
    fn identity_marker_also_counts_as_auto_increment() {
        let options = ExtractorOptions::default();
        let reporter = PhaseReporter::new(&options);
        let mut meta = meta_with_table("users");

        let mut row = column_row("users", "id", 1);
        row.identity = Some("a".to_string());
        apply_columns(&mut meta, vec![row], &reporter);

        assert!(meta.tables.get("users").unwrap().columns[0].auto_increment);
    }

    #[test]
    fn datatype_spelling_is_preserved_verbatim() {
        let options = ExtractorOptions::default();
        let reporter = PhaseReporter::new(&options);
        let mut meta = meta_with_table("users");

        let mut row = column_row("users", "name", 1);
        row.data_type = "character varying(255)".to_string();
        apply_columns(&mut meta, vec![row], &reporter);

        assert_eq!(
            meta.tables.get("users").unwrap().columns[0].data_type,
            "character varying(255)"
        );
    }

    #[test]
    fn literal_default_cast_is_stripped() {
        let options = ExtractorOptions::default();
        let reporter = PhaseReporter::new(&options);
        let mut meta = meta_with_table("users");

        let mut row = column_row("users", "status", 1);
        row.default_expr = Some("'active'::character varying".to_string());
        apply_columns(&mut meta, vec![row], &reporter);

        assert_eq!(
            meta.tables.get("users").unwrap().columns[0]
                .default_value
                .as_deref(),
            Some("active")
        );
    }

    #[test]
    fn referential_action_letters_map_to_rules() {
        assert_eq!(action_from_letter("a"), ReferentialRule::NoAction);
        assert_eq!(action_from_letter("r"), ReferentialRule::Restrict);
        assert_eq!(action_from_letter("c"), ReferentialRule::Cascade);
        assert_eq!(action_from_letter("n"), ReferentialRule::SetNull);
        assert_eq!(action_from_letter("d"), ReferentialRule::SetDefault);
    }

    #[test]
    fn check_rows_aggregate_and_may_have_no_columns() {
        let options = ExtractorOptions::default();
        let reporter = PhaseReporter::new(&options);
        let mut meta = meta_with_table("t");

        let rows = vec![CheckRow {
            table: "t".to_string(),
            constraint: "always_true".to_string(),
            clause: "CHECK (true)".to_string(),
            column: None,
            position: None,
        }];
        apply_checks(&mut meta, rows, &reporter).unwrap();

        let table = meta.tables.get("t").unwrap();
        let Constraint::Check(check) = &table.constraints[0] else {
            panic!("expected a check constraint");
        };
        assert!(check.columns.is_empty());
    }

    #[test]
    fn composite_trigger_events_merge_into_one_trigger() {
        let options = ExtractorOptions::default();
        let reporter = PhaseReporter::new(&options);
        let mut meta = meta_with_table("users");

        let base = TriggerRow {
            name: "audit_users".to_string(),
            table: "users".to_string(),
            timing: "AFTER".to_string(),
            event: "INSERT".to_string(),
            orientation: "ROW".to_string(),
            action_statement: "EXECUTE FUNCTION audit()".to_string(),
            when_clause: Some("(old.* IS DISTINCT FROM new.*)".to_string()),
        };
        let mut update = base.clone();
        update.event = "UPDATE".to_string();
        apply_triggers(&mut meta, vec![base, update], &reporter).unwrap();

        let trigger = meta.triggers.get("audit_users").unwrap();
        assert_eq!(
            trigger.events,
            [TriggerEvent::Insert, TriggerEvent::Update]
        );
        assert_eq!(trigger.timing, TriggerTiming::After);
        assert_eq!(trigger.function_name.as_deref(), Some("audit"));
        assert!(trigger.when_clause.is_some());
    }

    #[test]
    fn functions_are_keyed_by_name_and_argument_signature() {
        let mut meta = DatabaseMetadata::new("public");
        let rows = vec![
            FunctionRow {
                name: "add".to_string(),
                schema: "public".to_string(),
                return_type: "integer".to_string(),
                language: "sql".to_string(),
                body: "select $1 + $2".to_string(),
                argument_signature: "integer, integer".to_string(),
                volatility: "i".to_string(),
                strict: true,
                security_definer: false,
            },
            FunctionRow {
                name: "add".to_string(),
                schema: "public".to_string(),
                return_type: "bigint".to_string(),
                language: "sql".to_string(),
                body: "select $1 + $2 + $3".to_string(),
                argument_signature: "bigint, bigint, bigint".to_string(),
                volatility: "i".to_string(),
                strict: true,
                security_definer: false,
            },
        ];

        apply_functions(&mut meta, rows).unwrap();
        assert_eq!(meta.functions.len(), 2);
        assert!(meta.functions.contains("add(integer, integer)"));
    }
}
