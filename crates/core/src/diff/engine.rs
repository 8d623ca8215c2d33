use std::collections::{BTreeMap, HashSet};

use super::result::{
    ColumnFinding, ConstraintFinding, DiffResult, FindingKind, IndexFinding, TableFindings,
};
use crate::{
    model::{Column, DatabaseMetadata, Index, Table},
    signature::constraint_signature,
};

/// Four-level structural comparison: table existence, then columns,
/// constraints, and indexes of every table present on both sides.
///
/// Both inputs are read-only; the engine never mutates an entity.
#[derive(Debug, Default, Clone, Copy)]
pub struct ComparisonEngine;

impl ComparisonEngine {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn compare(&self, reference: &DatabaseMetadata, target: &DatabaseMetadata) -> DiffResult {
        let mut result = DiffResult::default();

        // Level 1: existence. NameMap iteration is ordered by case-folded
        // name, so every traversal below is deterministic.
        for (key, table) in reference.tables.iter() {
            if !target.tables.contains(key) {
                result.missing_tables.push(table.name.clone());
            }
        }
        for (key, table) in target.tables.iter() {
            if !reference.tables.contains(key) {
                result.extra_tables.push(table.name.clone());
            }
        }

        // Levels 2-4: shared tables only.
        for (key, ref_table) in reference.tables.iter() {
            let Some(target_table) = target.tables.get(key) else {
                continue;
            };

            let columns = compare_columns(ref_table, target_table);
            if !columns.is_empty() {
                result.column_diffs.push(TableFindings {
                    table: ref_table.name.clone(),
                    findings: columns,
                });
            }

            let constraints = compare_constraints(ref_table, target_table);
            if !constraints.is_empty() {
                result.constraint_diffs.push(TableFindings {
                    table: ref_table.name.clone(),
                    findings: constraints,
                });
            }

            let indexes = compare_indexes(ref_table, target_table);
            if !indexes.is_empty() {
                result.index_diffs.push(TableFindings {
                    table: ref_table.name.clone(),
                    findings: indexes,
                });
            }
        }

        result
    }
}

fn compare_columns(reference: &Table, target: &Table) -> Vec<ColumnFinding> {
    let mut findings = Vec::new();

    for ref_column in &reference.columns {
        match target.column(&ref_column.name) {
            None => findings.push(ColumnFinding {
                kind: FindingKind::Missing,
                column: ref_column.name.clone(),
                changes: Vec::new(),
            }),
            Some(target_column) => {
                let changes = column_changes(ref_column, target_column);
                if !changes.is_empty() {
                    findings.push(ColumnFinding {
                        kind: FindingKind::Modified,
                        column: ref_column.name.clone(),
                        changes,
                    });
                }
            }
        }
    }

    for target_column in &target.columns {
        if reference.column(&target_column.name).is_none() {
            findings.push(ColumnFinding {
                kind: FindingKind::Extra,
                column: target_column.name.clone(),
                changes: Vec::new(),
            });
        }
    }

    findings
}

/// The closed attribute set compared per column. Ordinal position, comment,
/// character set, and collation are extracted but deliberately not compared.
fn column_changes(reference: &Column, target: &Column) -> Vec<String> {
    let mut changes = Vec::new();

    if !reference.data_type.eq_ignore_ascii_case(&target.data_type) {
        changes.push(format!(
            "Type mismatch: {} != {}",
            reference.data_type, target.data_type
        ));
    }
    if reference.not_null != target.not_null {
        changes.push("Nullable mismatch".to_string());
    }
    if reference.auto_increment != target.auto_increment {
        changes.push("AutoIncrement mismatch".to_string());
    }
    if reference.unsigned != target.unsigned {
        changes.push("Unsigned mismatch".to_string());
    }
    if reference.default_value != target.default_value {
        changes.push("Default value mismatch".to_string());
    }

    changes
}

fn compare_constraints(reference: &Table, target: &Table) -> Vec<ConstraintFinding> {
    let ref_signatures: HashSet<String> = reference
        .constraints
        .iter()
        .map(constraint_signature)
        .collect();
    let target_signatures: HashSet<String> = target
        .constraints
        .iter()
        .map(constraint_signature)
        .collect();

    let mut findings = Vec::new();

    for constraint in &reference.constraints {
        let signature = constraint_signature(constraint);
        if !target_signatures.contains(&signature) {
            findings.push(ConstraintFinding {
                kind: FindingKind::Missing,
                label: constraint
                    .name()
                    .map_or_else(|| signature.clone(), ToString::to_string),
                signature,
                reference: Some(constraint.clone()),
                target: None,
            });
        }
    }

    for constraint in &target.constraints {
        let signature = constraint_signature(constraint);
        if !ref_signatures.contains(&signature) {
            findings.push(ConstraintFinding {
                kind: FindingKind::Extra,
                label: constraint
                    .name()
                    .map_or_else(|| signature.clone(), ToString::to_string),
                signature,
                reference: None,
                target: Some(constraint.clone()),
            });
        }
    }

    // Name pass: the same constraint name on both sides with differing
    // signatures is an in-place change, reported with both ends attached.
    let target_by_name: BTreeMap<String, &crate::model::Constraint> = target
        .constraints
        .iter()
        .filter_map(|c| c.name().map(|name| (name.to_uppercase(), c)))
        .collect();

    for constraint in &reference.constraints {
        let Some(name) = constraint.name() else {
            continue;
        };
        let Some(target_constraint) = target_by_name.get(&name.to_uppercase()) else {
            continue;
        };
        let ref_signature = constraint_signature(constraint);
        let target_signature = constraint_signature(target_constraint);
        if ref_signature != target_signature {
            findings.push(ConstraintFinding {
                kind: FindingKind::Modified,
                label: name.to_string(),
                signature: ref_signature,
                reference: Some(constraint.clone()),
                target: Some((*target_constraint).clone()),
            });
        }
    }

    findings
}

/// Indexes are matched by name, not signature: an index's name is part of
/// its contract (it appears in query plans and hints), so a rename shows up
/// as a missing/extra pair rather than silently passing.
fn compare_indexes(reference: &Table, target: &Table) -> Vec<IndexFinding> {
    let target_by_name: BTreeMap<String, &Index> = target
        .indexes
        .iter()
        .map(|index| (index.name.to_uppercase(), index))
        .collect();
    let ref_names: HashSet<String> = reference
        .indexes
        .iter()
        .map(|index| index.name.to_uppercase())
        .collect();

    let mut findings = Vec::new();

    for ref_index in &reference.indexes {
        match target_by_name.get(&ref_index.name.to_uppercase()) {
            None => findings.push(IndexFinding {
                kind: FindingKind::Missing,
                index: ref_index.name.clone(),
                changes: Vec::new(),
            }),
            Some(target_index) => {
                let changes = index_changes(ref_index, target_index);
                if !changes.is_empty() {
                    findings.push(IndexFinding {
                        kind: FindingKind::Modified,
                        index: ref_index.name.clone(),
                        changes,
                    });
                }
            }
        }
    }

    for target_index in &target.indexes {
        if !ref_names.contains(&target_index.name.to_uppercase()) {
            findings.push(IndexFinding {
                kind: FindingKind::Extra,
                index: target_index.name.clone(),
                changes: Vec::new(),
            });
        }
    }

    findings
}

fn index_changes(reference: &Index, target: &Index) -> Vec<String> {
    let mut changes = Vec::new();

    let ref_columns: Vec<String> = reference.columns.iter().map(|c| c.to_uppercase()).collect();
    let target_columns: Vec<String> = target.columns.iter().map(|c| c.to_uppercase()).collect();
    if ref_columns != target_columns {
        changes.push(format!(
            "Columns: {} != {}",
            reference.columns.join(","),
            target.columns.join(",")
        ));
    }
    if reference.unique != target.unique {
        changes.push(format!(
            "Uniqueness: {} != {}",
            reference.unique, target.unique
        ));
    }
    if reference.index_type != target.index_type {
        changes.push(format!(
            "Type: {} != {}",
            reference.index_type, target.index_type
        ));
    }

    changes
}
