//! Canonical constraint signatures.
//!
//! A signature survives a rename but not a semantic change: it is derived
//! from the constraint's kind, its column set, and (for foreign keys) the
//! referenced table, referenced columns, and referential rules. The
//! constraint's own name never participates.

use crate::model::Constraint;

/// Deterministic signature string used to key constraint comparison.
///
/// Primary-key, unique, and check signatures sort their columns: column
/// order carries no meaning for those kinds. Foreign keys keep column order,
/// since alignment with the referenced column list is positional.
#[must_use]
pub fn constraint_signature(constraint: &Constraint) -> String {
    match constraint {
        Constraint::PrimaryKey(key) => format!("PRIMARY_KEY:{}", sorted_upper(&key.columns)),
        Constraint::Unique(key) => format!("UNIQUE:{}", sorted_upper(&key.columns)),
        Constraint::Check(check) => format!("CHECK:{}", sorted_upper(&check.columns)),
        Constraint::ForeignKey(fk) => format!(
            "FOREIGN_KEY:{}\u{2192}{}({}) ON DELETE {} ON UPDATE {}",
            ordered_upper(&fk.columns),
            fk.referenced_table.to_uppercase(),
            ordered_upper(&fk.referenced_columns),
            fk.on_delete,
            fk.on_update,
        ),
    }
}

fn sorted_upper(columns: &[String]) -> String {
    let mut upper: Vec<String> = columns.iter().map(|c| c.to_uppercase()).collect();
    upper.sort();
    upper.join(",")
}

fn ordered_upper(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| c.to_uppercase())
        .collect::<Vec<_>>()
        .join(",")
}
