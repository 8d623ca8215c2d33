use std::time::SystemTime;

use super::{Constraint, Function, NameMap, Sequence, Table, Trigger};

/// Root of one extraction: every object of a single schema namespace, built
/// incrementally during extraction and read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseMetadata {
    pub schema_name: String,
    pub extracted_at: SystemTime,
    pub tables: NameMap<Table>,
    pub sequences: NameMap<Sequence>,
    /// Keyed by `name(argument_signature)`.
    pub functions: NameMap<Function>,
    pub triggers: NameMap<Trigger>,
}

impl DatabaseMetadata {
    #[must_use]
    pub fn new(schema_name: impl Into<String>) -> Self {
        Self {
            schema_name: schema_name.into(),
            extracted_at: SystemTime::now(),
            tables: NameMap::new(),
            sequences: NameMap::new(),
            functions: NameMap::new(),
            triggers: NameMap::new(),
        }
    }

    /// Post-extraction consistency pass. Returns warning messages; none of
    /// these abort a run.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        for table in self.tables.values() {
            if table.columns.is_empty() {
                warnings.push(format!("table `{}` has no columns", table.name));
            }
            for constraint in &table.constraints {
                if let Constraint::ForeignKey(fk) = constraint
                    && !self.tables.contains(&fk.referenced_table)
                {
                    warnings.push(format!(
                        "foreign key `{}` on `{}` references unknown table `{}`",
                        fk.name.as_deref().unwrap_or("<unnamed>"),
                        table.name,
                        fk.referenced_table,
                    ));
                }
            }
        }

        warnings
    }
}
