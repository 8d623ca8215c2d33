//! Fluent builders for hand-assembled metadata in tests.

use schemadiff_core::{
    CheckConstraint, Column, Constraint, DatabaseMetadata, ForeignKeyConstraint, Index, IndexType,
    KeyConstraint, ReferentialRule, Table,
};

/// Builds a metadata value from finished tables, panicking on duplicate
/// names (a test-authoring error).
#[must_use]
pub fn metadata(schema: &str, tables: impl IntoIterator<Item = Table>) -> DatabaseMetadata {
    let mut meta = DatabaseMetadata::new(schema);
    for table in tables {
        let name = table.name.clone();
        meta.tables
            .insert(&name, table)
            .expect("duplicate table name in test fixture");
    }
    meta
}

pub struct TableBuilder {
    table: Table,
    next_ordinal: u32,
}

impl TableBuilder {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            table: Table::named(name),
            next_ordinal: 1,
        }
    }

    #[must_use]
    pub fn column(mut self, column: ColumnBuilder) -> Self {
        let ordinal = self.next_ordinal;
        self.next_ordinal += 1;
        self.table.columns.push(column.build(ordinal));
        self
    }

    #[must_use]
    pub fn primary_key(mut self, name: Option<&str>, columns: &[&str]) -> Self {
        self.push(Constraint::PrimaryKey(KeyConstraint {
            name: name.map(ToString::to_string),
            columns: owned(columns),
        }));
        self
    }

    #[must_use]
    pub fn unique(mut self, name: Option<&str>, columns: &[&str]) -> Self {
        self.push(Constraint::Unique(KeyConstraint {
            name: name.map(ToString::to_string),
            columns: owned(columns),
        }));
        self
    }

    #[must_use]
    pub fn check(mut self, name: Option<&str>, columns: &[&str], clause: &str) -> Self {
        self.push(Constraint::Check(CheckConstraint {
            name: name.map(ToString::to_string),
            columns: owned(columns),
            clause: clause.to_string(),
        }));
        self
    }

    #[must_use]
    pub fn foreign_key(
        mut self,
        name: Option<&str>,
        columns: &[&str],
        referenced_table: &str,
        referenced_columns: &[&str],
        on_delete: ReferentialRule,
        on_update: ReferentialRule,
    ) -> Self {
        self.push(Constraint::ForeignKey(ForeignKeyConstraint {
            name: name.map(ToString::to_string),
            columns: owned(columns),
            referenced_table: referenced_table.to_string(),
            referenced_columns: owned(referenced_columns),
            on_delete,
            on_update,
        }));
        self
    }

    #[must_use]
    pub fn index(mut self, name: &str, columns: &[&str], unique: bool, kind: IndexType) -> Self {
        let mut index = Index::new(name);
        index.columns = owned(columns);
        index.unique = unique;
        index.index_type = kind;
        self.table.indexes.push(index);
        self
    }

    #[must_use]
    pub fn build(self) -> Table {
        self.table
    }

    fn push(&mut self, constraint: Constraint) {
        self.table
            .add_constraint(constraint)
            .expect("invalid constraint in test fixture");
    }
}

pub struct ColumnBuilder {
    column: Column,
}

impl ColumnBuilder {
    #[must_use]
    pub fn new(name: &str, data_type: &str) -> Self {
        Self {
            column: Column::new(name, data_type, 0),
        }
    }

    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.column.not_null = true;
        self
    }

    #[must_use]
    pub fn auto_increment(mut self) -> Self {
        self.column.auto_increment = true;
        self
    }

    #[must_use]
    pub fn unsigned(mut self) -> Self {
        self.column.unsigned = true;
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: &str) -> Self {
        self.column.default_value = Some(value.to_string());
        self
    }

    fn build(mut self, ordinal: u32) -> Column {
        self.column.ordinal = ordinal;
        self.column
    }
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}
