use super::{Constraint, Index};

/// One user table: ordered columns, constraints, and secondary indexes.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    /// Ordered by ordinal position.
    pub columns: Vec<Column>,
    pub constraints: Vec<Constraint>,
    pub indexes: Vec<Index>,
    pub engine: Option<String>,
    pub collation: Option<String>,
    pub comment: Option<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub row_estimate: Option<u64>,
}

impl Table {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            constraints: Vec::new(),
            indexes: Vec::new(),
            engine: None,
            collation: None,
            comment: None,
            created: None,
            updated: None,
            row_estimate: None,
        }
    }

    /// Case-insensitive column lookup.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|column| column.name.eq_ignore_ascii_case(name))
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns
            .iter_mut()
            .find(|column| column.name.eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub fn primary_key(&self) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.is_primary_key())
    }

    /// Adds a constraint, rejecting a second primary key.
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<(), String> {
        if constraint.is_primary_key() && self.primary_key().is_some() {
            return Err(format!("table `{}` already has a primary key", self.name));
        }
        self.constraints.push(constraint);
        Ok(())
    }
}

/// One column, datatype preserved verbatim in the source engine's spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub data_type: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    pub auto_increment: bool,
    pub unsigned: bool,
    /// 1-based, unique within the table.
    pub ordinal: u32,
    pub comment: Option<String>,
    pub character_set: Option<String>,
    pub collation: Option<String>,
}

impl Column {
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, ordinal: u32) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            not_null: false,
            default_value: None,
            auto_increment: false,
            unsigned: false,
            ordinal,
            comment: None,
            character_set: None,
            collation: None,
        }
    }
}
