use std::{fmt, str::FromStr};

/// Referential action on a foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferentialRule {
    #[default]
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

impl ReferentialRule {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }

    /// Accepts both the space-separated and underscore spellings the catalogs
    /// report (`NO ACTION` vs `NO_ACTION`), any case.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().replace('_', " ").to_uppercase().as_str() {
            "NO ACTION" => Some(Self::NoAction),
            "RESTRICT" => Some(Self::Restrict),
            "CASCADE" => Some(Self::Cascade),
            "SET NULL" => Some(Self::SetNull),
            "SET DEFAULT" => Some(Self::SetDefault),
            _ => None,
        }
    }
}

impl fmt::Display for ReferentialRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferentialRule {
    type Err = ();

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw).ok_or(())
    }
}

/// Primary-key or unique constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyConstraint {
    pub name: Option<String>,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckConstraint {
    pub name: Option<String>,
    /// May be empty: a check clause over an expression names no columns.
    pub columns: Vec<String>,
    pub clause: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyConstraint {
    pub name: Option<String>,
    pub columns: Vec<String>,
    pub referenced_table: String,
    /// Same arity as `columns`; alignment is positional.
    pub referenced_columns: Vec<String>,
    pub on_delete: ReferentialRule,
    pub on_update: ReferentialRule,
}

/// Table constraint, one variant per kind. Each variant carries only the
/// fields meaningful for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    PrimaryKey(KeyConstraint),
    Unique(KeyConstraint),
    Check(CheckConstraint),
    ForeignKey(ForeignKeyConstraint),
}

impl Constraint {
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::PrimaryKey(key) | Self::Unique(key) => key.name.as_deref(),
            Self::Check(check) => check.name.as_deref(),
            Self::ForeignKey(fk) => fk.name.as_deref(),
        }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        match self {
            Self::PrimaryKey(key) | Self::Unique(key) => &key.columns,
            Self::Check(check) => &check.columns,
            Self::ForeignKey(fk) => &fk.columns,
        }
    }

    #[must_use]
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::PrimaryKey(_) => "PRIMARY KEY",
            Self::Unique(_) => "UNIQUE",
            Self::Check(_) => "CHECK",
            Self::ForeignKey(_) => "FOREIGN KEY",
        }
    }

    #[must_use]
    pub fn is_primary_key(&self) -> bool {
        matches!(self, Self::PrimaryKey(_))
    }
}
