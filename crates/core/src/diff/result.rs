use std::fmt;

use crate::model::Constraint;

/// How an object differs between the two sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindingKind {
    /// Present in the reference, absent from the target.
    Missing,
    /// Absent from the reference, present in the target.
    Extra,
    /// Present in both with differing attributes.
    Modified,
}

impl FindingKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Missing => "MISSING",
            Self::Extra => "EXTRA",
            Self::Modified => "MODIFIED",
        }
    }

    #[must_use]
    pub fn marker(self) -> char {
        match self {
            Self::Missing => '-',
            Self::Extra => '+',
            Self::Modified => '~',
        }
    }
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnFinding {
    pub kind: FindingKind,
    pub column: String,
    /// One reason per differing attribute; empty unless `Modified`.
    pub changes: Vec<String>,
}

/// Constraint finding. `Modified` findings carry both constraints so the
/// report can show the in-place change; `Missing`/`Extra` carry one side.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintFinding {
    pub kind: FindingKind,
    /// Constraint name when present, otherwise the signature.
    pub label: String,
    pub signature: String,
    pub reference: Option<Constraint>,
    pub target: Option<Constraint>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexFinding {
    pub kind: FindingKind,
    pub index: String,
    pub changes: Vec<String>,
}

/// Findings for one shared table, in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct TableFindings<T> {
    pub table: String,
    pub findings: Vec<T>,
}

/// Outcome of comparing two schemas. Tables appear in lexicographic order;
/// findings within a table keep insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffResult {
    pub missing_tables: Vec<String>,
    pub extra_tables: Vec<String>,
    pub column_diffs: Vec<TableFindings<ColumnFinding>>,
    pub constraint_diffs: Vec<TableFindings<ConstraintFinding>>,
    pub index_diffs: Vec<TableFindings<IndexFinding>>,
}

impl DiffResult {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Total number of findings across all levels.
    #[must_use]
    pub fn total(&self) -> usize {
        self.missing_tables.len()
            + self.extra_tables.len()
            + self.column_diffs.iter().map(|t| t.findings.len()).sum::<usize>()
            + self
                .constraint_diffs
                .iter()
                .map(|t| t.findings.len())
                .sum::<usize>()
            + self.index_diffs.iter().map(|t| t.findings.len()).sum::<usize>()
    }
}
