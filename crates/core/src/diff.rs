mod engine;
mod result;

pub use engine::ComparisonEngine;
pub use result::{
    ColumnFinding, ConstraintFinding, DiffResult, FindingKind, IndexFinding, TableFindings,
};
