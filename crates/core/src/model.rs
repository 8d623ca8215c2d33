mod constraint;
mod index;
mod metadata;
mod name_map;
mod routine;
mod table;

pub use constraint::{
    CheckConstraint, Constraint, ForeignKeyConstraint, KeyConstraint, ReferentialRule,
};
pub use index::{Index, IndexType};
pub use metadata::DatabaseMetadata;
pub use name_map::{DuplicateName, NameMap};
pub use routine::{
    Function, FunctionSecurity, Sequence, Trigger, TriggerEvent, TriggerLevel, TriggerTiming,
    Volatility,
};
pub use table::{Column, Table};
