mod config;
mod diff;
mod error;
mod extract;
mod model;
mod normalize;
mod report;
mod retry;
mod script;
mod signature;

pub use config::{ConnectionConfig, DialectKind, UnknownDialect};
pub use diff::{
    ColumnFinding, ComparisonEngine, ConstraintFinding, DiffResult, FindingKind, IndexFinding,
    TableFindings,
};
pub use error::{CatalogError, ConfigError, Error, ExtractError, ProvisionError, Result};
pub use extract::{
    CancelToken, ExtractorOptions, NullProgress, Phase, PhaseReporter, ProgressEvent,
    ProgressSink, SchemaSource, StartedPhase,
};
pub use model::{
    CheckConstraint, Column, Constraint, DatabaseMetadata, DuplicateName, ForeignKeyConstraint,
    Function, FunctionSecurity, Index, IndexType, KeyConstraint, NameMap, ReferentialRule,
    Sequence, Table, Trigger, TriggerEvent, TriggerLevel, TriggerTiming, Volatility,
};
pub use normalize::normalize_default;
pub use report::ReportRenderer;
pub use retry::{BACKOFF_UNIT, MAX_ATTEMPTS, QUERY_TIMEOUT, RetryPolicy};
pub use script::split_script;
pub use signature::constraint_signature;
