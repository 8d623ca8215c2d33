mod builders;
mod scenario;

pub use builders::{ColumnBuilder, TableBuilder, metadata};
pub use scenario::{Scenario, ScenarioError};
