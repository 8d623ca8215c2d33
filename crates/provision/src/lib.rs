mod container;
mod runner;
mod spec;

pub use container::ProvisionedDatabase;
pub use runner::{ScriptOutcome, run_script};
pub use spec::ContainerSpec;
