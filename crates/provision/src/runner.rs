use schemadiff_core::{SchemaSource, split_script};

/// Outcome of executing a DDL script statement by statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScriptOutcome {
    pub succeeded: usize,
    pub failed: usize,
}

impl ScriptOutcome {
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Splits the script with the dialect's lexical rules and executes every
/// statement. A failed statement is logged and the next one is attempted;
/// the counts tell the caller how the run went.
pub fn run_script(source: &mut dyn SchemaSource, script: &str) -> ScriptOutcome {
    let statements = split_script(source.dialect(), script);
    let mut outcome = ScriptOutcome::default();

    for (index, statement) in statements.iter().enumerate() {
        match source.execute(statement) {
            Ok(()) => outcome.succeeded += 1,
            Err(error) => {
                outcome.failed += 1;
                tracing::warn!(
                    statement = index + 1,
                    total = statements.len(),
                    error = %error,
                    "DDL statement failed, continuing"
                );
            }
        }
    }

    tracing::info!(
        succeeded = outcome.succeeded,
        failed = outcome.failed,
        "DDL script executed"
    );
    outcome
}
