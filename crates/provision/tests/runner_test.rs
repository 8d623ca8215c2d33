use schemadiff_core::{
    CatalogError, DatabaseMetadata, DialectKind, ExtractError, SchemaSource,
};
use schemadiff_provision::run_script;

/// Records executed statements and fails those containing a marker.
struct ScriptedSource {
    dialect: DialectKind,
    executed: Vec<String>,
    fail_marker: Option<&'static str>,
}

impl ScriptedSource {
    fn new(dialect: DialectKind) -> Self {
        Self {
            dialect,
            executed: Vec::new(),
            fail_marker: None,
        }
    }

    fn failing_on(dialect: DialectKind, marker: &'static str) -> Self {
        Self {
            dialect,
            executed: Vec::new(),
            fail_marker: Some(marker),
        }
    }
}

impl SchemaSource for ScriptedSource {
    fn dialect(&self) -> DialectKind {
        self.dialect
    }

    fn extract(&mut self) -> Result<DatabaseMetadata, ExtractError> {
        Ok(DatabaseMetadata::new("test"))
    }

    fn execute(&mut self, sql: &str) -> Result<(), CatalogError> {
        self.executed.push(sql.to_string());
        match self.fail_marker {
            Some(marker) if sql.contains(marker) => {
                Err(CatalogError::new(format!("statement rejected: {marker}")))
            }
            _ => Ok(()),
        }
    }

    fn ping(&mut self) -> Result<(), CatalogError> {
        Ok(())
    }
}

#[test]
fn every_statement_is_executed_in_script_order() {
    let mut source = ScriptedSource::new(DialectKind::Mysql);
    let outcome = run_script(
        &mut source,
        "CREATE TABLE a (id int);\nCREATE TABLE b (id int);\n",
    );

    assert_eq!(outcome.succeeded, 2);
    assert_eq!(outcome.failed, 0);
    assert!(outcome.all_succeeded());
    assert_eq!(
        source.executed,
        ["CREATE TABLE a (id int)", "CREATE TABLE b (id int)"]
    );
}

#[test]
fn a_failing_statement_does_not_stop_the_rest() {
    let mut source = ScriptedSource::failing_on(DialectKind::Postgres, "broken");
    let outcome = run_script(
        &mut source,
        "CREATE TABLE ok1 (id int);\nCREATE TABLE broken (;\nCREATE TABLE ok2 (id int);",
    );

    assert_eq!(outcome.succeeded, 2);
    assert_eq!(outcome.failed, 1);
    assert!(!outcome.all_succeeded());
    assert_eq!(source.executed.len(), 3);
}

#[test]
fn comments_and_blank_statements_do_not_reach_the_engine() {
    let mut source = ScriptedSource::new(DialectKind::Postgres);
    let outcome = run_script(
        &mut source,
        "-- schema bootstrap\n;;\nCREATE TABLE a (id int); /* done */",
    );

    assert_eq!(outcome.succeeded, 1);
    assert_eq!(source.executed, ["CREATE TABLE a (id int)"]);
}
