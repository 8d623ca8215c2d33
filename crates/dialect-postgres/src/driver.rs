use postgres::{Client, NoTls, Row};
use schemadiff_core::{
    CatalogError, ConnectionConfig, DatabaseMetadata, DialectKind, ExtractError, ExtractorOptions,
    Phase, PhaseReporter, QUERY_TIMEOUT, RetryPolicy, SchemaSource,
};

use crate::{
    extractor::{
        self, CheckRow, ColumnRow, ForeignKeyRow, FunctionRow, IndexRow, KeyColumnRow,
        SequenceRow, TableRow, TriggerRow,
    },
    queries,
};

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_SCHEMA: &str = "public";

pub struct PostgresSchemaSource {
    client: Client,
    options: ExtractorOptions,
    policy: RetryPolicy,
}

pub fn connect(
    config: &ConnectionConfig,
    options: ExtractorOptions,
) -> Result<Box<dyn SchemaSource>, ExtractError> {
    let mut pg_config = postgres::Config::new();
    pg_config
        .host(config.host.as_deref().unwrap_or(DEFAULT_HOST))
        .port(config.port.unwrap_or(DialectKind::Postgres.default_port()))
        .dbname(&config.database);
    if let Some(user) = &config.user {
        pg_config.user(user);
    }
    if let Some(password) = &config.password {
        pg_config.password(password);
    }

    let client = pg_config
        .connect(NoTls)
        .map_err(|error| connect_error(catalog_error(error)))?;

    let policy = RetryPolicy::new(DialectKind::Postgres, options.retry);
    Ok(Box::new(PostgresSchemaSource {
        client,
        options,
        policy,
    }))
}

impl SchemaSource for PostgresSchemaSource {
    fn dialect(&self) -> DialectKind {
        DialectKind::Postgres
    }

    fn extract(&mut self) -> Result<DatabaseMetadata, ExtractError> {
        let options = self.options.clone();
        let session = snapshot_session(&mut self.client)
            .map_err(|source| connect_error(source))?;

        if let Err(source) = begin_repeatable_read(&mut self.client) {
            restore_session(&mut self.client, &session);
            return Err(connect_error(source));
        }

        let result = extract_inner(&mut self.client, &options, self.policy);

        let finish = if result.is_ok() { "COMMIT" } else { "ROLLBACK" };
        if let Err(error) = self.client.batch_execute(finish) {
            tracing::warn!("failed to {finish} extraction transaction: {error}");
        }
        restore_session(&mut self.client, &session);

        result
    }

    fn execute(&mut self, sql: &str) -> Result<(), CatalogError> {
        self.client.batch_execute(sql).map_err(catalog_error)
    }

    fn ping(&mut self) -> Result<(), CatalogError> {
        self.client.batch_execute("SELECT 1").map_err(catalog_error)
    }
}

struct SessionState {
    isolation: String,
    read_only: String,
}

fn snapshot_session(client: &mut Client) -> Result<SessionState, CatalogError> {
    Ok(SessionState {
        isolation: show_scalar(client, "SHOW default_transaction_isolation")?,
        read_only: show_scalar(client, "SHOW default_transaction_read_only")?,
    })
}

fn begin_repeatable_read(client: &mut Client) -> Result<(), CatalogError> {
    client
        .batch_execute(&format!(
            "SET statement_timeout = {}",
            QUERY_TIMEOUT.as_millis()
        ))
        .map_err(catalog_error)?;
    client
        .batch_execute("BEGIN TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
        .map_err(catalog_error)
}

fn restore_session(client: &mut Client, session: &SessionState) {
    let statements = [
        "RESET statement_timeout".to_string(),
        format!(
            "SET default_transaction_isolation = '{}'",
            session.isolation
        ),
        format!(
            "SET default_transaction_read_only = {}",
            session.read_only
        ),
    ];
    for statement in statements {
        if let Err(error) = client.batch_execute(&statement) {
            tracing::warn!("failed to restore session state (`{statement}`): {error}");
        }
    }
}

fn show_scalar(client: &mut Client, sql: &str) -> Result<String, CatalogError> {
    let row = client.query_one(sql, &[]).map_err(catalog_error)?;
    row.try_get::<_, String>(0).map_err(catalog_error)
}

fn extract_inner(
    client: &mut Client,
    options: &ExtractorOptions,
    policy: RetryPolicy,
) -> Result<DatabaseMetadata, ExtractError> {
    let reporter = PhaseReporter::new(options);
    let cancel = &options.cancel;

    let schema = options
        .schema
        .clone()
        .unwrap_or_else(|| DEFAULT_SCHEMA.to_string());
    let mut meta = DatabaseMetadata::new(&schema);

    let phase = reporter.begin(Phase::Tables)?;
    let rows = policy.run(Phase::Tables, cancel, || {
        query_rows(client, queries::TABLES_QUERY, &schema)
    })?;
    let table_rows = rows
        .iter()
        .map(table_row)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| assembly(Phase::Tables, source))?;
    let count = extractor::apply_tables(&mut meta, table_rows)?;
    phase.complete(count);

    let phase = reporter.begin(Phase::Columns)?;
    let rows = policy.run(Phase::Columns, cancel, || {
        query_rows(client, queries::COLUMNS_QUERY, &schema)
    })?;
    let column_rows = rows
        .iter()
        .map(column_row)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| assembly(Phase::Columns, source))?;
    let count = extractor::apply_columns(&mut meta, column_rows, &reporter);
    phase.complete(count);

    let phase = reporter.begin(Phase::Constraints)?;
    let mut count = 0;
    let rows = policy.run(Phase::Constraints, cancel, || {
        query_rows(client, queries::PRIMARY_KEYS_QUERY, &schema)
    })?;
    let key_rows = rows
        .iter()
        .map(key_column_row)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| assembly(Phase::Constraints, source))?;
    count += extractor::apply_key_constraints(&mut meta, key_rows, &reporter, true)?;

    let rows = policy.run(Phase::Constraints, cancel, || {
        query_rows(client, queries::FOREIGN_KEYS_QUERY, &schema)
    })?;
    let fk_rows = rows
        .iter()
        .map(foreign_key_row)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| assembly(Phase::Constraints, source))?;
    count += extractor::apply_foreign_keys(&mut meta, fk_rows, &reporter)?;

    let rows = policy.run(Phase::Constraints, cancel, || {
        query_rows(client, queries::CHECK_CONSTRAINTS_QUERY, &schema)
    })?;
    let check_rows = rows
        .iter()
        .map(check_row)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| assembly(Phase::Constraints, source))?;
    count += extractor::apply_checks(&mut meta, check_rows, &reporter)?;

    let rows = policy.run(Phase::Constraints, cancel, || {
        query_rows(client, queries::UNIQUE_CONSTRAINTS_QUERY, &schema)
    })?;
    let key_rows = rows
        .iter()
        .map(key_column_row)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| assembly(Phase::Constraints, source))?;
    count += extractor::apply_key_constraints(&mut meta, key_rows, &reporter, false)?;
    phase.complete(count);

    let phase = reporter.begin(Phase::Indexes)?;
    let rows = policy.run(Phase::Indexes, cancel, || {
        query_rows(client, queries::INDEXES_QUERY, &schema)
    })?;
    let index_rows = rows
        .iter()
        .map(index_row)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| assembly(Phase::Indexes, source))?;
    let count = extractor::apply_indexes(&mut meta, index_rows, &reporter);
    phase.complete(count);

    let phase = reporter.begin(Phase::Sequences)?;
    let rows = policy.run(Phase::Sequences, cancel, || {
        query_rows(client, queries::SEQUENCES_QUERY, &schema)
    })?;
    let sequence_rows = rows
        .iter()
        .map(sequence_row)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| assembly(Phase::Sequences, source))?;
    let count = extractor::apply_sequences(&mut meta, sequence_rows)?;
    phase.complete(count);

    let phase = reporter.begin(Phase::Functions)?;
    let rows = policy.run(Phase::Functions, cancel, || {
        query_rows(client, queries::FUNCTIONS_QUERY, &schema)
    })?;
    let function_rows = rows
        .iter()
        .map(function_row)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| assembly(Phase::Functions, source))?;
    let count = extractor::apply_functions(&mut meta, function_rows)?;
    phase.complete(count);

    let phase = reporter.begin(Phase::Triggers)?;
    let rows = policy.run(Phase::Triggers, cancel, || {
        query_rows(client, queries::TRIGGERS_QUERY, &schema)
    })?;
    let trigger_rows = rows
        .iter()
        .map(trigger_row)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| assembly(Phase::Triggers, source))?;
    let count = extractor::apply_triggers(&mut meta, trigger_rows, &reporter)?;
    phase.complete(count);

    for warning in meta.validate() {
        reporter.warn(warning);
    }

    Ok(meta)
}

fn query_rows(client: &mut Client, sql: &str, schema: &str) -> Result<Vec<Row>, CatalogError> {
    client.query(sql, &[&schema]).map_err(catalog_error)
}

fn table_row(row: &Row) -> Result<TableRow, CatalogError> {
    Ok(TableRow {
        name: try_get(row, 0)?,
        comment: try_get(row, 1)?,
        row_estimate: try_get::<Option<i64>>(row, 2)?.filter(|estimate| *estimate >= 0),
    })
}

fn column_row(row: &Row) -> Result<ColumnRow, CatalogError> {
    let ordinal: i16 = try_get(row, 2)?;
    Ok(ColumnRow {
        table: try_get(row, 0)?,
        name: try_get(row, 1)?,
        ordinal: u32::try_from(ordinal)
            .map_err(|_| CatalogError::new(format!("negative column ordinal {ordinal}")))?,
        data_type: try_get(row, 3)?,
        not_null: try_get(row, 4)?,
        default_expr: try_get(row, 5)?,
        identity: try_get::<Option<String>>(row, 6)?.filter(|marker| !marker.is_empty()),
        comment: try_get(row, 7)?,
        collation: try_get(row, 8)?,
    })
}

fn key_column_row(row: &Row) -> Result<KeyColumnRow, CatalogError> {
    Ok(KeyColumnRow {
        table: try_get(row, 0)?,
        constraint: try_get(row, 1)?,
        column: try_get(row, 2)?,
        position: try_get(row, 3)?,
    })
}

fn foreign_key_row(row: &Row) -> Result<ForeignKeyRow, CatalogError> {
    Ok(ForeignKeyRow {
        table: try_get(row, 0)?,
        constraint: try_get(row, 1)?,
        column: try_get(row, 2)?,
        position: try_get(row, 3)?,
        referenced_table: try_get(row, 4)?,
        referenced_column: try_get(row, 5)?,
        update_action: try_get(row, 6)?,
        delete_action: try_get(row, 7)?,
    })
}

fn check_row(row: &Row) -> Result<CheckRow, CatalogError> {
    Ok(CheckRow {
        table: try_get(row, 0)?,
        constraint: try_get(row, 1)?,
        clause: try_get(row, 2)?,
        column: try_get(row, 3)?,
        position: try_get(row, 4)?,
    })
}

fn index_row(row: &Row) -> Result<IndexRow, CatalogError> {
    Ok(IndexRow {
        table: try_get(row, 0)?,
        index: try_get(row, 1)?,
        column: try_get(row, 2)?,
        position: try_get(row, 3)?,
        unique: try_get(row, 4)?,
        access_method: try_get(row, 5)?,
        comment: try_get(row, 6)?,
    })
}

fn sequence_row(row: &Row) -> Result<SequenceRow, CatalogError> {
    Ok(SequenceRow {
        name: try_get(row, 0)?,
        start: try_get(row, 1)?,
        increment: try_get(row, 2)?,
        min_value: try_get(row, 3)?,
        max_value: try_get(row, 4)?,
        cache: try_get(row, 5)?,
        cycle: try_get::<Option<bool>>(row, 6)?.unwrap_or(false),
        owner: try_get(row, 7)?,
    })
}

fn function_row(row: &Row) -> Result<FunctionRow, CatalogError> {
    Ok(FunctionRow {
        name: try_get(row, 0)?,
        schema: try_get(row, 1)?,
        return_type: try_get::<Option<String>>(row, 2)?.unwrap_or_default(),
        language: try_get(row, 3)?,
        body: try_get::<Option<String>>(row, 4)?.unwrap_or_default(),
        argument_signature: try_get::<Option<String>>(row, 5)?.unwrap_or_default(),
        volatility: try_get(row, 6)?,
        strict: try_get(row, 7)?,
        security_definer: try_get(row, 8)?,
    })
}

fn trigger_row(row: &Row) -> Result<TriggerRow, CatalogError> {
    Ok(TriggerRow {
        name: try_get(row, 0)?,
        table: try_get(row, 1)?,
        timing: try_get(row, 2)?,
        event: try_get(row, 3)?,
        orientation: try_get(row, 4)?,
        action_statement: try_get::<Option<String>>(row, 5)?.unwrap_or_default(),
        when_clause: try_get(row, 6)?,
    })
}

fn try_get<'a, T>(row: &'a Row, index: usize) -> Result<T, CatalogError>
where
    T: postgres::types::FromSql<'a>,
{
    row.try_get(index).map_err(catalog_error)
}

fn assembly(phase: Phase, source: CatalogError) -> ExtractError {
    ExtractError::Assembly {
        phase,
        detail: source.to_string(),
    }
}

fn connect_error(source: CatalogError) -> ExtractError {
    ExtractError::Connect {
        dialect: DialectKind::Postgres,
        source,
    }
}

fn catalog_error(error: postgres::Error) -> CatalogError {
    let mut catalog = CatalogError::new(
        error
            .as_db_error()
            .map_or_else(|| error.to_string(), |db| db.message().to_string()),
    );
    if let Some(state) = error.code() {
        catalog = catalog.with_sqlstate(state.code());
    }
    catalog.with_source(error)
}
