use std::sync::OnceLock;

use odbc_api::{Connection, ConnectionOptions, Cursor, Environment, ResultSetMetadata};
use schemadiff_core::{
    CatalogError, ConnectionConfig, DatabaseMetadata, DialectKind, ExtractError, ExtractorOptions,
    Phase, PhaseReporter, QUERY_TIMEOUT, RetryPolicy, SchemaSource,
};

use crate::{
    extractor::{self, RawRow},
    queries,
};

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_DRIVER: &str = "IBM DB2 ODBC DRIVER";
/// Override key in `ConnectionConfig.extra` for a non-standard driver name.
const DRIVER_OVERRIDE_KEY: &str = "db2.odbc_driver";

static ENVIRONMENT: OnceLock<Environment> = OnceLock::new();

pub struct Db2SchemaSource {
    conn: Connection<'static>,
    options: ExtractorOptions,
    policy: RetryPolicy,
}

pub fn connect(
    config: &ConnectionConfig,
    options: ExtractorOptions,
) -> Result<Box<dyn SchemaSource>, ExtractError> {
    let environment = environment().map_err(connect_error)?;

    let driver = config
        .extra
        .get(DRIVER_OVERRIDE_KEY)
        .map_or(DEFAULT_DRIVER, String::as_str);
    let connection_string = format!(
        "Driver={{{driver}}};Hostname={};Port={};Database={};Protocol=TCPIP;Uid={};Pwd={};",
        config.host.as_deref().unwrap_or(DEFAULT_HOST),
        config.port.unwrap_or(DialectKind::Db2.default_port()),
        config.database,
        config.user.as_deref().unwrap_or_default(),
        config.password.as_deref().unwrap_or_default(),
    );

    let conn = environment
        .connect_with_connection_string(&connection_string, ConnectionOptions::default())
        .map_err(|error| connect_error(catalog_error(error)))?;

    let policy = RetryPolicy::new(DialectKind::Db2, options.retry);
    Ok(Box::new(Db2SchemaSource {
        conn,
        options,
        policy,
    }))
}

fn environment() -> Result<&'static Environment, CatalogError> {
    if let Some(environment) = ENVIRONMENT.get() {
        return Ok(environment);
    }
    let environment = Environment::new().map_err(catalog_error)?;
    Ok(ENVIRONMENT.get_or_init(|| environment))
}

impl SchemaSource for Db2SchemaSource {
    fn dialect(&self) -> DialectKind {
        DialectKind::Db2
    }

    fn extract(&mut self) -> Result<DatabaseMetadata, ExtractError> {
        let options = self.options.clone();
        let isolation =
            query_scalar(&self.conn, queries::CURRENT_ISOLATION_QUERY).unwrap_or_default();

        if let Err(source) = begin_read_only(&self.conn) {
            restore_session(&self.conn, &isolation);
            return Err(connect_error(source));
        }

        let result = extract_inner(&self.conn, &options, self.policy);

        let finish = if result.is_ok() {
            self.conn.commit()
        } else {
            self.conn.rollback()
        };
        if let Err(error) = finish {
            tracing::warn!("failed to finish extraction transaction: {error}");
        }
        restore_session(&self.conn, &isolation);

        result
    }

    fn execute(&mut self, sql: &str) -> Result<(), CatalogError> {
        self.conn
            .execute(sql, ())
            .map(|_| ())
            .map_err(catalog_error)
    }

    fn ping(&mut self) -> Result<(), CatalogError> {
        query_scalar(&self.conn, "SELECT 1 FROM SYSIBM.SYSDUMMY1").map(|_| ())
    }
}

/// Cursor stability is DB2's read-committed mode.
fn begin_read_only(conn: &Connection<'_>) -> Result<(), CatalogError> {
    conn.set_autocommit(false).map_err(catalog_error)?;
    run(conn, "SET CURRENT ISOLATION = CS")?;
    run(
        conn,
        &format!("SET CURRENT LOCK TIMEOUT {}", QUERY_TIMEOUT.as_secs()),
    )
}

fn restore_session(conn: &Connection<'_>, isolation: &str) {
    if !isolation.trim().is_empty() {
        let statement = format!("SET CURRENT ISOLATION = {}", isolation.trim());
        if let Err(error) = run(conn, &statement) {
            tracing::warn!("failed to restore session isolation: {error}");
        }
    }
    if let Err(error) = conn.set_autocommit(true) {
        tracing::warn!("failed to restore autocommit: {error}");
    }
}

fn extract_inner(
    conn: &Connection<'_>,
    options: &ExtractorOptions,
    policy: RetryPolicy,
) -> Result<DatabaseMetadata, ExtractError> {
    let reporter = PhaseReporter::new(options);
    let cancel = &options.cancel;

    let schema = match &options.schema {
        Some(schema) => schema.to_uppercase(),
        None => policy
            .run(Phase::Tables, cancel, || {
                query_scalar(conn, queries::CURRENT_SCHEMA_QUERY)
            })?
            .to_uppercase(),
    };
    let mut meta = DatabaseMetadata::new(&schema);

    let phase = reporter.begin(Phase::Tables)?;
    let rows = policy.run(Phase::Tables, cancel, || {
        query_rows(conn, &queries::scoped(queries::TABLES_QUERY, &schema))
    })?;
    let count = extractor::apply_tables(&mut meta, &rows)?;
    phase.complete(count);

    let phase = reporter.begin(Phase::Columns)?;
    let rows = policy.run(Phase::Columns, cancel, || {
        query_rows(conn, &queries::scoped(queries::COLUMNS_QUERY, &schema))
    })?;
    let count = extractor::apply_columns(&mut meta, &rows, &reporter)?;
    phase.complete(count);

    let phase = reporter.begin(Phase::Constraints)?;
    let mut count = 0;
    let rows = policy.run(Phase::Constraints, cancel, || {
        query_rows(conn, &queries::key_constraints(&schema, 'P'))
    })?;
    count += extractor::apply_key_constraints(&mut meta, &rows, &reporter, true)?;

    let rows = policy.run(Phase::Constraints, cancel, || {
        query_rows(conn, &queries::scoped(queries::FOREIGN_KEYS_QUERY, &schema))
    })?;
    count += extractor::apply_foreign_keys(&mut meta, &rows, &reporter)?;

    let rows = policy.run(Phase::Constraints, cancel, || {
        query_rows(
            conn,
            &queries::scoped(queries::CHECK_CONSTRAINTS_QUERY, &schema),
        )
    })?;
    count += extractor::apply_checks(&mut meta, &rows, &reporter)?;

    let rows = policy.run(Phase::Constraints, cancel, || {
        query_rows(conn, &queries::key_constraints(&schema, 'U'))
    })?;
    count += extractor::apply_key_constraints(&mut meta, &rows, &reporter, false)?;
    phase.complete(count);

    let phase = reporter.begin(Phase::Indexes)?;
    let rows = policy.run(Phase::Indexes, cancel, || {
        query_rows(conn, &queries::scoped(queries::INDEXES_QUERY, &schema))
    })?;
    let count = extractor::apply_indexes(&mut meta, &rows, &reporter)?;
    phase.complete(count);

    for warning in meta.validate() {
        reporter.warn(warning);
    }

    Ok(meta)
}

fn run(conn: &Connection<'_>, sql: &str) -> Result<(), CatalogError> {
    conn.execute(sql, ()).map(|_| ()).map_err(catalog_error)
}

fn query_scalar(conn: &Connection<'_>, sql: &str) -> Result<String, CatalogError> {
    query_rows(conn, sql)?
        .into_iter()
        .next()
        .and_then(|row| row.into_iter().next().flatten())
        .ok_or_else(|| CatalogError::new(format!("`{sql}` returned no rows")))
}

fn query_rows(conn: &Connection<'_>, sql: &str) -> Result<Vec<RawRow>, CatalogError> {
    let Some(mut cursor) = conn.execute(sql, ()).map_err(catalog_error)? else {
        return Ok(Vec::new());
    };

    let columns = cursor.num_result_cols().map_err(catalog_error)? as u16;
    let mut rows = Vec::new();
    let mut buffer = Vec::new();

    while let Some(mut row) = cursor.next_row().map_err(catalog_error)? {
        let mut values = Vec::with_capacity(columns as usize);
        for column in 1..=columns {
            buffer.clear();
            let present = row.get_text(column, &mut buffer).map_err(catalog_error)?;
            if present {
                values.push(Some(String::from_utf8_lossy(&buffer).into_owned()));
            } else {
                values.push(None);
            }
        }
        rows.push(values);
    }

    Ok(rows)
}

fn connect_error(source: CatalogError) -> ExtractError {
    ExtractError::Connect {
        dialect: DialectKind::Db2,
        source,
    }
}

fn catalog_error(error: odbc_api::Error) -> CatalogError {
    let mut catalog = CatalogError::new(error.to_string());
    if let odbc_api::Error::Diagnostics { record, .. } = &error {
        catalog = catalog
            .with_sqlstate(String::from_utf8_lossy(&record.state.0).into_owned())
            .with_code(record.native_error);
    }
    catalog.with_source(error)
}
