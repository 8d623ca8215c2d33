use mysql::{OptsBuilder, Pool, PooledConn, Row, prelude::Queryable};
use schemadiff_core::{
    CatalogError, ConnectionConfig, DatabaseMetadata, DialectKind, ExtractError, ExtractorOptions,
    Phase, PhaseReporter, QUERY_TIMEOUT, RetryPolicy, SchemaSource,
};

use crate::{
    extractor::{
        self, CheckRow, ColumnRow, ForeignKeyRow, IndexRow, KeyColumnRow, TableRow,
        assembly_error,
    },
    queries,
};

const DEFAULT_HOST: &str = "127.0.0.1";

pub struct MysqlSchemaSource {
    conn: PooledConn,
    options: ExtractorOptions,
    policy: RetryPolicy,
}

/// Opens a connection and fixes the extraction options for its lifetime.
pub fn connect(
    config: &ConnectionConfig,
    options: ExtractorOptions,
) -> Result<Box<dyn SchemaSource>, ExtractError> {
    let builder = OptsBuilder::new()
        .ip_or_hostname(config.host.clone().or(Some(DEFAULT_HOST.to_string())))
        .tcp_port(config.port.unwrap_or(DialectKind::Mysql.default_port()))
        .user(config.user.clone())
        .pass(config.password.clone())
        .socket(config.socket.clone())
        .db_name(Some(config.database.clone()));

    let pool = Pool::new(builder).map_err(|error| connect_error(catalog_error(error)))?;
    let conn = pool
        .get_conn()
        .map_err(|error| connect_error(catalog_error(error)))?;

    let policy = RetryPolicy::new(DialectKind::Mysql, options.retry);
    Ok(Box::new(MysqlSchemaSource {
        conn,
        options,
        policy,
    }))
}

impl SchemaSource for MysqlSchemaSource {
    fn dialect(&self) -> DialectKind {
        DialectKind::Mysql
    }

    fn extract(&mut self) -> Result<DatabaseMetadata, ExtractError> {
        let options = self.options.clone();
        let session = snapshot_session(&mut self.conn)
            .map_err(|source| ExtractError::Connect {
                dialect: DialectKind::Mysql,
                source,
            })?;

        if let Err(source) = begin_consistent_snapshot(&mut self.conn) {
            restore_session(&mut self.conn, &session);
            return Err(ExtractError::Connect {
                dialect: DialectKind::Mysql,
                source,
            });
        }

        let result = extract_inner(&mut self.conn, &options, self.policy);

        let finish = if result.is_ok() { "COMMIT" } else { "ROLLBACK" };
        if let Err(error) = self.conn.query_drop(finish) {
            tracing::warn!("failed to {finish} extraction transaction: {error}");
        }
        restore_session(&mut self.conn, &session);

        result
    }

    fn execute(&mut self, sql: &str) -> Result<(), CatalogError> {
        self.conn.query_drop(sql).map_err(catalog_error)
    }

    fn ping(&mut self) -> Result<(), CatalogError> {
        self.conn.query_drop("SELECT 1").map_err(catalog_error)
    }
}

fn extract_inner(
    conn: &mut PooledConn,
    options: &ExtractorOptions,
    policy: RetryPolicy,
) -> Result<DatabaseMetadata, ExtractError> {
    let reporter = PhaseReporter::new(options);
    let cancel = &options.cancel;

    let schema = match &options.schema {
        Some(schema) => schema.clone(),
        None => policy.run(Phase::Tables, cancel, || {
            query_scalar(conn, queries::CURRENT_SCHEMA_QUERY)
        })?,
    };

    let mut meta = DatabaseMetadata::new(&schema);

    let phase = reporter.begin(Phase::Tables)?;
    let rows = policy.run(Phase::Tables, cancel, || {
        query_rows(conn, queries::TABLES_QUERY, &schema)
    })?;
    let table_rows = rows
        .into_iter()
        .map(|row| table_row(&row))
        .collect::<Result<Vec<_>, _>>()?;
    let count = extractor::apply_tables(&mut meta, table_rows)?;
    phase.complete(count);

    let phase = reporter.begin(Phase::Columns)?;
    let rows = policy.run(Phase::Columns, cancel, || {
        query_rows(conn, queries::COLUMNS_QUERY, &schema)
    })?;
    let column_rows = rows
        .into_iter()
        .map(|row| column_row(&row))
        .collect::<Result<Vec<_>, _>>()?;
    let count = extractor::apply_columns(&mut meta, column_rows, &reporter);
    phase.complete(count);

    let phase = reporter.begin(Phase::Constraints)?;
    let mut count = 0;

    let rows = policy.run(Phase::Constraints, cancel, || {
        query_rows(conn, queries::PRIMARY_KEYS_QUERY, &schema)
    })?;
    let key_rows = rows
        .into_iter()
        .map(|row| key_column_row(&row))
        .collect::<Result<Vec<_>, _>>()?;
    count += extractor::apply_primary_keys(&mut meta, key_rows, &reporter)?;

    let rows = policy.run(Phase::Constraints, cancel, || {
        query_rows(conn, queries::FOREIGN_KEYS_QUERY, &schema)
    })?;
    let fk_rows = rows
        .into_iter()
        .map(|row| foreign_key_row(&row))
        .collect::<Result<Vec<_>, _>>()?;
    count += extractor::apply_foreign_keys(&mut meta, fk_rows, &reporter)?;

    match policy.run(Phase::Constraints, cancel, || {
        query_rows(conn, queries::CHECK_CONSTRAINTS_QUERY, &schema)
    }) {
        Ok(rows) => {
            let check_rows = rows
                .into_iter()
                .map(|row| check_row(&row))
                .collect::<Result<Vec<_>, _>>()?;
            count += extractor::apply_checks(&mut meta, check_rows, &reporter)?;
        }
        Err(ExtractError::Catalog { source, .. })
            if extractor::is_missing_check_catalog(&source) =>
        {
            tracing::debug!("server predates CHECK constraint catalog, sub-phase skipped");
        }
        Err(error) => return Err(error),
    }

    let rows = policy.run(Phase::Constraints, cancel, || {
        query_rows(conn, queries::UNIQUE_CONSTRAINTS_QUERY, &schema)
    })?;
    let key_rows = rows
        .into_iter()
        .map(|row| key_column_row(&row))
        .collect::<Result<Vec<_>, _>>()?;
    count += extractor::apply_unique_constraints(&mut meta, key_rows, &reporter)?;
    phase.complete(count);

    let phase = reporter.begin(Phase::Indexes)?;
    let rows = policy.run(Phase::Indexes, cancel, || {
        query_rows(conn, queries::INDEXES_QUERY, &schema)
    })?;
    let index_rows = rows
        .into_iter()
        .map(|row| index_row(&row))
        .collect::<Result<Vec<_>, _>>()?;
    let count = extractor::apply_indexes(&mut meta, index_rows, &reporter);
    phase.complete(count);

    for warning in meta.validate() {
        reporter.warn(warning);
    }

    Ok(meta)
}

struct SessionState {
    autocommit: bool,
    isolation: String,
    read_only: bool,
}

fn snapshot_session(conn: &mut PooledConn) -> Result<SessionState, CatalogError> {
    let row: Row = conn
        .query_first(queries::SESSION_SNAPSHOT_QUERY)
        .map_err(catalog_error)?
        .ok_or_else(|| CatalogError::new("session snapshot query returned no rows"))?;

    Ok(SessionState {
        autocommit: row.get::<i64, usize>(0).unwrap_or(1) != 0,
        isolation: row
            .get::<String, usize>(1)
            .unwrap_or_else(|| "REPEATABLE-READ".to_string()),
        read_only: row.get::<i64, usize>(2).unwrap_or(0) != 0,
    })
}

fn begin_consistent_snapshot(conn: &mut PooledConn) -> Result<(), CatalogError> {
    conn.query_drop("SET SESSION TRANSACTION ISOLATION LEVEL REPEATABLE READ")
        .map_err(catalog_error)?;
    conn.query_drop(format!(
        "SET SESSION max_execution_time = {}",
        QUERY_TIMEOUT.as_millis()
    ))
    .map_err(catalog_error)?;
    conn.query_drop("SET autocommit = 0").map_err(catalog_error)?;
    conn.query_drop("START TRANSACTION WITH CONSISTENT SNAPSHOT, READ ONLY")
        .map_err(catalog_error)
}

fn restore_session(conn: &mut PooledConn, session: &SessionState) {
    let statements = [
        format!(
            "SET SESSION transaction_isolation = '{}'",
            session.isolation
        ),
        format!(
            "SET SESSION transaction_read_only = {}",
            i32::from(session.read_only)
        ),
        format!("SET autocommit = {}", i32::from(session.autocommit)),
    ];
    for statement in statements {
        if let Err(error) = conn.query_drop(&statement) {
            tracing::warn!("failed to restore session state (`{statement}`): {error}");
        }
    }
}

fn query_scalar(conn: &mut PooledConn, sql: &str) -> Result<String, CatalogError> {
    conn.query_first::<String, _>(sql)
        .map_err(catalog_error)?
        .ok_or_else(|| CatalogError::new(format!("`{sql}` returned no rows")))
}

fn query_rows(conn: &mut PooledConn, sql: &str, schema: &str) -> Result<Vec<Row>, CatalogError> {
    conn.exec(sql, (schema,)).map_err(catalog_error)
}

fn table_row(row: &Row) -> Result<TableRow, ExtractError> {
    Ok(TableRow {
        name: require_string(row, 0, Phase::Tables, "TABLE_NAME")?,
        engine: optional_string(row, 1),
        collation: optional_string(row, 2),
        comment: optional_string(row, 3),
        created: optional_string(row, 4),
        updated: optional_string(row, 5),
        row_estimate: row.get::<Option<u64>, usize>(6).flatten(),
    })
}

fn column_row(row: &Row) -> Result<ColumnRow, ExtractError> {
    Ok(ColumnRow {
        table: require_string(row, 0, Phase::Columns, "TABLE_NAME")?,
        name: require_string(row, 1, Phase::Columns, "COLUMN_NAME")?,
        ordinal: require_u32(row, 2, Phase::Columns, "ORDINAL_POSITION")?,
        default_value: optional_string(row, 3),
        nullable: require_string(row, 4, Phase::Columns, "IS_NULLABLE")?,
        data_type: require_string(row, 5, Phase::Columns, "DATA_TYPE")?,
        char_length: row.get::<Option<u64>, usize>(6).flatten(),
        numeric_precision: row.get::<Option<u64>, usize>(7).flatten(),
        numeric_scale: row.get::<Option<u64>, usize>(8).flatten(),
        column_type: require_string(row, 9, Phase::Columns, "COLUMN_TYPE")?,
        extra: optional_string(row, 10).unwrap_or_default(),
        comment: optional_string(row, 11),
        character_set: optional_string(row, 12),
        collation: optional_string(row, 13),
    })
}

fn key_column_row(row: &Row) -> Result<KeyColumnRow, ExtractError> {
    Ok(KeyColumnRow {
        table: require_string(row, 0, Phase::Constraints, "TABLE_NAME")?,
        constraint: require_string(row, 1, Phase::Constraints, "CONSTRAINT_NAME")?,
        column: require_string(row, 2, Phase::Constraints, "COLUMN_NAME")?,
        position: require_u32(row, 3, Phase::Constraints, "ORDINAL_POSITION")?,
    })
}

fn foreign_key_row(row: &Row) -> Result<ForeignKeyRow, ExtractError> {
    Ok(ForeignKeyRow {
        table: require_string(row, 0, Phase::Constraints, "TABLE_NAME")?,
        constraint: require_string(row, 1, Phase::Constraints, "CONSTRAINT_NAME")?,
        column: require_string(row, 2, Phase::Constraints, "COLUMN_NAME")?,
        position: require_u32(row, 3, Phase::Constraints, "ORDINAL_POSITION")?,
        referenced_table: require_string(row, 4, Phase::Constraints, "REFERENCED_TABLE_NAME")?,
        referenced_column: require_string(row, 5, Phase::Constraints, "REFERENCED_COLUMN_NAME")?,
        update_rule: require_string(row, 6, Phase::Constraints, "UPDATE_RULE")?,
        delete_rule: require_string(row, 7, Phase::Constraints, "DELETE_RULE")?,
    })
}

fn check_row(row: &Row) -> Result<CheckRow, ExtractError> {
    Ok(CheckRow {
        table: require_string(row, 0, Phase::Constraints, "TABLE_NAME")?,
        constraint: require_string(row, 1, Phase::Constraints, "CONSTRAINT_NAME")?,
        clause: require_string(row, 2, Phase::Constraints, "CHECK_CLAUSE")?,
    })
}

fn index_row(row: &Row) -> Result<IndexRow, ExtractError> {
    Ok(IndexRow {
        table: require_string(row, 0, Phase::Indexes, "TABLE_NAME")?,
        index: require_string(row, 1, Phase::Indexes, "INDEX_NAME")?,
        column: require_string(row, 2, Phase::Indexes, "COLUMN_NAME")?,
        position: require_u32(row, 3, Phase::Indexes, "SEQ_IN_INDEX")?,
        non_unique: row.get::<i64, usize>(4).unwrap_or(1) != 0,
        index_type: optional_string(row, 5).unwrap_or_default(),
        comment: optional_string(row, 6),
    })
}

fn require_string(row: &Row, index: usize, phase: Phase, label: &str) -> Result<String, ExtractError> {
    row.get::<Option<String>, usize>(index)
        .flatten()
        .ok_or_else(|| assembly_error(phase, format!("missing `{label}` in catalog row")))
}

fn require_u32(row: &Row, index: usize, phase: Phase, label: &str) -> Result<u32, ExtractError> {
    row.get::<Option<u64>, usize>(index)
        .flatten()
        .and_then(|value| u32::try_from(value).ok())
        .ok_or_else(|| assembly_error(phase, format!("missing `{label}` in catalog row")))
}

fn optional_string(row: &Row, index: usize) -> Option<String> {
    row.get::<Option<String>, usize>(index).flatten()
}

fn connect_error(source: CatalogError) -> ExtractError {
    ExtractError::Connect {
        dialect: DialectKind::Mysql,
        source,
    }
}

fn catalog_error(error: mysql::Error) -> CatalogError {
    match &error {
        mysql::Error::MySqlError(server) => CatalogError::new(server.message.clone())
            .with_code(i32::from(server.code))
            .with_sqlstate(server.state.clone())
            .with_source(error),
        _ => CatalogError::new(error.to_string()).with_source(error),
    }
}
