use oracle::{Connection, Row};
use schemadiff_core::{
    CatalogError, ConnectionConfig, DatabaseMetadata, DialectKind, ExtractError, ExtractorOptions,
    Phase, PhaseReporter, QUERY_TIMEOUT, RetryPolicy, SchemaSource,
};

use crate::{
    extractor::{
        self, CheckRow, ColumnRow, ForeignKeyRow, IndexRow, KeyColumnRow, TableRow, TriggerRow,
    },
    queries,
};

const DEFAULT_HOST: &str = "127.0.0.1";

pub struct OracleSchemaSource {
    conn: Connection,
    options: ExtractorOptions,
    policy: RetryPolicy,
}

pub fn connect(
    config: &ConnectionConfig,
    options: ExtractorOptions,
) -> Result<Box<dyn SchemaSource>, ExtractError> {
    let user = config
        .user
        .clone()
        .ok_or_else(|| connect_error(CatalogError::new("oracle user is required")))?;
    let connect_string = format!(
        "//{}:{}/{}",
        config.host.as_deref().unwrap_or(DEFAULT_HOST),
        config.port.unwrap_or(DialectKind::Oracle.default_port()),
        config.database
    );

    let conn = Connection::connect(
        &user,
        config.password.as_deref().unwrap_or_default(),
        &connect_string,
    )
    .map_err(|error| connect_error(catalog_error(error)))?;
    if let Err(error) = conn.set_call_timeout(Some(QUERY_TIMEOUT)) {
        tracing::warn!("failed to set oracle call timeout: {error}");
    }

    let policy = RetryPolicy::new(DialectKind::Oracle, options.retry);
    Ok(Box::new(OracleSchemaSource {
        conn,
        options,
        policy,
    }))
}

impl SchemaSource for OracleSchemaSource {
    fn dialect(&self) -> DialectKind {
        DialectKind::Oracle
    }

    fn extract(&mut self) -> Result<DatabaseMetadata, ExtractError> {
        let options = self.options.clone();
        let autocommit = self.conn.autocommit();
        self.conn.set_autocommit(false);

        // A read-only transaction pins a statement-consistent view for the
        // whole extraction.
        if let Err(source) = self
            .conn
            .execute("SET TRANSACTION READ ONLY", &[])
            .map_err(catalog_error)
        {
            self.conn.set_autocommit(autocommit);
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
        self.conn.set_autocommit(autocommit);

        result
    }

    fn execute(&mut self, sql: &str) -> Result<(), CatalogError> {
        self.conn
            .execute(sql, &[])
            .map(|_| ())
            .map_err(catalog_error)?;
        self.conn.commit().map_err(catalog_error)
    }

    fn ping(&mut self) -> Result<(), CatalogError> {
        self.conn
            .query_row_as::<i64>("SELECT 1 FROM DUAL", &[])
            .map(|_| ())
            .map_err(catalog_error)
    }
}

fn extract_inner(
    conn: &Connection,
    options: &ExtractorOptions,
    policy: RetryPolicy,
) -> Result<DatabaseMetadata, ExtractError> {
    let reporter = PhaseReporter::new(options);
    let cancel = &options.cancel;

    let owner = match &options.schema {
        Some(schema) => schema.to_uppercase(),
        None => policy
            .run(Phase::Tables, cancel, || {
                conn.query_row_as::<String>(queries::CURRENT_USER_QUERY, &[])
                    .map_err(catalog_error)
            })?
            .to_uppercase(),
    };
    let mut meta = DatabaseMetadata::new(&owner);

    let phase = reporter.begin(Phase::Tables)?;
    let rows = policy.run(Phase::Tables, cancel, || {
        query_rows(conn, queries::TABLES_QUERY, &owner)
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
        query_rows(conn, queries::COLUMNS_QUERY, &owner)
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
    let primary_query = queries::key_constraints('P');
    let rows = policy.run(Phase::Constraints, cancel, || {
        query_rows(conn, &primary_query, &owner)
    })?;
    let key_rows = rows
        .iter()
        .map(key_column_row)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| assembly(Phase::Constraints, source))?;
    count += extractor::apply_key_constraints(&mut meta, key_rows, &reporter, true)?;

    let rows = policy.run(Phase::Constraints, cancel, || {
        query_rows(conn, queries::FOREIGN_KEYS_QUERY, &owner)
    })?;
    let fk_rows = rows
        .iter()
        .map(foreign_key_row)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| assembly(Phase::Constraints, source))?;
    count += extractor::apply_foreign_keys(&mut meta, fk_rows, &reporter)?;

    let rows = policy.run(Phase::Constraints, cancel, || {
        query_rows(conn, queries::CHECK_CONSTRAINTS_QUERY, &owner)
    })?;
    let check_rows = rows
        .iter()
        .map(check_row)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| assembly(Phase::Constraints, source))?;
    count += extractor::apply_checks(&mut meta, check_rows, &reporter)?;

    let unique_query = queries::key_constraints('U');
    let rows = policy.run(Phase::Constraints, cancel, || {
        query_rows(conn, &unique_query, &owner)
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
        query_rows(conn, queries::INDEXES_QUERY, &owner)
    })?;
    let index_rows = rows
        .iter()
        .map(index_row)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| assembly(Phase::Indexes, source))?;
    let count = extractor::apply_indexes(&mut meta, index_rows, &reporter);
    phase.complete(count);

    let phase = reporter.begin(Phase::Triggers)?;
    let rows = policy.run(Phase::Triggers, cancel, || {
        query_rows(conn, queries::TRIGGERS_QUERY, &owner)
    })?;
    let trigger_rows = rows
        .iter()
        .map(trigger_row)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| assembly(Phase::Triggers, source))?;
    let derived = extractor::derive_auto_increment(&mut meta, &trigger_rows, &reporter);
    tracing::debug!(derived, "auto-increment columns derived from triggers");
    phase.complete(trigger_rows.len());

    for warning in meta.validate() {
        reporter.warn(warning);
    }

    Ok(meta)
}

fn query_rows(conn: &Connection, sql: &str, owner: &str) -> Result<Vec<Row>, CatalogError> {
    let result_set = conn.query(sql, &[&owner]).map_err(catalog_error)?;
    result_set
        .collect::<Result<Vec<_>, _>>()
        .map_err(catalog_error)
}

fn table_row(row: &Row) -> Result<TableRow, CatalogError> {
    Ok(TableRow {
        name: get(row, 0)?,
        comment: get(row, 1)?,
        row_estimate: get(row, 2)?,
    })
}

fn column_row(row: &Row) -> Result<ColumnRow, CatalogError> {
    let ordinal: i64 = get::<Option<i64>>(row, 2)?.unwrap_or(0);
    Ok(ColumnRow {
        table: get(row, 0)?,
        name: get(row, 1)?,
        ordinal: u32::try_from(ordinal)
            .map_err(|_| CatalogError::new(format!("invalid column_id {ordinal}")))?,
        data_type: get(row, 3)?,
        precision: get(row, 4)?,
        scale: get(row, 5)?,
        char_length: get::<Option<i64>>(row, 6)?.filter(|length| *length > 0),
        nullable: get(row, 7)?,
        data_default: get(row, 8)?,
        comment: get(row, 9)?,
    })
}

fn key_column_row(row: &Row) -> Result<KeyColumnRow, CatalogError> {
    Ok(KeyColumnRow {
        table: get(row, 0)?,
        constraint: get(row, 1)?,
        column: get(row, 2)?,
        position: get::<Option<i64>>(row, 3)?.unwrap_or(0),
    })
}

fn foreign_key_row(row: &Row) -> Result<ForeignKeyRow, CatalogError> {
    Ok(ForeignKeyRow {
        table: get(row, 0)?,
        constraint: get(row, 1)?,
        column: get(row, 2)?,
        position: get::<Option<i64>>(row, 3)?.unwrap_or(0),
        referenced_table: get(row, 4)?,
        referenced_column: get(row, 5)?,
        delete_rule: get::<Option<String>>(row, 6)?.unwrap_or_default(),
    })
}

fn check_row(row: &Row) -> Result<CheckRow, CatalogError> {
    Ok(CheckRow {
        table: get(row, 0)?,
        constraint: get(row, 1)?,
        condition: get(row, 2)?,
        column: get(row, 3)?,
        position: get(row, 4)?,
    })
}

fn index_row(row: &Row) -> Result<IndexRow, CatalogError> {
    Ok(IndexRow {
        table: get(row, 0)?,
        index: get(row, 1)?,
        column: get(row, 2)?,
        position: get::<Option<i64>>(row, 3)?.unwrap_or(0),
        uniqueness: get::<Option<String>>(row, 4)?.unwrap_or_default(),
        index_type: get::<Option<String>>(row, 5)?.unwrap_or_default(),
    })
}

fn trigger_row(row: &Row) -> Result<TriggerRow, CatalogError> {
    Ok(TriggerRow {
        name: get(row, 0)?,
        table: get(row, 1)?,
        trigger_type: get::<Option<String>>(row, 2)?.unwrap_or_default(),
        triggering_event: get::<Option<String>>(row, 3)?.unwrap_or_default(),
        body: get(row, 4)?,
    })
}

fn get<T>(row: &Row, index: usize) -> Result<T, CatalogError>
where
    T: oracle::sql_type::FromSql,
{
    row.get(index).map_err(catalog_error)
}

fn assembly(phase: Phase, source: CatalogError) -> ExtractError {
    ExtractError::Assembly {
        phase,
        detail: source.to_string(),
    }
}

fn connect_error(source: CatalogError) -> ExtractError {
    ExtractError::Connect {
        dialect: DialectKind::Oracle,
        source,
    }
}

fn catalog_error(error: oracle::Error) -> CatalogError {
    let code = match &error {
        oracle::Error::OciError(db) | oracle::Error::DpiError(db) => {
            Some(db.code())
        }
        _ => None,
    };
    let mut catalog = CatalogError::new(error.to_string());
    if let Some(code) = code {
        catalog = catalog.with_code(code);
    }
    catalog.with_source(error)
}
