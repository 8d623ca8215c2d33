use futures_util::TryStreamExt;
use schemadiff_core::{
    CatalogError, ConnectionConfig, DatabaseMetadata, DialectKind, ExtractError, ExtractorOptions,
    Phase, PhaseReporter, QUERY_TIMEOUT, RetryPolicy, SchemaSource,
};
use tiberius::{AuthMethod, Client, Config, QueryItem};
use tokio::{
    net::TcpStream,
    runtime::{Builder, Runtime},
};
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::{
    extractor::{self, RawRow},
    queries,
};

type TdsClient = Client<Compat<TcpStream>>;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_SCHEMA: &str = "dbo";

pub struct MssqlSchemaSource {
    state: LiveState,
    options: ExtractorOptions,
    policy: RetryPolicy,
}

struct LiveState {
    runtime: Runtime,
    client: TdsClient,
}

pub fn connect(
    config: &ConnectionConfig,
    options: ExtractorOptions,
) -> Result<Box<dyn SchemaSource>, ExtractError> {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| connect_error(CatalogError::new(error.to_string())))?;

    let mut tds_config = Config::new();
    tds_config.host(config.host.as_deref().unwrap_or(DEFAULT_HOST));
    tds_config.port(config.port.unwrap_or(DialectKind::Mssql.default_port()));
    tds_config.database(config.database.clone());
    let user = config
        .user
        .clone()
        .ok_or_else(|| connect_error(CatalogError::new("mssql user is required")))?;
    tds_config.authentication(AuthMethod::sql_server(
        user,
        config.password.clone().unwrap_or_default(),
    ));
    tds_config.trust_cert();

    let client = runtime
        .block_on(async {
            let tcp = TcpStream::connect(tds_config.get_addr()).await?;
            tcp.set_nodelay(true)?;
            Client::connect(tds_config, tcp.compat_write())
                .await
                .map_err(io_like)
        })
        .map_err(|error: std::io::Error| connect_error(CatalogError::new(error.to_string())))?;

    let policy = RetryPolicy::new(DialectKind::Mssql, options.retry);
    Ok(Box::new(MssqlSchemaSource {
        state: LiveState { runtime, client },
        options,
        policy,
    }))
}

fn io_like(error: tiberius::error::Error) -> std::io::Error {
    std::io::Error::other(error.to_string())
}

impl SchemaSource for MssqlSchemaSource {
    fn dialect(&self) -> DialectKind {
        DialectKind::Mssql
    }

    fn extract(&mut self) -> Result<DatabaseMetadata, ExtractError> {
        let options = self.options.clone();
        let isolation = query_scalar(&mut self.state, queries::SESSION_ISOLATION_QUERY)
            .map_err(connect_error)?;

        if let Err(source) = begin_read_committed(&mut self.state) {
            restore_isolation(&mut self.state, &isolation);
            return Err(connect_error(source));
        }

        let result = extract_inner(&mut self.state, &options, self.policy);

        let finish = if result.is_ok() {
            "COMMIT TRANSACTION"
        } else {
            "ROLLBACK TRANSACTION"
        };
        if let Err(error) = execute(&mut self.state, finish) {
            tracing::warn!("failed to finish extraction transaction: {error}");
        }
        restore_isolation(&mut self.state, &isolation);

        result
    }

    fn execute(&mut self, sql: &str) -> Result<(), CatalogError> {
        execute(&mut self.state, sql)
    }

    fn ping(&mut self) -> Result<(), CatalogError> {
        query_rows(&mut self.state, "SELECT 1").map(|_| ())
    }
}

fn begin_read_committed(state: &mut LiveState) -> Result<(), CatalogError> {
    execute(
        state,
        &format!("SET LOCK_TIMEOUT {}", QUERY_TIMEOUT.as_millis()),
    )?;
    execute(state, "SET TRANSACTION ISOLATION LEVEL READ COMMITTED")?;
    execute(state, "BEGIN TRANSACTION")
}

fn restore_isolation(state: &mut LiveState, level: &str) {
    let statement = match level.trim() {
        "1" => "SET TRANSACTION ISOLATION LEVEL READ UNCOMMITTED",
        "3" => "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ",
        "4" => "SET TRANSACTION ISOLATION LEVEL SERIALIZABLE",
        "5" => "SET TRANSACTION ISOLATION LEVEL SNAPSHOT",
        _ => "SET TRANSACTION ISOLATION LEVEL READ COMMITTED",
    };
    if let Err(error) = execute(state, statement) {
        tracing::warn!("failed to restore session isolation: {error}");
    }
}

fn extract_inner(
    state: &mut LiveState,
    options: &ExtractorOptions,
    policy: RetryPolicy,
) -> Result<DatabaseMetadata, ExtractError> {
    let reporter = PhaseReporter::new(options);
    let cancel = &options.cancel;

    let schema = match &options.schema {
        Some(schema) => schema.clone(),
        None => {
            let current = policy.run(Phase::Tables, cancel, || {
                query_scalar(state, queries::CURRENT_SCHEMA_QUERY)
            })?;
            if current.trim().is_empty() {
                DEFAULT_SCHEMA.to_string()
            } else {
                current.trim().to_string()
            }
        }
    };
    let mut meta = DatabaseMetadata::new(&schema);

    let phase = reporter.begin(Phase::Tables)?;
    let rows = policy.run(Phase::Tables, cancel, || {
        query_rows(state, &queries::scoped(queries::TABLES_QUERY, &schema))
    })?;
    let count = extractor::apply_tables(&mut meta, &rows)?;
    phase.complete(count);

    let phase = reporter.begin(Phase::Columns)?;
    let rows = policy.run(Phase::Columns, cancel, || {
        query_rows(state, &queries::scoped(queries::COLUMNS_QUERY, &schema))
    })?;
    let count = extractor::apply_columns(&mut meta, &rows, &reporter)?;
    phase.complete(count);

    let phase = reporter.begin(Phase::Constraints)?;
    let mut count = 0;
    let rows = policy.run(Phase::Constraints, cancel, || {
        query_rows(state, &queries::key_constraints(&schema, "PK"))
    })?;
    count += extractor::apply_key_constraints(&mut meta, &rows, &reporter, true)?;

    let rows = policy.run(Phase::Constraints, cancel, || {
        query_rows(state, &queries::scoped(queries::FOREIGN_KEYS_QUERY, &schema))
    })?;
    count += extractor::apply_foreign_keys(&mut meta, &rows, &reporter)?;

    let rows = policy.run(Phase::Constraints, cancel, || {
        query_rows(
            state,
            &queries::scoped(queries::CHECK_CONSTRAINTS_QUERY, &schema),
        )
    })?;
    count += extractor::apply_checks(&mut meta, &rows, &reporter)?;

    let rows = policy.run(Phase::Constraints, cancel, || {
        query_rows(state, &queries::key_constraints(&schema, "UQ"))
    })?;
    count += extractor::apply_key_constraints(&mut meta, &rows, &reporter, false)?;
    phase.complete(count);

    let phase = reporter.begin(Phase::Indexes)?;
    let rows = policy.run(Phase::Indexes, cancel, || {
        query_rows(state, &queries::scoped(queries::INDEXES_QUERY, &schema))
    })?;
    let count = extractor::apply_indexes(&mut meta, &rows, &reporter)?;
    phase.complete(count);

    let phase = reporter.begin(Phase::Triggers)?;
    let rows = policy.run(Phase::Triggers, cancel, || {
        query_rows(state, &queries::scoped(queries::TRIGGERS_QUERY, &schema))
    })?;
    let count = extractor::apply_triggers(&mut meta, &rows, &reporter)?;
    phase.complete(count);

    for warning in meta.validate() {
        reporter.warn(warning);
    }

    Ok(meta)
}

fn execute(state: &mut LiveState, sql: &str) -> Result<(), CatalogError> {
    let LiveState { runtime, client } = state;
    runtime.block_on(async {
        let mut stream = client
            .simple_query(sql)
            .await
            .map_err(|error| catalog_error(sql, error))?;
        while stream
            .try_next()
            .await
            .map_err(|error| catalog_error(sql, error))?
            .is_some()
        {}
        Ok(())
    })
}

fn query_scalar(state: &mut LiveState, sql: &str) -> Result<String, CatalogError> {
    query_rows(state, sql)?
        .into_iter()
        .next()
        .and_then(|columns| columns.into_iter().next().flatten())
        .ok_or_else(|| CatalogError::new(format!("`{sql}` returned no rows")))
}

fn query_rows(state: &mut LiveState, sql: &str) -> Result<Vec<RawRow>, CatalogError> {
    let LiveState { runtime, client } = state;
    runtime.block_on(async {
        let mut stream = client
            .simple_query(sql)
            .await
            .map_err(|error| catalog_error(sql, error))?;
        let mut rows = Vec::new();

        while let Some(item) = stream
            .try_next()
            .await
            .map_err(|error| catalog_error(sql, error))?
        {
            if let QueryItem::Row(row) = item {
                let mut values = Vec::with_capacity(row.columns().len());
                for index in 0..row.columns().len() {
                    let value = row
                        .try_get::<&str, usize>(index)
                        .map_err(|error| catalog_error(sql, error))?
                        .map(ToString::to_string);
                    values.push(value);
                }
                rows.push(values);
            }
        }

        Ok(rows)
    })
}

fn connect_error(source: CatalogError) -> ExtractError {
    ExtractError::Connect {
        dialect: DialectKind::Mssql,
        source,
    }
}

fn catalog_error(sql: &str, error: tiberius::error::Error) -> CatalogError {
    let catalog = match &error {
        tiberius::error::Error::Server(token) => CatalogError::new(format!(
            "{} (while running `{}`)",
            token.message(),
            first_line(sql)
        ))
        .with_code(token.code() as i32),
        _ => CatalogError::new(format!("{error} (while running `{}`)", first_line(sql))),
    };
    catalog.with_source(error)
}

fn first_line(sql: &str) -> &str {
    sql.trim().lines().next().unwrap_or_default()
}
