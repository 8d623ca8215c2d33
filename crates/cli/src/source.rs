use schemadiff_core::{
    ConfigError, ConnectionConfig, DialectKind, Error, ExtractorOptions, SchemaSource,
};

/// Names of the dialects compiled into this build.
#[must_use]
pub fn enabled_dialects() -> Vec<&'static str> {
    vec![
        #[cfg(feature = "mysql")]
        "mysql",
        #[cfg(feature = "postgres")]
        "postgres",
        #[cfg(feature = "mssql")]
        "mssql",
        #[cfg(feature = "oracle")]
        "oracle",
        #[cfg(feature = "db2")]
        "db2",
    ]
}

/// Dispatches to the dialect driver. A dialect that was not compiled in is
/// a configuration fault, not a crash.
pub fn open_source(
    dialect: DialectKind,
    config: &ConnectionConfig,
    options: ExtractorOptions,
) -> Result<Box<dyn SchemaSource>, Error> {
    match dialect {
        #[cfg(feature = "mysql")]
        DialectKind::Mysql => Ok(schemadiff_dialect_mysql::connect(config, options)?),
        #[cfg(feature = "postgres")]
        DialectKind::Postgres => Ok(schemadiff_dialect_postgres::connect(config, options)?),
        #[cfg(feature = "mssql")]
        DialectKind::Mssql => Ok(schemadiff_dialect_mssql::connect(config, options)?),
        #[cfg(feature = "oracle")]
        DialectKind::Oracle => Ok(schemadiff_dialect_oracle::connect(config, options)?),
        #[cfg(feature = "db2")]
        DialectKind::Db2 => Ok(schemadiff_dialect_db2::connect(config, options)?),
        #[allow(unreachable_patterns)]
        other => Err(ConfigError::UnknownDialect(format!(
            "{other} support is not compiled into this build (enabled: {})",
            enabled_dialects().join(", ")
        ))
        .into()),
    }
}
