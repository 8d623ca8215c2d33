use std::{collections::BTreeMap, fmt, str::FromStr};

/// One of the five supported database engines.
///
/// Comparison is same-dialect only: both sides of a run use the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialectKind {
    Mysql,
    Postgres,
    Mssql,
    Oracle,
    Db2,
}

impl DialectKind {
    pub const ALL: [DialectKind; 5] = [
        DialectKind::Mysql,
        DialectKind::Postgres,
        DialectKind::Mssql,
        DialectKind::Oracle,
        DialectKind::Db2,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mysql => "mysql",
            Self::Postgres => "postgres",
            Self::Mssql => "mssql",
            Self::Oracle => "oracle",
            Self::Db2 => "db2",
        }
    }

    /// Default server port, used when a connection URL omits one.
    #[must_use]
    pub fn default_port(self) -> u16 {
        match self {
            Self::Mysql => 3306,
            Self::Postgres => 5432,
            Self::Mssql => 1433,
            Self::Oracle => 1521,
            Self::Db2 => 50000,
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DialectKind {
    type Err = UnknownDialect;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Self::Mysql),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "mssql" | "sqlserver" => Ok(Self::Mssql),
            "oracle" => Ok(Self::Oracle),
            "db2" => Ok(Self::Db2),
            _ => Err(UnknownDialect(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDialect(pub String);

impl fmt::Display for UnknownDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown dialect `{}`", self.0)
    }
}

impl std::error::Error for UnknownDialect {}

/// Coordinates for one database connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: String,
    pub socket: Option<String>,
    pub extra: BTreeMap<String, String>,
}

impl ConnectionConfig {
    #[must_use]
    pub fn for_database(database: impl Into<String>) -> Self {
        Self {
            host: None,
            port: None,
            user: None,
            password: None,
            database: database.into(),
            socket: None,
            extra: BTreeMap::new(),
        }
    }
}
