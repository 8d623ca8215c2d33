use std::time::Duration;

use schemadiff_core::DialectKind;

const DATABASE_NAME: &str = "schemadiff";
/// DB2 database names are limited to eight characters.
const DB2_DATABASE_NAME: &str = "SCHEMADF";
/// Satisfies the SQL Server and Oracle complexity requirements.
const PASSWORD: &str = "SchemaDiff#2024";

/// Everything needed to launch one ephemeral database container and connect
/// to it afterwards.
#[derive(Debug, Clone)]
pub struct ContainerSpec {
    pub dialect: DialectKind,
    pub image: String,
    pub env: Vec<String>,
    pub cmd: Vec<String>,
    /// Port the engine listens on inside the container.
    pub container_port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub readiness_timeout: Duration,
    pub privileged: bool,
}

impl ContainerSpec {
    /// Builds the launch contract for a dialect, with an optional image
    /// override from the command line.
    #[must_use]
    pub fn for_dialect(dialect: DialectKind, image: Option<&str>) -> Self {
        match dialect {
            DialectKind::Mysql => Self {
                dialect,
                image: image.unwrap_or("mysql:8.0").to_string(),
                env: vec![
                    format!("MYSQL_ROOT_PASSWORD={PASSWORD}"),
                    format!("MYSQL_DATABASE={DATABASE_NAME}"),
                ],
                // latin1 keeps indexed VARCHAR(1024) columns inside InnoDB's
                // 3072-byte key limit, which utf8mb4 would blow through;
                // classic auth and DYNAMIC rows match what the reference
                // schemas expect, and 256 MiB packets cover bulk DDL.
                cmd: vec![
                    "--character-set-server=latin1".to_string(),
                    "--collation-server=latin1_swedish_ci".to_string(),
                    "--default-authentication-plugin=mysql_native_password".to_string(),
                    "--innodb-default-row-format=dynamic".to_string(),
                    "--max-allowed-packet=268435456".to_string(),
                ],
                container_port: 3306,
                database: DATABASE_NAME.to_string(),
                user: "root".to_string(),
                password: PASSWORD.to_string(),
                readiness_timeout: Duration::from_secs(120),
                privileged: false,
            },
            DialectKind::Postgres => Self {
                dialect,
                image: image.unwrap_or("postgres:16").to_string(),
                env: vec![
                    format!("POSTGRES_PASSWORD={PASSWORD}"),
                    format!("POSTGRES_DB={DATABASE_NAME}"),
                ],
                cmd: Vec::new(),
                container_port: 5432,
                database: DATABASE_NAME.to_string(),
                user: "postgres".to_string(),
                password: PASSWORD.to_string(),
                readiness_timeout: Duration::from_secs(120),
                privileged: false,
            },
            DialectKind::Mssql => Self {
                dialect,
                image: image
                    .unwrap_or("mcr.microsoft.com/mssql/server:2022-latest")
                    .to_string(),
                env: vec![
                    "ACCEPT_EULA=Y".to_string(),
                    format!("MSSQL_SA_PASSWORD={PASSWORD}"),
                ],
                cmd: Vec::new(),
                container_port: 1433,
                database: "master".to_string(),
                user: "sa".to_string(),
                password: PASSWORD.to_string(),
                readiness_timeout: Duration::from_secs(180),
                privileged: false,
            },
            DialectKind::Oracle => {
                // gvenzl/oracle-free is a drop-in substitute for oracle-xe;
                // only the default pluggable database name differs.
                let image = image.unwrap_or("gvenzl/oracle-xe:21-slim").to_string();
                let service = if image.contains("free") {
                    "FREEPDB1"
                } else {
                    "XEPDB1"
                };
                Self {
                    dialect,
                    image,
                    env: vec![
                        format!("ORACLE_PASSWORD={PASSWORD}"),
                        format!("APP_USER={DATABASE_NAME}"),
                        format!("APP_USER_PASSWORD={PASSWORD}"),
                    ],
                    cmd: Vec::new(),
                    container_port: 1521,
                    database: service.to_string(),
                    user: DATABASE_NAME.to_string(),
                    password: PASSWORD.to_string(),
                    readiness_timeout: Duration::from_secs(300),
                    privileged: false,
                }
            }
            DialectKind::Db2 => Self {
                dialect,
                image: image.unwrap_or("icr.io/db2_community/db2").to_string(),
                env: vec![
                    "LICENSE=accept".to_string(),
                    format!("DB2INST1_PASSWORD={PASSWORD}"),
                    format!("DBNAME={DB2_DATABASE_NAME}"),
                ],
                cmd: Vec::new(),
                container_port: 50000,
                database: DB2_DATABASE_NAME.to_string(),
                user: "db2inst1".to_string(),
                password: PASSWORD.to_string(),
                readiness_timeout: Duration::from_secs(600),
                privileged: true,
            },
        }
    }
}
