use schemadiff_core::{ConfigError, ConnectionConfig, DialectKind};
use url::Url;

/// A side given as `scheme://…` is a live connection; anything else is
/// treated as a filesystem path to a DDL script.
#[must_use]
pub fn is_connection_url(input: &str) -> bool {
    input.contains("://")
}

/// Parses a JDBC-style connection URL into connection coordinates.
/// Credentials passed on the command line win over credentials embedded in
/// the URL.
pub fn parse_connection_url(
    dialect: DialectKind,
    raw: &str,
    user: Option<String>,
    password: Option<String>,
) -> Result<ConnectionConfig, ConfigError> {
    let trimmed = raw.strip_prefix("jdbc:").unwrap_or(raw);
    let parsed = Url::parse(trimmed).map_err(|error| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: error.to_string(),
    })?;

    let database = parsed.path().trim_start_matches('/').to_string();
    if database.is_empty() {
        return Err(ConfigError::InvalidUrl {
            url: raw.to_string(),
            reason: "missing database name in path".to_string(),
        });
    }

    let mut config = ConnectionConfig::for_database(database);
    config.host = parsed.host_str().map(ToString::to_string);
    config.port = Some(parsed.port().unwrap_or_else(|| dialect.default_port()));
    config.user = user.or_else(|| {
        let embedded = parsed.username();
        if embedded.is_empty() {
            None
        } else {
            Some(embedded.to_string())
        }
    });
    config.password = password.or_else(|| parsed.password().map(ToString::to_string));

    Ok(config)
}
