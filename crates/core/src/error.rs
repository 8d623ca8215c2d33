use std::{fmt, io, path::PathBuf, time::Duration};

use thiserror::Error;

use crate::{DialectKind, extract::Phase};

type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Driver-level fault raised by a catalog query or DDL statement.
///
/// Carries the engine's native error code and SQLSTATE when the driver
/// exposes them; the retry policy classifies transience from these fields.
#[derive(Debug, Error)]
pub struct CatalogError {
    pub code: Option<i32>,
    pub sqlstate: Option<String>,
    pub message: String,
    #[source]
    pub source: Option<BoxedError>,
}

impl CatalogError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            sqlstate: None,
            message: message.into(),
            source: None,
        }
    }

    #[must_use]
    pub fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }

    #[must_use]
    pub fn with_sqlstate(mut self, sqlstate: impl Into<String>) -> Self {
        self.sqlstate = Some(sqlstate.into());
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<BoxedError>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(code) = self.code {
            write!(f, " (code {code})")?;
        }
        if let Some(sqlstate) = &self.sqlstate {
            write!(f, " (sqlstate {sqlstate})")?;
        }
        Ok(())
    }
}

/// Unrecoverable extraction fault. Surfaces with exit code 2.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("connect to {dialect} failed")]
    Connect {
        dialect: DialectKind,
        #[source]
        source: CatalogError,
    },
    #[error("catalog query failed in {phase} phase")]
    Catalog {
        phase: Phase,
        #[source]
        source: CatalogError,
    },
    #[error("retries exhausted after {attempts} attempts in {phase} phase")]
    RetriesExhausted {
        phase: Phase,
        attempts: u32,
        #[source]
        source: CatalogError,
    },
    #[error("extraction cancelled in {phase} phase")]
    Cancelled { phase: Phase },
    #[error("row assembly failed in {phase} phase: {detail}")]
    Assembly { phase: Phase, detail: String },
    #[error("metadata invariant violated: {0}")]
    Invariant(String),
}

/// Container engine fault. Start and readiness failures are fatal; statement
/// failures inside a script are tolerated and only counted.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("container daemon is unreachable")]
    Daemon(#[source] BoxedError),
    #[error("container for image `{image}` failed to start")]
    ContainerStart {
        image: String,
        #[source]
        source: BoxedError,
    },
    #[error("database in image `{image}` did not become ready within {waited:?}")]
    NotReady { image: String, waited: Duration },
}

/// Invocation-surface fault: bad dialect, bad URL, unreadable script.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown dialect `{0}`")]
    UnknownDialect(String),
    #[error("invalid connection url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("cannot read DDL script `{path}`")]
    ScriptRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("extraction error: {0}")]
    Extract(#[from] ExtractError),
    #[error("provisioning error: {0}")]
    Provision(#[from] ProvisionError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;
