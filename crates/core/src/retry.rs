//! Retry envelope for catalog statements.
//!
//! Up to three attempts with linear backoff (`attempt x 1000 ms`). Only
//! faults the dialect considers transient are retried; everything else
//! surfaces immediately. Cancellation during backoff is fatal.

use std::time::Duration;

use crate::{
    CatalogError, DialectKind,
    error::ExtractError,
    extract::{CancelToken, Phase},
};

pub const MAX_ATTEMPTS: u32 = 3;
pub const BACKOFF_UNIT: Duration = Duration::from_millis(1000);
/// Every catalog statement carries this timeout; exceeding it is transient.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(300);

const CANCEL_POLL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    dialect: DialectKind,
    enabled: bool,
    backoff_unit: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(dialect: DialectKind, enabled: bool) -> Self {
        Self {
            dialect,
            enabled,
            backoff_unit: BACKOFF_UNIT,
        }
    }

    /// Overrides the backoff unit. Tests use this to keep exhaustion fast.
    #[must_use]
    pub fn backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    /// Dialect-specific transience predicate.
    #[must_use]
    pub fn is_transient(&self, error: &CatalogError) -> bool {
        let sqlstate_40 = error
            .sqlstate
            .as_deref()
            .is_some_and(|state| state.starts_with("40"));
        match self.dialect {
            DialectKind::Mysql => {
                matches!(error.code, Some(1213 | 1205 | 2006 | 2013)) || sqlstate_40
            }
            DialectKind::Postgres => sqlstate_40,
            DialectKind::Mssql => matches!(error.code, Some(1205 | 1204 | -2)) || sqlstate_40,
            DialectKind::Oracle => matches!(error.code, Some(60 | 8177 | 1013 | 1089)),
            DialectKind::Db2 => sqlstate_40,
        }
    }

    /// Runs `op`, retrying transient faults. When retry is disabled the
    /// operation runs exactly once.
    pub fn run<T, F>(
        &self,
        phase: Phase,
        cancel: &CancelToken,
        mut op: F,
    ) -> Result<T, ExtractError>
    where
        F: FnMut() -> Result<T, CatalogError>,
    {
        let attempts = if self.enabled { MAX_ATTEMPTS } else { 1 };
        let mut attempt = 1;
        loop {
            if cancel.is_cancelled() {
                return Err(ExtractError::Cancelled { phase });
            }
            match op() {
                Ok(value) => return Ok(value),
                Err(error) if self.enabled && self.is_transient(&error) => {
                    if attempt >= attempts {
                        return Err(ExtractError::RetriesExhausted {
                            phase,
                            attempts: attempt,
                            source: error,
                        });
                    }
                    tracing::warn!(
                        phase = phase.as_str(),
                        attempt,
                        error = %error,
                        "transient catalog fault, backing off"
                    );
                    self.backoff(attempt, cancel, phase)?;
                    attempt += 1;
                }
                Err(error) => return Err(ExtractError::Catalog { phase, source: error }),
            }
        }
    }

    fn backoff(&self, attempt: u32, cancel: &CancelToken, phase: Phase) -> Result<(), ExtractError> {
        let mut remaining = self.backoff_unit * attempt;
        while !remaining.is_zero() {
            if cancel.is_cancelled() {
                return Err(ExtractError::Cancelled { phase });
            }
            let step = remaining.min(CANCEL_POLL);
            std::thread::sleep(step);
            remaining -= step;
        }
        Ok(())
    }
}
