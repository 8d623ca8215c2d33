use std::{
    sync::atomic::{AtomicU32, Ordering},
    time::Duration,
};

use schemadiff_core::{
    CancelToken, CatalogError, DialectKind, ExtractError, Phase, RetryPolicy,
};

fn deadlock(dialect: DialectKind) -> CatalogError {
    match dialect {
        DialectKind::Mysql => CatalogError::new("deadlock").with_code(1213),
        DialectKind::Postgres => CatalogError::new("deadlock").with_sqlstate("40P01"),
        DialectKind::Mssql => CatalogError::new("deadlock").with_code(1205),
        DialectKind::Oracle => CatalogError::new("deadlock").with_code(60),
        DialectKind::Db2 => CatalogError::new("rollback").with_sqlstate("40001"),
    }
}

fn fast_policy(dialect: DialectKind, enabled: bool) -> RetryPolicy {
    RetryPolicy::new(dialect, enabled).backoff_unit(Duration::from_millis(1))
}

#[test]
fn each_dialect_classifies_its_deadlock_as_transient() {
    for dialect in DialectKind::ALL {
        let policy = RetryPolicy::new(dialect, true);
        assert!(
            policy.is_transient(&deadlock(dialect)),
            "{dialect} deadlock should be transient"
        );
    }
}

#[test]
fn mysql_connection_loss_codes_are_transient() {
    let policy = RetryPolicy::new(DialectKind::Mysql, true);
    assert!(policy.is_transient(&CatalogError::new("gone").with_code(2006)));
    assert!(policy.is_transient(&CatalogError::new("lost").with_code(2013)));
    assert!(policy.is_transient(&CatalogError::new("lock wait").with_code(1205)));
    assert!(!policy.is_transient(&CatalogError::new("syntax").with_code(1064)));
}

#[test]
fn mssql_timeout_is_transient() {
    let policy = RetryPolicy::new(DialectKind::Mssql, true);
    assert!(policy.is_transient(&CatalogError::new("timeout").with_code(-2)));
    assert!(policy.is_transient(&CatalogError::new("lock").with_code(1204)));
}

#[test]
fn oracle_codes_are_matched_exactly() {
    let policy = RetryPolicy::new(DialectKind::Oracle, true);
    for code in [60, 8177, 1013, 1089] {
        assert!(policy.is_transient(&CatalogError::new("ora").with_code(code)));
    }
    assert!(!policy.is_transient(&CatalogError::new("ora").with_code(942)));
    // Oracle transience is code-based, not sqlstate-based.
    assert!(!policy.is_transient(&CatalogError::new("ora").with_sqlstate("40001")));
}

#[test]
fn transient_fault_is_retried_up_to_three_attempts() {
    let attempts = AtomicU32::new(0);
    let policy = fast_policy(DialectKind::Postgres, true);

    let result: Result<(), ExtractError> =
        policy.run(Phase::Tables, &CancelToken::new(), || {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(CatalogError::new("serialization").with_sqlstate("40001"))
        });

    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert!(matches!(
        result,
        Err(ExtractError::RetriesExhausted { attempts: 3, .. })
    ));
}

#[test]
fn success_after_transient_fault_returns_value() {
    let attempts = AtomicU32::new(0);
    let policy = fast_policy(DialectKind::Mysql, true);

    let result = policy.run(Phase::Columns, &CancelToken::new(), || {
        if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(CatalogError::new("deadlock").with_code(1213))
        } else {
            Ok(7)
        }
    });

    assert_eq!(result.unwrap(), 7);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn non_transient_fault_surfaces_immediately() {
    let attempts = AtomicU32::new(0);
    let policy = fast_policy(DialectKind::Mysql, true);

    let result: Result<(), ExtractError> =
        policy.run(Phase::Constraints, &CancelToken::new(), || {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(CatalogError::new("no such table").with_code(1146))
        });

    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert!(matches!(result, Err(ExtractError::Catalog { .. })));
}

#[test]
fn disabled_retry_runs_exactly_once() {
    let attempts = AtomicU32::new(0);
    let policy = fast_policy(DialectKind::Postgres, false);

    let result: Result<(), ExtractError> =
        policy.run(Phase::Indexes, &CancelToken::new(), || {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(CatalogError::new("serialization").with_sqlstate("40001"))
        });

    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert!(matches!(result, Err(ExtractError::Catalog { .. })));
}

#[test]
fn cancellation_before_first_attempt_is_fatal() {
    let token = CancelToken::new();
    token.cancel();
    let policy = fast_policy(DialectKind::Db2, true);

    let result: Result<(), ExtractError> = policy.run(Phase::Tables, &token, || Ok(()));

    assert!(matches!(result, Err(ExtractError::Cancelled { .. })));
}

#[test]
fn cancellation_during_backoff_aborts_immediately() {
    let token = CancelToken::new();
    let policy = RetryPolicy::new(DialectKind::Postgres, true)
        .backoff_unit(Duration::from_millis(500));

    let cancel_handle = {
        let token = token.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            token.cancel();
        })
    };

    let result: Result<(), ExtractError> = policy.run(Phase::Tables, &token, || {
        Err(CatalogError::new("serialization").with_sqlstate("40001"))
    });

    cancel_handle.join().unwrap();
    assert!(matches!(result, Err(ExtractError::Cancelled { .. })));
}
