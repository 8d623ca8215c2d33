use schemadiff_core::{DialectKind, normalize_default};

#[test]
fn empty_and_whitespace_become_none() {
    assert_eq!(normalize_default(DialectKind::Mysql, ""), None);
    assert_eq!(normalize_default(DialectKind::Postgres, "   "), None);
}

#[test]
fn quoted_literal_loses_its_quotes() {
    assert_eq!(
        normalize_default(DialectKind::Mysql, "'active'"),
        Some("active".to_string())
    );
}

#[test]
fn sqlserver_parentheses_are_peeled_iteratively() {
    assert_eq!(
        normalize_default(DialectKind::Mssql, "((1))"),
        Some("1".to_string())
    );
    assert_eq!(
        normalize_default(DialectKind::Mssql, "((((42))))"),
        Some("42".to_string())
    );
    assert_eq!(
        normalize_default(DialectKind::Mssql, "('active')"),
        Some("active".to_string())
    );
    assert_eq!(
        normalize_default(DialectKind::Mssql, "(getdate())"),
        Some("getdate()".to_string())
    );
}

#[test]
fn parentheses_survive_on_other_dialects() {
    assert_eq!(
        normalize_default(DialectKind::Mysql, "(1)"),
        Some("(1)".to_string())
    );
}

#[test]
fn postgres_literal_cast_is_removed() {
    assert_eq!(
        normalize_default(DialectKind::Postgres, "'active'::character varying"),
        Some("active".to_string())
    );
    assert_eq!(
        normalize_default(DialectKind::Postgres, "0::smallint"),
        Some("0".to_string())
    );
}

#[test]
fn postgres_nextval_keeps_call_but_drops_regclass_cast() {
    assert_eq!(
        normalize_default(
            DialectKind::Postgres,
            "nextval('users_id_seq'::regclass)"
        ),
        Some("nextval('users_id_seq')".to_string())
    );
}

#[test]
fn function_calls_are_preserved_verbatim() {
    assert_eq!(
        normalize_default(DialectKind::Oracle, "SYSDATE"),
        Some("SYSDATE".to_string())
    );
    assert_eq!(
        normalize_default(DialectKind::Oracle, "SYS_GUID()"),
        Some("SYS_GUID()".to_string())
    );
    assert_eq!(
        normalize_default(DialectKind::Mysql, "CURRENT_TIMESTAMP"),
        Some("CURRENT_TIMESTAMP".to_string())
    );
}

#[test]
fn literal_with_embedded_escaped_quote_survives() {
    assert_eq!(
        normalize_default(DialectKind::Postgres, "'it''s'::text"),
        Some("it's".to_string())
    );
}

#[test]
fn normalisation_is_convergent() {
    let inputs = [
        (DialectKind::Mssql, "((('wrapped')))"),
        (DialectKind::Postgres, "'active'::character varying"),
        (DialectKind::Postgres, "nextval('seq'::regclass)"),
        (DialectKind::Mysql, "'quoted'"),
        (DialectKind::Oracle, "SYSDATE"),
        (DialectKind::Db2, "CURRENT TIMESTAMP"),
    ];

    for (dialect, raw) in inputs {
        let once = normalize_default(dialect, raw).unwrap();
        let twice = normalize_default(dialect, &once);
        assert_eq!(twice, Some(once.clone()), "input `{raw}` diverged");
    }
}
