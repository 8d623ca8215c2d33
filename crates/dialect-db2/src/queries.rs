// SYSCAT catalog queries. The ODBC text protocol here carries no bound
// parameters, so the (uppercased) schema is spliced in with `{schema}`
// after quote escaping.

pub(crate) const CURRENT_SCHEMA_QUERY: &str =
    "SELECT TRIM(CURRENT SCHEMA) FROM SYSIBM.SYSDUMMY1";

pub(crate) const CURRENT_ISOLATION_QUERY: &str =
    "SELECT TRIM(CURRENT ISOLATION) FROM SYSIBM.SYSDUMMY1";

pub(crate) const TABLES_QUERY: &str = r#"
SELECT TRIM(TABNAME), REMARKS, CARD
FROM SYSCAT.TABLES
WHERE TABSCHEMA = '{schema}' AND TYPE = 'T'
ORDER BY TABNAME
"#;

// COLNO is zero-based; assembly shifts it to the 1-based ordinal.
pub(crate) const COLUMNS_QUERY: &str = r#"
SELECT TRIM(TABNAME), TRIM(COLNAME), COLNO, TRIM(TYPENAME), LENGTH, SCALE,
       NULLS, DEFAULT, IDENTITY, REMARKS
FROM SYSCAT.COLUMNS
WHERE TABSCHEMA = '{schema}'
ORDER BY TABNAME, COLNO
"#;

// {kind} is 'P' or 'U'.
pub(crate) const KEY_CONSTRAINTS_QUERY: &str = r#"
SELECT TRIM(k.TABNAME), TRIM(k.CONSTNAME), TRIM(k.COLNAME), k.COLSEQ
FROM SYSCAT.KEYCOLUSE k
JOIN SYSCAT.TABCONST c
  ON c.TABSCHEMA = k.TABSCHEMA AND c.CONSTNAME = k.CONSTNAME AND c.TABNAME = k.TABNAME
WHERE k.TABSCHEMA = '{schema}' AND c.TYPE = '{kind}'
ORDER BY k.TABNAME, k.CONSTNAME, k.COLSEQ
"#;

// Referenced columns come from the referenced key's KEYCOLUSE rows, aligned
// by COLSEQ. Rule letters: A = NO ACTION, C = CASCADE, N = SET NULL,
// R = RESTRICT.
pub(crate) const FOREIGN_KEYS_QUERY: &str = r#"
SELECT TRIM(r.TABNAME), TRIM(r.CONSTNAME), TRIM(fk.COLNAME), fk.COLSEQ,
       TRIM(r.REFTABNAME), TRIM(pk.COLNAME), r.DELETERULE, r.UPDATERULE
FROM SYSCAT.REFERENCES r
JOIN SYSCAT.KEYCOLUSE fk
  ON fk.TABSCHEMA = r.TABSCHEMA AND fk.CONSTNAME = r.CONSTNAME AND fk.TABNAME = r.TABNAME
JOIN SYSCAT.KEYCOLUSE pk
  ON pk.TABSCHEMA = r.REFTABSCHEMA AND pk.CONSTNAME = r.REFKEYNAME
 AND pk.TABNAME = r.REFTABNAME AND pk.COLSEQ = fk.COLSEQ
WHERE r.TABSCHEMA = '{schema}'
ORDER BY r.TABNAME, r.CONSTNAME, fk.COLSEQ
"#;

pub(crate) const CHECK_CONSTRAINTS_QUERY: &str = r#"
SELECT TRIM(ch.TABNAME), TRIM(ch.CONSTNAME), ch.TEXT
FROM SYSCAT.CHECKS ch
WHERE ch.TABSCHEMA = '{schema}' AND ch.TYPE = 'C'
ORDER BY ch.TABNAME, ch.CONSTNAME
"#;

// UNIQUERULE: P = primary key index, U = unique, D = duplicates allowed.
// Primary-key indexes and unique-constraint backers are excluded.
pub(crate) const INDEXES_QUERY: &str = r#"
SELECT TRIM(i.TABNAME), TRIM(i.INDNAME), TRIM(ic.COLNAME), ic.COLSEQ,
       i.UNIQUERULE, TRIM(i.INDEXTYPE)
FROM SYSCAT.INDEXES i
JOIN SYSCAT.INDEXCOLUSE ic
  ON ic.INDSCHEMA = i.INDSCHEMA AND ic.INDNAME = i.INDNAME
WHERE i.TABSCHEMA = '{schema}'
  AND i.UNIQUERULE <> 'P'
  AND NOT EXISTS (
    SELECT 1 FROM SYSCAT.TABCONST c
    WHERE c.TABSCHEMA = i.TABSCHEMA AND c.CONSTNAME = i.INDNAME AND c.TYPE = 'U'
  )
ORDER BY i.TABNAME, i.INDNAME, ic.COLSEQ
"#;

pub(crate) fn scoped(template: &str, schema: &str) -> String {
    template.replace("{schema}", &schema.replace('\'', "''"))
}

pub(crate) fn key_constraints(schema: &str, kind: char) -> String {
    scoped(KEY_CONSTRAINTS_QUERY, schema).replace("{kind}", &kind.to_string())
}
