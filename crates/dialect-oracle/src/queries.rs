// ALL_* dictionary queries, scoped to one owner (bound as :1, uppercased).
//
// ALL_CONSTRAINTS.search_condition and ALL_TRIGGERS.trigger_body are LONG
// columns: filtering them in SQL raises ORA-00932, so both are projected
// into memory and filtered in the extractor.

pub(crate) const CURRENT_USER_QUERY: &str = "SELECT USER FROM DUAL";

pub(crate) const TABLES_QUERY: &str = r#"
SELECT t.table_name, c.comments, t.num_rows
FROM ALL_TABLES t
LEFT JOIN ALL_TAB_COMMENTS c
  ON c.owner = t.owner AND c.table_name = t.table_name AND c.table_type = 'TABLE'
WHERE t.owner = :1
  AND t.nested = 'NO'
  AND t.table_name NOT LIKE 'BIN$%'
ORDER BY t.table_name
"#;

pub(crate) const COLUMNS_QUERY: &str = r#"
SELECT c.table_name, c.column_name, c.column_id, c.data_type,
       c.data_precision, c.data_scale, c.char_length,
       c.nullable, c.data_default, cm.comments
FROM ALL_TAB_COLUMNS c
LEFT JOIN ALL_COL_COMMENTS cm
  ON cm.owner = c.owner AND cm.table_name = c.table_name
 AND cm.column_name = c.column_name
WHERE c.owner = :1
ORDER BY c.table_name, c.column_id
"#;

// {kind} is 'P' or 'U'.
pub(crate) const KEY_CONSTRAINTS_QUERY: &str = r#"
SELECT c.table_name, c.constraint_name, cc.column_name, cc.position
FROM ALL_CONSTRAINTS c
JOIN ALL_CONS_COLUMNS cc
  ON cc.owner = c.owner AND cc.constraint_name = c.constraint_name
WHERE c.owner = :1 AND c.constraint_type = '{kind}'
ORDER BY c.table_name, c.constraint_name, cc.position
"#;

// Oracle has no UPDATE rule on foreign keys; it is recorded as NO ACTION.
pub(crate) const FOREIGN_KEYS_QUERY: &str = r#"
SELECT c.table_name, c.constraint_name, cc.column_name, cc.position,
       rc.table_name, rcc.column_name, c.delete_rule
FROM ALL_CONSTRAINTS c
JOIN ALL_CONS_COLUMNS cc
  ON cc.owner = c.owner AND cc.constraint_name = c.constraint_name
JOIN ALL_CONSTRAINTS rc
  ON rc.owner = c.r_owner AND rc.constraint_name = c.r_constraint_name
JOIN ALL_CONS_COLUMNS rcc
  ON rcc.owner = rc.owner AND rcc.constraint_name = rc.constraint_name
 AND rcc.position = cc.position
WHERE c.owner = :1 AND c.constraint_type = 'R'
ORDER BY c.table_name, c.constraint_name, cc.position
"#;

pub(crate) const CHECK_CONSTRAINTS_QUERY: &str = r#"
SELECT c.table_name, c.constraint_name, c.search_condition, cc.column_name, cc.position
FROM ALL_CONSTRAINTS c
LEFT JOIN ALL_CONS_COLUMNS cc
  ON cc.owner = c.owner AND cc.constraint_name = c.constraint_name
WHERE c.owner = :1 AND c.constraint_type = 'C'
ORDER BY c.table_name, c.constraint_name, cc.position
"#;

pub(crate) const INDEXES_QUERY: &str = r#"
SELECT i.table_name, i.index_name, ic.column_name, ic.column_position,
       i.uniqueness, i.index_type
FROM ALL_INDEXES i
JOIN ALL_IND_COLUMNS ic
  ON ic.index_owner = i.owner AND ic.index_name = i.index_name
WHERE i.owner = :1
  AND NOT EXISTS (
    SELECT 1 FROM ALL_CONSTRAINTS c
    WHERE c.owner = i.owner
      AND c.index_name = i.index_name
      AND c.constraint_type IN ('P', 'U')
  )
ORDER BY i.table_name, i.index_name, ic.column_position
"#;

pub(crate) const TRIGGERS_QUERY: &str = r#"
SELECT trigger_name, table_name, trigger_type, triggering_event, trigger_body
FROM ALL_TRIGGERS
WHERE owner = :1
ORDER BY trigger_name
"#;

pub(crate) fn key_constraints(kind: char) -> String {
    KEY_CONSTRAINTS_QUERY.replace("{kind}", &kind.to_string())
}
