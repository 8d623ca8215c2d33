// sys.* catalog queries. tiberius' simple_query protocol carries no
// parameters, so the schema name is spliced in with `{schema}` after quote
// escaping, and every non-character column is CAST to NVARCHAR so the row
// drain stays uniform.
//
// Comments live in sys.extended_properties under class 1 / 'MS_Description';
// minor_id 0 is the table itself, a column_id is that column.

pub(crate) const CURRENT_SCHEMA_QUERY: &str = "SELECT SCHEMA_NAME()";

pub(crate) const SESSION_ISOLATION_QUERY: &str = r#"
SELECT CAST(transaction_isolation_level AS NVARCHAR(2))
FROM sys.dm_exec_sessions WHERE session_id = @@SPID
"#;

pub(crate) const TABLES_QUERY: &str = r#"
SELECT t.name,
       CAST(ep.value AS NVARCHAR(4000)),
       CONVERT(NVARCHAR(33), t.create_date, 126),
       CONVERT(NVARCHAR(33), t.modify_date, 126)
FROM sys.tables t
JOIN sys.schemas s ON s.schema_id = t.schema_id
LEFT JOIN sys.extended_properties ep
  ON ep.class = 1 AND ep.major_id = t.object_id AND ep.minor_id = 0
 AND ep.name = 'MS_Description'
WHERE s.name = N'{schema}'
ORDER BY t.name
"#;

pub(crate) const COLUMNS_QUERY: &str = r#"
SELECT t.name,
       c.name,
       CAST(c.column_id AS NVARCHAR(10)),
       ty.name,
       CAST(c.max_length AS NVARCHAR(10)),
       CAST(c.precision AS NVARCHAR(10)),
       CAST(c.scale AS NVARCHAR(10)),
       CAST(c.is_nullable AS NVARCHAR(1)),
       CAST(c.is_identity AS NVARCHAR(1)),
       dc.definition,
       CAST(ep.value AS NVARCHAR(4000)),
       c.collation_name
FROM sys.columns c
JOIN sys.tables t ON t.object_id = c.object_id
JOIN sys.schemas s ON s.schema_id = t.schema_id
JOIN sys.types ty ON ty.user_type_id = c.user_type_id
LEFT JOIN sys.default_constraints dc ON dc.object_id = c.default_object_id
LEFT JOIN sys.extended_properties ep
  ON ep.class = 1 AND ep.major_id = t.object_id AND ep.minor_id = c.column_id
 AND ep.name = 'MS_Description'
WHERE s.name = N'{schema}'
ORDER BY t.name, c.column_id
"#;

// {kind} is 'PK' or 'UQ'.
pub(crate) const KEY_CONSTRAINTS_QUERY: &str = r#"
SELECT t.name, kc.name, col.name, CAST(ic.key_ordinal AS NVARCHAR(10))
FROM sys.key_constraints kc
JOIN sys.tables t ON t.object_id = kc.parent_object_id
JOIN sys.schemas s ON s.schema_id = t.schema_id
JOIN sys.index_columns ic
  ON ic.object_id = kc.parent_object_id AND ic.index_id = kc.unique_index_id
JOIN sys.columns col ON col.object_id = ic.object_id AND col.column_id = ic.column_id
WHERE s.name = N'{schema}' AND kc.type = '{kind}'
ORDER BY t.name, kc.name, ic.key_ordinal
"#;

// Referential action descriptions arrive underscore-separated (NO_ACTION,
// SET_NULL) and are normalised during assembly.
pub(crate) const FOREIGN_KEYS_QUERY: &str = r#"
SELECT t.name, fk.name, pc.name, CAST(fkc.constraint_column_id AS NVARCHAR(10)),
       rt.name, rc.name,
       fk.update_referential_action_desc, fk.delete_referential_action_desc
FROM sys.foreign_keys fk
JOIN sys.tables t ON t.object_id = fk.parent_object_id
JOIN sys.schemas s ON s.schema_id = t.schema_id
JOIN sys.foreign_key_columns fkc ON fkc.constraint_object_id = fk.object_id
JOIN sys.columns pc
  ON pc.object_id = fkc.parent_object_id AND pc.column_id = fkc.parent_column_id
JOIN sys.tables rt ON rt.object_id = fk.referenced_object_id
JOIN sys.columns rc
  ON rc.object_id = fkc.referenced_object_id AND rc.column_id = fkc.referenced_column_id
WHERE s.name = N'{schema}'
ORDER BY t.name, fk.name, fkc.constraint_column_id
"#;

pub(crate) const CHECK_CONSTRAINTS_QUERY: &str = r#"
SELECT t.name, cc.name, cc.definition
FROM sys.check_constraints cc
JOIN sys.tables t ON t.object_id = cc.parent_object_id
JOIN sys.schemas s ON s.schema_id = t.schema_id
WHERE s.name = N'{schema}'
ORDER BY t.name, cc.name
"#;

pub(crate) const INDEXES_QUERY: &str = r#"
SELECT t.name, i.name, col.name, CAST(ic.key_ordinal AS NVARCHAR(10)),
       CAST(i.is_unique AS NVARCHAR(1)), i.type_desc
FROM sys.indexes i
JOIN sys.tables t ON t.object_id = i.object_id
JOIN sys.schemas s ON s.schema_id = t.schema_id
JOIN sys.index_columns ic ON ic.object_id = i.object_id AND ic.index_id = i.index_id
JOIN sys.columns col ON col.object_id = ic.object_id AND col.column_id = ic.column_id
WHERE s.name = N'{schema}'
  AND i.is_primary_key = 0
  AND i.is_unique_constraint = 0
  AND i.type > 0
  AND ic.is_included_column = 0
ORDER BY t.name, i.name, ic.key_ordinal
"#;

pub(crate) const TRIGGERS_QUERY: &str = r#"
SELECT tr.name, t.name,
       CASE WHEN tr.is_instead_of_trigger = 1 THEN 'INSTEAD OF' ELSE 'AFTER' END,
       te.type_desc
FROM sys.triggers tr
JOIN sys.tables t ON t.object_id = tr.parent_id
JOIN sys.schemas s ON s.schema_id = t.schema_id
JOIN sys.trigger_events te ON te.object_id = tr.object_id
WHERE s.name = N'{schema}'
ORDER BY tr.name, te.type
"#;

pub(crate) fn scoped(template: &str, schema: &str) -> String {
    template.replace("{schema}", &schema.replace('\'', "''"))
}

pub(crate) fn key_constraints(schema: &str, kind: &str) -> String {
    scoped(KEY_CONSTRAINTS_QUERY, schema).replace("{kind}", kind)
}
