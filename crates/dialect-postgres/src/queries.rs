// pg_catalog / information_schema queries, all scoped to one namespace.
// format_type keeps the datatype in the engine's own spelling
// (`character varying(255)`, `timestamp without time zone`).

pub(crate) const TABLES_QUERY: &str = r#"
SELECT c.relname,
       obj_description(c.oid, 'pg_class'),
       c.reltuples::bigint
FROM pg_catalog.pg_class c
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
WHERE n.nspname = $1
  AND c.relkind IN ('r', 'p')
  AND NOT c.relispartition
ORDER BY c.relname
"#;

pub(crate) const COLUMNS_QUERY: &str = r#"
SELECT c.relname,
       a.attname,
       a.attnum,
       pg_catalog.format_type(a.atttypid, a.atttypmod),
       a.attnotnull,
       pg_catalog.pg_get_expr(ad.adbin, ad.adrelid),
       a.attidentity::text,
       col_description(c.oid, a.attnum),
       co.collname
FROM pg_catalog.pg_attribute a
JOIN pg_catalog.pg_class c ON c.oid = a.attrelid
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
LEFT JOIN pg_catalog.pg_attrdef ad ON ad.adrelid = a.attrelid AND ad.adnum = a.attnum
LEFT JOIN pg_catalog.pg_collation co ON co.oid = a.attcollation
WHERE n.nspname = $1
  AND c.relkind IN ('r', 'p')
  AND NOT c.relispartition
  AND a.attnum > 0
  AND NOT a.attisdropped
ORDER BY c.relname, a.attnum
"#;

// One row per key column; `WITH ORDINALITY` carries the position.
pub(crate) const PRIMARY_KEYS_QUERY: &str = r#"
SELECT cl.relname, con.conname, a.attname, k.ord
FROM pg_catalog.pg_constraint con
JOIN pg_catalog.pg_class cl ON cl.oid = con.conrelid
JOIN pg_catalog.pg_namespace n ON n.oid = cl.relnamespace
CROSS JOIN LATERAL unnest(con.conkey) WITH ORDINALITY AS k(attnum, ord)
JOIN pg_catalog.pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = k.attnum
WHERE n.nspname = $1 AND con.contype = 'p'
ORDER BY cl.relname, con.conname, k.ord
"#;

pub(crate) const UNIQUE_CONSTRAINTS_QUERY: &str = r#"
SELECT cl.relname, con.conname, a.attname, k.ord
FROM pg_catalog.pg_constraint con
JOIN pg_catalog.pg_class cl ON cl.oid = con.conrelid
JOIN pg_catalog.pg_namespace n ON n.oid = cl.relnamespace
CROSS JOIN LATERAL unnest(con.conkey) WITH ORDINALITY AS k(attnum, ord)
JOIN pg_catalog.pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = k.attnum
WHERE n.nspname = $1 AND con.contype = 'u'
ORDER BY cl.relname, con.conname, k.ord
"#;

// Referential action letters (a/r/c/n/d) are mapped during assembly.
pub(crate) const FOREIGN_KEYS_QUERY: &str = r#"
SELECT cl.relname, con.conname, a.attname, k.ord,
       fcl.relname, fa.attname,
       con.confupdtype::text, con.confdeltype::text
FROM pg_catalog.pg_constraint con
JOIN pg_catalog.pg_class cl ON cl.oid = con.conrelid
JOIN pg_catalog.pg_namespace n ON n.oid = cl.relnamespace
JOIN pg_catalog.pg_class fcl ON fcl.oid = con.confrelid
CROSS JOIN LATERAL unnest(con.conkey, con.confkey) WITH ORDINALITY AS k(attnum, fattnum, ord)
JOIN pg_catalog.pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = k.attnum
JOIN pg_catalog.pg_attribute fa ON fa.attrelid = con.confrelid AND fa.attnum = k.fattnum
WHERE n.nspname = $1 AND con.contype = 'f'
ORDER BY cl.relname, con.conname, k.ord
"#;

pub(crate) const CHECK_CONSTRAINTS_QUERY: &str = r#"
SELECT cl.relname, con.conname, pg_get_constraintdef(con.oid, true), a.attname, k.ord
FROM pg_catalog.pg_constraint con
JOIN pg_catalog.pg_class cl ON cl.oid = con.conrelid
JOIN pg_catalog.pg_namespace n ON n.oid = cl.relnamespace
LEFT JOIN LATERAL unnest(con.conkey) WITH ORDINALITY AS k(attnum, ord) ON true
LEFT JOIN pg_catalog.pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = k.attnum
WHERE n.nspname = $1 AND con.contype = 'c'
ORDER BY cl.relname, con.conname, k.ord
"#;

// Constraint-backing indexes are excluded through pg_constraint.conindid;
// expression columns fall back to their rendered definition.
pub(crate) const INDEXES_QUERY: &str = r#"
SELECT cl.relname,
       icl.relname,
       COALESCE(a.attname, pg_get_indexdef(ix.indexrelid, k.ord::int, true)),
       k.ord,
       ix.indisunique,
       am.amname,
       obj_description(icl.oid, 'pg_class')
FROM pg_catalog.pg_index ix
JOIN pg_catalog.pg_class icl ON icl.oid = ix.indexrelid
JOIN pg_catalog.pg_class cl ON cl.oid = ix.indrelid
JOIN pg_catalog.pg_namespace n ON n.oid = cl.relnamespace
JOIN pg_catalog.pg_am am ON am.oid = icl.relam
CROSS JOIN LATERAL unnest(ix.indkey) WITH ORDINALITY AS k(attnum, ord)
LEFT JOIN pg_catalog.pg_attribute a
  ON a.attrelid = ix.indrelid AND a.attnum = k.attnum AND k.attnum <> 0
WHERE n.nspname = $1
  AND NOT ix.indisprimary
  AND NOT EXISTS (
    SELECT 1 FROM pg_catalog.pg_constraint cc WHERE cc.conindid = ix.indexrelid
  )
ORDER BY cl.relname, icl.relname, k.ord
"#;

pub(crate) const SEQUENCES_QUERY: &str = r#"
SELECT sequencename, start_value, increment_by, min_value, max_value,
       cache_size, cycle, sequenceowner
FROM pg_catalog.pg_sequences
WHERE schemaname = $1
ORDER BY sequencename
"#;

pub(crate) const FUNCTIONS_QUERY: &str = r#"
SELECT p.proname,
       n.nspname,
       pg_get_function_result(p.oid),
       l.lanname,
       p.prosrc,
       pg_get_function_identity_arguments(p.oid),
       p.provolatile::text,
       p.proisstrict,
       p.prosecdef
FROM pg_catalog.pg_proc p
JOIN pg_catalog.pg_namespace n ON n.oid = p.pronamespace
JOIN pg_catalog.pg_language l ON l.oid = p.prolang
WHERE n.nspname = $1 AND p.prokind = 'f'
ORDER BY p.proname, pg_get_function_identity_arguments(p.oid)
"#;

// One row per (trigger, event); events are merged during assembly. The WHEN
// condition comes from pg_trigger, which information_schema does not expose
// in rendered form.
pub(crate) const TRIGGERS_QUERY: &str = r#"
SELECT t.trigger_name,
       t.event_object_table,
       t.action_timing,
       t.event_manipulation,
       t.action_orientation,
       t.action_statement,
       pg_get_expr(pt.tgqual, pt.tgrelid, true)
FROM information_schema.triggers t
JOIN pg_catalog.pg_namespace n ON n.nspname = t.event_object_schema
JOIN pg_catalog.pg_class cl ON cl.relnamespace = n.oid AND cl.relname = t.event_object_table
JOIN pg_catalog.pg_trigger pt ON pt.tgrelid = cl.oid AND pt.tgname = t.trigger_name
WHERE t.trigger_schema = $1
ORDER BY t.trigger_name, t.event_manipulation
"#;
