use schemadiff_core::{
    Column, ComparisonEngine, Constraint, DatabaseMetadata, FindingKind, ForeignKeyConstraint,
    Index, IndexType, KeyConstraint, ReferentialRule, Table,
};

fn metadata(tables: Vec<Table>) -> DatabaseMetadata {
    let mut meta = DatabaseMetadata::new("app");
    for table in tables {
        let name = table.name.clone();
        meta.tables.insert(&name, table).unwrap();
    }
    meta
}

fn users_table() -> Table {
    let mut table = Table::named("USERS");
    let mut id = Column::new("ID", "int", 1);
    id.not_null = true;
    id.auto_increment = true;
    table.columns.push(id);
    let mut email = Column::new("EMAIL", "varchar(255)", 2);
    email.not_null = true;
    table.columns.push(email);
    table
        .add_constraint(Constraint::PrimaryKey(KeyConstraint {
            name: Some("PRIMARY".to_string()),
            columns: vec!["ID".to_string()],
        }))
        .unwrap();
    table
        .add_constraint(Constraint::Unique(KeyConstraint {
            name: Some("uq_email".to_string()),
            columns: vec!["EMAIL".to_string()],
        }))
        .unwrap();
    table
}

fn child_table(on_delete: ReferentialRule) -> Table {
    let mut table = Table::named("CHILD");
    table.columns.push(Column::new("PARENT_ID", "int", 1));
    table
        .add_constraint(Constraint::ForeignKey(ForeignKeyConstraint {
            name: Some("fk_child_parent".to_string()),
            columns: vec!["PARENT_ID".to_string()],
            referenced_table: "PARENT".to_string(),
            referenced_columns: vec!["ID".to_string()],
            on_delete,
            on_update: ReferentialRule::NoAction,
        }))
        .unwrap();
    table
}

#[test]
fn identical_schemas_produce_an_empty_diff() {
    let reference = metadata(vec![users_table()]);
    let target = metadata(vec![users_table()]);

    let diff = ComparisonEngine::new().compare(&reference, &target);

    assert!(diff.is_empty());
    assert_eq!(diff.total(), 0);
}

#[test]
fn comparing_a_schema_against_itself_is_empty() {
    let meta = metadata(vec![users_table(), child_table(ReferentialRule::Cascade)]);
    assert!(ComparisonEngine::new().compare(&meta, &meta).is_empty());
}

#[test]
fn table_only_in_reference_is_missing() {
    let reference = metadata(vec![users_table(), Table::named("ORDERS")]);
    let target = metadata(vec![users_table()]);

    let diff = ComparisonEngine::new().compare(&reference, &target);

    assert_eq!(diff.missing_tables, ["ORDERS"]);
    assert!(diff.extra_tables.is_empty());
    assert_eq!(diff.total(), 1);
}

#[test]
fn missing_and_extra_are_symmetric() {
    let a = metadata(vec![users_table(), Table::named("ORDERS")]);
    let b = metadata(vec![users_table(), Table::named("AUDIT")]);

    let forward = ComparisonEngine::new().compare(&a, &b);
    let backward = ComparisonEngine::new().compare(&b, &a);

    assert_eq!(forward.missing_tables, backward.extra_tables);
    assert_eq!(forward.extra_tables, backward.missing_tables);
}

#[test]
fn table_name_matching_ignores_case() {
    let mut lower = Table::named("users");
    lower.columns.push(Column::new("id", "int", 1));
    let reference = metadata(vec![lower]);

    let mut upper = Table::named("USERS");
    upper.columns.push(Column::new("ID", "int", 1));
    let target = metadata(vec![upper]);

    assert!(ComparisonEngine::new().compare(&reference, &target).is_empty());
}

#[test]
fn widened_column_reports_a_type_mismatch() {
    let mut reference_table = Table::named("PRODUCTS");
    reference_table
        .columns
        .push(Column::new("PRICE", "decimal(10,2)", 1));
    let mut target_table = Table::named("PRODUCTS");
    target_table
        .columns
        .push(Column::new("PRICE", "decimal(12,2)", 1));

    let diff = ComparisonEngine::new().compare(
        &metadata(vec![reference_table]),
        &metadata(vec![target_table]),
    );

    assert_eq!(diff.column_diffs.len(), 1);
    let finding = &diff.column_diffs[0].findings[0];
    assert_eq!(finding.kind, FindingKind::Modified);
    assert_eq!(
        finding.changes,
        ["Type mismatch: decimal(10,2) != decimal(12,2)"]
    );
}

#[test]
fn type_comparison_ignores_case_only() {
    let mut reference_table = Table::named("T");
    reference_table.columns.push(Column::new("C", "VARCHAR(10)", 1));
    let mut target_table = Table::named("T");
    target_table.columns.push(Column::new("C", "varchar(10)", 1));

    let diff = ComparisonEngine::new().compare(
        &metadata(vec![reference_table]),
        &metadata(vec![target_table]),
    );

    assert!(diff.is_empty());
}

#[test]
fn every_compared_column_attribute_yields_its_own_reason() {
    let mut reference_table = Table::named("T");
    let mut ref_col = Column::new("C", "int", 1);
    ref_col.not_null = true;
    ref_col.auto_increment = true;
    ref_col.unsigned = true;
    ref_col.default_value = Some("1".to_string());
    reference_table.columns.push(ref_col);

    let mut target_table = Table::named("T");
    let target_col = Column::new("C", "bigint", 1);
    target_table.columns.push(target_col);

    let diff = ComparisonEngine::new().compare(
        &metadata(vec![reference_table]),
        &metadata(vec![target_table]),
    );

    let changes = &diff.column_diffs[0].findings[0].changes;
    assert_eq!(
        changes,
        &[
            "Type mismatch: int != bigint",
            "Nullable mismatch",
            "AutoIncrement mismatch",
            "Unsigned mismatch",
            "Default value mismatch",
        ]
    );
}

#[test]
fn uncompared_column_attributes_do_not_flag() {
    let mut reference_table = Table::named("T");
    let mut ref_col = Column::new("C", "int", 1);
    ref_col.comment = Some("the reference comment".to_string());
    ref_col.collation = Some("utf8mb4_bin".to_string());
    reference_table.columns.push(ref_col);

    let mut target_table = Table::named("T");
    let mut target_col = Column::new("C", "int", 2);
    target_col.comment = Some("a different comment".to_string());
    target_table.columns.push(target_col);

    let diff = ComparisonEngine::new().compare(
        &metadata(vec![reference_table]),
        &metadata(vec![target_table]),
    );

    assert!(diff.is_empty());
}

#[test]
fn missing_and_extra_columns_are_reported() {
    let mut reference_table = Table::named("T");
    reference_table.columns.push(Column::new("KEPT", "int", 1));
    reference_table.columns.push(Column::new("DROPPED", "int", 2));

    let mut target_table = Table::named("T");
    target_table.columns.push(Column::new("KEPT", "int", 1));
    target_table.columns.push(Column::new("ADDED", "int", 2));

    let diff = ComparisonEngine::new().compare(
        &metadata(vec![reference_table]),
        &metadata(vec![target_table]),
    );

    let findings = &diff.column_diffs[0].findings;
    assert_eq!(findings.len(), 2);
    assert_eq!(findings[0].kind, FindingKind::Missing);
    assert_eq!(findings[0].column, "DROPPED");
    assert_eq!(findings[1].kind, FindingKind::Extra);
    assert_eq!(findings[1].column, "ADDED");
}

#[test]
fn foreign_key_rule_change_reports_missing_extra_and_modified() {
    let reference = metadata(vec![child_table(ReferentialRule::Cascade)]);
    let target = metadata(vec![child_table(ReferentialRule::NoAction)]);

    let diff = ComparisonEngine::new().compare(&reference, &target);

    let findings = &diff.constraint_diffs[0].findings;
    let kinds: Vec<FindingKind> = findings.iter().map(|f| f.kind).collect();
    assert_eq!(
        kinds,
        [FindingKind::Missing, FindingKind::Extra, FindingKind::Modified]
    );

    let modified = &findings[2];
    assert_eq!(modified.label, "fk_child_parent");
    assert!(modified.reference.is_some());
    assert!(modified.target.is_some());
}

#[test]
fn renamed_constraint_with_same_signature_is_silent() {
    let mut reference_table = child_table(ReferentialRule::Cascade);
    let mut target_table = child_table(ReferentialRule::Cascade);
    if let Some(Constraint::ForeignKey(fk)) = reference_table.constraints.first_mut() {
        fk.name = Some("fk_old_name".to_string());
    }
    if let Some(Constraint::ForeignKey(fk)) = target_table.constraints.first_mut() {
        fk.name = Some("fk_new_name".to_string());
    }

    let diff = ComparisonEngine::new().compare(
        &metadata(vec![reference_table]),
        &metadata(vec![target_table]),
    );

    assert!(diff.constraint_diffs.is_empty());
}

#[test]
fn index_uniqueness_change_is_modified_with_reason() {
    let mut reference_table = Table::named("USERS");
    reference_table.columns.push(Column::new("EMAIL", "varchar(255)", 1));
    let mut plain = Index::new("idx_email");
    plain.columns = vec!["EMAIL".to_string()];
    plain.index_type = IndexType::BTree;
    reference_table.indexes.push(plain);

    let mut target_table = Table::named("USERS");
    target_table.columns.push(Column::new("EMAIL", "varchar(255)", 1));
    let mut unique = Index::new("idx_email");
    unique.columns = vec!["EMAIL".to_string()];
    unique.unique = true;
    unique.index_type = IndexType::BTree;
    target_table.indexes.push(unique);

    let diff = ComparisonEngine::new().compare(
        &metadata(vec![reference_table]),
        &metadata(vec![target_table]),
    );

    let finding = &diff.index_diffs[0].findings[0];
    assert_eq!(finding.kind, FindingKind::Modified);
    assert_eq!(finding.changes, ["Uniqueness: false != true"]);
}

#[test]
fn renamed_index_reports_both_missing_and_extra() {
    let mut reference_table = Table::named("T");
    reference_table.columns.push(Column::new("C", "int", 1));
    let mut old = Index::new("idx_old");
    old.columns = vec!["C".to_string()];
    reference_table.indexes.push(old);

    let mut target_table = Table::named("T");
    target_table.columns.push(Column::new("C", "int", 1));
    let mut new = Index::new("idx_new");
    new.columns = vec!["C".to_string()];
    target_table.indexes.push(new);

    let diff = ComparisonEngine::new().compare(
        &metadata(vec![reference_table]),
        &metadata(vec![target_table]),
    );

    let kinds: Vec<FindingKind> = diff.index_diffs[0]
        .findings
        .iter()
        .map(|f| f.kind)
        .collect();
    assert_eq!(kinds, [FindingKind::Missing, FindingKind::Extra]);
}

#[test]
fn tables_are_visited_in_lexicographic_order() {
    let mut b = Table::named("BRAVO");
    b.columns.push(Column::new("X", "int", 1));
    let mut a = Table::named("ALPHA");
    a.columns.push(Column::new("X", "int", 1));

    let mut b2 = Table::named("BRAVO");
    b2.columns.push(Column::new("X", "bigint", 1));
    let mut a2 = Table::named("ALPHA");
    a2.columns.push(Column::new("X", "bigint", 1));

    let diff =
        ComparisonEngine::new().compare(&metadata(vec![b, a]), &metadata(vec![b2, a2]));

    let order: Vec<&str> = diff.column_diffs.iter().map(|t| t.table.as_str()).collect();
    assert_eq!(order, ["ALPHA", "BRAVO"]);
}
