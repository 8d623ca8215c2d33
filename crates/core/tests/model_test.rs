use schemadiff_core::{
    Column, Constraint, DatabaseMetadata, KeyConstraint, NameMap, ReferentialRule, Table,
};

fn pk(name: &str, columns: &[&str]) -> Constraint {
    Constraint::PrimaryKey(KeyConstraint {
        name: Some(name.to_string()),
        columns: columns.iter().map(ToString::to_string).collect(),
    })
}

#[test]
fn name_map_rejects_case_insensitive_duplicates() {
    let mut map = NameMap::new();
    map.insert("users", Table::named("users")).unwrap();

    let err = map.insert("USERS", Table::named("USERS")).unwrap_err();
    assert_eq!(err.0, "USERS");
    assert_eq!(map.len(), 1);
}

#[test]
fn name_map_lookup_ignores_case() {
    let mut map = NameMap::new();
    map.insert("Users", Table::named("Users")).unwrap();

    assert!(map.contains("users"));
    assert_eq!(map.get("uSeRs").unwrap().name, "Users");
}

#[test]
fn name_map_iterates_in_lexicographic_order() {
    let mut map = NameMap::new();
    map.insert("zebra", 1).unwrap();
    map.insert("Apple", 2).unwrap();
    map.insert("mango", 3).unwrap();

    let keys: Vec<&String> = map.keys().collect();
    assert_eq!(keys, ["APPLE", "MANGO", "ZEBRA"]);
}

#[test]
fn table_rejects_second_primary_key() {
    let mut table = Table::named("users");
    table.add_constraint(pk("pk_users", &["id"])).unwrap();

    let err = table.add_constraint(pk("pk_again", &["email"])).unwrap_err();
    assert!(err.contains("already has a primary key"));
    assert_eq!(table.constraints.len(), 1);
}

#[test]
fn table_column_lookup_ignores_case() {
    let mut table = Table::named("users");
    table.columns.push(Column::new("Email", "varchar(255)", 1));

    assert!(table.column("EMAIL").is_some());
    assert!(table.column("missing").is_none());
}

#[test]
fn validation_warns_on_unresolved_foreign_key_and_empty_table() {
    let mut meta = DatabaseMetadata::new("app");
    let mut child = Table::named("child");
    child.columns.push(Column::new("parent_id", "int", 1));
    child
        .add_constraint(Constraint::ForeignKey(
            schemadiff_core::ForeignKeyConstraint {
                name: Some("fk_child".to_string()),
                columns: vec!["parent_id".to_string()],
                referenced_table: "parent".to_string(),
                referenced_columns: vec!["id".to_string()],
                on_delete: ReferentialRule::NoAction,
                on_update: ReferentialRule::NoAction,
            },
        ))
        .unwrap();
    meta.tables.insert("child", child).unwrap();
    meta.tables.insert("hollow", Table::named("hollow")).unwrap();

    let warnings = meta.validate();
    assert_eq!(warnings.len(), 2);
    assert!(warnings.iter().any(|w| w.contains("unknown table `parent`")));
    assert!(warnings.iter().any(|w| w.contains("`hollow` has no columns")));
}

#[test]
fn referential_rule_accepts_both_spellings() {
    assert_eq!(
        ReferentialRule::parse("NO_ACTION"),
        Some(ReferentialRule::NoAction)
    );
    assert_eq!(
        ReferentialRule::parse("no action"),
        Some(ReferentialRule::NoAction)
    );
    assert_eq!(
        ReferentialRule::parse("SET_NULL"),
        Some(ReferentialRule::SetNull)
    );
    assert_eq!(ReferentialRule::parse("cascade"), Some(ReferentialRule::Cascade));
    assert_eq!(ReferentialRule::parse("bogus"), None);
}
