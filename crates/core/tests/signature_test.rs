use schemadiff_core::{
    CheckConstraint, Constraint, ForeignKeyConstraint, KeyConstraint, ReferentialRule,
    constraint_signature,
};

fn fk(name: Option<&str>, on_delete: ReferentialRule) -> Constraint {
    Constraint::ForeignKey(ForeignKeyConstraint {
        name: name.map(ToString::to_string),
        columns: vec!["parent_id".to_string(), "tenant_id".to_string()],
        referenced_table: "parent".to_string(),
        referenced_columns: vec!["id".to_string(), "tenant".to_string()],
        on_delete,
        on_update: ReferentialRule::NoAction,
    })
}

#[test]
fn signature_ignores_constraint_name() {
    let named = fk(Some("fk_child_parent"), ReferentialRule::Cascade);
    let anonymous = fk(None, ReferentialRule::Cascade);

    assert_eq!(constraint_signature(&named), constraint_signature(&anonymous));
}

#[test]
fn primary_key_columns_are_sorted_and_upper_cased() {
    let forward = Constraint::PrimaryKey(KeyConstraint {
        name: None,
        columns: vec!["b".to_string(), "a".to_string()],
    });
    let reverse = Constraint::PrimaryKey(KeyConstraint {
        name: None,
        columns: vec!["A".to_string(), "B".to_string()],
    });

    assert_eq!(constraint_signature(&forward), "PRIMARY_KEY:A,B");
    assert_eq!(constraint_signature(&forward), constraint_signature(&reverse));
}

#[test]
fn foreign_key_column_order_is_preserved() {
    let swapped = Constraint::ForeignKey(ForeignKeyConstraint {
        name: None,
        columns: vec!["tenant_id".to_string(), "parent_id".to_string()],
        referenced_table: "parent".to_string(),
        referenced_columns: vec!["tenant".to_string(), "id".to_string()],
        on_delete: ReferentialRule::Cascade,
        on_update: ReferentialRule::NoAction,
    });

    assert_ne!(
        constraint_signature(&fk(None, ReferentialRule::Cascade)),
        constraint_signature(&swapped)
    );
}

#[test]
fn foreign_key_rules_are_part_of_the_signature() {
    let cascade = fk(None, ReferentialRule::Cascade);
    let restrict = fk(None, ReferentialRule::Restrict);

    let cascade_sig = constraint_signature(&cascade);
    assert_ne!(cascade_sig, constraint_signature(&restrict));
    assert!(cascade_sig.contains("ON DELETE CASCADE"));
    assert!(cascade_sig.contains("ON UPDATE NO ACTION"));
    assert!(cascade_sig.starts_with("FOREIGN_KEY:PARENT_ID,TENANT_ID"));
    assert!(cascade_sig.contains("PARENT(ID,TENANT)"));
}

#[test]
fn check_signature_allows_empty_column_list() {
    let check = Constraint::Check(CheckConstraint {
        name: Some("positive_price".to_string()),
        columns: Vec::new(),
        clause: "price > 0".to_string(),
    });

    assert_eq!(constraint_signature(&check), "CHECK:");
}

#[test]
fn signature_is_idempotent() {
    let constraint = fk(Some("fk"), ReferentialRule::SetNull);
    assert_eq!(
        constraint_signature(&constraint),
        constraint_signature(&constraint)
    );
}
