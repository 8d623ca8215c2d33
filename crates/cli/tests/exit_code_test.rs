use schemadiff_cli::run::{EXIT_DIFFERENCES, EXIT_NO_DIFFERENCES, exit_code_for};
use schemadiff_core::ComparisonEngine;
use schemadiff_testkit::{ColumnBuilder, TableBuilder, metadata};

fn users_table() -> schemadiff_core::Table {
    TableBuilder::new("USERS")
        .column(ColumnBuilder::new("ID", "int").not_null().auto_increment())
        .column(ColumnBuilder::new("EMAIL", "varchar(255)").not_null())
        .primary_key(Some("PRIMARY"), &["ID"])
        .unique(Some("uq_email"), &["EMAIL"])
        .build()
}

#[test]
fn no_differences_maps_to_exit_zero() {
    let reference = metadata("app", [users_table()]);
    let target = metadata("app", [users_table()]);

    let diff = ComparisonEngine::new().compare(&reference, &target);
    assert_eq!(exit_code_for(&diff), EXIT_NO_DIFFERENCES);
}

#[test]
fn any_difference_maps_to_exit_one() {
    let reference = metadata("app", [users_table(), TableBuilder::new("ORDERS").build()]);
    let target = metadata("app", [users_table()]);

    let diff = ComparisonEngine::new().compare(&reference, &target);
    assert_eq!(exit_code_for(&diff), EXIT_DIFFERENCES);
}
