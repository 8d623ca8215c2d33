use schemadiff_core::{
    Column, ComparisonEngine, DatabaseMetadata, DiffResult, ReportRenderer, Table,
};

fn metadata(tables: Vec<Table>) -> DatabaseMetadata {
    let mut meta = DatabaseMetadata::new("app");
    for table in tables {
        let name = table.name.clone();
        meta.tables.insert(&name, table).unwrap();
    }
    meta
}

#[test]
fn empty_diff_renders_zero_header_and_no_sections() {
    let report = ReportRenderer::new().render(&DiffResult::default());

    assert!(report.contains("0 Differences Found"));
    assert!(report.contains("SCHEMA COMPARISON REPORT"));
    assert!(!report.contains("MISSING TABLES"));
    assert!(!report.contains("LEGEND"));
}

#[test]
fn single_difference_uses_singular_header() {
    let diff = DiffResult {
        missing_tables: vec!["ORDERS".to_string()],
        ..DiffResult::default()
    };

    let report = ReportRenderer::new().render(&diff);

    assert!(report.contains("1 Difference Found"));
    assert!(report.contains("MISSING TABLES"));
    assert!(report.contains("  - ORDERS"));
    assert!(report.contains("LEGEND"));
}

#[test]
fn empty_sections_are_omitted() {
    let diff = DiffResult {
        extra_tables: vec!["AUDIT".to_string()],
        ..DiffResult::default()
    };

    let report = ReportRenderer::new().render(&diff);

    assert!(report.contains("EXTRA TABLES"));
    assert!(report.contains("  + AUDIT"));
    assert!(!report.contains("MISSING TABLES"));
    assert!(!report.contains("COLUMN DIFFERENCES"));
    assert!(!report.contains("CONSTRAINT DIFFERENCES"));
    assert!(!report.contains("INDEX DIFFERENCES"));
}

#[test]
fn column_findings_are_grouped_by_table_with_reasons() {
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
    let report = ReportRenderer::new().render(&diff);

    assert!(report.contains("COLUMN DIFFERENCES"));
    assert!(report.contains("  PRODUCTS"));
    assert!(report.contains("    ~ MODIFIED PRICE"));
    assert!(report.contains("        Type mismatch: decimal(10,2) != decimal(12,2)"));
}

#[test]
fn rendering_is_deterministic() {
    let mut reference_table = Table::named("T");
    reference_table.columns.push(Column::new("A", "int", 1));
    let mut target_table = Table::named("T");
    target_table.columns.push(Column::new("A", "bigint", 1));

    let reference = metadata(vec![reference_table]);
    let target = metadata(vec![target_table]);

    let first = ReportRenderer::new().render(&ComparisonEngine::new().compare(&reference, &target));
    let second =
        ReportRenderer::new().render(&ComparisonEngine::new().compare(&reference, &target));

    assert_eq!(first, second);
}

#[test]
fn self_comparison_renders_byte_identical_zero_reports() {
    let mut table = Table::named("USERS");
    table.columns.push(Column::new("ID", "int", 1));
    let meta = metadata(vec![table]);

    let engine = ComparisonEngine::new();
    let renderer = ReportRenderer::new();
    let first = renderer.render(&engine.compare(&meta, &meta));
    let second = renderer.render(&engine.compare(&meta, &meta));

    assert_eq!(first, second);
    assert!(first.contains("0 Differences Found"));
}
