use schemadiff_cli::error_presentation::render_runtime_error;
use schemadiff_core::{
    CatalogError, ConfigError, DialectKind, Error, ExtractError, Phase, ProvisionError,
};

#[test]
fn extraction_errors_are_tagged_extract() {
    let error = Error::Extract(ExtractError::Catalog {
        phase: Phase::Columns,
        source: CatalogError::new("relation does not exist").with_sqlstate("42P01"),
    });

    let rendered = render_runtime_error(error);
    assert!(rendered.starts_with("[extract]"));
    assert!(rendered.contains("while comparing schemas"));
    assert!(rendered.contains("columns"));
}

#[test]
fn provisioning_errors_are_tagged_provision() {
    let error = Error::Provision(ProvisionError::NotReady {
        image: "mysql:8.0".to_string(),
        waited: std::time::Duration::from_secs(120),
    });

    let rendered = render_runtime_error(error);
    assert!(rendered.starts_with("[provision]"));
    assert!(rendered.contains("mysql:8.0"));
}

#[test]
fn configuration_errors_are_tagged_config() {
    let error = Error::Config(ConfigError::UnknownDialect("sybase".to_string()));

    let rendered = render_runtime_error(error);
    assert!(rendered.starts_with("[config]"));
    assert!(rendered.contains("sybase"));
}

#[test]
fn connect_errors_name_the_dialect() {
    let error = Error::Extract(ExtractError::Connect {
        dialect: DialectKind::Mssql,
        source: CatalogError::new("login failed").with_code(18456),
    });

    let rendered = render_runtime_error(error);
    assert!(rendered.contains("mssql"));
}
