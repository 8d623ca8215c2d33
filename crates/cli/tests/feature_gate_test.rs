use schemadiff_cli::source::enabled_dialects;

#[test]
fn default_build_enables_the_network_native_dialects() {
    let enabled = enabled_dialects();
    #[cfg(feature = "mysql")]
    assert!(enabled.contains(&"mysql"));
    #[cfg(feature = "postgres")]
    assert!(enabled.contains(&"postgres"));
    #[cfg(feature = "mssql")]
    assert!(enabled.contains(&"mssql"));
    assert!(!enabled.is_empty());
}

#[cfg(not(feature = "oracle"))]
mod disabled_dialects {
    use schemadiff_cli::source::open_source;
    use schemadiff_core::{
        ConnectionConfig, DialectKind, Error, ExtractorOptions,
    };

    #[test]
    fn a_dialect_left_out_of_the_build_is_a_configuration_fault() {
        let config = ConnectionConfig::for_database("app");
        let error = open_source(DialectKind::Oracle, &config, ExtractorOptions::default())
            .err()
            .expect("oracle is not compiled in");
        assert!(matches!(error, Error::Config(_)));
        assert!(error.to_string().contains("not compiled into this build"));
    }
}
