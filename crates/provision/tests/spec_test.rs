use std::time::Duration;

use schemadiff_core::DialectKind;
use schemadiff_provision::ContainerSpec;

#[test]
fn mysql_spec_forces_latin1_classic_auth_dynamic_rows_and_big_packets() {
    let spec = ContainerSpec::for_dialect(DialectKind::Mysql, None);

    assert_eq!(spec.container_port, 3306);
    assert!(spec.cmd.contains(&"--character-set-server=latin1".to_string()));
    assert!(
        spec.cmd
            .contains(&"--default-authentication-plugin=mysql_native_password".to_string())
    );
    assert!(
        spec.cmd
            .contains(&"--innodb-default-row-format=dynamic".to_string())
    );
    assert!(spec.cmd.contains(&"--max-allowed-packet=268435456".to_string()));
}

#[test]
fn mssql_spec_accepts_eula_and_sets_a_strong_sa_password() {
    let spec = ContainerSpec::for_dialect(DialectKind::Mssql, None);

    assert!(spec.env.contains(&"ACCEPT_EULA=Y".to_string()));
    assert!(spec.env.iter().any(|e| e.starts_with("MSSQL_SA_PASSWORD=")));
    assert_eq!(spec.user, "sa");
    // The engine rejects weak SA passwords outright.
    assert!(spec.password.len() >= 8);
    assert!(spec.password.chars().any(|c| c.is_ascii_uppercase()));
    assert!(spec.password.chars().any(|c| c.is_ascii_digit()));
    assert!(spec.password.chars().any(|c| !c.is_ascii_alphanumeric()));
}

#[test]
fn oracle_free_image_switches_the_service_name() {
    let xe = ContainerSpec::for_dialect(DialectKind::Oracle, None);
    assert_eq!(xe.database, "XEPDB1");

    let free = ContainerSpec::for_dialect(
        DialectKind::Oracle,
        Some("gvenzl/oracle-free:23-slim"),
    );
    assert_eq!(free.database, "FREEPDB1");
    assert_eq!(free.image, "gvenzl/oracle-free:23-slim");
}

#[test]
fn db2_spec_accepts_license_and_runs_privileged() {
    let spec = ContainerSpec::for_dialect(DialectKind::Db2, None);

    assert!(spec.env.contains(&"LICENSE=accept".to_string()));
    assert!(spec.privileged);
    assert!(spec.database.len() <= 8);
}

#[test]
fn readiness_deadlines_scale_with_engine_startup_cost() {
    let postgres = ContainerSpec::for_dialect(DialectKind::Postgres, None);
    let oracle = ContainerSpec::for_dialect(DialectKind::Oracle, None);
    let db2 = ContainerSpec::for_dialect(DialectKind::Db2, None);

    assert!(postgres.readiness_timeout >= Duration::from_secs(60));
    assert!(oracle.readiness_timeout > postgres.readiness_timeout);
    assert!(db2.readiness_timeout >= oracle.readiness_timeout);
}

#[test]
fn image_override_is_respected() {
    let spec = ContainerSpec::for_dialect(DialectKind::Mysql, Some("mysql:8.4"));
    assert_eq!(spec.image, "mysql:8.4");
}
