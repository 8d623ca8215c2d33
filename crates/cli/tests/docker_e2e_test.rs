//! End-to-end runs against real containers. These need a local container
//! daemon and network access to pull images, so they are ignored by
//! default: `cargo test -p schemadiff-cli -- --ignored`.

use std::{fs, io::Write as _};

use clap::Parser;
use schemadiff_cli::{args::Args, run};

fn write_script(dir: &tempfile::TempDir, name: &str, ddl: &str) -> String {
    let path = dir.path().join(name);
    let mut file = fs::File::create(&path).expect("create script");
    file.write_all(ddl.as_bytes()).expect("write script");
    path.to_string_lossy().into_owned()
}

fn args(reference: &str, target: &str) -> Args {
    Args::try_parse_from([
        "schemadiff",
        "--db-type",
        "mysql",
        "--reference",
        reference,
        "--target",
        target,
    ])
    .expect("valid invocation")
}

#[test]
#[ignore = "requires a local container daemon"]
fn identical_scripts_exit_zero() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ddl = "CREATE TABLE USERS (\n  ID INT AUTO_INCREMENT PRIMARY KEY,\n  EMAIL VARCHAR(255) UNIQUE\n);\n";
    let reference = write_script(&dir, "reference.sql", ddl);
    let target = write_script(&dir, "target.sql", ddl);

    let code = run::run(&args(&reference, &target)).expect("run succeeds");
    assert_eq!(code, run::EXIT_NO_DIFFERENCES);
}

#[test]
#[ignore = "requires a local container daemon"]
fn a_dropped_table_exits_one() {
    let dir = tempfile::tempdir().expect("tempdir");
    let reference = write_script(
        &dir,
        "reference.sql",
        "CREATE TABLE USERS (ID INT PRIMARY KEY);\nCREATE TABLE ORDERS (ID INT PRIMARY KEY);\n",
    );
    let target = write_script(
        &dir,
        "target.sql",
        "CREATE TABLE USERS (ID INT PRIMARY KEY);\n",
    );

    let code = run::run(&args(&reference, &target)).expect("run succeeds");
    assert_eq!(code, run::EXIT_DIFFERENCES);
}
