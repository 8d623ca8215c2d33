use std::{fs, path::PathBuf, thread};

use schemadiff_core::{
    CancelToken, ComparisonEngine, ConfigError, DatabaseMetadata, DialectKind, Error,
    ExtractorOptions, ReportRenderer,
};
use schemadiff_provision::{ContainerSpec, ProvisionedDatabase, run_script};

use crate::{
    args::{Args, Side},
    source::open_source,
    url::{is_connection_url, parse_connection_url},
};

pub const EXIT_NO_DIFFERENCES: i32 = 0;
pub const EXIT_DIFFERENCES: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Resolves both sides (in parallel), compares, prints the report, and
/// returns the process exit code. The first side to fail cancels its
/// sibling's extraction at the next phase boundary.
pub fn run(args: &Args) -> Result<i32, Error> {
    let dialect = args.db_type;
    let cancel = CancelToken::new();

    let (reference, target) = thread::scope(|scope| {
        let reference = scope.spawn(|| resolve_side(dialect, Side::Reference, args, &cancel));
        let target = scope.spawn(|| resolve_side(dialect, Side::Target, args, &cancel));
        (join(reference), join(target))
    });
    let reference = reference?;
    let target = target?;

    let diff = ComparisonEngine::new().compare(&reference, &target);
    print!("{}", ReportRenderer::new().render(&diff));

    Ok(exit_code_for(&diff))
}

/// Maps a comparison outcome to the process exit code contract.
#[must_use]
pub fn exit_code_for(diff: &schemadiff_core::DiffResult) -> i32 {
    if diff.is_empty() {
        EXIT_NO_DIFFERENCES
    } else {
        EXIT_DIFFERENCES
    }
}

fn join(
    handle: thread::ScopedJoinHandle<'_, Result<DatabaseMetadata, Error>>,
) -> Result<DatabaseMetadata, Error> {
    match handle.join() {
        Ok(result) => result,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

fn resolve_side(
    dialect: DialectKind,
    side: Side,
    args: &Args,
    cancel: &CancelToken,
) -> Result<DatabaseMetadata, Error> {
    let result = resolve_side_inner(dialect, side, args, cancel);
    if result.is_err() {
        cancel.cancel();
    }
    result
}

fn resolve_side_inner(
    dialect: DialectKind,
    side: Side,
    args: &Args,
    cancel: &CancelToken,
) -> Result<DatabaseMetadata, Error> {
    let input = side.input(args);
    let options = ExtractorOptions {
        schema: side.schema(args),
        retry: !args.no_retry,
        cancel: cancel.clone(),
        ..ExtractorOptions::default()
    };

    if is_connection_url(input) {
        tracing::info!(side = side.label(), url = input, "dialling live database");
        let config =
            parse_connection_url(dialect, input, side.user(args), side.password(args))?;
        let mut source = open_source(dialect, &config, options)?;
        return Ok(source.extract()?);
    }

    tracing::info!(side = side.label(), script = input, "provisioning from DDL script");
    let script =
        fs::read_to_string(input).map_err(|source| ConfigError::ScriptRead {
            path: PathBuf::from(input),
            source,
        })?;

    let spec = ContainerSpec::for_dialect(dialect, args.image.as_deref());
    let container = ProvisionedDatabase::launch(&spec)?;
    container.wait_until_ready(spec.readiness_timeout, |config| {
        match open_source(dialect, config, ExtractorOptions::default()) {
            Ok(mut probe) => probe.ping().is_ok(),
            Err(_) => false,
        }
    })?;

    let mut source = open_source(dialect, container.connection(), options)?;
    let outcome = run_script(source.as_mut(), &script);
    if !outcome.all_succeeded() {
        tracing::warn!(
            side = side.label(),
            failed = outcome.failed,
            succeeded = outcome.succeeded,
            "some DDL statements failed; comparing what was materialised"
        );
    }

    let meta = source.extract()?;
    drop(source);
    Ok(meta)
}
