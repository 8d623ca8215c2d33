use anyhow::Context;
use miette::Report;
use schemadiff_core::Error;

const RUN_CONTEXT: &str = "while comparing schemas";

/// Renders a runtime error with its taxonomy category tag. Every error
/// rendered here maps to exit code 2.
#[must_use]
pub fn render_runtime_error(error: Error) -> String {
    let category = category(&error);
    let report = report_with_context(error, RUN_CONTEXT);
    format!("[{category}] {report}")
}

fn category(error: &Error) -> &'static str {
    match error {
        Error::Extract(_) => "extract",
        Error::Provision(_) => "provision",
        Error::Config(_) => "config",
    }
}

fn report_with_context<E, C>(source: E, context: C) -> Report
where
    E: std::error::Error + Send + Sync + 'static,
    C: Into<String>,
{
    let context = context.into();
    let anyhow_error = std::result::Result::<(), E>::Err(source)
        .context(context)
        .expect_err("context wrapping must produce an error");
    miette::miette!("{anyhow_error:#}")
}
