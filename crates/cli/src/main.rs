use clap::Parser;
use schemadiff_cli::{args::Args, error_presentation, run};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run::run(&args) {
        Ok(code) => std::process::exit(code),
        Err(error) => {
            eprintln!("{}", error_presentation::render_runtime_error(error));
            std::process::exit(run::EXIT_ERROR);
        }
    }
}
