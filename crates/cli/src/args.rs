use clap::Parser;
use schemadiff_core::DialectKind;

/// Compare two relational database schemas and report structural
/// differences. Exit code 0 means no differences, 1 means differences were
/// found, 2 means the run itself failed.
#[derive(Debug, Parser)]
#[command(name = "schemadiff", version, about)]
pub struct Args {
    /// Reference side: a connection URL or a path to a DDL script.
    #[arg(long)]
    pub reference: String,

    /// Target side: a connection URL or a path to a DDL script.
    #[arg(long)]
    pub target: String,

    /// Dialect used for both sides (same-dialect comparison only).
    #[arg(long = "db-type")]
    pub db_type: DialectKind,

    /// Credentials for a reference connection URL.
    #[arg(long)]
    pub ref_user: Option<String>,
    #[arg(long)]
    pub ref_pass: Option<String>,

    /// Credentials for a target connection URL.
    #[arg(long)]
    pub target_user: Option<String>,
    #[arg(long)]
    pub target_pass: Option<String>,

    /// Container image used when a side is a DDL script.
    #[arg(long)]
    pub image: Option<String>,

    /// Schema/owner to examine on the reference side (defaults to the
    /// session default of the dialect).
    #[arg(long)]
    pub ref_schema: Option<String>,

    /// Schema/owner to examine on the target side.
    #[arg(long)]
    pub target_schema: Option<String>,

    /// Disable the transient-fault retry envelope around catalog queries.
    #[arg(long)]
    pub no_retry: bool,
}

/// Which side of the comparison an input belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Reference,
    Target,
}

impl Side {
    #[must_use]
    pub fn input<'a>(self, args: &'a Args) -> &'a str {
        match self {
            Self::Reference => &args.reference,
            Self::Target => &args.target,
        }
    }

    #[must_use]
    pub fn user(self, args: &Args) -> Option<String> {
        match self {
            Self::Reference => args.ref_user.clone(),
            Self::Target => args.target_user.clone(),
        }
    }

    #[must_use]
    pub fn password(self, args: &Args) -> Option<String> {
        match self {
            Self::Reference => args.ref_pass.clone(),
            Self::Target => args.target_pass.clone(),
        }
    }

    #[must_use]
    pub fn schema(self, args: &Args) -> Option<String> {
        match self {
            Self::Reference => args.ref_schema.clone(),
            Self::Target => args.target_schema.clone(),
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Reference => "reference",
            Self::Target => "target",
        }
    }
}
