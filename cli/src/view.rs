use std::{io, path::PathBuf};

use anyhow::Error;

use clap::Parser;

mod runner;
use runner::Runner;

/// View variation records from text or binary variant input.
#[derive(Debug, Parser)]
pub struct View {
    /// Input variant file.
    ///
    /// Text and binary variant formats are supported, optionally
    /// gzip-compressed. If no file is provided, stdin will be used.
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Input format.
    ///
    /// By default, the format is autodetected. Providing a format name
    /// (e.g. 'vcf41', 'bcf') restricts reading to that format, which still
    /// has to match the input. Takes precedence over a format given inside
    /// a query.
    #[arg(short = 'f', long, value_name = "NAME")]
    format: Option<String>,

    /// Record query.
    ///
    /// A query is an optional format name followed by '::', then one or
    /// more '|'-separated clauses. A clause is an 'attribute=pattern' pair,
    /// a bare pattern as shorthand for 'id=pattern', or '@file' referencing
    /// a list file with one query per line. Patterns support '*' and '?'
    /// wildcards. The flag may be repeated; each query is run over the
    /// input in turn, which requires a file input.
    #[arg(short = 'Q', long = "query", value_name = "QUERY")]
    query: Vec<String>,

    /// Match query patterns case-sensitively.
    ///
    /// By default, patterns match without regard to case.
    #[arg(long)]
    case_sensitive: bool,

    /// Database name to record on the output.
    #[arg(long, default_value = "local", value_name = "NAME")]
    db: String,
}

impl View {
    pub fn run(self) -> Result<(), Error> {
        let runner = Runner::try_from(&self)?;

        runner.run(&mut io::stdout().lock())
    }
}
