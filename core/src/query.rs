//! The query mini-language.
//!
//! A query names what to read: an optional format name followed by `::`,
//! then one or more `|`-separated clauses. A clause is an
//! `attribute=pattern` pair, a bare pattern as shorthand for `id=pattern`,
//! or a reference to a list file (`@file` or `list:file`) whose lines are
//! parsed as further queries. List files may reference other list files,
//! up to a fixed nesting depth.

use std::{fmt, fs, io, path::Path};

/// The maximum list-file nesting depth.
///
/// A list file referencing itself, directly or through other files, would
/// otherwise expand forever.
pub const MAX_LIST_DEPTH: usize = 16;

/// A parsed query.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Spec {
    /// The format name, if one was given.
    pub format: Option<String>,
    /// The query fields as `(attribute, pattern)` pairs.
    pub fields: Vec<(String, String)>,
}

/// Parses a query, expanding any referenced list files.
pub fn parse(text: &str) -> Result<Spec, Error> {
    let mut spec = Spec::default();

    parse_into(text, &mut spec, 0)?;

    Ok(spec)
}

fn parse_into(text: &str, spec: &mut Spec, depth: usize) -> Result<(), Error> {
    let rest = match text.split_once("::") {
        Some((format, rest)) => {
            // The first format named anywhere in the expansion wins
            if !format.is_empty() && spec.format.is_none() {
                spec.format = Some(format.trim().to_string());
            }

            rest
        }
        None => text,
    };

    for clause in rest.split('|') {
        let clause = clause.trim();

        if clause.is_empty() {
            continue;
        }

        if let Some(path) = clause
            .strip_prefix('@')
            .or_else(|| clause.strip_prefix("list:"))
        {
            expand_list(Path::new(path), spec, depth + 1)?;
        } else if let Some((name, pattern)) = clause.split_once('=') {
            spec.fields
                .push((name.trim().to_lowercase(), pattern.trim().to_string()));
        } else {
            spec.fields.push((String::from("id"), clause.to_string()));
        }
    }

    Ok(())
}

fn expand_list(path: &Path, spec: &mut Spec, depth: usize) -> Result<(), Error> {
    if depth > MAX_LIST_DEPTH {
        return Err(Error::Depth);
    }

    let contents = fs::read_to_string(path).map_err(|e| Error::List {
        path: path.display().to_string(),
        source: e,
    })?;

    for line in contents.lines() {
        // Everything after '#' is comment
        let line = line.split('#').next().unwrap_or_default().trim();

        if line.is_empty() {
            continue;
        }

        parse_into(line, spec, depth)?;
    }

    Ok(())
}

/// An error associated with parsing a query.
#[derive(Debug)]
pub enum Error {
    /// List files were nested past [`MAX_LIST_DEPTH`].
    Depth,
    /// A referenced list file could not be read.
    List {
        /// The referenced path.
        path: String,
        /// The underlying I/O failure.
        source: io::Error,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Depth => write!(
                f,
                "query list files nested deeper than {MAX_LIST_DEPTH} levels"
            ),
            Error::List { path, source } => {
                write!(f, "cannot read query list file '{path}': {source}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Depth => None,
            Error::List { source, .. } => Some(source),
        }
    }
}
