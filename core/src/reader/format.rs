//! The registry of supported input formats.

use std::{collections::HashMap, fmt, str::FromStr, sync::OnceLock};

/// A supported input format.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Format {
    /// Text variants, version 3.x.
    Vcf3,
    /// Text variants, version 4.0.
    Vcf40,
    /// Text variants, version 4.1.
    Vcf41,
    /// Binary variants.
    Bcf,
}

/// One registry entry.
///
/// Aliases share a format with their canonical entry but are excluded from
/// autodetection so the same grammar is not trialled twice.
#[derive(Clone, Copy, Debug)]
pub struct Descriptor {
    /// The format name, the primary lookup key.
    pub name: &'static str,
    /// The canonical name this entry is an alias of, if any.
    pub alias_of: Option<&'static str>,
    /// Whether the entry participates in autodetection.
    pub autodetect: bool,
    /// An ontology term id usable as an alternate lookup key.
    pub term: &'static str,
    /// The format the entry loads.
    pub format: Format,
}

/// The ordered format registry.
///
/// Autodetection trials entries in this order. The binary format comes first
/// since its magic-number peek is non-consuming and must run before the
/// source transitions to line-oriented reading.
pub const REGISTRY: &[Descriptor] = &[
    Descriptor {
        name: "bcf",
        alias_of: None,
        autodetect: true,
        term: "format_3020",
        format: Format::Bcf,
    },
    Descriptor {
        name: "vcf41",
        alias_of: None,
        autodetect: true,
        term: "format_3016",
        format: Format::Vcf41,
    },
    Descriptor {
        name: "vcf40",
        alias_of: None,
        autodetect: true,
        term: "format_3016",
        format: Format::Vcf40,
    },
    Descriptor {
        name: "vcf3",
        alias_of: None,
        autodetect: true,
        term: "format_3016",
        format: Format::Vcf3,
    },
    // Deprecated alias for the current text version; resolvable by name but
    // never trialled on its own
    Descriptor {
        name: "vcf",
        alias_of: Some("vcf41"),
        autodetect: false,
        term: "format_3016",
        format: Format::Vcf41,
    },
];

fn name_index() -> &'static HashMap<&'static str, usize> {
    static INDEX: OnceLock<HashMap<&'static str, usize>> = OnceLock::new();

    INDEX.get_or_init(|| {
        REGISTRY
            .iter()
            .enumerate()
            .map(|(i, descriptor)| (descriptor.name, i))
            .collect()
    })
}

fn term_index() -> &'static HashMap<&'static str, usize> {
    static INDEX: OnceLock<HashMap<&'static str, usize>> = OnceLock::new();

    INDEX.get_or_init(|| {
        // First entry for a term wins, so terms resolve to canonical entries
        let mut index = HashMap::new();

        for (i, descriptor) in REGISTRY.iter().enumerate() {
            index.entry(descriptor.term).or_insert(i);
        }

        index
    })
}

/// Looks up a registry entry by name, case-insensitively.
pub fn find(name: &str) -> Option<(usize, &'static Descriptor)> {
    let name = name.to_lowercase();

    name_index()
        .get(name.as_str())
        .map(|&i| (i, &REGISTRY[i]))
}

/// Looks up a registry entry by ontology term id.
pub fn find_by_term(term: &str) -> Option<(usize, &'static Descriptor)> {
    term_index().get(term).map(|&i| (i, &REGISTRY[i]))
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Vcf3 => "vcf3",
            Format::Vcf40 => "vcf40",
            Format::Vcf41 => "vcf41",
            Format::Bcf => "bcf",
        };

        f.write_str(name)
    }
}

impl FromStr for Format {
    type Err = UnknownFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        find(s)
            .map(|(_, descriptor)| descriptor.format)
            .ok_or_else(|| UnknownFormatError(s.to_string()))
    }
}

/// An error for a requested format name not present in the registry.
///
/// This indicates a programming or configuration error rather than a data
/// error, and is fatal.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnknownFormatError(pub String);

impl fmt::Display for UnknownFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown variant format '{}'", self.0)
    }
}

impl std::error::Error for UnknownFormatError {}
