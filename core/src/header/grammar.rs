//! Grammar for `##`-prefixed metadata header lines.
//!
//! The same grammar is used for every supported text format version and for
//! the text header embedded in the binary format. A line is
//! `##<CATEGORY>=<rest>`; if `<rest>` carries no `ID=` key the whole value is
//! kept as a free-text pair (this covers the `##fileformat=...` signature
//! line), otherwise the bracketed `ID=...` body is parsed into a typed entry.

use std::fmt;

use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::char,
    combinator::all_consuming,
    multi::separated_list1,
    sequence::{delimited, separated_pair},
    IResult,
};

use super::{
    field::{Category, Field, Number, ParseNumberError, ParseTypeError},
    sample::{split_list, Sample},
};

/// A parsed metadata header line.
#[derive(Clone, Debug, PartialEq)]
pub enum Entry {
    /// An INFO or FORMAT field declaration.
    Field(Field),
    /// A SAMPLE declaration.
    Sample(Sample),
    /// Any other declaration, kept as a free-text pair with the id extracted
    /// when one was present.
    Other {
        /// The header category, e.g. `FILTER` or `fileformat`.
        category: String,
        /// The `ID=` value, if the line carried one.
        id: Option<String>,
        /// The raw value after `=`.
        value: String,
    },
}

fn key(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c != '=' && c != ',' && c != '<' && c != '>')(input)
}

fn quoted(input: &str) -> IResult<&str, &str> {
    delimited(char('"'), take_while(|c: char| c != '"'), char('"'))(input)
}

fn bare(input: &str) -> IResult<&str, &str> {
    take_while(|c: char| c != ',' && c != '>')(input)
}

fn key_value(input: &str) -> IResult<&str, (&str, &str)> {
    separated_pair(key, char('='), alt((quoted, bare)))(input)
}

fn body(input: &str) -> IResult<&str, Vec<(&str, &str)>> {
    all_consuming(delimited(
        char('<'),
        separated_list1(char(','), key_value),
        char('>'),
    ))(input)
}

/// Parses one `##`-prefixed header line into an [`Entry`].
pub fn parse_line(line: &str) -> Result<Entry, Error> {
    let rest = line.strip_prefix("##").ok_or(Error::NotMeta)?;

    let (category, value) = match rest.split_once('=') {
        Some((category, value)) => (category, value),
        None => {
            return Ok(Entry::Other {
                category: rest.to_string(),
                id: None,
                value: String::new(),
            })
        }
    };

    if !value.contains("ID=") {
        return Ok(Entry::Other {
            category: category.to_string(),
            id: None,
            value: value.to_string(),
        });
    }

    let (_, pairs) = body(value).map_err(|_| Error::Structure {
        category: category.to_string(),
    })?;

    let get = |key: &str| {
        pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    };

    let id = get("ID").ok_or_else(|| Error::MissingId {
        category: category.to_string(),
    })?;

    match category {
        "INFO" | "FORMAT" => {
            let field_category = if category == "INFO" {
                Category::Info
            } else {
                Category::Format
            };

            let number = get("Number")
                .ok_or(Error::MissingKey {
                    category: field_category,
                    key: "Number",
                })?
                .parse::<Number>()?;

            let ty = get("Type")
                .ok_or(Error::MissingKey {
                    category: field_category,
                    key: "Type",
                })?
                .parse()?;

            Ok(Entry::Field(Field {
                category: field_category,
                id: id.to_string(),
                number,
                ty,
                description: get("Description").unwrap_or_default().to_string(),
            }))
        }
        "SAMPLE" => {
            // The SAMPLE genome count reuses the cardinality rule, but only a
            // literal count is meaningful here
            let number = match get("Number").map(str::parse::<Number>).transpose()? {
                Some(Number::Count(n)) => Some(n as usize),
                _ => None,
            };

            Ok(Entry::Sample(Sample::from_parts(
                id.to_string(),
                number,
                split_list(get("Description").unwrap_or_default()),
                split_list(get("Genomes").unwrap_or_default()),
                split_list(get("Mixture").unwrap_or_default()),
            )))
        }
        _ => Ok(Entry::Other {
            category: category.to_string(),
            id: Some(id.to_string()),
            value: value.to_string(),
        }),
    }
}

/// An error associated with parsing a single metadata header line.
///
/// These are recoverable: callers log the error and skip the line.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// The line does not start with `##`.
    NotMeta,
    /// The `ID=...` body is not a well-formed bracketed key-value list.
    Structure {
        /// The header category of the offending line.
        category: String,
    },
    /// The body carried no `ID=` key where one was expected.
    MissingId {
        /// The header category of the offending line.
        category: String,
    },
    /// A required key is missing from a field declaration.
    MissingKey {
        /// The declaring category.
        category: Category,
        /// The missing key.
        key: &'static str,
    },
    /// The `Number` value did not parse.
    Number(ParseNumberError),
    /// The `Type` value did not parse.
    Type(ParseTypeError),
}

impl From<ParseNumberError> for Error {
    fn from(e: ParseNumberError) -> Self {
        Self::Number(e)
    }
}

impl From<ParseTypeError> for Error {
    fn from(e: ParseTypeError) -> Self {
        Self::Type(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotMeta => f.write_str("header line does not start with '##'"),
            Error::Structure { category } => {
                write!(f, "malformed '{category}' header declaration")
            }
            Error::MissingId { category } => {
                write!(f, "'{category}' header declaration without ID")
            }
            Error::MissingKey { category, key } => {
                write!(f, "{category} header declaration without {key}")
            }
            Error::Number(e) => write!(f, "{e}"),
            Error::Type(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::header::field::Type;

    #[test]
    fn test_parse_info_field() -> Result<(), Error> {
        let entry =
            parse_line("##INFO=<ID=DP,Number=1,Type=Integer,Description=\"Depth\">")?;

        assert_eq!(
            entry,
            Entry::Field(Field {
                category: Category::Info,
                id: String::from("DP"),
                number: Number::Count(1),
                ty: Type::Integer,
                description: String::from("Depth"),
            })
        );

        Ok(())
    }

    #[test]
    fn test_parse_format_field_with_sentinel_number() -> Result<(), Error> {
        let entry = parse_line("##FORMAT=<ID=AD,Number=A,Type=Integer,Description=\"x\">")?;

        match entry {
            Entry::Field(field) => {
                assert_eq!(field.category, Category::Format);
                assert_eq!(field.number, Number::Alleles);
            }
            _ => panic!("expected field entry"),
        }

        Ok(())
    }

    #[test]
    fn test_parse_unquoted_description() -> Result<(), Error> {
        let entry = parse_line("##INFO=<ID=H2,Number=0,Type=Flag,Description=HapMap2>")?;

        match entry {
            Entry::Field(field) => assert_eq!(field.description, "HapMap2"),
            _ => panic!("expected field entry"),
        }

        Ok(())
    }

    #[test]
    fn test_parse_description_with_commas() -> Result<(), Error> {
        let entry = parse_line(
            "##INFO=<ID=AF,Number=A,Type=Float,Description=\"Allele frequency, per ALT\">",
        )?;

        match entry {
            Entry::Field(field) => assert_eq!(field.description, "Allele frequency, per ALT"),
            _ => panic!("expected field entry"),
        }

        Ok(())
    }

    #[test]
    fn test_parse_unknown_type_fails_for_line_only() {
        let result = parse_line("##INFO=<ID=DP,Number=1,Type=Weird,Description=\"x\">");

        assert_eq!(
            result,
            Err(Error::Type(ParseTypeError(String::from("Weird"))))
        );
    }

    #[test]
    fn test_parse_fileformat_signature_as_pair() -> Result<(), Error> {
        let entry = parse_line("##fileformat=VCFv4.1")?;

        assert_eq!(
            entry,
            Entry::Other {
                category: String::from("fileformat"),
                id: None,
                value: String::from("VCFv4.1"),
            }
        );

        Ok(())
    }

    #[test]
    fn test_parse_filter_keeps_id_and_value() -> Result<(), Error> {
        let entry = parse_line("##FILTER=<ID=q10,Description=\"Quality below 10\">")?;

        assert_eq!(
            entry,
            Entry::Other {
                category: String::from("FILTER"),
                id: Some(String::from("q10")),
                value: String::from("<ID=q10,Description=\"Quality below 10\">"),
            }
        );

        Ok(())
    }

    #[test]
    fn test_parse_sample_declaration() -> Result<(), Error> {
        let entry = parse_line(
            "##SAMPLE=<ID=S1,Number=2,Genomes=G1;G2,Mixture=0.5;0.5,Description=\"a;b\">",
        )?;

        match entry {
            Entry::Sample(sample) => {
                assert_eq!(sample.id, "S1");
                assert_eq!(sample.number, 2);
                assert_eq!(sample.genomes, ["G1", "G2"]);
                assert_eq!(sample.mixture, ["0.5", "0.5"]);
                assert_eq!(sample.descriptions, ["a", "b"]);
            }
            _ => panic!("expected sample entry"),
        }

        Ok(())
    }

    #[test]
    fn test_parse_contig_declaration() -> Result<(), Error> {
        let entry = parse_line("##contig=<ID=chr1,length=248956422>")?;

        match entry {
            Entry::Other { category, id, .. } => {
                assert_eq!(category, "contig");
                assert_eq!(id.as_deref(), Some("chr1"));
            }
            _ => panic!("expected free-text entry"),
        }

        Ok(())
    }

    #[test]
    fn test_parse_missing_meta_prefix() {
        assert_eq!(parse_line("#CHROM\tPOS"), Err(Error::NotMeta));
    }

    #[test]
    fn test_parse_malformed_body() {
        let result = parse_line("##INFO=<ID=DP,Number=1,Type=Integer");

        assert_eq!(
            result,
            Err(Error::Structure {
                category: String::from("INFO")
            })
        );
    }
}
