//! Typed INFO/FORMAT field declarations.

use std::{fmt, str::FromStr};

/// A typed field declaration from the metadata header.
///
/// INFO and FORMAT header lines declare the id, value type, and cardinality of
/// the values that data records may carry for that field. Consumers must branch
/// on [`Number`] before allocating storage for field values.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Field {
    /// The declaring header category.
    pub category: Category,
    /// The field id, e.g. `DP`.
    pub id: String,
    /// The declared cardinality.
    pub number: Number,
    /// The declared value type.
    pub ty: Type,
    /// Free-text description.
    pub description: String,
}

/// A header category that may declare fields.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Category {
    /// `##INFO` declarations.
    Info,
    /// `##FORMAT` declarations.
    Format,
    /// `##FILTER` declarations.
    Filter,
    /// `##ALT` declarations.
    Alt,
    /// `##SAMPLE` declarations.
    Sample,
}

impl Category {
    /// Returns the header keyword for the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Info => "INFO",
            Category::Format => "FORMAT",
            Category::Filter => "FILTER",
            Category::Alt => "ALT",
            Category::Sample => "SAMPLE",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INFO" => Ok(Self::Info),
            "FORMAT" => Ok(Self::Format),
            "FILTER" => Ok(Self::Filter),
            "ALT" => Ok(Self::Alt),
            "SAMPLE" => Ok(Self::Sample),
            _ => Err(ParseCategoryError(s.to_string())),
        }
    }
}

/// An error associated with parsing a field category.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseCategoryError(pub String);

impl fmt::Display for ParseCategoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown header category '{}'", self.0)
    }
}

impl std::error::Error for ParseCategoryError {}

/// The declared cardinality of a field.
///
/// The `Number` key in a field declaration is either a literal non-negative
/// integer, or one of three sentinels: `A` for one value per alternate allele,
/// `G` for one value per possible genotype, and `.` for a variable or unbounded
/// count.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Number {
    /// A fixed number of values.
    Count(u32),
    /// One value per alternate allele (`A`).
    Alleles,
    /// One value per possible genotype (`G`).
    Genotypes,
    /// Variable or unbounded count (`.`).
    Unknown,
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Count(n) => write!(f, "{n}"),
            Number::Alleles => f.write_str("A"),
            Number::Genotypes => f.write_str("G"),
            Number::Unknown => f.write_str("."),
        }
    }
}

impl FromStr for Number {
    type Err = ParseNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Self::Alleles),
            "G" => Ok(Self::Genotypes),
            "." => Ok(Self::Unknown),
            _ => s
                .parse::<u32>()
                .map(Self::Count)
                .map_err(|_| ParseNumberError(s.to_string())),
        }
    }
}

/// An error associated with parsing a field cardinality.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseNumberError(pub String);

impl fmt::Display for ParseNumberError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse '{}' as field cardinality", self.0)
    }
}

impl std::error::Error for ParseNumberError {}

/// The declared value type of a field.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Type {
    /// Integer values.
    Integer,
    /// Floating-point values.
    Float,
    /// A presence flag carrying no value.
    Flag,
    /// Single-character values.
    Character,
    /// String values.
    String,
}

impl Type {
    /// Returns the header keyword for the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Type::Integer => "Integer",
            Type::Float => "Float",
            Type::Flag => "Flag",
            Type::Character => "Character",
            Type::String => "String",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Type {
    type Err = ParseTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Integer" => Ok(Self::Integer),
            "Float" => Ok(Self::Float),
            "Flag" => Ok(Self::Flag),
            "Character" => Ok(Self::Character),
            "String" => Ok(Self::String),
            _ => Err(ParseTypeError(s.to_string())),
        }
    }
}

/// An error associated with parsing a field value type.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseTypeError(pub String);

impl fmt::Display for ParseTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown field value type '{}'", self.0)
    }
}

impl std::error::Error for ParseTypeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_sentinels_round_trip() {
        for s in ["A", "G", ".", "0", "1", "42"] {
            let number = s.parse::<Number>().unwrap();
            assert_eq!(number.to_string(), s);
        }
    }

    #[test]
    fn test_number_semantic_categories() {
        assert_eq!("A".parse(), Ok(Number::Alleles));
        assert_eq!("G".parse(), Ok(Number::Genotypes));
        assert_eq!(".".parse(), Ok(Number::Unknown));
        assert_eq!("3".parse(), Ok(Number::Count(3)));
    }

    #[test]
    fn test_number_rejects_negative_and_junk() {
        assert!("-1".parse::<Number>().is_err());
        assert!("B".parse::<Number>().is_err());
        assert!("".parse::<Number>().is_err());
    }

    #[test]
    fn test_type_round_trip() {
        for s in ["Integer", "Float", "Flag", "Character", "String"] {
            let ty = s.parse::<Type>().unwrap();
            assert_eq!(ty.to_string(), s);
        }
    }

    #[test]
    fn test_type_unknown() {
        assert_eq!(
            "Weird".parse::<Type>(),
            Err(ParseTypeError(String::from("Weird")))
        );
    }

    #[test]
    fn test_category_round_trip() {
        for s in ["INFO", "FORMAT", "FILTER", "ALT", "SAMPLE"] {
            let category = s.parse::<Category>().unwrap();
            assert_eq!(category.to_string(), s);
        }
    }
}
