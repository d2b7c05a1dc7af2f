//! Wildcard matching of records against query fields.

use std::fmt;

/// A single query field, e.g. `id=rs1*`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Field {
    /// The queried attribute name.
    pub name: String,
    /// The wildcard pattern; `*` matches any run, `?` any single character.
    pub pattern: String,
}

/// A matcher filtering decoded records against id/accession query fields.
///
/// With no fields supplied, every record matches. Otherwise the record id is
/// tested against each field's pattern in turn, matching on first success.
/// Accession-style fields test against the same id value, since no separate
/// accession attribute exists at this layer.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Matcher {
    fields: Vec<Field>,
    case_sensitive: bool,
}

impl Matcher {
    /// Creates a matcher from query fields.
    ///
    /// # Errors
    ///
    /// A field name other than `id` or `acc` is a fatal configuration error.
    pub fn new<I>(fields: I, case_sensitive: bool) -> Result<Self, UnknownFieldError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let fields = fields
            .into_iter()
            .map(|(name, pattern)| {
                if matches!(name.as_str(), "id" | "acc") {
                    Ok(Field { name, pattern })
                } else {
                    Err(UnknownFieldError(name))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            fields,
            case_sensitive,
        })
    }

    /// Returns whether no query fields were supplied.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Tests a record id against the query fields.
    pub fn matches(&self, id: &str) -> bool {
        if self.fields.is_empty() {
            return true;
        }

        self.fields.iter().any(|field| {
            if self.case_sensitive {
                wildcard_match(&field.pattern, id)
            } else {
                wildcard_match(
                    &field.pattern.to_lowercase(),
                    &id.to_lowercase(),
                )
            }
        })
    }

    /// Returns the query fields.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }
}

/// Matches a wildcard pattern against text.
///
/// `*` matches any (possibly empty) run of characters and `?` any single
/// character; everything else matches literally.
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    // Iterative two-pointer matcher: on mismatch, back up to the position
    // after the most recent '*' and let it absorb one more character
    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, t));
            p += 1;
        } else if let Some((star_p, star_t)) = star {
            p = star_p + 1;
            t = star_t + 1;
            star = Some((star_p, star_t + 1));
        } else {
            return false;
        }
    }

    while p < pattern.len() && pattern[p] == '*' {
        p += 1;
    }

    p == pattern.len()
}

/// An error for a query field naming an unknown attribute.
///
/// This indicates a programming or configuration error rather than a data
/// error, and is fatal.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnknownFieldError(pub String);

impl fmt::Display for UnknownFieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown query attribute '{}'", self.0)
    }
}

impl std::error::Error for UnknownFieldError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(fields: &[(&str, &str)], case_sensitive: bool) -> Matcher {
        Matcher::new(
            fields
                .iter()
                .map(|(name, pattern)| (name.to_string(), pattern.to_string())),
            case_sensitive,
        )
        .unwrap()
    }

    #[test]
    fn test_wildcard_literal() {
        assert!(wildcard_match("rs1", "rs1"));
        assert!(!wildcard_match("rs1", "rs12"));
        assert!(!wildcard_match("rs12", "rs1"));
    }

    #[test]
    fn test_wildcard_star() {
        assert!(wildcard_match("ABC*", "ABC123"));
        assert!(wildcard_match("ABC*", "ABC"));
        assert!(wildcard_match("*123", "ABC123"));
        assert!(wildcard_match("A*C*E", "ABCDE"));
        assert!(wildcard_match("*", ""));
        assert!(!wildcard_match("ABC*", "XYZ"));
    }

    #[test]
    fn test_wildcard_question_mark() {
        assert!(wildcard_match("rs?", "rs1"));
        assert!(!wildcard_match("rs?", "rs"));
        assert!(wildcard_match("r?1*", "rs123"));
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let matcher = matcher(&[], true);

        assert!(matcher.matches("anything"));
        assert!(matcher.matches(""));
    }

    #[test]
    fn test_id_field() {
        let matcher = matcher(&[("id", "ABC*")], true);

        assert!(matcher.matches("ABC123"));
        assert!(!matcher.matches("XYZ"));
        assert!(!matcher.matches("abc123"));
    }

    #[test]
    fn test_case_insensitive() {
        let matcher = matcher(&[("id", "ABC*")], false);

        assert!(matcher.matches("ABC123"));
        assert!(matcher.matches("abc123"));
        assert!(!matcher.matches("XYZ"));
    }

    #[test]
    fn test_accession_field_tests_id() {
        let matcher = matcher(&[("acc", "rs9*")], true);

        assert!(matcher.matches("rs99"));
        assert!(!matcher.matches("rs1"));
    }

    #[test]
    fn test_first_success_wins_across_fields() {
        let matcher = matcher(&[("id", "no-such*"), ("acc", "rs*")], true);

        assert!(matcher.matches("rs1"));
    }

    #[test]
    fn test_unknown_field_is_fatal() {
        let result = Matcher::new(
            [(String::from("organism"), String::from("*"))],
            true,
        );

        assert_eq!(result, Err(UnknownFieldError(String::from("organism"))));
    }
}
