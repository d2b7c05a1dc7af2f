//! SAMPLE header declarations.

/// A `##SAMPLE` header declaration.
///
/// A sample declaration names a sample column and describes the genomes it
/// mixes. The `Genomes`, `Mixture`, and `Description` values are
/// semicolon-delimited lists in the source text; their lengths should match the
/// declared genome count, but a mismatch is recoverable and only logged.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    /// The sample id.
    pub id: String,
    /// Per-genome free-text descriptions.
    pub descriptions: Vec<String>,
    /// Genome identifiers.
    pub genomes: Vec<String>,
    /// Mixture proportions, kept as raw text.
    pub mixture: Vec<String>,
    /// The declared number of genomes.
    pub number: usize,
}

impl Sample {
    /// Creates a sample declaration from its raw header values, checking the
    /// declared genome count against the parsed list lengths.
    pub fn from_parts(
        id: String,
        number: Option<usize>,
        descriptions: Vec<String>,
        genomes: Vec<String>,
        mixture: Vec<String>,
    ) -> Self {
        let number = number.unwrap_or(genomes.len());

        if genomes.len() != number {
            log::warn!(
                "sample '{id}' declares {number} genome(s), but lists {}",
                genomes.len()
            );
        }

        if !mixture.is_empty() && mixture.len() != number {
            log::warn!(
                "sample '{id}' declares {number} genome(s), but lists {} mixture value(s)",
                mixture.len()
            );
        }

        Self {
            id,
            descriptions,
            genomes,
            mixture,
            number,
        }
    }
}

/// Splits a semicolon-delimited header list into its parts.
pub(crate) fn split_list(s: &str) -> Vec<String> {
    if s.is_empty() {
        Vec::new()
    } else {
        s.split(';').map(str::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_matching_lengths() {
        let sample = Sample::from_parts(
            String::from("S1"),
            Some(2),
            split_list("Germline;Tumour"),
            split_list("G1;G2"),
            split_list("0.5;0.5"),
        );

        assert_eq!(sample.number, 2);
        assert_eq!(sample.genomes, ["G1", "G2"]);
        assert_eq!(sample.mixture, ["0.5", "0.5"]);
    }

    #[test]
    fn test_from_parts_length_mismatch_is_kept() {
        // Three genomes against two mixture values is logged, not fatal
        let sample = Sample::from_parts(
            String::from("S1"),
            Some(3),
            Vec::new(),
            split_list("G1;G2;G3"),
            split_list("0.5;0.5"),
        );

        assert_eq!(sample.genomes.len(), 3);
        assert_eq!(sample.mixture.len(), 2);
    }

    #[test]
    fn test_from_parts_infers_number() {
        let sample = Sample::from_parts(
            String::from("S1"),
            None,
            Vec::new(),
            split_list("G1;G2"),
            Vec::new(),
        );

        assert_eq!(sample.number, 2);
    }

    #[test]
    fn test_split_list_empty() {
        assert!(split_list("").is_empty());
    }
}
