//! Single variant records.

use std::fmt;

use crate::Header;

/// The number of fixed, positional columns in a data line.
pub const FIXED_COLUMNS: usize = 9;

/// One decoded variant record.
///
/// The INFO, FORMAT, and per-sample values are carried as raw text; decoding
/// FORMAT-keyed per-sample subfields is a downstream concern.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Record {
    /// The chromosome or contig name.
    pub chrom: String,
    /// The 1-based position.
    pub pos: u64,
    /// The record id, `.` when missing.
    pub id: String,
    /// The reference allele(s).
    pub reference: String,
    /// The alternate allele(s).
    pub alternate: String,
    /// The quality value, kept as raw text.
    pub quality: String,
    /// The filter value, kept as raw text.
    pub filter: String,
    /// The raw INFO string.
    pub info: String,
    /// The raw FORMAT string.
    pub format: String,
    /// Raw per-sample strings, in column order.
    pub samples: Vec<String>,
}

impl Record {
    /// Decodes one tab-delimited data line.
    ///
    /// The first nine columns map positionally to the fixed fields; all
    /// further columns are per-sample strings kept in order. The chromosome
    /// name is registered in the header's contig table if not already
    /// present. A sample-column count differing from the header's declared
    /// sample count is logged as a warning and the record kept as-is.
    pub fn parse(line: &str, header: &mut Header) -> Result<Self, ParseRecordError> {
        let mut columns = line.split('\t');

        let mut next = || {
            columns
                .next()
                .ok_or_else(|| ParseRecordError::MissingColumns(line.to_string()))
        };

        let chrom = next()?.to_string();
        let pos_column = next()?;
        let pos = pos_column
            .parse()
            .map_err(|_| ParseRecordError::Position(pos_column.to_string()))?;
        let id = next()?.to_string();
        let reference = next()?.to_string();
        let alternate = next()?.to_string();
        let quality = next()?.to_string();
        let filter = next()?.to_string();
        let info = next()?.to_string();
        let format = next()?.to_string();

        let samples: Vec<String> = columns.map(str::to_string).collect();

        if samples.len() != header.sample_names.len() {
            log::warn!(
                "record at {chrom}:{pos} has {} sample column(s), header declares {}",
                samples.len(),
                header.sample_names.len()
            );
        }

        let _ = header.contig_id(&chrom);

        Ok(Self {
            chrom,
            pos,
            id,
            reference,
            alternate,
            quality,
            filter,
            info,
            format,
            samples,
        })
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.chrom,
            self.pos,
            self.id,
            self.reference,
            self.alternate,
            self.quality,
            self.filter,
            self.info,
            self.format,
        )?;

        for sample in &self.samples {
            write!(f, "\t{sample}")?;
        }

        Ok(())
    }
}

/// An error associated with decoding a data line.
///
/// These are recoverable: callers log the error and skip the record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParseRecordError {
    /// The line has fewer than the nine fixed columns.
    MissingColumns(String),
    /// The position column is not a non-negative integer.
    Position(String),
}

impl fmt::Display for ParseRecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseRecordError::MissingColumns(line) => {
                write!(f, "data line '{line}' has fewer than {FIXED_COLUMNS} columns")
            }
            ParseRecordError::Position(pos) => {
                write!(f, "failed to parse '{pos}' as record position")
            }
        }
    }
}

impl std::error::Error for ParseRecordError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_without_samples() -> Result<(), ParseRecordError> {
        let mut header = Header::new();

        let record = Record::parse("chr1\t100\trs1\tA\tG\t30\tPASS\tDP=10\t.", &mut header)?;

        assert_eq!(record.chrom, "chr1");
        assert_eq!(record.pos, 100);
        assert_eq!(record.id, "rs1");
        assert_eq!(record.reference, "A");
        assert_eq!(record.alternate, "G");
        assert_eq!(record.quality, "30");
        assert_eq!(record.filter, "PASS");
        assert_eq!(record.info, "DP=10");
        assert_eq!(record.format, ".");
        assert!(record.samples.is_empty());

        Ok(())
    }

    #[test]
    fn test_parse_with_samples() -> Result<(), ParseRecordError> {
        let mut header = Header::new();
        header.sample_names = vec![String::from("NA1"), String::from("NA2")];

        let record = Record::parse(
            "chr1\t100\trs1\tA\tG\t30\tPASS\tDP=10\tGT:DP\t0/1:10\t1/1:7",
            &mut header,
        )?;

        assert_eq!(record.samples, ["0/1:10", "1/1:7"]);

        Ok(())
    }

    #[test]
    fn test_parse_sample_count_mismatch_is_kept() -> Result<(), ParseRecordError> {
        let mut header = Header::new();
        header.sample_names = vec![String::from("NA1"), String::from("NA2")];

        // One sample column against two declared: logged, record kept as-is
        let record = Record::parse(
            "chr1\t100\trs1\tA\tG\t30\tPASS\tDP=10\tGT\t0/1",
            &mut header,
        )?;

        assert_eq!(record.samples, ["0/1"]);

        Ok(())
    }

    #[test]
    fn test_parse_registers_contig() -> Result<(), ParseRecordError> {
        let mut header = Header::new();

        Record::parse("chr2\t1\t.\tA\tG\t.\t.\t.\t.", &mut header)?;
        Record::parse("chr1\t2\t.\tA\tG\t.\t.\t.\t.", &mut header)?;
        Record::parse("chr2\t3\t.\tA\tG\t.\t.\t.\t.", &mut header)?;

        assert_eq!(header.contig_name(0), Some("chr2"));
        assert_eq!(header.contig_name(1), Some("chr1"));

        Ok(())
    }

    #[test]
    fn test_parse_short_line() {
        let mut header = Header::new();

        assert!(matches!(
            Record::parse("chr1\t100\trs1", &mut header),
            Err(ParseRecordError::MissingColumns(_))
        ));
    }

    #[test]
    fn test_parse_bad_position() {
        let mut header = Header::new();

        assert_eq!(
            Record::parse("chr1\tx\trs1\tA\tG\t.\t.\t.\t.", &mut header),
            Err(ParseRecordError::Position(String::from("x")))
        );
    }

    #[test]
    fn test_display_round_trip() -> Result<(), ParseRecordError> {
        let mut header = Header::new();
        let line = "chr1\t100\trs1\tA\tG\t30\tPASS\tDP=10\tGT\t0/1";

        let record = Record::parse(line, &mut header)?;

        assert_eq!(record.to_string(), line);

        Ok(())
    }
}
