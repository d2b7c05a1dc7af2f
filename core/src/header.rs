//! Shared variant metadata header.

use std::fmt;

use indexmap::IndexSet;

pub mod field;
pub use field::Field;

pub mod grammar;
pub use grammar::Entry;

pub mod sample;
pub use sample::Sample;

use field::Category;

/// The fixed prefix of the column-header line.
///
/// A header block that does not end with a line starting with this exact
/// tab-separated prefix is not a valid header for any supported format.
pub const COLUMN_HEADER: &str = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT";

/// The shared metadata header of a variant input.
///
/// Created once per [`Variation`](crate::Variation) and populated
/// incrementally as header lines are parsed. After the data section begins
/// only the contig table grows, as new contigs are seen in data records.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Header {
    /// INFO and FORMAT field declarations, in declaration order.
    pub fields: Vec<Field>,
    /// SAMPLE declarations, in declaration order.
    pub samples: Vec<Sample>,
    /// All other declarations as `(category, value)` pairs.
    pub pairs: Vec<(String, String)>,
    /// The ordered sample-column names from the column-header line.
    pub sample_names: Vec<String>,
    contigs: IndexSet<String>,
}

impl Header {
    /// Creates an empty header.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parsed metadata entry to the header.
    pub fn add_entry(&mut self, entry: Entry) {
        match entry {
            Entry::Field(field) => self.fields.push(field),
            Entry::Sample(sample) => self.samples.push(sample),
            Entry::Other {
                category,
                id,
                value,
            } => {
                // Contig declarations seed the contig-id table so that binary
                // records can resolve chromosome indices by declaration order
                if category == "contig" {
                    if let Some(id) = id {
                        let _ = self.contig_id(&id);
                    }
                }

                self.pairs.push((category, value));
            }
        }
    }

    /// Parses one `##` line and adds it to the header.
    pub fn add_line(&mut self, line: &str) -> Result<(), grammar::Error> {
        grammar::parse_line(line).map(|entry| self.add_entry(entry))
    }

    /// Parses the column-header line, capturing trailing sample names.
    ///
    /// The line must begin with the literal tab-separated [`COLUMN_HEADER`]
    /// prefix; any further tab-separated tokens are the ordered sample-column
    /// identifiers.
    pub fn set_columns(&mut self, line: &str) -> Result<(), ColumnHeaderError> {
        let rest = line
            .strip_prefix(COLUMN_HEADER)
            .ok_or_else(|| ColumnHeaderError(line.to_string()))?;

        self.sample_names = match rest.strip_prefix('\t') {
            Some(names) => names.split('\t').map(str::to_string).collect(),
            None if rest.is_empty() => Vec::new(),
            None => return Err(ColumnHeaderError(line.to_string())),
        };

        Ok(())
    }

    /// Returns the id for a contig name, registering it first-seen if new.
    ///
    /// Ids are assigned in insertion order and grow monotonically.
    pub fn contig_id(&mut self, name: &str) -> usize {
        match self.contigs.get_index_of(name) {
            Some(id) => id,
            None => self.contigs.insert_full(name.to_string()).0,
        }
    }

    /// Returns the contig name for an id, if assigned.
    pub fn contig_name(&self, id: usize) -> Option<&str> {
        self.contigs.get_index(id).map(String::as_str)
    }

    /// Returns an iterator over registered contig names in id order.
    pub fn contigs(&self) -> impl Iterator<Item = &str> {
        self.contigs.iter().map(String::as_str)
    }

    /// Returns the field declared with the provided category and id, if any.
    pub fn field(&self, category: Category, id: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|field| field.category == category && field.id == id)
    }

    /// Returns the free-text value for a header category, if declared.
    ///
    /// The first matching pair wins; this is how the `fileformat` signature
    /// value is recovered.
    pub fn pair(&self, category: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, v)| v.as_str())
    }
}

/// An error associated with parsing the column-header line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ColumnHeaderError(pub String);

impl fmt::Display for ColumnHeaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed column-header line '{}'", self.0)
    }
}

impl std::error::Error for ColumnHeaderError {}
