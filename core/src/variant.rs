//! Variant aggregates and records.

use crate::Header;

pub mod record;
pub use record::Record;

/// The result of one variant query.
///
/// A `Variation` is owned by the caller that requested it and is mutated only
/// by the reader machinery during a load call. The record list reflects the
/// most recent chunk; accumulating across chunks is the caller's decision.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Variation {
    /// The query identifier.
    pub id: String,
    /// The source database name.
    pub db: String,
    /// The input filename, if the input came from a file.
    pub filename: String,
    /// The detected (or requested) format name; empty until committed.
    pub format: String,
    /// The shared metadata header.
    pub header: Header,
    /// The records from the most recent chunk.
    pub records: Vec<Record>,
    /// Whether any data record has been decoded over the input's lifetime.
    pub has_data: bool,
}

impl Variation {
    /// Creates an empty variation for a query.
    pub fn new<I, D, F>(id: I, db: D, filename: F) -> Self
    where
        I: Into<String>,
        D: Into<String>,
        F: Into<String>,
    {
        Self {
            id: id.into(),
            db: db.into(),
            filename: filename.into(),
            ..Self::default()
        }
    }

    /// Clears per-attempt state after a failed format trial.
    pub(crate) fn reset(&mut self) {
        self.format.clear();
        self.header = Header::new();
        self.records.clear();
        self.has_data = false;
    }
}
