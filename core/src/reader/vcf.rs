//! Text variant loader.

use crate::{
    header::grammar,
    reader::{
        cursor::CHUNK_SIZE,
        dispatch::{Error, Trial},
        query::Matcher,
        source::{Lines, Source},
    },
    variant::{Record, Variation},
};

/// A text format version, distinguished by its signature line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Version {
    V3,
    V40,
    V41,
}

impl Version {
    /// The literal prefix of the first header line; the primary detection
    /// signal for text variants.
    fn signature(self) -> &'static str {
        match self {
            Version::V3 => "##fileformat=VCFv3.",
            Version::V40 => "##fileformat=VCFv4.0",
            Version::V41 => "##fileformat=VCFv4.1",
        }
    }
}

/// A loader for tab-delimited text variant data.
pub(crate) struct Loader {
    version: Version,
    done: bool,
    records_seen: u64,
}

impl Loader {
    pub fn new(version: Version) -> Self {
        Self {
            version,
            done: false,
            records_seen: 0,
        }
    }

    /// Attempts to parse the metadata header and column-header line.
    ///
    /// On any mismatch every consumed line is pushed back, so the next
    /// candidate format retries from the same read position.
    pub fn load_header(
        &mut self,
        source: &mut Source,
        variation: &mut Variation,
    ) -> Result<Trial, Error> {
        let lines = source.lines()?;
        let mut taken = Vec::new();

        let Some(first) = lines.read()? else {
            return Ok(if lines.consumed() == 0 {
                Trial::Empty
            } else {
                Trial::Eof
            });
        };

        if !first.starts_with(self.version.signature()) {
            lines.push_back(first);
            return Ok(Trial::Fail);
        }

        add_header_line(variation, &first);
        taken.push(first);

        loop {
            let Some(line) = lines.read()? else {
                // The header block never reached the column-header line
                restore(lines, taken);
                return Ok(Trial::Fail);
            };

            if line.starts_with("##") {
                add_header_line(variation, &line);
                taken.push(line);
            } else if line.starts_with('#') {
                if variation.header.set_columns(&line).is_ok() {
                    return Ok(Trial::Ok);
                }

                taken.push(line);
                restore(lines, taken);
                return Ok(Trial::Fail);
            } else {
                taken.push(line);
                restore(lines, taken);
                return Ok(Trial::Fail);
            }
        }
    }

    /// Scans up to one chunk of data lines, replacing the record list with
    /// the subset passing the matcher.
    pub fn load_chunk(
        &mut self,
        source: &mut Source,
        variation: &mut Variation,
        matcher: &Matcher,
    ) -> Result<Trial, Error> {
        let lines = source.lines()?;

        variation.records.clear();

        let mut scanned = 0;

        while scanned < CHUNK_SIZE {
            let Some(line) = lines.read()? else {
                self.done = true;
                break;
            };

            if line.is_empty() {
                continue;
            }

            scanned += 1;

            match Record::parse(&line, &mut variation.header) {
                Ok(record) => {
                    self.records_seen += 1;

                    if matcher.matches(&record.id) {
                        variation.records.push(record);
                    }
                }
                Err(e) => log::warn!("skipping data line: {e}"),
            }
        }

        if !variation.records.is_empty() {
            variation.has_data = true;
            Ok(Trial::Ok)
        } else if self.done {
            Ok(Trial::Eof)
        } else {
            Ok(Trial::NoMatch)
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn records_seen(&self) -> u64 {
        self.records_seen
    }
}

fn add_header_line(variation: &mut Variation, line: &str) {
    match grammar::parse_line(line) {
        Ok(entry) => variation.header.add_entry(entry),
        Err(e) => log::warn!("skipping malformed header line: {e}"),
    }
}

fn restore(lines: &mut Lines, taken: Vec<String>) {
    for line in taken.into_iter().rev() {
        lines.push_back(line);
    }
}
