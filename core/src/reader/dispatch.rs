//! Format trial dispatch.
//!
//! A [`Dispatcher`] starts uncommitted and trials registry entries against
//! the source in registry order until one parses a complete header. From
//! that point on it is committed: all further loading goes through the
//! matched format and no other candidate is ever consulted, even across
//! chunks that yield no matching records.

use std::{fmt, io};

use crate::{
    reader::{
        bcf, format,
        format::{Format, UnknownFormatError},
        query::{Matcher, UnknownFieldError},
        source::Source,
        vcf,
    },
    variant::Variation,
};

/// The outcome of one load attempt by a format loader.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Trial {
    /// The attempt succeeded; header parsed or records loaded.
    Ok,
    /// The source does not look like this format; nothing was consumed.
    Fail,
    /// Records were scanned, but none passed the query.
    NoMatch,
    /// The end of input was reached with nothing left to load.
    Eof,
    /// The source held no input at all.
    Empty,
}

/// A format loader, one variant per decoding strategy.
pub(crate) enum Loader {
    Vcf(vcf::Loader),
    Bcf(bcf::Loader),
}

impl Loader {
    fn new(format: Format) -> Self {
        match format {
            Format::Vcf3 => Self::Vcf(vcf::Loader::new(vcf::Version::V3)),
            Format::Vcf40 => Self::Vcf(vcf::Loader::new(vcf::Version::V40)),
            Format::Vcf41 => Self::Vcf(vcf::Loader::new(vcf::Version::V41)),
            Format::Bcf => Self::Bcf(bcf::Loader::new()),
        }
    }

    fn load_header(
        &mut self,
        source: &mut Source,
        variation: &mut Variation,
    ) -> Result<Trial, Error> {
        match self {
            Self::Vcf(loader) => loader.load_header(source, variation),
            Self::Bcf(loader) => loader.load_header(source, variation),
        }
    }

    fn load_chunk(
        &mut self,
        source: &mut Source,
        variation: &mut Variation,
        matcher: &Matcher,
    ) -> Result<Trial, Error> {
        match self {
            Self::Vcf(loader) => loader.load_chunk(source, variation, matcher),
            Self::Bcf(loader) => loader.load_chunk(source, variation, matcher),
        }
    }

    fn is_done(&self) -> bool {
        match self {
            Self::Vcf(loader) => loader.is_done(),
            Self::Bcf(loader) => loader.is_done(),
        }
    }

    fn records_seen(&self) -> u64 {
        match self {
            Self::Vcf(loader) => loader.records_seen(),
            Self::Bcf(loader) => loader.records_seen(),
        }
    }
}

/// A dispatcher trialling and then driving one format loader.
pub struct Dispatcher {
    forced: Option<usize>,
    committed: Option<Committed>,
}

struct Committed {
    index: usize,
    loader: Loader,
}

impl Dispatcher {
    /// Creates an uncommitted dispatcher that will autodetect the format.
    pub fn new() -> Self {
        Self {
            forced: None,
            committed: None,
        }
    }

    /// Creates a dispatcher restricted to a single registry entry.
    ///
    /// The entry still has to match the source; it is trialled alone instead
    /// of alongside the other candidates.
    pub fn with_format(index: usize) -> Self {
        Self {
            forced: Some(index),
            committed: None,
        }
    }

    /// Returns the registry entry committed to, if detection has run.
    pub fn committed(&self) -> Option<&'static format::Descriptor> {
        self.committed
            .as_ref()
            .map(|committed| &format::REGISTRY[committed.index])
    }

    /// Returns whether the committed loader has exhausted its input.
    pub fn is_done(&self) -> bool {
        self.committed
            .as_ref()
            .map(|committed| committed.loader.is_done())
            .unwrap_or(false)
    }

    /// Returns the number of records scanned so far, matching or not.
    pub fn records_seen(&self) -> u64 {
        self.committed
            .as_ref()
            .map(|committed| committed.loader.records_seen())
            .unwrap_or(0)
    }

    /// Runs one load step.
    ///
    /// Uncommitted, this trials candidate formats and parses the header of
    /// the first that matches. Committed, it loads the next chunk of records
    /// through the matched loader.
    pub fn load(
        &mut self,
        source: &mut Source,
        variation: &mut Variation,
        matcher: &Matcher,
    ) -> Result<Trial, Error> {
        match &mut self.committed {
            Some(committed) => committed.loader.load_chunk(source, variation, matcher),
            None => self.detect(source, variation),
        }
    }

    fn detect(
        &mut self,
        source: &mut Source,
        variation: &mut Variation,
    ) -> Result<Trial, Error> {
        let candidates: Vec<usize> = match self.forced {
            Some(index) => vec![index],
            None => (0..format::REGISTRY.len())
                .filter(|&i| format::REGISTRY[i].autodetect)
                .collect(),
        };

        for index in candidates {
            let descriptor = &format::REGISTRY[index];
            let mut loader = Loader::new(descriptor.format);

            match loader.load_header(source, variation)? {
                Trial::Ok => {
                    log::debug!("detected input format '{}'", descriptor.name);

                    variation.format = descriptor.name.to_string();
                    self.committed = Some(Committed { index, loader });

                    return Ok(Trial::Ok);
                }
                Trial::Fail | Trial::Empty | Trial::NoMatch => {
                    log::debug!("input does not match format '{}'", descriptor.name);
                    variation.reset();
                }
                Trial::Eof => return Err(Error::PrematureEof),
            }
        }

        Err(Error::NoFormat)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// An error from reading a variant source.
#[derive(Debug)]
pub enum Error {
    /// An underlying I/O failure.
    Io(io::Error),
    /// No candidate format matched the input.
    NoFormat,
    /// A requested format name is not in the registry.
    UnknownFormat(UnknownFormatError),
    /// A query field names an unknown attribute.
    UnknownField(UnknownFieldError),
    /// A matched format's header was structurally invalid.
    BadHeader {
        /// What was wrong with the header.
        reason: String,
    },
    /// A binary record's typed content could not be decoded.
    BadRecord {
        /// What was wrong with the record.
        reason: String,
    },
    /// The input ended in the middle of a framed record or header.
    PrematureEof,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "i/o error: {e}"),
            Error::NoFormat => f.write_str("input matches no supported variant format"),
            Error::UnknownFormat(e) => write!(f, "{e}"),
            Error::UnknownField(e) => write!(f, "{e}"),
            Error::BadHeader { reason } => write!(f, "invalid header: {reason}"),
            Error::BadRecord { reason } => write!(f, "invalid record: {reason}"),
            Error::PrematureEof => f.write_str("input ended unexpectedly"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::UnknownFormat(e) => Some(e),
            Error::UnknownField(e) => Some(e),
            Error::NoFormat
            | Error::BadHeader { .. }
            | Error::BadRecord { .. }
            | Error::PrematureEof => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<UnknownFormatError> for Error {
    fn from(e: UnknownFormatError) -> Self {
        Error::UnknownFormat(e)
    }
}

impl From<UnknownFieldError> for Error {
    fn from(e: UnknownFieldError) -> Self {
        Error::UnknownField(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io;

    fn source_from(bytes: &[u8]) -> Source {
        Source::new(Box::new(io::Cursor::new(bytes.to_vec())))
    }

    fn text_input(version: &str) -> String {
        format!(
            "##fileformat={version}\n\
            #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\n\
            chr1\t100\trs1\tA\tG\t30\tPASS\t.\t.\n"
        )
    }

    #[test]
    fn test_detect_text_versions() -> Result<(), Error> {
        for (version, name) in [
            ("VCFv3.3", "vcf3"),
            ("VCFv4.0", "vcf40"),
            ("VCFv4.1", "vcf41"),
        ] {
            let mut source = source_from(text_input(version).as_bytes());
            let mut variation = Variation::default();
            let mut dispatcher = Dispatcher::new();

            let trial = dispatcher.load(&mut source, &mut variation, &Matcher::default())?;

            assert_eq!(trial, Trial::Ok);
            assert_eq!(dispatcher.committed().unwrap().name, name);
            assert_eq!(variation.format, name);
        }

        Ok(())
    }

    #[test]
    fn test_detection_stays_committed_across_chunks() -> Result<(), Error> {
        let mut source = source_from(text_input("VCFv4.1").as_bytes());
        let mut variation = Variation::default();
        let mut dispatcher = Dispatcher::new();
        let matcher = Matcher::default();

        dispatcher.load(&mut source, &mut variation, &matcher)?;
        assert!(!dispatcher.is_done());

        let trial = dispatcher.load(&mut source, &mut variation, &matcher)?;

        assert_eq!(trial, Trial::Ok);
        assert_eq!(variation.records.len(), 1);
        assert_eq!(dispatcher.records_seen(), 1);
        assert!(dispatcher.is_done());

        Ok(())
    }

    #[test]
    fn test_empty_input_exhausts_detection() {
        let mut source = source_from(b"");
        let mut variation = Variation::default();
        let mut dispatcher = Dispatcher::new();

        let result = dispatcher.load(&mut source, &mut variation, &Matcher::default());

        assert!(matches!(result, Err(Error::NoFormat)));
    }

    #[test]
    fn test_unrecognized_input_exhausts_detection() {
        let mut source = source_from(b"chr1\t100\trs1\tA\tG\n");
        let mut variation = Variation::default();
        let mut dispatcher = Dispatcher::new();

        let result = dispatcher.load(&mut source, &mut variation, &Matcher::default());

        assert!(matches!(result, Err(Error::NoFormat)));
    }

    #[test]
    fn test_forced_format_must_still_match() {
        let (index, _) = format::find("vcf41").unwrap();

        let mut source = source_from(text_input("VCFv4.0").as_bytes());
        let mut variation = Variation::default();
        let mut dispatcher = Dispatcher::with_format(index);

        let result = dispatcher.load(&mut source, &mut variation, &Matcher::default());

        assert!(matches!(result, Err(Error::NoFormat)));
    }

    #[test]
    fn test_forced_alias_resolves() -> Result<(), Error> {
        let (index, _) = format::find("vcf").unwrap();

        let mut source = source_from(text_input("VCFv4.1").as_bytes());
        let mut variation = Variation::default();
        let mut dispatcher = Dispatcher::with_format(index);

        dispatcher.load(&mut source, &mut variation, &Matcher::default())?;

        assert_eq!(dispatcher.committed().unwrap().format, Format::Vcf41);

        Ok(())
    }
}
