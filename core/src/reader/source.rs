//! Input state for format trials.
//!
//! A [`Source`] starts out raw, with nothing consumed. Format detection may
//! peek at the leading bytes (through the compression layer if necessary)
//! without consuming them, and may transition the source once into
//! line-oriented reading; a push-back stack lets a failed trial restore the
//! read position exactly so the next candidate format retries from the same
//! point. Committing to the binary format instead surrenders the raw reader.

use std::io::{self, BufRead, Read};

use flate2::bufread::MultiGzDecoder;

const GZIP_MAGIC_NUMBER: [u8; 2] = [0x1f, 0x8b];

pub(crate) const BCF_MAGIC_NUMBER: [u8; 3] = *b"BCF";

/// A compression method detected on an input.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Compression {
    /// Gzip, including its blocked BGZF profile.
    Gzip,
}

/// The input to one reader, tracking trial state.
pub struct Source {
    state: State,
    compression: Option<Option<Compression>>,
}

enum State {
    Raw(Box<dyn BufRead>),
    Text(Lines),
    Taken,
}

impl Source {
    /// Creates a new source over a reader.
    pub fn new(reader: Box<dyn BufRead>) -> Self {
        Self {
            state: State::Raw(reader),
            compression: None,
        }
    }

    /// Detects the compression method by magic number, without consuming.
    ///
    /// The result is cached on first call.
    pub fn compression(&mut self) -> io::Result<Option<Compression>> {
        if let Some(compression) = self.compression {
            return Ok(compression);
        }

        let compression = match &mut self.state {
            State::Raw(reader) => {
                let src = reader.fill_buf()?;

                match src.get(..GZIP_MAGIC_NUMBER.len()) {
                    Some(buf) if buf == GZIP_MAGIC_NUMBER => Some(Compression::Gzip),
                    _ => None,
                }
            }
            State::Text(_) | State::Taken => None,
        };

        self.compression = Some(compression);

        Ok(compression)
    }

    /// Peeks whether the leading bytes carry the binary-format magic number,
    /// looking through the compression layer if one was detected.
    ///
    /// Nothing is consumed; only a raw source can match.
    pub fn peek_bcf(&mut self) -> io::Result<bool> {
        let compression = self.compression()?;

        let State::Raw(reader) = &mut self.state else {
            return Ok(false);
        };

        let src = reader.fill_buf()?;

        if compression == Some(Compression::Gzip) {
            let mut decoder = MultiGzDecoder::new(src);
            let mut buf = [0; BCF_MAGIC_NUMBER.len()];

            match decoder.read_exact(&mut buf) {
                Ok(()) => Ok(buf == BCF_MAGIC_NUMBER),
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
                Err(e) => Err(e),
            }
        } else {
            match src.get(..BCF_MAGIC_NUMBER.len()) {
                Some(buf) => Ok(buf == BCF_MAGIC_NUMBER),
                None => Ok(false),
            }
        }
    }

    /// Returns the line reader, transitioning out of the raw state on first
    /// call and applying decompression if a compression method was detected.
    pub fn lines(&mut self) -> io::Result<&mut Lines> {
        if matches!(self.state, State::Raw(_)) {
            let compression = self.compression()?;

            let State::Raw(reader) = std::mem::replace(&mut self.state, State::Taken) else {
                return Err(taken_error());
            };

            let reader: Box<dyn BufRead> = match compression {
                Some(Compression::Gzip) => {
                    Box::new(io::BufReader::new(MultiGzDecoder::new(reader)))
                }
                None => reader,
            };

            self.state = State::Text(Lines::new(reader));
        }

        match &mut self.state {
            State::Text(lines) => Ok(lines),
            State::Raw(_) | State::Taken => Err(taken_error()),
        }
    }

    /// Surrenders the raw reader, committing the source to binary reading.
    pub fn take_raw(&mut self) -> io::Result<Box<dyn BufRead>> {
        match std::mem::replace(&mut self.state, State::Taken) {
            State::Raw(reader) => Ok(reader),
            state => {
                self.state = state;
                Err(taken_error())
            }
        }
    }
}

fn taken_error() -> io::Error {
    io::Error::new(
        io::ErrorKind::Other,
        "input source already committed to another reading mode",
    )
}

/// A line reader with push-back.
pub struct Lines {
    reader: Box<dyn BufRead>,
    pushed: Vec<String>,
    consumed: usize,
}

impl Lines {
    fn new(reader: Box<dyn BufRead>) -> Self {
        Self {
            reader,
            pushed: Vec::new(),
            consumed: 0,
        }
    }

    /// Reads the next line, without its terminator, or `None` at end of
    /// input. Pushed-back lines are returned first.
    pub fn read(&mut self) -> io::Result<Option<String>> {
        if let Some(line) = self.pushed.pop() {
            self.consumed += 1;
            return Ok(Some(line));
        }

        let mut buf = String::new();

        if self.reader.read_line(&mut buf)? == 0 {
            return Ok(None);
        }

        if buf.ends_with('\n') {
            buf.pop();
        }
        if buf.ends_with('\r') {
            buf.pop();
        }

        self.consumed += 1;

        Ok(Some(buf))
    }

    /// Pushes a line back so the next [`read`](Lines::read) returns it again.
    pub fn push_back(&mut self, line: String) {
        self.consumed -= 1;
        self.pushed.push(line);
    }

    /// Returns the number of lines permanently consumed so far.
    pub fn consumed(&self) -> usize {
        self.consumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    use flate2::{write::GzEncoder, Compression as GzCompression};

    fn source_from(bytes: &[u8]) -> Source {
        Source::new(Box::new(io::Cursor::new(bytes.to_vec())))
    }

    fn gzip(bytes: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), GzCompression::default());
        encoder.write_all(bytes).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_lines_strip_terminators() -> io::Result<()> {
        let mut source = source_from(b"one\r\ntwo\nthree");
        let lines = source.lines()?;

        assert_eq!(lines.read()?.as_deref(), Some("one"));
        assert_eq!(lines.read()?.as_deref(), Some("two"));
        assert_eq!(lines.read()?.as_deref(), Some("three"));
        assert_eq!(lines.read()?, None);

        Ok(())
    }

    #[test]
    fn test_push_back_restores_position() -> io::Result<()> {
        let mut source = source_from(b"first\nsecond\n");
        let lines = source.lines()?;

        let first = lines.read()?.unwrap();
        let second = lines.read()?.unwrap();
        assert_eq!(lines.consumed(), 2);

        // Restore in reverse, as a failed format trial would
        lines.push_back(second);
        lines.push_back(first);
        assert_eq!(lines.consumed(), 0);

        assert_eq!(lines.read()?.as_deref(), Some("first"));
        assert_eq!(lines.read()?.as_deref(), Some("second"));

        Ok(())
    }

    #[test]
    fn test_compression_detection() -> io::Result<()> {
        let mut plain = source_from(b"##fileformat=VCFv4.1\n");
        assert_eq!(plain.compression()?, None);

        let mut gzipped = source_from(&gzip(b"##fileformat=VCFv4.1\n"));
        assert_eq!(gzipped.compression()?, Some(Compression::Gzip));

        Ok(())
    }

    #[test]
    fn test_lines_read_through_gzip() -> io::Result<()> {
        let mut source = source_from(&gzip(b"##fileformat=VCFv4.1\nline two\n"));
        let lines = source.lines()?;

        assert_eq!(lines.read()?.as_deref(), Some("##fileformat=VCFv4.1"));
        assert_eq!(lines.read()?.as_deref(), Some("line two"));

        Ok(())
    }

    #[test]
    fn test_peek_bcf() -> io::Result<()> {
        let mut text = source_from(b"##fileformat=VCFv4.1\n");
        assert!(!text.peek_bcf()?);

        let mut binary = source_from(&gzip(b"BCF\x02\x02rest"));
        assert!(binary.peek_bcf()?);

        let mut empty = source_from(b"");
        assert!(!empty.peek_bcf()?);

        Ok(())
    }

    #[test]
    fn test_take_raw_once() -> io::Result<()> {
        let mut source = source_from(b"BCF\x02\x02");

        assert!(source.take_raw().is_ok());
        assert!(source.take_raw().is_err());
        assert!(source.lines().is_err());

        Ok(())
    }
}
