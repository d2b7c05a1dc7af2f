//! Typed-value decoding for the binary format.
//!
//! Values are prefixed by a descriptor byte holding the atom kind in the low
//! nibble and the element count in the high nibble; a count of 15 marks an
//! overflow, with the real count following as a typed scalar integer.
//! Integer and float atoms reserve sentinel encodings for missing values and
//! for end-of-vector padding.

use std::fmt;

/// The missing-value bit pattern for floats, also used for QUAL.
pub(crate) const MISSING_FLOAT: u32 = 0x7f80_0001;

const END_FLOAT: u32 = 0x7f80_0002;

const OVERFLOW_COUNT: usize = 15;

/// An atom kind from a descriptor byte.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Kind {
    Missing = 0,
    Int8 = 1,
    Int16 = 2,
    Int32 = 3,
    Float = 5,
    Char = 7,
}

impl Kind {
    fn from_descriptor(descriptor: u8) -> Result<Self, Error> {
        match descriptor & 0x0f {
            0 => Ok(Self::Missing),
            1 => Ok(Self::Int8),
            2 => Ok(Self::Int16),
            3 => Ok(Self::Int32),
            5 => Ok(Self::Float),
            7 => Ok(Self::Char),
            n => Err(Error::Kind(n)),
        }
    }
}

/// One decoded integer atom.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Int {
    Value(i32),
    Missing,
    End,
}

/// A consuming cursor over one record section.
pub(crate) struct Cursor<'a> {
    buf: &'a [u8],
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], Error> {
        if len > self.buf.len() {
            return Err(Error::UnexpectedEnd);
        }

        let (taken, rest) = self.buf.split_at(len);
        self.buf = rest;

        Ok(taken)
    }

    pub fn read_u8(&mut self) -> Result<u8, Error> {
        self.take(1).map(|buf| buf[0])
    }

    pub fn read_i32(&mut self) -> Result<i32, Error> {
        self.take(4)
            .map(|buf| i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, Error> {
        self.take(4)
            .map(|buf| u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]))
    }

    /// Reads a descriptor byte, resolving the overflow form of the count.
    pub fn read_descriptor(&mut self) -> Result<(Kind, usize), Error> {
        let descriptor = self.read_u8()?;
        let kind = Kind::from_descriptor(descriptor)?;

        let count = match (descriptor >> 4) as usize {
            OVERFLOW_COUNT => usize::try_from(self.read_scalar_int()?)
                .map_err(|_| Error::UnexpectedEnd)?,
            count => count,
        };

        Ok((kind, count))
    }

    /// Reads a complete typed value expected to be a single plain integer,
    /// the encoding used for dictionary keys and overflow counts.
    pub fn read_scalar_int(&mut self) -> Result<i32, Error> {
        let (kind, count) = self.read_descriptor()?;

        if count != 1 {
            return Err(Error::Scalar);
        }

        match self.read_int(kind)? {
            Int::Value(value) => Ok(value),
            Int::Missing | Int::End => Err(Error::Scalar),
        }
    }

    /// Reads one integer atom of the given kind, mapping sentinels.
    pub fn read_int(&mut self, kind: Kind) -> Result<Int, Error> {
        match kind {
            Kind::Int8 => Ok(match self.take(1)?[0] as i8 {
                i8::MIN => Int::Missing,
                v if v == i8::MIN + 1 => Int::End,
                v => Int::Value(i32::from(v)),
            }),
            Kind::Int16 => {
                let buf = self.take(2)?;

                Ok(match i16::from_le_bytes([buf[0], buf[1]]) {
                    i16::MIN => Int::Missing,
                    v if v == i16::MIN + 1 => Int::End,
                    v => Int::Value(i32::from(v)),
                })
            }
            Kind::Int32 => Ok(match self.read_i32()? {
                i32::MIN => Int::Missing,
                v if v == i32::MIN + 1 => Int::End,
                v => Int::Value(v),
            }),
            Kind::Missing | Kind::Float | Kind::Char => Err(Error::Kind(kind as u8)),
        }
    }

    /// Reads a complete typed value expected to be a string.
    ///
    /// A zero-count value of any kind reads as the empty string.
    pub fn read_string(&mut self) -> Result<String, Error> {
        let (kind, count) = self.read_descriptor()?;

        if count == 0 {
            return Ok(String::new());
        }

        if kind != Kind::Char {
            return Err(Error::Kind(kind as u8));
        }

        let mut bytes = self.take(count)?.to_vec();

        // NUL padding after the content
        while bytes.last() == Some(&0) {
            bytes.pop();
        }

        String::from_utf8(bytes).map_err(|_| Error::Utf8)
    }

    /// Reads `count` atoms of `kind` and renders them in text form, with
    /// missing atoms as `.` and end-of-vector padding suppressed.
    pub fn read_elements(&mut self, kind: Kind, count: usize) -> Result<String, Error> {
        if count == 0 || kind == Kind::Missing {
            return Ok(String::from("."));
        }

        if kind == Kind::Char {
            let value = {
                let mut bytes = self.take(count)?.to_vec();

                while bytes.last() == Some(&0) {
                    bytes.pop();
                }

                String::from_utf8(bytes).map_err(|_| Error::Utf8)?
            };

            return Ok(if value.is_empty() {
                String::from(".")
            } else {
                value
            });
        }

        let mut out = String::new();
        let mut ended = false;

        for i in 0..count {
            let atom = if kind == Kind::Float {
                match self.read_u32()? {
                    MISSING_FLOAT => None,
                    END_FLOAT => {
                        ended = true;
                        None
                    }
                    bits => Some(f32::from_bits(bits).to_string()),
                }
            } else {
                match self.read_int(kind)? {
                    Int::Value(v) => Some(v.to_string()),
                    Int::Missing => None,
                    Int::End => {
                        ended = true;
                        None
                    }
                }
            };

            if ended {
                continue;
            }

            if i > 0 {
                out.push(',');
            }

            match atom {
                Some(text) => out.push_str(&text),
                None => out.push('.'),
            }
        }

        Ok(if out.is_empty() {
            String::from(".")
        } else {
            out
        })
    }

    /// Reads `count` genotype atoms for one sample and renders the call.
    ///
    /// Each atom packs an allele index offset by one with a phasing bit in
    /// the low position; a zero payload is a missing allele.
    pub fn read_genotype(&mut self, kind: Kind, count: usize) -> Result<String, Error> {
        let mut out = String::new();

        for i in 0..count {
            let atom = match self.read_int(kind)? {
                Int::Value(v) => v,
                Int::Missing => 0,
                Int::End => continue,
            };

            if i > 0 {
                out.push(if atom & 1 == 1 { '|' } else { '/' });
            }

            match atom >> 1 {
                0 => out.push('.'),
                allele => out.push_str(&(allele - 1).to_string()),
            }
        }

        Ok(if out.is_empty() {
            String::from(".")
        } else {
            out
        })
    }
}

/// An error from decoding typed values.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Error {
    /// The section ended inside a value.
    UnexpectedEnd,
    /// An unassigned atom kind, or a kind invalid in context.
    Kind(u8),
    /// A value that had to be a plain scalar integer was not.
    Scalar,
    /// String content was not valid UTF-8.
    Utf8,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnexpectedEnd => f.write_str("record section ended inside a typed value"),
            Error::Kind(n) => write!(f, "invalid typed-value kind {n}"),
            Error::Scalar => f.write_str("expected a scalar integer value"),
            Error::Utf8 => f.write_str("string value is not valid UTF-8"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_string() -> Result<(), Error> {
        // (3 << 4) | 7: three chars
        let mut cursor = Cursor::new(&[0x37, b'r', b's', b'1']);

        assert_eq!(cursor.read_string()?, "rs1");
        assert!(cursor.is_empty());

        Ok(())
    }

    #[test]
    fn test_read_string_empty_is_missing_kind() -> Result<(), Error> {
        let mut cursor = Cursor::new(&[0x00]);

        assert_eq!(cursor.read_string()?, "");

        Ok(())
    }

    #[test]
    fn test_read_scalar_int_widths() -> Result<(), Error> {
        let mut cursor = Cursor::new(&[0x11, 0x07]);
        assert_eq!(cursor.read_scalar_int()?, 7);

        let mut cursor = Cursor::new(&[0x12, 0x00, 0x01]);
        assert_eq!(cursor.read_scalar_int()?, 256);

        let mut cursor = Cursor::new(&[0x13, 0x00, 0x00, 0x01, 0x00]);
        assert_eq!(cursor.read_scalar_int()?, 65536);

        Ok(())
    }

    #[test]
    fn test_overflow_count() -> Result<(), Error> {
        // Descriptor with count 15, real count following as int8 scalar
        let mut data = vec![0xf1, 0x11, 20];
        data.extend(1..=20u8);

        let mut cursor = Cursor::new(&data);
        let (kind, count) = cursor.read_descriptor()?;

        assert_eq!(kind, Kind::Int8);
        assert_eq!(count, 20);
        assert_eq!(
            cursor.read_elements(kind, count)?,
            (1..=20).map(|i| i.to_string()).collect::<Vec<_>>().join(",")
        );

        Ok(())
    }

    #[test]
    fn test_elements_missing_and_padding() -> Result<(), Error> {
        // int8 [5, missing, end]: the sentinel tail is consumed, not shown
        let mut cursor = Cursor::new(&[5, 0x80, 0x81]);

        assert_eq!(cursor.read_elements(Kind::Int8, 3)?, "5,.");
        assert!(cursor.is_empty());

        Ok(())
    }

    #[test]
    fn test_elements_float() -> Result<(), Error> {
        let mut data = Vec::new();
        data.extend_from_slice(&0.5f32.to_le_bytes());
        data.extend_from_slice(&MISSING_FLOAT.to_le_bytes());

        let mut cursor = Cursor::new(&data);

        assert_eq!(cursor.read_elements(Kind::Float, 2)?, "0.5,.");

        Ok(())
    }

    #[test]
    fn test_genotype_phasing() -> Result<(), Error> {
        // 0/1 then 1|1 then a missing call
        let mut cursor = Cursor::new(&[2, 4, 4, 5, 0x80, 0x80]);

        assert_eq!(cursor.read_genotype(Kind::Int8, 2)?, "0/1");
        assert_eq!(cursor.read_genotype(Kind::Int8, 2)?, "1|1");
        assert_eq!(cursor.read_genotype(Kind::Int8, 2)?, "./.");

        Ok(())
    }

    #[test]
    fn test_truncated_value() {
        let mut cursor = Cursor::new(&[0x37, b'r', b's']);

        assert_eq!(cursor.read_string(), Err(Error::UnexpectedEnd));
    }
}
