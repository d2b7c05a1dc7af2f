//! Binary variant loader.
//!
//! The binary format carries the same metadata header as the text formats as
//! an embedded text blob, followed by length-framed records whose fields are
//! typed values referencing two dictionaries: the contig table, in
//! declaration order, and a string table holding `PASS` followed by the
//! `FILTER`, `INFO` and `FORMAT` ids in declaration order. Records decode to
//! the same tab-separated representation the text formats use, so a single
//! parsing path produces the in-memory records for every format.

pub(crate) mod typed;

use std::io::{self, BufRead, Read};

use indexmap::IndexSet;
use noodles_bgzf as bgzf;

use crate::{
    header::{field::Category, grammar, Entry, Header},
    reader::{
        cursor::CHUNK_SIZE,
        dispatch::{Error, Trial},
        query::Matcher,
        source::{Source, BCF_MAGIC_NUMBER},
    },
    variant::{Record, Variation},
};

const SUPPORTED_MAJOR_VERSION: u8 = 2;

/// A loader for length-framed binary variant data.
pub(crate) struct Loader {
    reader: Option<bgzf::Reader<Box<dyn BufRead>>>,
    strings: IndexSet<String>,
    done: bool,
    records_seen: u64,
}

impl Loader {
    pub fn new() -> Self {
        Self {
            reader: None,
            strings: IndexSet::new(),
            done: false,
            records_seen: 0,
        }
    }

    /// Peeks for the magic number and, on a match, commits to the source's
    /// raw reader and parses the embedded header.
    ///
    /// Header problems past the magic number are fatal: the magic commits
    /// the input to this format, so there is no other candidate to fall
    /// back to.
    pub fn load_header(
        &mut self,
        source: &mut Source,
        variation: &mut Variation,
    ) -> Result<Trial, Error> {
        if !source.peek_bcf()? {
            return Ok(Trial::Fail);
        }

        let mut reader = bgzf::Reader::new(source.take_raw()?);

        let mut magic = [0; 5];
        read_all(&mut reader, &mut magic)?;

        if magic[..BCF_MAGIC_NUMBER.len()] != BCF_MAGIC_NUMBER {
            return Err(Error::BadHeader {
                reason: String::from("missing magic number"),
            });
        }

        if magic[3] != SUPPORTED_MAJOR_VERSION {
            return Err(Error::BadHeader {
                reason: format!("unsupported binary version {}.{}", magic[3], magic[4]),
            });
        }

        let mut len = [0; 4];
        read_all(&mut reader, &mut len)?;

        let mut text = vec![0; u32::from_le_bytes(len) as usize];
        read_all(&mut reader, &mut text)?;

        // NUL padding after the text
        while text.last() == Some(&0) {
            text.pop();
        }

        let text = String::from_utf8(text).map_err(|_| Error::BadHeader {
            reason: String::from("header text is not valid UTF-8"),
        })?;

        self.parse_header_text(&text, &mut variation.header)?;
        self.reader = Some(reader);

        Ok(Trial::Ok)
    }

    /// Parses the embedded header text, building the string dictionary as a
    /// side effect of walking the declarations in order.
    fn parse_header_text(&mut self, text: &str, header: &mut Header) -> Result<(), Error> {
        self.strings.insert(String::from("PASS"));

        let mut columns_seen = false;

        for line in text.lines() {
            if line.starts_with("##") {
                match grammar::parse_line(line) {
                    Ok(entry) => {
                        match &entry {
                            Entry::Field(field)
                                if matches!(
                                    field.category,
                                    Category::Info | Category::Format
                                ) =>
                            {
                                self.strings.insert(field.id.clone());
                            }
                            Entry::Other {
                                category,
                                id: Some(id),
                                ..
                            } if category == "FILTER" => {
                                self.strings.insert(id.clone());
                            }
                            _ => {}
                        }

                        header.add_entry(entry);
                    }
                    Err(e) => log::warn!("skipping malformed header line: {e}"),
                }
            } else if line.starts_with('#') {
                header.set_columns(line).map_err(|e| Error::BadHeader {
                    reason: e.to_string(),
                })?;

                columns_seen = true;
            }
        }

        if !columns_seen {
            return Err(Error::BadHeader {
                reason: String::from("missing column-header line"),
            });
        }

        Ok(())
    }

    /// Scans up to one chunk of framed records, replacing the record list
    /// with the subset passing the matcher.
    ///
    /// The input may end cleanly only on a frame boundary; ending inside a
    /// record is fatal.
    pub fn load_chunk(
        &mut self,
        _source: &mut Source,
        variation: &mut Variation,
        matcher: &Matcher,
    ) -> Result<Trial, Error> {
        // Split field borrows: the reader stays mutably borrowed across the
        // loop while decoding only needs the string dictionary
        let Self {
            reader,
            strings,
            done,
            records_seen,
        } = self;

        let reader = reader.as_mut().ok_or(Error::PrematureEof)?;

        variation.records.clear();

        let mut scanned = 0;

        while scanned < CHUNK_SIZE {
            let Some(l_shared) = read_frame_len(reader)? else {
                *done = true;
                break;
            };

            let l_indiv = read_frame_len(reader)?.ok_or(Error::PrematureEof)?;

            let mut shared = vec![0; l_shared as usize];
            read_all(reader, &mut shared)?;

            let mut indiv = vec![0; l_indiv as usize];
            read_all(reader, &mut indiv)?;

            scanned += 1;

            let line = decode(strings, &shared, &indiv, &variation.header)?;

            match Record::parse(&line, &mut variation.header) {
                Ok(record) => {
                    *records_seen += 1;

                    if matcher.matches(&record.id) {
                        variation.records.push(record);
                    }
                }
                Err(e) => log::warn!("skipping record: {e}"),
            }
        }

        if !variation.records.is_empty() {
            variation.has_data = true;
            Ok(Trial::Ok)
        } else if *done {
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

/// Decodes one framed record into the tab-separated text representation.
fn decode(
    strings: &IndexSet<String>,
    shared: &[u8],
    indiv: &[u8],
    header: &Header,
) -> Result<String, Error> {
    let mut cursor = typed::Cursor::new(shared);

    let contig = cursor.read_i32()?;
    let pos = cursor.read_i32()?;
    let _rlen = cursor.read_i32()?;
    let qual = cursor.read_u32()?;

    let n = cursor.read_u32()?;
    let n_info = (n & 0xffff) as usize;
    let n_allele = (n >> 16) as usize;

    let n = cursor.read_u32()?;
    let n_sample = (n & 0x00ff_ffff) as usize;
    let n_fmt = (n >> 24) as usize;

    let chrom = usize::try_from(contig)
        .ok()
        .and_then(|id| header.contig_name(id))
        .ok_or_else(|| Error::BadRecord {
            reason: format!("unknown contig id {contig}"),
        })?
        .to_string();

    let id = dot_if_empty(cursor.read_string()?);

    let mut alleles = Vec::with_capacity(n_allele);
    for _ in 0..n_allele {
        alleles.push(cursor.read_string()?);
    }

    let reference = match alleles.first() {
        Some(allele) if !allele.is_empty() => allele.clone(),
        _ => String::from("."),
    };

    let alternate = if alleles.len() > 1 {
        alleles[1..].join(",")
    } else {
        String::from(".")
    };

    let qual = if qual == typed::MISSING_FLOAT {
        String::from(".")
    } else {
        f32::from_bits(qual).to_string()
    };

    // FILTER is a typed integer vector of string-dictionary indices
    let (kind, count) = cursor.read_descriptor()?;
    let mut filters = Vec::new();

    for _ in 0..count {
        match cursor.read_int(kind)? {
            typed::Int::Value(index) => filters.push(string(strings, index)?),
            typed::Int::Missing => filters.push(String::from(".")),
            typed::Int::End => {}
        }
    }

    let filter = if filters.is_empty() {
        String::from(".")
    } else {
        filters.join(";")
    };

    let mut info = Vec::with_capacity(n_info);

    for _ in 0..n_info {
        let key = string(strings, cursor.read_scalar_int()?)?;
        let (kind, count) = cursor.read_descriptor()?;

        if count == 0 {
            // Flags encode as zero-count values
            info.push(key);
        } else {
            let value = cursor.read_elements(kind, count)?;
            info.push(format!("{key}={value}"));
        }
    }

    let info = if info.is_empty() {
        String::from(".")
    } else {
        info.join(";")
    };

    let mut cursor = typed::Cursor::new(indiv);
    let mut keys = Vec::with_capacity(n_fmt);
    let mut samples = vec![String::new(); n_sample];

    for _ in 0..n_fmt {
        let key = string(strings, cursor.read_scalar_int()?)?;
        let (kind, count) = cursor.read_descriptor()?;
        let genotype = key == "GT";

        for sample in &mut samples {
            let value = if genotype {
                cursor.read_genotype(kind, count)?
            } else {
                cursor.read_elements(kind, count)?
            };

            if !sample.is_empty() {
                sample.push(':');
            }

            sample.push_str(&value);
        }

        keys.push(key);
    }

    let format = if keys.is_empty() {
        String::from(".")
    } else {
        keys.join(":")
    };

    for sample in &mut samples {
        if sample.is_empty() {
            sample.push('.');
        }
    }

    let mut columns = vec![
        chrom,
        (i64::from(pos) + 1).to_string(),
        id,
        reference,
        alternate,
        qual,
        filter,
        info,
        format,
    ];
    columns.extend(samples);

    Ok(columns.join("\t"))
}

/// Resolves a string-dictionary index.
fn string(strings: &IndexSet<String>, index: i32) -> Result<String, Error> {
    usize::try_from(index)
        .ok()
        .and_then(|i| strings.get_index(i))
        .cloned()
        .ok_or_else(|| Error::BadRecord {
            reason: format!("unknown dictionary index {index}"),
        })
}

fn dot_if_empty(s: String) -> String {
    if s.is_empty() {
        String::from(".")
    } else {
        s
    }
}

fn read_all<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<(), Error> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Error::PrematureEof
        } else {
            Error::Io(e)
        }
    })
}

/// Reads one frame length, distinguishing clean end of input at a frame
/// boundary from truncation inside the length itself.
fn read_frame_len<R: Read>(reader: &mut R) -> Result<Option<u32>, Error> {
    let mut buf = [0; 4];
    let mut filled = 0;

    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).map_err(Error::Io)?;

        if n == 0 {
            return if filled == 0 {
                Ok(None)
            } else {
                Err(Error::PrematureEof)
            };
        }

        filled += n;
    }

    Ok(Some(u32::from_le_bytes(buf)))
}

impl From<typed::Error> for Error {
    fn from(e: typed::Error) -> Self {
        Error::BadRecord {
            reason: e.to_string(),
        }
    }
}
