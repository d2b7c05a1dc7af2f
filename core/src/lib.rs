//! Streaming readers for variation records.
//!
//! Variant data arrives in several related formats: tab-separated text in a
//! few versions, and a length-framed binary encoding, either of which may be
//! gzip-compressed. All of them share one metadata header grammar and one
//! record shape, so this crate detects the format of an input, parses its
//! header once, and then streams its records in bounded chunks through a
//! single decoding path, optionally filtered by a wildcard query.
//!
//! The entry point is the [`reader::Builder`]:
//!
//! ```no_run
//! use varkit_core::{reader::Builder, Input};
//!
//! # fn main() -> Result<(), varkit_core::reader::Error> {
//! let mut cursor = Builder::default()
//!     .set_input(Input::Path("variants.vcf.gz".into()))
//!     .set_query([(String::from("id"), String::from("rs1*"))])
//!     .build()?;
//!
//! // The first chunk carries the header only
//! while cursor.next_chunk()? {
//!     for record in cursor.records() {
//!         println!("{record}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod header;
pub use header::Header;

pub mod input;
pub use input::Input;

pub mod query;

pub mod reader;

pub mod variant;
pub use variant::{Record, Variation};
