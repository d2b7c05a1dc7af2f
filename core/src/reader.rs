//! Streaming, format-autodetecting variant readers.

pub mod source;
pub use source::Source;

pub mod format;
pub use format::Format;

pub mod query;
pub use query::Matcher;

pub mod dispatch;
pub use dispatch::{Dispatcher, Trial};

pub mod cursor;
pub use cursor::{Cursor, CHUNK_SIZE};

pub mod builder;
pub use builder::Builder;

mod vcf;

mod bcf;

pub use dispatch::Error;
