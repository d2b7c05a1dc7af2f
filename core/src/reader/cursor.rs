//! A resumable streaming cursor over one variant input.

use crate::{
    reader::{
        dispatch::{Dispatcher, Error, Trial},
        query::Matcher,
        source::Source,
    },
    variant::{Record, Variation},
};

/// The maximum number of data records scanned per chunk.
///
/// A chunk bounds the work of one [`Cursor::next_chunk`] call by records
/// scanned, matching or not, so a selective query over a large input still
/// returns control regularly.
pub const CHUNK_SIZE: usize = 1000;

/// A cursor streaming one variant input in chunks.
///
/// The first [`next_chunk`](Cursor::next_chunk) call detects the format and
/// parses the header, leaving the record list empty; every later call
/// replaces the record list with the records from the next chunk of input
/// that pass the query. The cursor can be put aside between calls and
/// resumed at any time.
pub struct Cursor {
    source: Source,
    variation: Variation,
    matcher: Matcher,
    dispatcher: Dispatcher,
    done: bool,
}

impl Cursor {
    pub(crate) fn new(
        source: Source,
        variation: Variation,
        matcher: Matcher,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            source,
            variation,
            matcher,
            dispatcher,
            done: false,
        }
    }

    /// Advances the cursor by one step.
    ///
    /// Returns `false` once the input is exhausted. A chunk may legitimately
    /// carry no records when a query matched nothing in it; that is not the
    /// end of the input. Errors are fatal: the cursor is done afterwards.
    pub fn next_chunk(&mut self) -> Result<bool, Error> {
        if self.done {
            return Ok(false);
        }

        let trial = self
            .dispatcher
            .load(&mut self.source, &mut self.variation, &self.matcher)
            .map_err(|e| {
                self.done = true;
                e
            })?;

        match trial {
            Trial::Ok | Trial::NoMatch => Ok(true),
            Trial::Eof | Trial::Empty | Trial::Fail => {
                self.done = true;
                Ok(false)
            }
        }
    }

    /// Returns the variation read so far.
    pub fn variation(&self) -> &Variation {
        &self.variation
    }

    /// Returns the records of the current chunk.
    pub fn records(&self) -> &[Record] {
        &self.variation.records
    }

    /// Returns whether the input is exhausted.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Returns the number of records scanned so far, matching or not.
    pub fn total_records(&self) -> u64 {
        self.dispatcher.records_seen()
    }

    /// Consumes the cursor, returning the variation.
    pub fn into_variation(self) -> Variation {
        self.variation
    }
}
