//! Builder for setting up a reading cursor.

use crate::{
    input::Input,
    reader::{
        cursor::Cursor,
        dispatch::{Dispatcher, Error},
        format::{self, UnknownFormatError},
        query::Matcher,
        source::Source,
    },
    variant::Variation,
};

/// A builder for a [`Cursor`].
///
/// With no format set, the input format is autodetected; setting one
/// restricts reading to that format, which still has to match the input.
#[derive(Debug, Default)]
pub struct Builder {
    input: Option<Input>,
    format: Option<String>,
    query: Vec<(String, String)>,
    case_sensitive: bool,
    identifier: Option<String>,
    db: Option<String>,
}

impl Builder {
    /// Sets the input source. Defaults to stdin.
    pub fn set_input(mut self, input: Input) -> Self {
        self.input = Some(input);
        self
    }

    /// Sets the format, by registry name or ontology term id.
    pub fn set_format<S>(mut self, format: S) -> Self
    where
        S: Into<String>,
    {
        self.format = Some(format.into());
        self
    }

    /// Sets the query fields used to filter records.
    pub fn set_query<I>(mut self, query: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.query = query.into_iter().collect();
        self
    }

    /// Sets whether query patterns match case-sensitively.
    pub fn set_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Sets the query identifier recorded on the variation.
    pub fn set_identifier<S>(mut self, identifier: S) -> Self
    where
        S: Into<String>,
    {
        self.identifier = Some(identifier.into());
        self
    }

    /// Sets the source database name recorded on the variation.
    pub fn set_db<S>(mut self, db: S) -> Self
    where
        S: Into<String>,
    {
        self.db = Some(db.into());
        self
    }

    /// Builds the cursor, opening the input.
    ///
    /// # Errors
    ///
    /// An unknown format name or query attribute is a configuration error
    /// and fails here, before any input is read.
    pub fn build(self) -> Result<Cursor, Error> {
        let matcher = Matcher::new(self.query, self.case_sensitive)?;

        let dispatcher = match &self.format {
            Some(name) => {
                let (index, _) = format::find(name)
                    .or_else(|| format::find_by_term(name))
                    .ok_or_else(|| UnknownFormatError(name.clone()))?;

                Dispatcher::with_format(index)
            }
            None => Dispatcher::new(),
        };

        let input = self.input.unwrap_or(Input::Stdin);

        let filename = input
            .as_path()
            .map(|path| path.display().to_string())
            .unwrap_or_default();

        let source = Source::new(input.open()?);

        let variation = Variation::new(
            self.identifier.unwrap_or_default(),
            self.db.unwrap_or_default(),
            filename,
        );

        Ok(Cursor::new(source, variation, matcher, dispatcher))
    }
}
