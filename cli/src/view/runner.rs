use std::io::Write;

use anyhow::{Context, Error};

use varkit_core::{query, reader::Builder, Input};

use super::View;

pub struct Runner {
    input: Input,
    specs: Vec<query::Spec>,
    format: Option<String>,
    case_sensitive: bool,
    db: String,
}

impl Runner {
    pub fn run(&self, writer: &mut dyn Write) -> Result<(), Error> {
        for spec in &self.specs {
            self.run_query(spec, writer)?;
        }

        Ok(())
    }

    /// Runs one query over the input, writing matching records.
    ///
    /// Each query re-opens the input, so running several requires a file
    /// rather than stdin.
    fn run_query(&self, spec: &query::Spec, writer: &mut dyn Write) -> Result<(), Error> {
        let mut builder = Builder::default()
            .set_input(self.input.clone())
            .set_query(spec.fields.clone())
            .set_case_sensitive(self.case_sensitive)
            .set_db(self.db.clone());

        if let Some((_, pattern)) = spec.fields.first() {
            builder = builder.set_identifier(pattern.clone());
        }

        if let Some(format) = self.format.as_ref().or(spec.format.as_ref()) {
            builder = builder.set_format(format.clone());
        }

        let mut cursor = builder.build()?;
        let mut matched: u64 = 0;

        while cursor.next_chunk()? {
            for record in cursor.records() {
                writeln!(writer, "{record}")?;
            }

            matched += cursor.records().len() as u64;

            log::debug!(
                "chunk: {} matching of {} scanned so far",
                cursor.records().len(),
                cursor.total_records(),
            );
        }

        log::info!(
            "read {} records in format '{}', of which {matched} matched",
            cursor.total_records(),
            cursor.variation().format,
        );

        Ok(())
    }
}

impl TryFrom<&View> for Runner {
    type Error = Error;

    fn try_from(args: &View) -> Result<Self, Self::Error> {
        let input = Input::new(args.input.clone())?;

        let mut specs = args
            .query
            .iter()
            .map(|text| query::parse(text))
            .collect::<Result<Vec<_>, _>>()
            .context("failed to parse query")?;

        if specs.is_empty() {
            specs.push(query::Spec::default());
        }

        if specs.len() > 1 && input == Input::Stdin {
            return Err(Error::msg(
                "multiple queries require a file input, since stdin cannot be re-read",
            ));
        }

        Ok(Self {
            input,
            specs,
            format: args.format.clone(),
            case_sensitive: args.case_sensitive,
            db: args.db.clone(),
        })
    }
}
