//! Writing token records

use crate::analysis::cursor::TokenCursor;
use crate::analysis::error::StreamError;
use crate::analysis::token::TokenRecord;
use serde::{Deserialize, Serialize};
use std::io::{self, BufWriter, Write};

/// Line format of the output file.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `<text>\t<category>`
    #[default]
    Tsv,
    /// `{"text":...,"category":...}`
    Json,
}

/// Buffers records into `W`, one line each.
pub struct TokenWriter<W: Write> {
    out: BufWriter<W>,
    format: OutputFormat,
    written: usize,
}

impl<W: Write> TokenWriter<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        TokenWriter {
            out: BufWriter::new(out),
            format,
            written: 0,
        }
    }

    pub fn write(&mut self, record: &TokenRecord) -> Result<(), StreamError> {
        match self.format {
            OutputFormat::Tsv => writeln!(self.out, "{}", record)?,
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.out, record).map_err(io::Error::from)?;
                writeln!(self.out)?;
            }
        }
        self.written += 1;
        Ok(())
    }

    /// Drain `cursor` into the writer, stopping at the first error.
    pub fn write_all(&mut self, cursor: TokenCursor) -> Result<usize, StreamError> {
        let before = self.written;
        for record in cursor {
            self.write(&record?)?;
        }
        Ok(self.written - before)
    }

    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(self) -> Result<W, StreamError> {
        self.out
            .into_inner()
            .map_err(|e| StreamError::Io(e.into_error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(format: OutputFormat, records: &[TokenRecord]) -> String {
        let mut writer = TokenWriter::new(Vec::new(), format);
        for record in records {
            writer.write(record).unwrap();
        }
        assert_eq!(writer.written(), records.len());
        String::from_utf8(writer.finish().unwrap()).unwrap()
    }

    #[test]
    fn test_tsv() {
        let out = render(
            OutputFormat::Tsv,
            &[TokenRecord::new("Hello", "word"), TokenRecord::new("42", "number")],
        );
        assert_eq!(out, "Hello\tword\n42\tnumber\n");
    }

    #[test]
    fn test_json_lines() {
        let out = render(OutputFormat::Json, &[TokenRecord::new("say \"hi\"", "word")]);
        insta::assert_snapshot!(out, @r#"{"text":"say \"hi\"","category":"word"}"#);
    }

    #[test]
    fn test_empty() {
        assert_eq!(render(OutputFormat::Tsv, &[]), "");
    }
}
