// logtrail - core/export.rs
//
// Tab-separated row output. Fields are joined literally: no header, no
// quoting, `\n` line terminator. Writes to any Write trait object.

use crate::core::report::Row;
use crate::util::constants::ROW_DELIMITER;
use crate::util::error::OutputError;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::io::Write;

/// Streams rows to an output as tab-joined lines.
pub struct RowWriter<W: Write> {
    inner: csv::Writer<W>,
    rows_written: u64,
}

impl<W: Write> RowWriter<W> {
    pub fn new(writer: W) -> Self {
        let inner = WriterBuilder::new()
            .delimiter(ROW_DELIMITER)
            .quote_style(QuoteStyle::Never)
            .terminator(Terminator::Any(b'\n'))
            .has_headers(false)
            .flexible(true)
            .from_writer(writer);
        Self {
            inner,
            rows_written: 0,
        }
    }

    /// Buffer one row. Call `flush` to push it to the underlying writer.
    pub fn write_row(&mut self, row: &Row) -> Result<(), OutputError> {
        self.inner
            .write_record(row.fields())
            .map_err(|e| OutputError::Write { source: e })?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), OutputError> {
        self.inner
            .flush()
            .map_err(|e| OutputError::Flush { source: e })
    }

    /// Total rows written since creation.
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(self) -> Result<W, OutputError> {
        self.inner.into_inner().map_err(|e| OutputError::Flush {
            source: e.into_error(),
        })
    }
}
