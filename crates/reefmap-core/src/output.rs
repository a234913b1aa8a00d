//! Record output as a JSON array or JSON Lines.
//!
//! JSON Lines output is streamed as records arrive; JSON array output is
//! buffered until `finish` so the document is always well formed.

use serde::Serialize;
use std::io::{self, Write};

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// A single JSON array
    Json,
    /// One JSON object per line (newline-delimited JSON)
    JsonLines,
}

/// Writes a sequence of serializable records.
pub struct OutputWriter<W: Write, T: Serialize> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
    pending: Vec<T>,
    written: usize,
}

impl<W: Write, T: Serialize> OutputWriter<W, T> {
    /// Create a new output writer. `pretty` only affects JSON array output.
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            pending: Vec::new(),
            written: 0,
        }
    }

    /// Queue or stream one record.
    pub fn push(&mut self, record: T) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => self.pending.push(record),
            OutputFormat::JsonLines => {
                serde_json::to_writer(&mut self.writer, &record).map_err(io::Error::other)?;
                writeln!(self.writer)?;
                self.written += 1;
            }
        }
        Ok(())
    }

    /// Flush buffered output and return the record count.
    pub fn finish(mut self) -> io::Result<usize> {
        if self.format == OutputFormat::Json {
            if self.pretty {
                serde_json::to_writer_pretty(&mut self.writer, &self.pending)
                    .map_err(io::Error::other)?;
            } else {
                serde_json::to_writer(&mut self.writer, &self.pending).map_err(io::Error::other)?;
            }
            writeln!(self.writer)?;
            self.written += self.pending.len();
        }
        self.writer.flush()?;
        Ok(self.written)
    }
}
