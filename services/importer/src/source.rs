//! Pull-based CSV row source
//!
//! Rows are read only when the consumer asks for the next one, so a consumer
//! that stops pulling (for example while a batch is being written) leaves the
//! file where it is.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use csv::StringRecord;

use crate::mapper::RawRow;

pub struct RowSource<R: Read> {
    reader: csv::Reader<R>,
    headers: Vec<String>,
    record: StringRecord,
    finished: bool,
}

impl RowSource<File> {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open CSV file {}", path.display()))?;
        Self::from_reader(file)
    }
}

impl<R: Read> RowSource<R> {
    /// Build a source over any reader; the first record is the header row
    pub fn from_reader(rdr: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(rdr);

        // Non-UTF-8 header bytes become U+FFFD; data rows are unaffected
        let headers: Vec<String> = reader
            .byte_headers()
            .context("Failed to read CSV headers")?
            .iter()
            .map(|h| String::from_utf8_lossy(h).trim().to_string())
            .collect();

        for (column, header) in headers.iter().enumerate() {
            if header.contains(char::REPLACEMENT_CHARACTER) {
                tracing::warn!(column, header = %header, "CSV header is not valid UTF-8");
            }
        }

        Ok(Self {
            reader,
            headers,
            record: StringRecord::new(),
            finished: false,
        })
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.headers.iter().map(String::as_str)
    }

    fn to_row(&self) -> RawRow {
        self.headers
            .iter()
            .zip(self.record.iter())
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect()
    }
}

impl<R: Read> Iterator for RowSource<R> {
    /// A malformed record yields `Err` and the source moves on to the next
    /// one. An I/O error ends the source.
    type Item = Result<RawRow, csv::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.reader.read_record(&mut self.record) {
            Ok(true) => Some(Ok(self.to_row())),
            Ok(false) => {
                self.finished = true;
                None
            }
            Err(e) => {
                if matches!(e.kind(), csv::ErrorKind::Io(_)) {
                    self.finished = true;
                }
                Some(Err(e))
            }
        }
    }
}
