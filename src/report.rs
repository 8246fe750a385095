//! Report assembly
//!
//! A report is a header line followed by one tab-separated line per match
//! record, in the order the records were produced:
//!
//! ```text
//! region	service	ip_prefix	ip
//! eu-west-1	EC2	203.0.113.0/24	203.0.113.5
//! ```
//!
//! Records are handed to a [`ReportSink`]; the file-backed [`TsvReport`] is
//! what the CLI uses. Any failure to open or write the destination is a
//! `SinkUnavailable` error and ends the run.

use crate::error::{BlocklensError, BlocklensResult};
use crate::lens::xref::MatchRecord;
use std::io::Write;
use tracing::info;

/// Column names of the report header
pub const REPORT_HEADER: [&str; 4] = ["region", "service", "ip_prefix", "ip"];

/// Destination for match records
pub trait ReportSink {
    fn emit(&mut self, record: &MatchRecord) -> BlocklensResult<()>;

    /// Flush whatever is buffered. Called once after the last record.
    fn finish(&mut self) -> BlocklensResult<()> {
        Ok(())
    }
}

/// In-memory sink
impl ReportSink for Vec<MatchRecord> {
    fn emit(&mut self, record: &MatchRecord) -> BlocklensResult<()> {
        self.push(record.clone());
        Ok(())
    }
}

/// Tab-separated report written to any `Write`
pub struct TsvReport<W: Write> {
    writer: W,
    name: String,
    rows: usize,
}

impl<W: Write> TsvReport<W> {
    /// Wrap a writer and write the header line right away
    pub fn new(mut writer: W, name: impl Into<String>) -> BlocklensResult<Self> {
        let name = name.into();
        writeln!(writer, "{}", REPORT_HEADER.join("\t")).map_err(|e| {
            BlocklensError::SinkUnavailable {
                path: name.clone(),
                source: e,
            }
        })?;
        Ok(Self {
            writer,
            name,
            rows: 0,
        })
    }

    /// Number of data rows written so far
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn sink_error(&self, source: std::io::Error) -> BlocklensError {
        BlocklensError::SinkUnavailable {
            path: self.name.clone(),
            source,
        }
    }
}

impl<W: Write> ReportSink for TsvReport<W> {
    fn emit(&mut self, record: &MatchRecord) -> BlocklensResult<()> {
        if let Err(e) = writeln!(self.writer, "{}", record.to_delimited('\t')) {
            return Err(self.sink_error(e));
        }
        self.rows += 1;
        Ok(())
    }

    fn finish(&mut self) -> BlocklensResult<()> {
        if let Err(e) = self.writer.flush() {
            return Err(self.sink_error(e));
        }
        info!("wrote {} report rows to {}", self.rows, self.name);
        Ok(())
    }
}

/// Open a report file. Compressed outputs (`.gz`, `.bz2`) are handled by
/// `oneio` based on the extension.
pub fn open_report(path: &str) -> BlocklensResult<TsvReport<Box<dyn Write>>> {
    let writer = oneio::get_writer(path).map_err(|e| BlocklensError::SinkUnavailable {
        path: path.to_string(),
        source: std::io::Error::other(e.to_string()),
    })?;
    TsvReport::new(writer, path)
}

/// Emit every record into `sink`, then finish it. Returns the row count.
pub fn write_report<S: ReportSink + ?Sized>(
    records: &[MatchRecord],
    sink: &mut S,
) -> BlocklensResult<usize> {
    for record in records {
        sink.emit(record)?;
    }
    sink.finish()?;
    Ok(records.len())
}
