//! Append-only CSV sink
//!
//! Each record occupies exactly one line (line breaks inside fields are
//! flattened to spaces), which lets [`CsvSink::open`] detect and drop a row
//! torn by an interrupted append before it writes anything new.

use crate::record::Record;
use crate::storage::traits::{ResultSink, SinkError, SinkResult};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const SEPARATOR: char = ',';
const TAIL_CHUNK: u64 = 8 * 1024;

/// CSV file sink with a fixed `name,price,availability,source_page` header
#[derive(Debug)]
pub struct CsvSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl CsvSink {
    /// Opens or creates the CSV file at `path`
    ///
    /// A new or empty file gets the header. An existing file must start with
    /// the same header, and any incomplete trailing row is truncated away.
    pub fn open(path: &Path) -> SinkResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)?;

        discard_torn_tail(&mut file, path)?;

        let header = header_line();
        if file.metadata()?.len() == 0 {
            file.write_all(header.as_bytes())?;
            file.flush()?;
            file.sync_data()?;
            tracing::debug!("Created {} with header", path.display());
        } else {
            let found = read_first_line(&mut file)?;
            if found != header.trim_end() {
                return Err(SinkError::HeaderMismatch {
                    path: path.display().to_string(),
                    expected: header.trim_end().to_string(),
                    found,
                });
            }
            tracing::info!("Appending to existing {}", path.display());
        }

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }
}

impl ResultSink for CsvSink {
    fn append(&self, records: &[Record]) -> SinkResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut batch = String::new();
        for record in records {
            push_row(&mut batch, &record.to_row());
        }

        let mut file = self.file.lock().map_err(|_| SinkError::Poisoned)?;
        file.write_all(batch.as_bytes())?;
        file.flush()?;
        file.sync_data()?;

        Ok(records.len())
    }

    fn finish(&self) -> SinkResult<()> {
        let file = self.file.lock().map_err(|_| SinkError::Poisoned)?;
        file.sync_all()?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("CSV file {}", self.path.display())
    }
}

fn header_line() -> String {
    let mut line = String::new();
    push_row(&mut line, &Record::COLUMNS);
    line
}

fn needs_quotes(field: &str) -> bool {
    field.contains(SEPARATOR) || field.contains('"')
}

/// Appends one CSV row, terminated by a newline
fn push_row<S: AsRef<str>>(out: &mut String, fields: &[S]) {
    for (index, field) in fields.iter().enumerate() {
        if index > 0 {
            out.push(SEPARATOR);
        }
        let field = field.as_ref().replace(['\r', '\n'], " ");
        if needs_quotes(&field) {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(&field);
        }
    }
    out.push('\n');
}

fn read_first_line(file: &mut File) -> SinkResult<String> {
    file.seek(SeekFrom::Start(0))?;
    let mut line = String::new();
    BufReader::new(&*file).read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Truncates the file after its last newline if it does not end with one
fn discard_torn_tail(file: &mut File, path: &Path) -> SinkResult<()> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(());
    }

    let keep = match last_newline_offset(file, len)? {
        Some(offset) if offset + 1 == len => return Ok(()),
        Some(offset) => offset + 1,
        None => 0,
    };

    tracing::warn!(
        "Discarding {} bytes of incomplete trailing row in {}",
        len - keep,
        path.display()
    );
    file.set_len(keep)?;
    file.sync_data()?;
    Ok(())
}

/// Scans backwards from `len` for the last `\n`
fn last_newline_offset(file: &mut File, len: u64) -> SinkResult<Option<u64>> {
    let mut end = len;
    let mut buf = Vec::new();

    while end > 0 {
        let start = end.saturating_sub(TAIL_CHUNK);
        buf.resize((end - start) as usize, 0);
        file.seek(SeekFrom::Start(start))?;
        file.read_exact(&mut buf)?;

        if let Some(pos) = buf.iter().rposition(|&b| b == b'\n') {
            return Ok(Some(start + pos as u64));
        }
        end = start;
    }

    Ok(None)
}
