use crate::error::{AnalyticsError, Result};
use crate::util::open_with_backoff;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use zstd::stream::read::Decoder;

/// Line reader over an NDJSON source, plain or zstd-compressed (`.zst`).
/// Tracks 1-based line numbers so parse errors can point at the bad line.
pub struct NdjsonReader {
    path: PathBuf,
    rdr: Box<dyn BufRead>,
    line_no: u64,
}

impl NdjsonReader {
    pub fn open(path: &Path, buf_bytes: usize) -> Result<Self> {
        if !path.exists() {
            return Err(AnalyticsError::MissingSource { path: path.to_path_buf() });
        }
        let f = open_with_backoff(path, 16, 50)?;
        let cap = buf_bytes.max(8 * 1024);
        let inner: Box<dyn Read> = if is_zstd(path) {
            let mut dec = Decoder::new(f)?;
            // Large exports are often compressed with long windows.
            dec.window_log_max(31)?;
            Box::new(dec)
        } else {
            Box::new(f)
        };
        Ok(Self { path: path.to_path_buf(), rdr: Box::new(BufReader::with_capacity(cap, inner)), line_no: 0 })
    }

    /// Read the next line into `buf`. Returns the number of bytes read (0 on EOF).
    /// Strips trailing `\r?\n`.
    pub fn read_line(&mut self, buf: &mut String) -> Result<usize> {
        buf.clear();
        let n = self.rdr.read_line(buf)?;
        if n == 0 { return Ok(0); }
        self.line_no += 1;
        if buf.ends_with('\n') {
            buf.pop();
            if buf.ends_with('\r') { buf.pop(); }
        }
        Ok(n)
    }

    /// Next non-blank line parsed as JSON, or `None` at EOF.
    /// `on_bytes` receives the raw byte count of every line read, blank or not.
    /// A malformed line, or one holding a JSON value that is not an object, is an
    /// `IngestionParse` error carrying its line number.
    pub fn next_record(&mut self, buf: &mut String, mut on_bytes: impl FnMut(u64)) -> Result<Option<serde_json::Value>> {
        loop {
            let n = self.read_line(buf)?;
            if n == 0 { return Ok(None); }
            on_bytes(n as u64);
            let line = buf.trim();
            if line.is_empty() { continue; }
            return serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(line)
                .map(|record| Some(serde_json::Value::Object(record)))
                .map_err(|source| AnalyticsError::IngestionParse {
                    path: self.path.clone(),
                    line: self.line_no,
                    source,
                });
        }
    }

    /// Call `on_record` with every record until EOF; the first error aborts.
    pub fn for_each_record(
        &mut self,
        mut on_bytes: impl FnMut(u64),
        mut on_record: impl FnMut(serde_json::Value) -> Result<()>,
    ) -> Result<u64> {
        let mut buf = String::with_capacity(16 * 1024);
        let mut records = 0u64;
        while let Some(value) = self.next_record(&mut buf, &mut on_bytes)? {
            on_record(value)?;
            records += 1;
        }
        Ok(records)
    }
}

fn is_zstd(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()).map(|e| e.eq_ignore_ascii_case("zst")).unwrap_or(false)
}

/// Size of the source on disk, used as the byte-progress total.
/// For compressed sources this undercounts, so the bar just overruns.
pub fn source_len(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}
