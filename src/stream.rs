//! Streaming Source Reader
//!
//! Pulls one archive member line by line, decodes each non-blank line
//! against the member's schema, and applies the active error policy. Every
//! stream owns its archive handle outright: opening seeks straight to the
//! member's data and wraps a bounded reader over it, so dropping the stream
//! releases the handle on every exit path, including early abandonment.
//!
//! Streams are restartable by construction: each call to a facade accessor
//! builds a fresh stream with its own handle and no shared cursor state.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::marker::PhantomData;
use std::path::Path;
use std::rc::Rc;

use flate2::bufread::DeflateDecoder;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;
use zip::result::ZipError;
use zip::{CompressionMethod, ZipArchive};

use crate::decode::decode_line;
use crate::error::{ArchiveError, RecordedFailure, Result};
use crate::schema::Schema;

/// How per-line decode failures affect a record stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorPolicy {
    /// Drop failed lines and continue; failures are not retained
    Silent,
    /// Stop at the first failed line and surface it as a terminal error
    FailFast,
    /// Drop failed lines from the stream but record each failure for the
    /// facade's failure report
    #[default]
    Collect,
}

/// Shared collect-policy buffer, keyed by member name. Facade-scoped and
/// single-threaded by design.
pub(crate) type FailureSink = Rc<RefCell<BTreeMap<&'static str, Vec<RecordedFailure>>>>;

/// Lazy reader over the physical lines of one archive member.
///
/// Yields `(zero_based_line_number, line_bytes)` for non-blank lines only;
/// blank and whitespace-only lines advance the line counter but are never
/// surfaced.
pub(crate) struct MemberLines {
    reader: Box<dyn BufRead>,
    next_index: usize,
}

impl MemberLines {
    pub(crate) fn new(reader: Box<dyn BufRead>) -> Self {
        Self {
            reader,
            next_index: 0,
        }
    }

    fn next_line(&mut self) -> Option<std::io::Result<(usize, Vec<u8>)>> {
        loop {
            let mut buf = Vec::new();
            match self.reader.read_until(b'\n', &mut buf) {
                Ok(0) => return None,
                Ok(_) => {
                    let index = self.next_index;
                    self.next_index += 1;
                    while matches!(buf.last(), Some(&(b'\n' | b'\r'))) {
                        buf.pop();
                    }
                    if buf.iter().all(u8::is_ascii_whitespace) {
                        continue;
                    }
                    return Some(Ok((index, buf)));
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Open one member of the archive as an owned lazy reader.
///
/// Returns `Ok(None)` when the member is absent, which is legitimate for
/// snapshot archives. The zip central directory is only used to locate the
/// member; the returned reader runs over the underlying file directly so it
/// does not borrow the archive.
fn open_member(path: &Path, member: &'static str) -> Result<Option<MemberLines>> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ArchiveError::NotFound(path.to_path_buf()),
        _ => ArchiveError::Io(e),
    })?;

    let mut archive = ZipArchive::new(BufReader::new(file)).map_err(ArchiveError::Corrupt)?;
    let (start, size, method) = match archive.by_name(member) {
        Ok(entry) => (entry.data_start(), entry.compressed_size(), entry.compression()),
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(ArchiveError::Corrupt(e)),
    };

    let mut inner = archive.into_inner();
    inner.seek(SeekFrom::Start(start))?;
    let bounded = inner.take(size);

    let reader: Box<dyn BufRead> = match method {
        CompressionMethod::Stored => Box::new(bounded),
        CompressionMethod::Deflated => Box::new(BufReader::new(DeflateDecoder::new(bounded))),
        other => {
            return Err(ArchiveError::UnsupportedCompression {
                member,
                method: format!("{other:?}"),
            })
        }
    };

    Ok(Some(MemberLines::new(reader)))
}

/// A lazy, restartable stream of typed records from one archive member
pub struct RecordStream<T> {
    member: &'static str,
    schema: &'static Schema,
    lines: Option<MemberLines>,
    policy: ErrorPolicy,
    sink: Option<FailureSink>,
    done: bool,
    _record: PhantomData<fn() -> T>,
}

impl<T> RecordStream<T> {
    pub(crate) fn open(
        path: &Path,
        schema: &'static Schema,
        policy: ErrorPolicy,
        sink: Option<FailureSink>,
    ) -> Result<Self> {
        let lines = open_member(path, schema.member)?;
        if lines.is_none() {
            warn!(member = schema.member, "member not present in archive");
        }
        Ok(Self {
            member: schema.member,
            schema,
            lines,
            policy,
            sink,
            done: false,
            _record: PhantomData,
        })
    }

    /// Member file this stream reads from
    pub fn member(&self) -> &'static str {
        self.member
    }
}

impl<T: DeserializeOwned> Iterator for RecordStream<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let lines = match self.lines.as_mut() {
            Some(lines) => lines,
            // absent member: an empty sequence, not an error
            None => return None,
        };

        loop {
            let (line, raw) = match lines.next_line() {
                None => {
                    self.done = true;
                    return None;
                }
                Some(Err(e)) => {
                    // container-level trouble mid-stream is terminal under
                    // every policy
                    self.done = true;
                    return Some(Err(e.into()));
                }
                Some(Ok(entry)) => entry,
            };

            match decode_line::<T>(&raw, self.schema) {
                Ok(record) => return Some(Ok(record)),
                Err(failure) => match self.policy {
                    ErrorPolicy::Silent => continue,
                    ErrorPolicy::FailFast => {
                        self.done = true;
                        return Some(Err(ArchiveError::Decode {
                            member: self.member,
                            line,
                            failure,
                        }));
                    }
                    ErrorPolicy::Collect => {
                        if let Some(sink) = &self.sink {
                            sink.borrow_mut().entry(self.member).or_default().push(
                                RecordedFailure {
                                    member: self.member,
                                    line,
                                    failure,
                                },
                            );
                        }
                        continue;
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn lines_from(text: &'static str) -> MemberLines {
        MemberLines::new(Box::new(Cursor::new(text.as_bytes())))
    }

    #[test]
    fn blank_lines_are_skipped_but_keep_physical_numbering() {
        let mut lines = lines_from("a\n\n   \nb\n");
        let (n, raw) = lines.next_line().unwrap().unwrap();
        assert_eq!((n, raw.as_slice()), (0, b"a".as_slice()));
        let (n, raw) = lines.next_line().unwrap().unwrap();
        assert_eq!((n, raw.as_slice()), (3, b"b".as_slice()));
        assert!(lines.next_line().is_none());
    }

    #[test]
    fn crlf_and_missing_trailing_newline_are_tolerated() {
        let mut lines = lines_from("one\r\ntwo");
        assert_eq!(lines.next_line().unwrap().unwrap().1, b"one".to_vec());
        assert_eq!(lines.next_line().unwrap().unwrap().1, b"two".to_vec());
        assert!(lines.next_line().is_none());
    }

    #[test]
    fn whitespace_only_file_yields_nothing() {
        let mut lines = lines_from("\n \n\t\n");
        assert!(lines.next_line().is_none());
    }
}
