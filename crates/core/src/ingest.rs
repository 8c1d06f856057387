//! Streaming CSV ingestion.
//!
//! Uploaded blobs arrive as a sequence of byte chunks whose boundaries are
//! arbitrary: a chunk can end in the middle of a multi-byte UTF-8 character
//! or in the middle of a CSV row. [`Utf8ChunkDecoder`] holds back incomplete
//! characters until the next chunk arrives, and [`CsvIngestor`] feeds the
//! validated text into an incremental `csv-core` reader so rows are emitted
//! as soon as they are complete.

use std::collections::VecDeque;

use csv_core::{ReadRecordResult, Reader};
use futures::{Stream, StreamExt};
use thiserror::Error;

/// One parsed CSV row.
pub type CsvRecord = Vec<String>;

/// Errors produced while ingesting an uploaded CSV.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    /// The byte stream is not valid UTF-8.
    #[error("invalid UTF-8 at byte offset {offset}")]
    InvalidUtf8 { offset: u64 },

    /// The byte stream ended in the middle of a multi-byte character.
    #[error("stream ended inside a UTF-8 sequence at byte offset {offset}")]
    TruncatedUtf8 { offset: u64 },

    /// The underlying byte source failed.
    #[error("source error: {0}")]
    Source(String),
}

/// Incremental UTF-8 validator for chunked input.
///
/// Up to three trailing bytes of an incomplete character are carried over
/// to the next call.
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    carry: Vec<u8>,
    consumed: u64,
}

impl Utf8ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk, returning the text that is complete so far.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<String, IngestError> {
        let mut buf = std::mem::take(&mut self.carry);
        buf.extend_from_slice(chunk);

        match std::str::from_utf8(&buf) {
            Ok(_) => {
                self.consumed += buf.len() as u64;
                String::from_utf8(buf).map_err(|e| IngestError::InvalidUtf8 {
                    offset: self.consumed + e.utf8_error().valid_up_to() as u64,
                })
            }
            Err(e) if e.error_len().is_none() => {
                let valid = e.valid_up_to();
                self.carry = buf.split_off(valid);
                self.consumed += valid as u64;
                String::from_utf8(buf).map_err(|e| IngestError::InvalidUtf8 {
                    offset: self.consumed + e.utf8_error().valid_up_to() as u64,
                })
            }
            Err(e) => Err(IngestError::InvalidUtf8 {
                offset: self.consumed + e.valid_up_to() as u64,
            }),
        }
    }

    /// Signal end of input. Fails if a character was left incomplete.
    pub fn finish(&mut self) -> Result<(), IngestError> {
        if self.carry.is_empty() {
            Ok(())
        } else {
            Err(IngestError::TruncatedUtf8 {
                offset: self.consumed,
            })
        }
    }
}

/// Push-based CSV parser over chunked UTF-8 input.
///
/// Rows are split on commas with RFC 4180 quoting. There is no header row
/// handling, rows may have different field counts, and blank lines produce
/// no record.
#[derive(Debug)]
pub struct CsvIngestor {
    decoder: Utf8ChunkDecoder,
    reader: Reader,
    output: Vec<u8>,
    ends: Vec<usize>,
    out_len: usize,
    ends_len: usize,
    finished: bool,
}

impl Default for CsvIngestor {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvIngestor {
    pub fn new() -> Self {
        Self {
            decoder: Utf8ChunkDecoder::new(),
            reader: Reader::new(),
            output: vec![0; 1024],
            ends: vec![0; 16],
            out_len: 0,
            ends_len: 0,
            finished: false,
        }
    }

    /// Feed one chunk and return every record it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<CsvRecord>, IngestError> {
        let text = self.decoder.decode(chunk)?;
        let mut records = Vec::new();
        if !text.is_empty() {
            self.parse(text.as_bytes(), &mut records)?;
        }
        Ok(records)
    }

    /// Flush the final record once the input is exhausted.
    ///
    /// Calling `finish` more than once yields no further records.
    pub fn finish(&mut self) -> Result<Vec<CsvRecord>, IngestError> {
        if self.finished {
            return Ok(Vec::new());
        }
        self.finished = true;
        self.decoder.finish()?;

        let mut records = Vec::new();
        // An empty input slice tells csv-core that the stream has ended.
        self.parse(&[], &mut records)?;
        Ok(records)
    }

    fn parse(&mut self, mut input: &[u8], records: &mut Vec<CsvRecord>) -> Result<(), IngestError> {
        let at_eof = input.is_empty();
        loop {
            let (result, nin, nout, nend) = self.reader.read_record(
                input,
                &mut self.output[self.out_len..],
                &mut self.ends[self.ends_len..],
            );
            input = &input[nin..];
            self.out_len += nout;
            self.ends_len += nend;

            match result {
                ReadRecordResult::InputEmpty | ReadRecordResult::End => return Ok(()),
                ReadRecordResult::OutputFull => {
                    let len = self.output.len();
                    self.output.resize(len * 2, 0);
                    if input.is_empty() && !at_eof {
                        return Ok(());
                    }
                }
                ReadRecordResult::OutputEndsFull => {
                    let len = self.ends.len();
                    self.ends.resize(len * 2, 0);
                    if input.is_empty() && !at_eof {
                        return Ok(());
                    }
                }
                ReadRecordResult::Record => {
                    records.push(self.take_record()?);
                    if input.is_empty() && !at_eof {
                        return Ok(());
                    }
                }
            }
        }
    }

    fn take_record(&mut self) -> Result<CsvRecord, IngestError> {
        let mut fields = Vec::with_capacity(self.ends_len);
        let mut start = 0;
        for &end in &self.ends[..self.ends_len] {
            // Field boundaries fall on ASCII delimiters, so every slice of
            // validated input is itself valid UTF-8.
            let field = std::str::from_utf8(&self.output[start..end])
                .map_err(|e| IngestError::InvalidUtf8 {
                    offset: e.valid_up_to() as u64,
                })?;
            fields.push(field.to_owned());
            start = end;
        }
        self.out_len = 0;
        self.ends_len = 0;
        Ok(fields)
    }
}

/// Ingest a chunked byte stream as CSV, yielding records lazily.
///
/// The returned stream is single-pass: it drives `chunks` forward as records
/// are pulled and ends after the first error.
pub fn ingest<S, B, E>(chunks: S) -> impl Stream<Item = Result<CsvRecord, IngestError>>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let state = IngestState {
        chunks,
        ingestor: CsvIngestor::new(),
        ready: VecDeque::new(),
        done: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(record) = state.ready.pop_front() {
                return Some((Ok(record), state));
            }
            if state.done {
                return None;
            }

            let fed = match state.chunks.next().await {
                Some(Ok(chunk)) => state.ingestor.feed(chunk.as_ref()),
                Some(Err(e)) => Err(IngestError::Source(e.to_string())),
                None => {
                    state.done = true;
                    state.ingestor.finish()
                }
            };

            match fed {
                Ok(records) => state.ready.extend(records),
                Err(e) => {
                    state.done = true;
                    state.ready.clear();
                    return Some((Err(e), state));
                }
            }
        }
    })
}

struct IngestState<S> {
    chunks: S,
    ingestor: CsvIngestor,
    ready: VecDeque<CsvRecord>,
    done: bool,
}
