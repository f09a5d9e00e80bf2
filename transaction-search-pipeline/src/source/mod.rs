//! Upload decoding for the transaction search pipeline.
//!
//! An uploaded file is either a JSON array of records, whose elements may be
//! `null`, or newline-delimited JSON with one record per line. Both decode
//! into the record stream consumed by [`crate::BatchIngestor`], where `None`
//! stands for an element that carries no record.
//!
//! The format is picked from the first non-whitespace byte, after an
//! optional UTF-8 byte order mark. Arrays are
//! buffered and parsed in one pass; NDJSON is decoded line by line as bytes
//! arrive.

use std::convert::Infallible;
use std::fmt::Display;
use std::pin::Pin;

use bytes::{Buf, Bytes, BytesMut};
use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt};

use crate::errors::PipelineError;
use transaction_search_shared::TransactionDocument;

/// UTF-8 byte order mark.
const BOM: &[u8] = b"\xEF\xBB\xBF";

/// One decoded element of an upload.
pub type SourceItem = Result<Option<TransactionDocument>, PipelineError>;

/// Decode a complete in-memory upload.
pub fn decode_bytes(body: Bytes) -> BoxStream<'static, SourceItem> {
    decode_stream(stream::iter([Ok::<_, Infallible>(body)]))
}

/// Decode an upload arriving as a stream of byte chunks.
///
/// A transport error from `body` is surfaced as `MalformedInput` and ends the
/// stream.
pub fn decode_stream<'a, S, E>(body: S) -> BoxStream<'a, SourceItem>
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'a,
    E: Display + Send + 'a,
{
    let decoder = Decoder {
        body: Box::pin(body),
        buf: BytesMut::new(),
        mode: Mode::Detect,
        eof: false,
        bom_checked: false,
    };

    stream::unfold(decoder, |mut decoder| async move {
        let item = decoder.next_item().await?;
        Some((item, decoder))
    })
    .boxed()
}

enum Mode {
    /// No non-whitespace byte seen yet.
    Detect,
    Lines,
    Array(std::vec::IntoIter<Option<TransactionDocument>>),
    Done,
}

struct Decoder<'a, E> {
    body: Pin<Box<dyn Stream<Item = Result<Bytes, E>> + Send + 'a>>,
    buf: BytesMut,
    mode: Mode,
    eof: bool,
    bom_checked: bool,
}

impl<E: Display> Decoder<'_, E> {
    async fn next_item(&mut self) -> Option<SourceItem> {
        loop {
            match self.mode {
                Mode::Done => return None,
                Mode::Array(ref mut elements) => {
                    let next = elements.next();
                    if next.is_none() {
                        self.mode = Mode::Done;
                    }
                    return next.map(Ok);
                }
                Mode::Detect => {
                    if !self.bom_checked {
                        // A BOM may span chunks
                        if self.buf.len() < BOM.len() && !self.eof && BOM.starts_with(&self.buf) {
                            if let Err(e) = self.fill().await {
                                return Some(Err(e));
                            }
                            continue;
                        }
                        if self.buf.starts_with(BOM) {
                            self.buf.advance(BOM.len());
                        }
                        self.bom_checked = true;
                    }

                    let first = self.buf.iter().copied().find(|b| !b.is_ascii_whitespace());
                    match first {
                        Some(b'[') => {
                            if let Err(e) = self.read_to_end().await {
                                return Some(Err(e));
                            }
                            return Some(self.parse_array());
                        }
                        Some(_) => self.mode = Mode::Lines,
                        None if self.eof => {
                            self.mode = Mode::Done;
                            return None;
                        }
                        None => {
                            if let Err(e) = self.fill().await {
                                return Some(Err(e));
                            }
                        }
                    }
                }
                Mode::Lines => {
                    if let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
                        let line = self.buf.split_to(pos + 1);
                        return Some(self.parse_line(&line));
                    }
                    if self.eof {
                        self.mode = Mode::Done;
                        if self.buf.is_empty() {
                            return None;
                        }
                        let line = self.buf.split();
                        return Some(self.parse_line(&line));
                    }
                    if let Err(e) = self.fill().await {
                        return Some(Err(e));
                    }
                }
            }
        }
    }

    /// Pull the next chunk into the buffer.
    async fn fill(&mut self) -> Result<(), PipelineError> {
        match self.body.next().await {
            Some(Ok(chunk)) => self.buf.extend_from_slice(&chunk),
            Some(Err(e)) => {
                self.mode = Mode::Done;
                return Err(PipelineError::malformed(format!(
                    "Failed to read upload: {}",
                    e
                )));
            }
            None => self.eof = true,
        }
        Ok(())
    }

    async fn read_to_end(&mut self) -> Result<(), PipelineError> {
        while !self.eof {
            self.fill().await?;
        }
        Ok(())
    }

    fn parse_array(&mut self) -> SourceItem {
        let body = self.buf.split();
        match serde_json::from_slice::<Vec<Option<TransactionDocument>>>(&body) {
            Ok(elements) => {
                let mut elements = elements.into_iter();
                let first = elements.next();
                self.mode = if first.is_some() {
                    Mode::Array(elements)
                } else {
                    Mode::Done
                };
                // An empty array yields one `None` so the stream is never
                // empty on success; the ingestor skips it.
                Ok(first.flatten())
            }
            Err(e) => {
                self.mode = Mode::Done;
                Err(e.into())
            }
        }
    }

    fn parse_line(&mut self, line: &[u8]) -> SourceItem {
        let line = line.trim_ascii();
        if line.is_empty() {
            return Ok(None);
        }
        serde_json::from_slice::<Option<TransactionDocument>>(line).map_err(|e| {
            self.mode = Mode::Done;
            e.into()
        })
    }
}
