//! Streaming HTTP GET: write to disk and hash in the same pass.
//!
//! One blocking curl Easy handle per call. Each received chunk is appended to
//! the destination file, fed into SHA-256 and reported to the progress sink
//! before the next chunk is read, so memory stays bounded by the chunk size.
//! The fetcher never deletes what it wrote; cleanup belongs to the caller.

mod head;
mod options;

pub use options::TransferOptions;

use crate::checksum::finalize_hex;
use crate::control::CancelToken;
use crate::progress::ProgressSink;
use crate::store::ArtifactWriter;
use head::ResponseHead;
use sha2::{Digest, Sha256};
use std::cell::RefCell;
use std::io;
use std::path::Path;
use std::time::Duration;

const USER_AGENT: &str = concat!("imgrepo/", env!("CARGO_PKG_VERSION"));

/// Manifests are small text files; anything bigger is not one.
pub const MAX_TEXT_BYTES: u64 = 8 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The server answered with a non-2xx status.
    #[error("HTTP {status}")]
    Remote { status: u32 },
    /// Network-level failure reported by curl (timeout, reset, DNS, ...).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// Writing the destination file failed.
    #[error("storage: {0}")]
    Storage(#[source] io::Error),
    /// Server declared a length and closed the stream early.
    #[error("incomplete transfer: expected {expected} bytes, got {received}")]
    Incomplete { expected: u64, received: u64 },
    #[error("response exceeds {limit} bytes")]
    TooLarge { limit: u64 },
    #[error("response is not valid UTF-8")]
    NotText,
    #[error("transfer cancelled")]
    Cancelled,
}

/// What a completed transfer produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub bytes: u64,
    /// Lowercase hex SHA-256 of exactly the bytes written.
    pub digest: String,
}

/// Why the write callback refused a chunk.
enum Stop {
    Rejected,
    Cancelled,
    Storage(io::Error),
}

/// Per-transfer sink state driven by curl's write callback.
struct Receiver<'a> {
    destination: &'a Path,
    writer: Option<ArtifactWriter>,
    hasher: Sha256,
    received: u64,
    progress: Option<&'a dyn ProgressSink>,
    cancel: Option<&'a CancelToken>,
    stop: Option<Stop>,
}

impl Receiver<'_> {
    /// Returns the number of bytes consumed; anything short of `data.len()` aborts curl.
    fn on_chunk(&mut self, data: &[u8], head: &ResponseHead) -> usize {
        if self.cancel.map_or(false, CancelToken::is_cancelled) {
            self.stop = Some(Stop::Cancelled);
            return 0;
        }
        if !head.is_success() {
            self.stop = Some(Stop::Rejected);
            return 0;
        }
        if let Err(e) = self.append(data) {
            self.stop = Some(Stop::Storage(e));
            return 0;
        }
        self.hasher.update(data);
        self.received += data.len() as u64;
        if let Some(sink) = self.progress {
            sink.on_progress(self.received, head.content_length);
        }
        data.len()
    }

    fn append(&mut self, data: &[u8]) -> io::Result<()> {
        // Created lazily: only a confirmed 2xx response with a body gets here.
        if self.writer.is_none() {
            self.writer = Some(ArtifactWriter::create(self.destination)?);
        }
        if let Some(w) = self.writer.as_mut() {
            w.append(data)?;
        }
        Ok(())
    }
}

fn configure(
    url: &str,
    options: &TransferOptions,
    timeout: Duration,
) -> Result<curl::easy::Easy, curl::Error> {
    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.useragent(USER_AGENT)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(options.connect_timeout)?;
    easy.low_speed_limit(options.low_speed_limit)?;
    easy.low_speed_time(options.low_speed_time)?;
    easy.timeout(timeout)?;
    easy.buffer_size(options.chunk_size)?;
    Ok(easy)
}

/// GET `url` into `destination`, returning bytes written and their SHA-256.
///
/// The destination is created only after a 2xx status is confirmed, so an
/// error response leaves nothing behind. On a mid-stream failure the partial
/// file stays where it is.
pub fn fetch(
    url: &str,
    destination: &Path,
    progress: Option<&dyn ProgressSink>,
    options: &TransferOptions,
    cancel: Option<&CancelToken>,
) -> Result<FetchOutcome, FetchError> {
    let mut easy = configure(url, options, options.transfer_timeout)?;
    easy.progress(true)?;

    let head = RefCell::new(ResponseHead::default());
    let mut receiver = Receiver {
        destination,
        writer: None,
        hasher: Sha256::new(),
        received: 0,
        progress,
        cancel,
        stop: None,
    };

    let performed = {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(line) = std::str::from_utf8(data) {
                head.borrow_mut().observe(line);
            }
            true
        })?;
        transfer.write_function(|data| Ok(receiver.on_chunk(data, &head.borrow())))?;
        // Also fires while the remote is silent, so cancellation does not wait for data.
        transfer.progress_function(|_, _, _, _| !cancel.map_or(false, CancelToken::is_cancelled))?;
        transfer.perform()
    };

    if let Err(e) = performed {
        return Err(match receiver.stop.take() {
            Some(Stop::Cancelled) => FetchError::Cancelled,
            Some(Stop::Rejected) => FetchError::Remote {
                status: head.borrow().status.unwrap_or(0),
            },
            Some(Stop::Storage(io_err)) => FetchError::Storage(io_err),
            None if e.is_aborted_by_callback() => FetchError::Cancelled,
            None => FetchError::Curl(e),
        });
    }

    let status = easy.response_code()?;
    if !(200..300).contains(&status) {
        return Err(FetchError::Remote { status });
    }

    let writer = match receiver.writer.take() {
        Some(w) => w,
        // 2xx with an empty body: still materialize an (empty) file.
        None => ArtifactWriter::create(destination).map_err(FetchError::Storage)?,
    };
    let bytes = writer.finish().map_err(FetchError::Storage)?;
    if let Some(expected) = head.into_inner().content_length {
        if expected != bytes {
            return Err(FetchError::Incomplete {
                expected,
                received: bytes,
            });
        }
    }

    tracing::debug!(url, bytes, "transfer complete");
    Ok(FetchOutcome {
        bytes,
        digest: finalize_hex(receiver.hasher),
    })
}

/// GET a small UTF-8 document (e.g. a checksum manifest) into memory.
pub fn get_text(url: &str, options: &TransferOptions) -> Result<String, FetchError> {
    let mut easy = configure(url, options, options.manifest_timeout)?;
    let mut body: Vec<u8> = Vec::new();
    let mut too_large = false;

    let performed = {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            if body.len() as u64 + data.len() as u64 > MAX_TEXT_BYTES {
                too_large = true;
                return Ok(0);
            }
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()
    };

    if let Err(e) = performed {
        if too_large {
            return Err(FetchError::TooLarge {
                limit: MAX_TEXT_BYTES,
            });
        }
        return Err(FetchError::Curl(e));
    }

    let status = easy.response_code()?;
    if !(200..300).contains(&status) {
        return Err(FetchError::Remote { status });
    }
    String::from_utf8(body).map_err(|_| FetchError::NotText)
}
