use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use fastget_protocol::StatusCode;
use fastget_session::{RemoteHandle, SftpSession};
use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::TransferError;
use crate::error::{RemoteOp, classify};
use crate::types::{ChunkPlan, ChunkRequest};

/// A contiguous run of file bytes delivered by [`RemoteReadStream`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Byte offset within the remote file.
    pub offset: u64,
    pub data: Vec<u8>,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

type ReadFuture<'a> = Pin<Box<dyn Future<Output = Result<Chunk, TransferError>> + Send + 'a>>;

// ---------------------------------------------------------------------------
// RemoteReadStream
// ---------------------------------------------------------------------------

/// Pipelined reads of `[0, size)` from an open remote handle.
///
/// Up to `concurrency` reads are outstanding at once. Completions land in
/// a reorder buffer keyed by offset and are handed out strictly in offset
/// order. Issuing stops while outstanding plus buffered chunks reach twice
/// the concurrency, which bounds memory when an early read is slow.
///
/// The stream is single-use: after the last chunk or the first error it
/// yields nothing more.
pub struct RemoteReadStream<'a> {
    session: &'a dyn SftpSession,
    handle: &'a RemoteHandle,
    plan: ChunkPlan,
    concurrency: usize,
    window: usize,
    in_flight: FuturesUnordered<ReadFuture<'a>>,
    reorder: BTreeMap<u64, Vec<u8>>,
    next_offset: u64,
    size: u64,
    cancel: CancellationToken,
    failed: bool,
    peak_in_flight: usize,
}

impl<'a> RemoteReadStream<'a> {
    pub fn new(
        session: &'a dyn SftpSession,
        handle: &'a RemoteHandle,
        size: u64,
        chunk_size: u32,
        concurrency: usize,
    ) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            session,
            handle,
            plan: ChunkPlan::new(size, chunk_size),
            concurrency,
            window: concurrency.saturating_mul(2),
            in_flight: FuturesUnordered::new(),
            reorder: BTreeMap::new(),
            next_offset: 0,
            size,
            cancel: CancellationToken::new(),
            failed: false,
            peak_in_flight: 0,
        }
    }

    /// Aborts pending reads with [`TransferError::Cancelled`] once `token` fires.
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Returns the next chunk in offset order, or `None` once `size` bytes
    /// have been delivered.
    pub async fn next_chunk(&mut self) -> Result<Option<Chunk>, TransferError> {
        if self.failed {
            return Err(TransferError::Unknown("read stream already failed".into()));
        }
        if self.cancel.is_cancelled() {
            self.abort();
            return Err(TransferError::Cancelled);
        }

        loop {
            if let Some(data) = self.reorder.remove(&self.next_offset) {
                let chunk = Chunk {
                    offset: self.next_offset,
                    data,
                };
                self.next_offset += chunk.len() as u64;
                self.fill();
                return Ok(Some(chunk));
            }

            if self.next_offset >= self.size {
                debug!(
                    size = self.size,
                    peak_in_flight = self.peak_in_flight,
                    "all chunks delivered"
                );
                return Ok(None);
            }

            self.fill();

            let cancel = self.cancel.clone();
            let completed = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(TransferError::Cancelled),
                next = self.in_flight.next() => match next {
                    Some(result) => result,
                    None => Err(TransferError::Unknown(format!(
                        "no reads outstanding at offset {}",
                        self.next_offset
                    ))),
                },
            };

            match completed {
                Ok(chunk) => {
                    trace!(offset = chunk.offset, len = chunk.len(), "chunk received");
                    self.reorder.insert(chunk.offset, chunk.data);
                }
                Err(err) => {
                    self.abort();
                    return Err(err);
                }
            }
        }
    }

    /// Issues requests until the concurrency or window limit is reached.
    fn fill(&mut self) {
        while self.in_flight.len() < self.concurrency
            && self.in_flight.len() + self.reorder.len() < self.window
        {
            let Some(request) = self.plan.next() else {
                break;
            };
            self.in_flight
                .push(Box::pin(fetch(self.session, self.handle, request)));
            self.peak_in_flight = self.peak_in_flight.max(self.in_flight.len());
        }
    }

    /// Drops every outstanding read and buffered chunk.
    fn abort(&mut self) {
        let dropped = self.in_flight.len();
        self.in_flight = FuturesUnordered::new();
        self.reorder.clear();
        self.failed = true;
        debug!(dropped, offset = self.next_offset, "read stream aborted");
    }

    /// Bytes delivered so far.
    pub fn delivered(&self) -> u64 {
        self.next_offset
    }

    /// Highest number of reads that were outstanding at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight
    }
}

/// Reads one full request, continuing after short reads.
async fn fetch<'a>(
    session: &'a dyn SftpSession,
    handle: &'a RemoteHandle,
    request: ChunkRequest,
) -> Result<Chunk, TransferError> {
    let expected = request.length as usize;
    let mut data = Vec::with_capacity(expected);

    while data.len() < expected {
        let offset = request.offset + data.len() as u64;
        let want = expected - data.len();
        let bytes = match session.read(handle, offset, want as u32).await {
            Ok(bytes) => bytes,
            Err(err) if err.code == StatusCode::Eof => Vec::new(),
            Err(err) => return Err(classify(err, RemoteOp::Read { offset })),
        };
        if bytes.is_empty() {
            return Err(TransferError::TruncatedRead {
                offset: request.offset,
                expected: u64::from(request.length),
                received: data.len() as u64,
            });
        }
        if bytes.len() < want {
            trace!(offset, want, got = bytes.len(), "short read");
        }
        data.extend_from_slice(&bytes[..bytes.len().min(want)]);
    }

    Ok(Chunk {
        offset: request.offset,
        data,
    })
}
