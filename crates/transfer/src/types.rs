use std::path::PathBuf;
use std::time::Duration;

use fastget_protocol::constants::{
    DEFAULT_CHUNK_SIZE, DEFAULT_CONCURRENCY, MAX_CHUNK_SIZE, MAX_CONCURRENCY,
};
use tokio_util::sync::CancellationToken;

use crate::TransferError;
use crate::encoding::Transcoder;
use crate::progress::{Progress, ProgressCallback};

/// Per-transfer tuning.
#[derive(Clone)]
pub struct TransferOptions {
    /// Target text encoding of the local file; `None` writes bytes verbatim.
    pub encoding: Option<String>,
    /// Maximum number of reads outstanding at once.
    pub concurrency: usize,
    /// Bytes requested per read.
    pub chunk_size: u32,
    /// Permission bits for a newly created local file.
    pub mode: Option<u32>,
    /// Called after each chunk is written.
    pub progress: Option<ProgressCallback>,
    /// Aborts the transfer when cancelled.
    pub cancel: Option<CancellationToken>,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            encoding: None,
            concurrency: DEFAULT_CONCURRENCY,
            chunk_size: DEFAULT_CHUNK_SIZE,
            mode: None,
            progress: None,
            cancel: None,
        }
    }
}

impl std::fmt::Debug for TransferOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferOptions")
            .field("encoding", &self.encoding)
            .field("concurrency", &self.concurrency)
            .field("chunk_size", &self.chunk_size)
            .field("mode", &self.mode.map(|m| format!("{m:o}")))
            .field("progress", &self.progress.is_some())
            .field("cancel", &self.cancel.is_some())
            .finish()
    }
}

impl TransferOptions {
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: u32) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn on_progress(mut self, callback: impl Fn(Progress) + Send + Sync + 'static) -> Self {
        self.progress = Some(std::sync::Arc::new(callback));
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Checks bounds and the encoding label.
    pub fn validate(&self) -> Result<(), TransferError> {
        if self.concurrency == 0 || self.concurrency > MAX_CONCURRENCY {
            return Err(TransferError::InvalidOptions(format!(
                "concurrency must be between 1 and {MAX_CONCURRENCY}, got {}",
                self.concurrency
            )));
        }
        if self.chunk_size == 0 || self.chunk_size > MAX_CHUNK_SIZE {
            return Err(TransferError::InvalidOptions(format!(
                "chunk size must be between 1 and {MAX_CHUNK_SIZE}, got {}",
                self.chunk_size
            )));
        }
        if let Some(mode) = self.mode
            && mode & !0o7777 != 0
        {
            return Err(TransferError::InvalidOptions(format!(
                "mode {mode:o} has bits outside 0o7777"
            )));
        }
        if let Some(label) = &self.encoding {
            Transcoder::for_label(label)?;
        }
        Ok(())
    }
}

/// A single byte-range read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRequest {
    pub offset: u64,
    pub length: u32,
}

impl ChunkRequest {
    pub fn end(&self) -> u64 {
        self.offset + u64::from(self.length)
    }
}

/// Partitions `[0, size)` into contiguous `chunk_size` requests.
#[derive(Debug, Clone)]
pub struct ChunkPlan {
    next: u64,
    size: u64,
    chunk_size: u32,
}

impl ChunkPlan {
    pub fn new(size: u64, chunk_size: u32) -> Self {
        Self {
            next: 0,
            size,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Number of requests not yet handed out.
    pub fn remaining(&self) -> u64 {
        (self.size - self.next).div_ceil(u64::from(self.chunk_size))
    }
}

impl Iterator for ChunkPlan {
    type Item = ChunkRequest;

    fn next(&mut self) -> Option<ChunkRequest> {
        if self.next >= self.size {
            return None;
        }
        let length = (self.size - self.next).min(u64::from(self.chunk_size)) as u32;
        let request = ChunkRequest {
            offset: self.next,
            length,
        };
        self.next += u64::from(length);
        Some(request)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = usize::try_from(self.remaining()).unwrap_or(usize::MAX);
        (n, Some(n))
    }
}

/// Everything one `fast_get` call needs.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub remote_path: String,
    pub local_path: PathBuf,
    pub options: TransferOptions,
}

impl TransferRequest {
    pub fn new(remote_path: impl Into<String>, local_path: impl Into<PathBuf>) -> Self {
        Self {
            remote_path: remote_path.into(),
            local_path: local_path.into(),
            options: TransferOptions::default(),
        }
    }

    pub fn with_options(mut self, options: TransferOptions) -> Self {
        self.options = options;
        self
    }
}

/// Outcome of a successful transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferResult {
    /// Bytes read from the remote file; always equals its size.
    pub bytes_transferred: u64,
    /// Bytes written locally; differs from the above only when transcoding.
    pub bytes_written: u64,
    pub elapsed: Duration,
}

/// Lifecycle of a single transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    Idle,
    PathResolved,
    RemoteStatted,
    HandlesOpen,
    Streaming,
    Completed,
    Failed,
}

impl TransferState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether `self -> next` is a legal step.
    pub fn can_advance_to(self, next: TransferState) -> bool {
        use TransferState::*;
        match (self, next) {
            (Idle, PathResolved)
            | (PathResolved, RemoteStatted)
            | (RemoteStatted, HandlesOpen)
            | (HandlesOpen, Streaming)
            | (Streaming, Completed) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}
