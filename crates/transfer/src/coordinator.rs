//! Orchestration of a single `fast_get` transfer.
//!
//! The coordinator owns every per-transfer resource: the remote handle,
//! the local sink and the read stream. All of them are released before
//! the result is returned, whichever way the transfer ends.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use fastget_session::{RemoteHandle, SftpSession};
use tracing::{debug, info, warn};

use crate::chunked::RemoteReadStream;
use crate::encoding::Transcoder;
use crate::error::{RemoteOp, TransferError, classify};
use crate::path::{is_remote_relative, resolve_local, resolve_remote};
use crate::progress::Progress;
use crate::sink::LocalWriteSink;
use crate::types::{TransferOptions, TransferRequest, TransferResult, TransferState};

/// Downloads `remote_path` from `session` into `local_path`.
///
/// Relative remote paths resolve against the session's home directory,
/// relative local paths against the current working directory. The local
/// file is created or truncated; on failure it is removed again.
pub async fn fast_get(
    session: &dyn SftpSession,
    remote_path: &str,
    local_path: impl AsRef<Path>,
    options: TransferOptions,
) -> Result<TransferResult, TransferError> {
    TransferCoordinator::new(session)
        .fast_get(remote_path, local_path, options)
        .await
}

/// Runs transfers against one session.
///
/// The session is borrowed, never owned; it may serve any number of
/// transfers, concurrently or in sequence.
pub struct TransferCoordinator<'a> {
    session: &'a dyn SftpSession,
}

impl<'a> TransferCoordinator<'a> {
    pub fn new(session: &'a dyn SftpSession) -> Self {
        Self { session }
    }

    pub async fn fast_get(
        &self,
        remote_path: &str,
        local_path: impl AsRef<Path>,
        options: TransferOptions,
    ) -> Result<TransferResult, TransferError> {
        let request = TransferRequest::new(remote_path, local_path.as_ref()).with_options(options);
        self.run(&request).await
    }

    /// Runs `request` to completion. Resolves or fails exactly once.
    pub async fn run(&self, request: &TransferRequest) -> Result<TransferResult, TransferError> {
        let started = Instant::now();
        let mut tracker = StateTracker::new(&request.remote_path);
        info!(
            remote = %request.remote_path,
            local = %request.local_path.display(),
            concurrency = request.options.concurrency,
            chunk_size = request.options.chunk_size,
            "fast_get started"
        );

        match self.execute(request, &mut tracker, started).await {
            Ok(result) => {
                tracker.advance(TransferState::Completed);
                info!(
                    remote = %request.remote_path,
                    bytes = result.bytes_transferred,
                    written = result.bytes_written,
                    elapsed_ms = result.elapsed.as_millis() as u64,
                    "fast_get completed"
                );
                Ok(result)
            }
            Err(err) => {
                tracker.advance(TransferState::Failed);
                debug!(remote = %request.remote_path, error = %err, "fast_get failed");
                Err(err)
            }
        }
    }

    async fn execute(
        &self,
        request: &TransferRequest,
        tracker: &mut StateTracker<'_>,
        started: Instant,
    ) -> Result<TransferResult, TransferError> {
        let options = &request.options;
        options.validate()?;
        let transcoder = match &options.encoding {
            Some(label) => Transcoder::for_label(label)?,
            None => None,
        };

        let remote = self.resolve_remote(&request.remote_path).await?;
        let local = resolve_local_destination(&request.local_path)?;
        tracker.advance(TransferState::PathResolved);
        check_cancelled(options)?;

        let attrs = self
            .session
            .stat(&remote)
            .await
            .map_err(|e| classify(e, RemoteOp::Stat(&remote)))?;
        if attrs.is_dir() {
            return Err(TransferError::RemoteNotAFile(remote));
        }
        let size = attrs.size.ok_or_else(|| {
            TransferError::Unknown(format!("server did not report a size for {remote}"))
        })?;
        check_local_destination(&local).await?;
        tracker.advance(TransferState::RemoteStatted);
        check_cancelled(options)?;

        let handle = self
            .session
            .open(&remote)
            .await
            .map_err(|e| classify(e, RemoteOp::Open(&remote)))?;
        let sink = match LocalWriteSink::open(&local, options.mode, transcoder).await {
            Ok(sink) => sink,
            Err(err) => {
                self.close_quietly(&handle, &remote).await;
                return Err(err);
            }
        };
        tracker.advance(TransferState::HandlesOpen);

        tracker.advance(TransferState::Streaming);
        match self.stream(&handle, sink, size, options).await {
            Ok(bytes_written) => {
                if let Err(err) = self.session.close(&handle).await {
                    warn!(remote = %remote, error = %err, "closing remote handle failed after complete transfer");
                }
                Ok(TransferResult {
                    bytes_transferred: size,
                    bytes_written,
                    elapsed: started.elapsed(),
                })
            }
            Err(err) => {
                self.close_quietly(&handle, &remote).await;
                remove_partial(&local).await;
                Err(err)
            }
        }
    }

    async fn resolve_remote(&self, path: &str) -> Result<String, TransferError> {
        if !is_remote_relative(path) {
            return resolve_remote(path, "/");
        }
        let home = self
            .session
            .home_dir()
            .await
            .map_err(|e| classify(e, RemoteOp::HomeDir))?;
        resolve_remote(path, &home)
    }

    /// Pumps the read stream into `sink`. Returns bytes written locally.
    async fn stream(
        &self,
        handle: &RemoteHandle,
        mut sink: LocalWriteSink,
        size: u64,
        options: &TransferOptions,
    ) -> Result<u64, TransferError> {
        let mut stream = RemoteReadStream::new(
            self.session,
            handle,
            size,
            options.chunk_size,
            options.concurrency,
        );
        if let Some(token) = &options.cancel {
            stream = stream.with_cancel(token.clone());
        }

        let mut transferred = 0u64;
        while let Some(chunk) = stream.next_chunk().await? {
            sink.write(chunk.offset, &chunk.data).await?;
            transferred += chunk.len() as u64;
            if let Some(progress) = &options.progress {
                progress(Progress {
                    transferred,
                    chunk_len: chunk.len() as u64,
                    total: size,
                });
            }
        }

        if transferred != size {
            return Err(TransferError::TruncatedRead {
                offset: transferred,
                expected: size,
                received: transferred,
            });
        }
        sink.close().await
    }

    async fn close_quietly(&self, handle: &RemoteHandle, remote: &str) {
        if let Err(err) = self.session.close(handle).await {
            warn!(remote = %remote, error = %err, "failed to close remote handle");
        }
    }
}

/// Logs and checks state transitions.
struct StateTracker<'r> {
    remote: &'r str,
    state: TransferState,
}

impl<'r> StateTracker<'r> {
    fn new(remote: &'r str) -> Self {
        Self {
            remote,
            state: TransferState::Idle,
        }
    }

    fn advance(&mut self, next: TransferState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal transition {:?} -> {next:?}",
            self.state
        );
        debug!(remote = self.remote, from = ?self.state, to = ?next, "transfer state");
        self.state = next;
    }
}

fn check_cancelled(options: &TransferOptions) -> Result<(), TransferError> {
    match &options.cancel {
        Some(token) if token.is_cancelled() => Err(TransferError::Cancelled),
        _ => Ok(()),
    }
}

fn resolve_local_destination(path: &Path) -> Result<PathBuf, TransferError> {
    if path.is_absolute() {
        return resolve_local(path, Path::new("/"));
    }
    let cwd = std::env::current_dir().map_err(|e| {
        TransferError::InvalidPath(format!("cannot determine working directory: {e}"))
    })?;
    resolve_local(path, &cwd)
}

/// Rejects destinations that are directories or whose parent is missing.
async fn check_local_destination(path: &Path) -> Result<(), TransferError> {
    let local_open = |source| TransferError::LocalOpen {
        path: path.to_path_buf(),
        source,
    };

    if let Ok(meta) = tokio::fs::metadata(path).await
        && meta.is_dir()
    {
        return Err(local_open(io::Error::new(
            io::ErrorKind::IsADirectory,
            "destination is a directory",
        )));
    }

    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };
    match tokio::fs::metadata(parent).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(local_open(io::Error::new(
            io::ErrorKind::NotADirectory,
            "parent is not a directory",
        ))),
        Err(err) => Err(local_open(err)),
    }
}

async fn remove_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "partial local file removed"),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => warn!(path = %path.display(), error = %err, "failed to remove partial local file"),
    }
}
