//! Loopback session serving a local directory tree.
//!
//! The directory given as `root` plays the server's `/`. Remote paths are
//! resolved the way an SFTP server resolves them: relative paths against
//! the home directory, `..` clamped at `/`.

use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use fastget_protocol::{FileAttributes, SftpError, join_remote};
use tracing::{debug, trace};

use crate::{RemoteHandle, SessionFuture, SftpSession};

/// An [`SftpSession`] backed by the local filesystem.
pub struct LocalSession {
    root: PathBuf,
    home: String,
    max_read: Option<u32>,
    handles: Mutex<HashMap<u32, Arc<File>>>,
    next_handle: AtomicU32,
}

impl LocalSession {
    /// Creates a session whose `/` is `root` and whose home is `home`.
    ///
    /// `home` is a remote path; a relative value is taken from `/`.
    pub fn new(root: impl Into<PathBuf>, home: &str) -> Self {
        let home = join_remote("/", home);
        Self {
            root: root.into(),
            home,
            max_read: None,
            handles: Mutex::new(HashMap::new()),
            next_handle: AtomicU32::new(1),
        }
    }

    /// Caps every read at `max` bytes, like servers that split large reads.
    pub fn with_max_read(mut self, max: u32) -> Self {
        self.max_read = Some(max.max(1));
        self
    }

    /// Number of handles opened and not yet closed.
    pub fn open_handle_count(&self) -> usize {
        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Maps a remote path onto the local tree.
    fn local_path(&self, remote: &str) -> PathBuf {
        let absolute = join_remote(&self.home, remote);
        let mut local = self.root.clone();
        for part in absolute.split('/').filter(|p| !p.is_empty()) {
            local.push(part);
        }
        local
    }

    fn lookup(&self, handle: &RemoteHandle) -> Result<Arc<File>, SftpError> {
        let id = decode_handle(handle)?;
        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or_else(|| SftpError::failure("invalid handle"))
    }
}

impl LocalSession {
    async fn stat_path(&self, path: &str) -> Result<FileAttributes, SftpError> {
        let local = self.local_path(path);
        let metadata = tokio::fs::metadata(&local).await?;
        trace!(path, size = metadata.len(), "stat");
        Ok(attributes(&metadata))
    }

    async fn open_path(&self, path: &str) -> Result<RemoteHandle, SftpError> {
        let local = self.local_path(path);
        let file = tokio::fs::File::open(&local).await?;
        if file.metadata().await?.is_dir() {
            return Err(SftpError::failure("Is a directory"));
        }

        let file = Arc::new(file.into_std().await);
        let id = self.next_handle.fetch_add(1, Ordering::Relaxed);
        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, file);

        debug!(path, handle = id, "remote file opened");
        Ok(RemoteHandle::new(id.to_be_bytes()))
    }

    async fn read_handle(
        &self,
        handle: &RemoteHandle,
        offset: u64,
        len: u32,
    ) -> Result<Vec<u8>, SftpError> {
        let file = self.lookup(handle)?;
        let len = match self.max_read {
            Some(max) => len.min(max),
            None => len,
        };

        let data = tokio::task::spawn_blocking(move || read_full_at(&file, offset, len))
            .await
            .map_err(|e| SftpError::failure(format!("read task failed: {e}")))??;

        trace!(offset, requested = len, received = data.len(), "read");
        Ok(data)
    }

    async fn close_handle(&self, handle: &RemoteHandle) -> Result<(), SftpError> {
        let id = decode_handle(handle)?;
        let removed = self
            .handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        match removed {
            Some(_) => {
                debug!(handle = id, "remote file closed");
                Ok(())
            }
            None => Err(SftpError::failure("invalid handle")),
        }
    }
}

impl SftpSession for LocalSession {
    fn home_dir(&self) -> SessionFuture<'_, String> {
        let home = self.home.clone();
        Box::pin(async move { Ok(home) })
    }

    fn stat<'a>(&'a self, path: &'a str) -> SessionFuture<'a, FileAttributes> {
        Box::pin(self.stat_path(path))
    }

    fn open<'a>(&'a self, path: &'a str) -> SessionFuture<'a, RemoteHandle> {
        Box::pin(self.open_path(path))
    }

    fn read<'a>(
        &'a self,
        handle: &'a RemoteHandle,
        offset: u64,
        len: u32,
    ) -> SessionFuture<'a, Vec<u8>> {
        Box::pin(self.read_handle(handle, offset, len))
    }

    fn close<'a>(&'a self, handle: &'a RemoteHandle) -> SessionFuture<'a, ()> {
        Box::pin(self.close_handle(handle))
    }
}

fn decode_handle(handle: &RemoteHandle) -> Result<u32, SftpError> {
    let bytes: [u8; 4] = handle
        .as_bytes()
        .try_into()
        .map_err(|_| SftpError::failure("invalid handle"))?;
    Ok(u32::from_be_bytes(bytes))
}

/// Reads until `len` bytes are collected or end of file is reached.
fn read_full_at(file: &File, offset: u64, len: u32) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; len as usize];
    let mut filled = 0;
    while filled < buf.len() {
        let n = read_at(file, &mut buf[filled..], offset + filled as u64)?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    buf.truncate(filled);
    Ok(buf)
}

#[cfg(unix)]
fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    std::os::unix::fs::FileExt::read_at(file, buf, offset)
}

#[cfg(windows)]
fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    std::os::windows::fs::FileExt::seek_read(file, buf, offset)
}

#[cfg(unix)]
fn attributes(metadata: &std::fs::Metadata) -> FileAttributes {
    use std::os::unix::fs::MetadataExt;

    FileAttributes {
        size: Some(metadata.len()),
        uid: Some(metadata.uid()),
        gid: Some(metadata.gid()),
        permissions: Some(metadata.mode()),
        atime: Some(metadata.atime() as u32),
        mtime: Some(metadata.mtime() as u32),
    }
}

#[cfg(not(unix))]
fn attributes(metadata: &std::fs::Metadata) -> FileAttributes {
    use fastget_protocol::constants::{S_IFDIR, S_IFREG};

    let permissions = if metadata.is_dir() {
        S_IFDIR | 0o755
    } else {
        S_IFREG | 0o644
    };
    let mtime = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as u32);
    FileAttributes {
        size: Some(metadata.len()),
        permissions: Some(permissions),
        mtime,
        ..Default::default()
    }
}
