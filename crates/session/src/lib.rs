//! SFTP session capability.
//!
//! The transfer engine never speaks the SFTP wire protocol itself. It is
//! handed an [`SftpSession`], an already authenticated channel that can
//! open, read, close and stat remote files. The SSH client owning the
//! connection implements this trait; [`LocalSession`] implements it over
//! a local directory tree for loopback use and tests.

mod local;

use std::future::Future;
use std::pin::Pin;

use fastget_protocol::{FileAttributes, SftpError};

pub use local::LocalSession;

/// Boxed future returned by session operations.
pub type SessionFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SftpError>> + Send + 'a>>;

/// An open file on the remote side.
///
/// The bytes are opaque and only meaningful to the session that issued
/// them. Handles are deliberately not `Clone`: whoever holds one is
/// responsible for closing it.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct RemoteHandle(Vec<u8>);

impl RemoteHandle {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Abstract connection to an SFTP server.
///
/// Implementations must accept several `read` calls outstanding at once
/// on the same handle; request IDs are the implementation's business.
/// Using a trait keeps the transfer engine decoupled from the SSH stack
/// and testable with doubles.
pub trait SftpSession: Send + Sync {
    /// Absolute path of the session's home directory (`realpath(".")`).
    fn home_dir(&self) -> SessionFuture<'_, String>;

    /// Returns the attributes of `path`, following symlinks.
    fn stat<'a>(&'a self, path: &'a str) -> SessionFuture<'a, FileAttributes>;

    /// Opens `path` for reading.
    fn open<'a>(&'a self, path: &'a str) -> SessionFuture<'a, RemoteHandle>;

    /// Reads up to `len` bytes at `offset`.
    ///
    /// May return fewer bytes than requested. An empty buffer means end
    /// of file.
    fn read<'a>(
        &'a self,
        handle: &'a RemoteHandle,
        offset: u64,
        len: u32,
    ) -> SessionFuture<'a, Vec<u8>>;

    /// Closes a handle obtained from [`open`](Self::open).
    fn close<'a>(&'a self, handle: &'a RemoteHandle) -> SessionFuture<'a, ()>;
}
