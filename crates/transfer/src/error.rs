//! Transfer errors and the classifier that produces them.
//!
//! Sessions report raw [`SftpError`]s. [`classify`] turns those into the
//! stable [`TransferError`] taxonomy based on which remote operation
//! failed, keeping the server's message text intact.

use std::io;
use std::path::PathBuf;

use fastget_protocol::{SftpError, StatusCode};

/// Text every "file not found" rejection carries, whatever the server said.
pub const NO_SUCH_FILE: &str = "No such file";

/// Machine-checkable category of a [`TransferError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidPath,
    InvalidOptions,
    RemoteNotFound,
    RemotePermission,
    RemoteNotAFile,
    RemoteRead,
    TruncatedRead,
    LocalOpen,
    LocalWrite,
    ConnectionLost,
    Cancelled,
    Unknown,
}

/// Errors produced by a transfer.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("{message}: {path}")]
    RemoteNotFound { path: String, message: String },

    #[error("{message}: {path}")]
    RemotePermission { path: String, message: String },

    #[error("not a regular file: {0}")]
    RemoteNotAFile(String),

    #[error("remote read failed at offset {offset}: {message}")]
    RemoteRead { offset: u64, message: String },

    #[error("truncated read at offset {offset}: expected {expected} bytes, got {received}")]
    TruncatedRead {
        offset: u64,
        expected: u64,
        received: u64,
    },

    #[error("cannot open local file {}: {source}", path.display())]
    LocalOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write local file {}: {source}", path.display())]
    LocalWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("connection lost: {0}")]
    ConnectionLost(String),

    #[error("cancelled")]
    Cancelled,

    #[error("transfer failed: {0}")]
    Unknown(String),
}

impl TransferError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPath(_) => ErrorKind::InvalidPath,
            Self::InvalidOptions(_) => ErrorKind::InvalidOptions,
            Self::RemoteNotFound { .. } => ErrorKind::RemoteNotFound,
            Self::RemotePermission { .. } => ErrorKind::RemotePermission,
            Self::RemoteNotAFile(_) => ErrorKind::RemoteNotAFile,
            Self::RemoteRead { .. } => ErrorKind::RemoteRead,
            Self::TruncatedRead { .. } => ErrorKind::TruncatedRead,
            Self::LocalOpen { .. } => ErrorKind::LocalOpen,
            Self::LocalWrite { .. } => ErrorKind::LocalWrite,
            Self::ConnectionLost(_) => ErrorKind::ConnectionLost,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Unknown(_) => ErrorKind::Unknown,
        }
    }
}

/// The remote operation a session error came from.
#[derive(Debug, Clone, Copy)]
pub enum RemoteOp<'a> {
    HomeDir,
    Stat(&'a str),
    Open(&'a str),
    Read { offset: u64 },
    Close,
}

/// Maps a session error onto the transfer taxonomy.
///
/// Connection failures win over everything else. Not-found and
/// permission failures are only meaningful for path operations; a failed
/// read is always [`TransferError::RemoteRead`] with the server's text.
/// Anything left over becomes [`TransferError::Unknown`].
pub fn classify(err: SftpError, op: RemoteOp<'_>) -> TransferError {
    let SftpError { code, message } = err;

    if code.is_connection_error() {
        return TransferError::ConnectionLost(message);
    }

    match (code, op) {
        (StatusCode::NoSuchFile, RemoteOp::Stat(path) | RemoteOp::Open(path)) => {
            TransferError::RemoteNotFound {
                path: path.to_string(),
                message: not_found_message(message),
            }
        }
        (StatusCode::PermissionDenied, RemoteOp::Stat(path) | RemoteOp::Open(path)) => {
            TransferError::RemotePermission {
                path: path.to_string(),
                message,
            }
        }
        (_, RemoteOp::Read { offset }) => TransferError::RemoteRead { offset, message },
        _ => TransferError::Unknown(message),
    }
}

/// Makes sure a not-found message contains [`NO_SUCH_FILE`].
fn not_found_message(message: String) -> String {
    if message.contains(NO_SUCH_FILE) {
        message
    } else if message.is_empty() {
        NO_SUCH_FILE.to_string()
    } else {
        format!("{NO_SUCH_FILE} ({message})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stat_not_found_keeps_server_text() {
        let err = classify(SftpError::no_such_file(), RemoteOp::Stat("/srv/missing.txt"));
        assert_eq!(err.kind(), ErrorKind::RemoteNotFound);
        assert_eq!(err.to_string(), "No such file: /srv/missing.txt");
    }

    #[test]
    fn not_found_message_is_normalized() {
        let raw = SftpError::new(StatusCode::NoSuchFile, "file does not exist");
        let err = classify(raw, RemoteOp::Open("/x"));
        assert!(err.to_string().contains(NO_SUCH_FILE));
        assert!(err.to_string().contains("file does not exist"));
    }

    #[test]
    fn permission_denied_on_open() {
        let err = classify(SftpError::permission_denied(), RemoteOp::Open("/root/secret"));
        assert_eq!(err.kind(), ErrorKind::RemotePermission);
        assert_eq!(err.to_string(), "Permission denied: /root/secret");
    }

    #[test]
    fn connection_errors_win() {
        let err = classify(SftpError::connection_lost(), RemoteOp::Read { offset: 64 });
        assert_eq!(err.kind(), ErrorKind::ConnectionLost);

        let err = classify(
            SftpError::from_code(StatusCode::NoConnection),
            RemoteOp::Stat("/x"),
        );
        assert_eq!(err.kind(), ErrorKind::ConnectionLost);
    }

    #[test]
    fn read_failure_keeps_message_verbatim() {
        let err = classify(SftpError::failure("bad handle 7"), RemoteOp::Read { offset: 32768 });
        assert_eq!(err.kind(), ErrorKind::RemoteRead);
        assert_eq!(
            err.to_string(),
            "remote read failed at offset 32768: bad handle 7"
        );
    }

    #[test]
    fn unclassified_errors_are_wrapped() {
        let err = classify(
            SftpError::new(StatusCode::Other(99), "vendor specific"),
            RemoteOp::Stat("/x"),
        );
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert!(err.to_string().contains("vendor specific"));

        let err = classify(SftpError::failure("nope"), RemoteOp::Close);
        assert_eq!(err.kind(), ErrorKind::Unknown);
    }

    #[test]
    fn local_errors_name_the_path() {
        let err = TransferError::LocalOpen {
            path: PathBuf::from("/tmp/out.bin"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(err.kind(), ErrorKind::LocalOpen);
        assert!(err.to_string().starts_with("cannot open local file /tmp/out.bin"));
    }
}
